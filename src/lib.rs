//! # eventwire
//!
//! A compact binary codec and event-dispatch protocol for exchanging typed
//! messages over a byte stream.
//!
//! ## Layers
//! - [`core`]: little-endian buffer cursors, the encodable value set, and
//!   discriminant sizing
//! - [`protocol`]: schema descriptions and validation, event groups, subscriber
//!   sets, and the dispatch table
//! - [`encoding`]: lossy quantizers for directions and normalized values
//! - [`config`] and [`utils`]: TOML configuration, logging, metrics
//!
//! The transport is not part of this crate: it hands over one delimited message
//! together with its group identifier, and takes bytes produced by
//! [`DispatchTable::encode`](protocol::dispatcher::DispatchTable::encode).
//!
//! ## Example
//! ```rust
//! use eventwire::prelude::*;
//!
//! eventwire::wire_enum! {
//!     pub enum KickReason: u8 { None = 0, Cheating = 1 }
//! }
//!
//! eventwire::event_group! {
//!     pub enum VoteEvent {
//!         BeginMapVote { maps: Vec<String> },
//!         BeginKickVote { player: String, reason: KickReason },
//!     }
//! }
//!
//! # fn main() -> eventwire::Result<()> {
//! let mut builder = DispatchTableBuilder::new();
//! let group = builder.register_next::<VoteEvent>()?;
//! let table = builder.build();
//!
//! table.subscribe::<BeginKickVote, _>(|vote| {
//!     assert_eq!(vote.reason, KickReason::Cheating);
//!     Ok(())
//! })?;
//!
//! let event = VoteEvent::from(BeginKickVote { player: "Bob".into(), reason: KickReason::Cheating });
//! let (id, bytes) = table.to_vec(&event)?;
//! assert_eq!(id, group);
//! table.dispatch_incoming(id, &bytes)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod encoding;
pub mod error;
pub mod protocol;
pub mod utils;

pub use error::{ProtocolError, Result};

/// Commonly used types and traits.
pub mod prelude {
    pub use crate::config::EventwireConfig;
    pub use crate::core::codec::{DecodeLimits, Deserializer, Serializer};
    pub use crate::core::kind::KindWidth;
    pub use crate::core::wire::{Decode, Describe, Encode};
    pub use crate::error::{ProtocolError, Result};
    pub use crate::protocol::dispatcher::{DispatchTable, DispatchTableBuilder, GroupId};
    pub use crate::protocol::event_group::{EventGroup, GroupCodec, Variant};
    pub use crate::protocol::subscribers::{DeliveryReport, SubscriptionId};
}
