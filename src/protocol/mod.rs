//! # Event-Group Protocol
//!
//! Typed event groups on top of the codec.
//!
//! ## Components
//! - **Schema**: abstract descriptions of groups, variants and fields
//! - **Validator**: one-pass schema checks with batch diagnostics
//! - **Event groups**: the `EventGroup`/`Variant` traits, `GroupCodec`, and the `event_group!` generator
//! - **Subscribers**: copy-on-write callback lists with per-callback isolation
//! - **Dispatcher**: group-identifier routing from bytes or local values to subscribers
//!
//! ## Wire Format
//! ```text
//! [kind: u8|u16|u32|u64 LE][variant fields in declared order]
//! ```
//! The group identifier is carried out of band by the transport.

pub mod dispatcher;
pub mod event_group;
pub mod schema;
pub mod subscribers;
pub mod validator;
