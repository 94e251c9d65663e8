//! # Core Codec Components
//!
//! Low-level buffer cursors, the encodable value set, and discriminant sizing.
//!
//! This module is the foundation of the wire format. Everything above it
//! (event groups, dispatch) is expressed as sequences of calls into these types.
//!
//! ## Components
//! - **Codec**: `Serializer` / `Deserializer` cursors over a caller-owned byte region
//! - **Wire**: `Encode` / `Decode` / `Describe` traits for every encodable value
//! - **Kind**: minimal-width discriminant selection and kind read/write
//!
//! ## Wire Format
//! ```text
//! bool            1 byte, 0 or 1
//! i8/u8 .. i64/u64, f32, f64   fixed width, little-endian
//! string          [len: i32 LE][len UTF-8 bytes]
//! array<T>        [count: i32 LE][T]*count
//! ```
//!
//! ## Safety
//! - Cursors never read or write past the supplied region
//! - Length prefixes are validated before any allocation
//! - Decode allocations are capped by the bytes actually remaining

pub mod codec;
pub mod kind;
pub mod wire;
