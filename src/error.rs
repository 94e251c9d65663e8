//! # Error Types
//!
//! Error handling for the codec, schema validation, and dispatch layers.
//!
//! ## Error Categories
//! - **Codec Errors**: buffer overflow/underflow, invalid UTF-8, bad length prefixes.
//!   Fatal to the current encode/decode call; the cursor must not be reused afterwards.
//! - **Schema Errors**: collected per offending field and reported as one batch
//!   when an event group is built, never at message time.
//! - **Message Errors**: unknown group identifiers and unknown variant kinds.
//!   Always recoverable; the message is dropped and the caller decides what to log.
//! - **Programming Errors**: encoding a kind the group does not own.
//!
//! ## Example Usage
//! ```rust
//! use eventwire::core::codec::Deserializer;
//! use eventwire::error::ProtocolError;
//!
//! let bytes = [0x02, 0x00];
//! let mut de = Deserializer::new(&bytes);
//! match de.deserialize_i32() {
//!     Err(ProtocolError::BufferUnderflow { needed, remaining }) => {
//!         assert_eq!((needed, remaining), (4, 2));
//!     }
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

use crate::protocol::validator::SchemaDiagnostic;
use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Subscriber set errors
    pub const ERR_SUBSCRIBERS_WRITE_LOCK: &str = "Failed to acquire write lock on subscriber set";
    pub const ERR_SUBSCRIBERS_READ_LOCK: &str = "Failed to acquire read lock on subscriber set";

    /// Subscriber callback failures
    pub const ERR_SUBSCRIBER_PANICKED: &str = "Subscriber panicked during delivery";

    /// Dispatch errors
    pub const ERR_UNKNOWN_GROUP: &str = "Dropping message for unknown event group";
    pub const ERR_UNKNOWN_VARIANT: &str = "Dropping message for unknown variant kind";
    pub const ERR_MALFORMED_MESSAGE: &str = "Dropping malformed message";
}

// ProtocolError is the primary error type for all eventwire operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Buffer overflow: need {needed} bytes, {remaining} remaining")]
    BufferOverflow { needed: usize, remaining: usize },

    #[error("Buffer underflow: need {needed} bytes, {remaining} remaining")]
    BufferUnderflow { needed: usize, remaining: usize },

    #[error("String bytes are not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("Invalid length prefix: {0}")]
    InvalidLength(i32),

    #[error("Length {0} does not fit in an i32 length prefix")]
    LengthOverflow(usize),

    #[error("{what} length {len} exceeds limit {max}")]
    LimitExceeded {
        what: &'static str,
        len: usize,
        max: usize,
    },

    #[error("Value {value} is not a variant of enum {name}")]
    InvalidEnumValue { name: &'static str, value: i128 },

    #[error("Kind {kind} out of range for group {group} ({variants} variants)")]
    KindOutOfRange {
        group: &'static str,
        kind: u64,
        variants: usize,
    },

    #[error("Unknown variant kind {kind} for group {group}")]
    UnknownVariant { group: &'static str, kind: u64 },

    #[error("Unknown event group identifier: {0}")]
    UnknownGroup(u32),

    #[error("Event group identifier {0} registered twice")]
    DuplicateGroup(u32),

    #[error("Event group {0} registered under two identifiers")]
    DuplicateGroupType(&'static str),

    #[error("Event group {0} is not registered")]
    GroupNotRegistered(&'static str),

    #[error("Schema validation failed with {} diagnostic(s)", .0.len())]
    SchemaValidation(Vec<SchemaDiagnostic>),

    #[error("Subscriber error: {0}")]
    Subscriber(String),

    #[error("Synchronization primitive poisoned")]
    LockPoisoned,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Custom error: {0}")]
    Custom(String),
}

impl ProtocolError {
    /// Whether the error concerns a single inbound message and can be dropped
    /// without affecting the rest of the process.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ProtocolError::BufferUnderflow { .. }
                | ProtocolError::InvalidUtf8(_)
                | ProtocolError::InvalidLength(_)
                | ProtocolError::LimitExceeded { .. }
                | ProtocolError::InvalidEnumValue { .. }
                | ProtocolError::UnknownVariant { .. }
                | ProtocolError::UnknownGroup(_)
                | ProtocolError::Subscriber(_)
        )
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(ProtocolError::UnknownGroup(3).is_recoverable());
        assert!(ProtocolError::UnknownVariant { group: "g", kind: 9 }.is_recoverable());
        assert!(!ProtocolError::KindOutOfRange {
            group: "g",
            kind: 9,
            variants: 2
        }
        .is_recoverable());
        assert!(!ProtocolError::DuplicateGroup(1).is_recoverable());
    }

    #[test]
    fn test_display_messages() {
        let err = ProtocolError::BufferOverflow {
            needed: 4,
            remaining: 1,
        };
        assert_eq!(err.to_string(), "Buffer overflow: need 4 bytes, 1 remaining");
        assert_eq!(
            ProtocolError::SchemaValidation(Vec::new()).to_string(),
            "Schema validation failed with 0 diagnostic(s)"
        );
    }
}
