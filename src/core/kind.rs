//! Discriminant ("kind") sizing for event groups.
//!
//! A group's kind is written as the smallest unsigned integer whose maximum value
//! is at least the number of declared variants: up to 255 variants use one byte,
//! 256 to 65535 use two, and so on. The width is a property of the schema and is
//! computed once when the group is built, never per message.

use crate::core::codec::{Deserializer, Serializer};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire width of a kind discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindWidth {
    U8,
    U16,
    U32,
    U64,
}

impl KindWidth {
    /// Select the width for a group with `count` variants.
    pub const fn for_variant_count(count: usize) -> Self {
        let count = count as u64;
        if count <= u8::MAX as u64 {
            KindWidth::U8
        } else if count <= u16::MAX as u64 {
            KindWidth::U16
        } else if count <= u32::MAX as u64 {
            KindWidth::U32
        } else {
            KindWidth::U64
        }
    }

    /// Encoded size in bytes.
    pub const fn byte_len(self) -> usize {
        match self {
            KindWidth::U8 => 1,
            KindWidth::U16 => 2,
            KindWidth::U32 => 4,
            KindWidth::U64 => 8,
        }
    }

    pub const fn bits(self) -> u32 {
        self.byte_len() as u32 * 8
    }

    /// Largest kind value representable at this width.
    pub const fn max_kind(self) -> u64 {
        match self {
            KindWidth::U8 => u8::MAX as u64,
            KindWidth::U16 => u16::MAX as u64,
            KindWidth::U32 => u32::MAX as u64,
            KindWidth::U64 => u64::MAX,
        }
    }

    /// Write `kind` at this width.
    ///
    /// Callers guarantee `kind` is a declared kind of the group, so it always fits.
    pub fn write(self, se: &mut Serializer<'_>, kind: u64) -> Result<()> {
        debug_assert!(kind <= self.max_kind());
        match self {
            KindWidth::U8 => se.serialize_u8(kind as u8),
            KindWidth::U16 => se.serialize_u16(kind as u16),
            KindWidth::U32 => se.serialize_u32(kind as u32),
            KindWidth::U64 => se.serialize_u64(kind),
        }
    }

    /// Read a kind at this width.
    pub fn read(self, de: &mut Deserializer<'_>) -> Result<u64> {
        Ok(match self {
            KindWidth::U8 => u64::from(de.deserialize_u8()?),
            KindWidth::U16 => u64::from(de.deserialize_u16()?),
            KindWidth::U32 => u64::from(de.deserialize_u32()?),
            KindWidth::U64 => de.deserialize_u64()?,
        })
    }
}

impl fmt::Display for KindWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_boundaries() {
        assert_eq!(KindWidth::for_variant_count(0), KindWidth::U8);
        assert_eq!(KindWidth::for_variant_count(2), KindWidth::U8);
        assert_eq!(KindWidth::for_variant_count(200), KindWidth::U8);
        assert_eq!(KindWidth::for_variant_count(255), KindWidth::U8);
        assert_eq!(KindWidth::for_variant_count(256), KindWidth::U16);
        assert_eq!(KindWidth::for_variant_count(65_535), KindWidth::U16);
        assert_eq!(KindWidth::for_variant_count(65_536), KindWidth::U32);
    }

    #[test]
    fn test_kind_is_little_endian() {
        let mut buffer = [0u8; 8];
        let mut se = Serializer::new(&mut buffer);
        KindWidth::U16.write(&mut se, 0x0102).unwrap();
        assert_eq!(se.finish(), 2);
        assert_eq!(&buffer[..2], &[0x02, 0x01]);

        let mut de = Deserializer::new(&buffer[..2]);
        assert_eq!(KindWidth::U16.read(&mut de).unwrap(), 0x0102);
    }

    #[test]
    fn test_display() {
        assert_eq!(KindWidth::U8.to_string(), "u8");
        assert_eq!(KindWidth::U64.to_string(), "u64");
    }
}
