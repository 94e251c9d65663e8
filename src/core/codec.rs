//! # Buffer Cursors
//!
//! `Serializer` and `Deserializer` are thin cursors over a byte region owned by the
//! caller. Each call advances the cursor by exactly the number of bytes it produced
//! or consumed. Neither type allocates on its own; only decoding strings and arrays
//! allocates the returned value.
//!
//! All multi-byte scalars are little-endian on the wire regardless of host order.
//! Once a call returns an error the cursor position is unspecified and the cursor
//! must be discarded.
//!
//! ```rust
//! use eventwire::core::codec::{Deserializer, Serializer};
//!
//! let mut buffer = [0u8; 64];
//! let mut se = Serializer::new(&mut buffer);
//! se.serialize_string("Hi").unwrap();
//! let written = se.finish();
//! assert_eq!(&buffer[..written], &[2, 0, 0, 0, b'H', b'i']);
//!
//! let mut de = Deserializer::new(&buffer[..written]);
//! assert_eq!(de.deserialize_string().unwrap(), "Hi");
//! ```

use crate::error::{ProtocolError, Result};
use bytes::{Buf, BufMut};

/// Size in bytes of a string or array length prefix.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Upper bounds applied to length prefixes read from untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Maximum string length in bytes
    pub max_string_len: usize,
    /// Maximum number of elements in a single array
    pub max_array_len: usize,
}

impl DecodeLimits {
    /// No limits beyond the size of the input itself.
    pub const UNBOUNDED: DecodeLimits = DecodeLimits {
        max_string_len: usize::MAX,
        max_array_len: usize::MAX,
    };
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

macro_rules! serialize_scalar {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $put:ident) => {
        $(#[$doc])*
        #[inline]
        pub fn $name(&mut self, value: $ty) -> Result<()> {
            self.reserve(std::mem::size_of::<$ty>())?;
            self.rest.$put(value);
            Ok(())
        }
    };
}

macro_rules! deserialize_scalar {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $get:ident) => {
        $(#[$doc])*
        #[inline]
        pub fn $name(&mut self) -> Result<$ty> {
            self.require(std::mem::size_of::<$ty>())?;
            Ok(self.rest.$get())
        }
    };
}

/// Write cursor over a caller-owned buffer.
pub struct Serializer<'a> {
    rest: &'a mut [u8],
    capacity: usize,
}

impl<'a> Serializer<'a> {
    /// Create a serializer writing from the start of `buffer`.
    pub fn new(buffer: &'a mut [u8]) -> Self {
        let capacity = buffer.len();
        Self {
            rest: buffer,
            capacity,
        }
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn bytes_written(&self) -> usize {
        self.capacity - self.rest.remaining_mut()
    }

    /// Remaining capacity in bytes.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.rest.remaining_mut()
    }

    /// Consume the serializer, returning the number of bytes written.
    pub fn finish(self) -> usize {
        self.bytes_written()
    }

    #[inline]
    fn reserve(&self, needed: usize) -> Result<()> {
        let remaining = self.rest.remaining_mut();
        if remaining < needed {
            return Err(ProtocolError::BufferOverflow { needed, remaining });
        }
        Ok(())
    }

    /// Write a length prefix for a string byte count or an array element count.
    pub fn serialize_len(&mut self, len: usize) -> Result<()> {
        let prefix = i32::try_from(len).map_err(|_| ProtocolError::LengthOverflow(len))?;
        self.serialize_i32(prefix)
    }

    serialize_scalar!(serialize_i8, i8, put_i8);
    serialize_scalar!(serialize_u8, u8, put_u8);
    serialize_scalar!(serialize_i16, i16, put_i16_le);
    serialize_scalar!(serialize_u16, u16, put_u16_le);
    serialize_scalar!(serialize_i32, i32, put_i32_le);
    serialize_scalar!(serialize_u32, u32, put_u32_le);
    serialize_scalar!(serialize_i64, i64, put_i64_le);
    serialize_scalar!(serialize_u64, u64, put_u64_le);
    serialize_scalar!(serialize_f32, f32, put_f32_le);
    serialize_scalar!(serialize_f64, f64, put_f64_le);

    /// Write a bool as a single `0` or `1` byte.
    #[inline]
    pub fn serialize_bool(&mut self, value: bool) -> Result<()> {
        self.serialize_u8(u8::from(value))
    }

    /// Write a string as an i32 byte-length prefix followed by its UTF-8 bytes.
    ///
    /// Capacity for the prefix and the body is checked up front, so a failed call
    /// never leaves a dangling length prefix behind.
    pub fn serialize_string(&mut self, value: &str) -> Result<()> {
        let bytes = value.as_bytes();
        i32::try_from(bytes.len()).map_err(|_| ProtocolError::LengthOverflow(bytes.len()))?;
        self.reserve(LENGTH_PREFIX_SIZE + bytes.len())?;
        self.serialize_len(bytes.len())?;
        self.rest.put_slice(bytes);
        Ok(())
    }

    /// Write an array as an i32 element-count prefix followed by each element,
    /// encoded in order by `element`.
    ///
    /// The callback receives the element index, which allows nested arrays and
    /// arrays of strings to be composed from the same primitives.
    pub fn serialize_array<T, F>(&mut self, values: &[T], mut element: F) -> Result<()>
    where
        F: FnMut(&mut Self, usize, &T) -> Result<()>,
    {
        self.serialize_len(values.len())?;
        for (index, value) in values.iter().enumerate() {
            element(self, index, value)?;
        }
        Ok(())
    }
}

/// Read cursor over a delimited byte region.
pub struct Deserializer<'a> {
    rest: &'a [u8],
    limits: DecodeLimits,
}

impl<'a> Deserializer<'a> {
    /// Create an unbounded deserializer reading from the start of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::with_limits(bytes, DecodeLimits::UNBOUNDED)
    }

    /// Create a deserializer that rejects length prefixes above `limits`.
    pub fn with_limits(bytes: &'a [u8], limits: DecodeLimits) -> Self {
        Self { rest: bytes, limits }
    }

    /// Bytes left to read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.rest.remaining()
    }

    /// Whether every byte of the region has been consumed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    #[inline]
    fn require(&self, needed: usize) -> Result<()> {
        let remaining = self.rest.remaining();
        if remaining < needed {
            return Err(ProtocolError::BufferUnderflow { needed, remaining });
        }
        Ok(())
    }

    /// Read a length prefix, rejecting negative values and values above `max`.
    pub fn deserialize_len(&mut self, what: &'static str, max: usize) -> Result<usize> {
        let raw = self.deserialize_i32()?;
        let len = usize::try_from(raw).map_err(|_| ProtocolError::InvalidLength(raw))?;
        if len > max {
            return Err(ProtocolError::LimitExceeded { what, len, max });
        }
        Ok(len)
    }

    deserialize_scalar!(deserialize_i8, i8, get_i8);
    deserialize_scalar!(deserialize_u8, u8, get_u8);
    deserialize_scalar!(deserialize_i16, i16, get_i16_le);
    deserialize_scalar!(deserialize_u16, u16, get_u16_le);
    deserialize_scalar!(deserialize_i32, i32, get_i32_le);
    deserialize_scalar!(deserialize_u32, u32, get_u32_le);
    deserialize_scalar!(deserialize_i64, i64, get_i64_le);
    deserialize_scalar!(deserialize_u64, u64, get_u64_le);
    deserialize_scalar!(deserialize_f32, f32, get_f32_le);
    deserialize_scalar!(deserialize_f64, f64, get_f64_le);

    /// Read a bool. Only the byte `1` is `true`; every other value is `false`.
    #[inline]
    pub fn deserialize_bool(&mut self) -> Result<bool> {
        Ok(self.deserialize_u8()? == 1)
    }

    /// Borrow a length-prefixed string without copying.
    pub fn deserialize_str(&mut self) -> Result<&'a str> {
        let len = self.deserialize_len("string", self.limits.max_string_len)?;
        self.require(len)?;
        let (head, tail) = self.rest.split_at(len);
        let value = std::str::from_utf8(head)?;
        self.rest = tail;
        Ok(value)
    }

    /// Read a length-prefixed string.
    pub fn deserialize_string(&mut self) -> Result<String> {
        self.deserialize_str().map(str::to_owned)
    }

    /// Read an array by decoding `count` elements in order with `element`.
    ///
    /// Every encodable element occupies at least one byte, so the initial
    /// allocation is capped by the bytes remaining rather than the claimed count.
    pub fn deserialize_array<T, F>(&mut self, mut element: F) -> Result<Vec<T>>
    where
        F: FnMut(&mut Self, usize) -> Result<T>,
    {
        let count = self.deserialize_len("array", self.limits.max_array_len)?;
        let mut values = Vec::with_capacity(count.min(self.remaining()));
        for index in 0..count {
            values.push(element(self, index)?);
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializer_accounting() {
        let mut buffer = [0u8; 1024];
        let mut se = Serializer::new(&mut buffer);
        assert_eq!(se.bytes_written(), 0);

        se.serialize_array(&[0, 1, 2, 3], |se, _, v| se.serialize_i32(*v))
            .unwrap();
        assert_eq!(se.bytes_written(), 20);

        se.serialize_string("Hello, World!").unwrap();
        assert_eq!(se.bytes_written(), 37);

        se.serialize_i64(i64::MAX / 2).unwrap();
        se.serialize_u64(u64::MAX / 2).unwrap();
        assert_eq!(se.bytes_written(), 53);

        se.serialize_i32(i32::MAX / 2).unwrap();
        se.serialize_u32(u32::MAX / 2).unwrap();
        assert_eq!(se.bytes_written(), 61);

        se.serialize_i16(i16::MAX / 2).unwrap();
        se.serialize_u16(u16::MAX / 2).unwrap();
        assert_eq!(se.bytes_written(), 65);

        se.serialize_i8(i8::MAX / 2).unwrap();
        se.serialize_u8(u8::MAX / 2).unwrap();
        assert_eq!(se.bytes_written(), 67);

        se.serialize_bool(true).unwrap();
        assert_eq!(se.bytes_written(), 68);

        se.serialize_f32(0.1).unwrap();
        se.serialize_f64(0.0001).unwrap();
        assert_eq!(se.finish(), 80);
    }

    #[test]
    fn test_overflow_reports_capacity() {
        let mut buffer = [0u8; 3];
        let mut se = Serializer::new(&mut buffer);
        se.serialize_u16(7).unwrap();
        match se.serialize_u32(1) {
            Err(ProtocolError::BufferOverflow { needed, remaining }) => {
                assert_eq!(needed, 4);
                assert_eq!(remaining, 1);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_string_overflow_writes_nothing() {
        let mut buffer = [0u8; 6];
        let mut se = Serializer::new(&mut buffer);
        assert!(se.serialize_string("abc").is_err());
        assert_eq!(se.bytes_written(), 0);
    }

    #[test]
    fn test_bool_decodes_only_one_as_true() {
        let bytes = [0u8, 1, 2, 255];
        let mut de = Deserializer::new(&bytes);
        assert!(!de.deserialize_bool().unwrap());
        assert!(de.deserialize_bool().unwrap());
        assert!(!de.deserialize_bool().unwrap());
        assert!(!de.deserialize_bool().unwrap());
        assert!(de.is_empty());
    }

    #[test]
    fn test_negative_length_rejected() {
        let bytes = (-1i32).to_le_bytes();
        let mut de = Deserializer::new(&bytes);
        assert!(matches!(
            de.deserialize_string(),
            Err(ProtocolError::InvalidLength(-1))
        ));
    }

    #[test]
    fn test_invalid_utf8() {
        let bytes = [2, 0, 0, 0, 0xC3, 0x28];
        let mut de = Deserializer::new(&bytes);
        assert!(matches!(
            de.deserialize_string(),
            Err(ProtocolError::InvalidUtf8(_))
        ));
    }

    #[test]
    fn test_string_longer_than_region() {
        let bytes = [10, 0, 0, 0, b'a', b'b'];
        let mut de = Deserializer::new(&bytes);
        match de.deserialize_str() {
            Err(ProtocolError::BufferUnderflow { needed, remaining }) => {
                assert_eq!((needed, remaining), (10, 2));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_limits_applied() {
        let limits = DecodeLimits {
            max_string_len: 4,
            max_array_len: 2,
        };
        let string = [5, 0, 0, 0, b'h', b'e', b'l', b'l', b'o'];
        let mut de = Deserializer::with_limits(&string, limits);
        assert!(matches!(
            de.deserialize_string(),
            Err(ProtocolError::LimitExceeded { what: "string", len: 5, max: 4 })
        ));

        let array = [3, 0, 0, 0, 1, 2, 3];
        let mut de = Deserializer::with_limits(&array, limits);
        assert!(matches!(
            de.deserialize_array(|de, _| de.deserialize_u8()),
            Err(ProtocolError::LimitExceeded { what: "array", .. })
        ));
    }

    #[test]
    fn test_huge_count_does_not_preallocate() {
        let bytes = i32::MAX.to_le_bytes();
        let mut de = Deserializer::new(&bytes);
        assert!(matches!(
            de.deserialize_array(|de, _| de.deserialize_u8()),
            Err(ProtocolError::BufferUnderflow { .. })
        ));
    }

    #[test]
    fn test_nested_arrays() {
        let grid = vec![vec!["a".to_string()], vec![], vec!["b".into(), "cd".into()]];
        let mut buffer = [0u8; 128];
        let mut se = Serializer::new(&mut buffer);
        se.serialize_array(&grid, |se, _, row| {
            se.serialize_array(row, |se, _, s| se.serialize_string(s))
        })
        .unwrap();
        let written = se.finish();

        let mut de = Deserializer::new(&buffer[..written]);
        let decoded = de
            .deserialize_array(|de, _| de.deserialize_array(|de, _| de.deserialize_string()))
            .unwrap();
        assert_eq!(decoded, grid);
        assert!(de.is_empty());
    }
}
