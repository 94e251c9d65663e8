//! # Encodable Values
//!
//! The closed set of types that can appear in an event field:
//! `bool`, `i8`..`u64`, `f32`, `f64`, `String`, integer-backed enums declared
//! with [`wire_enum!`](crate::wire_enum), and `Vec<T>` of any of these
//! (including nested vectors).
//!
//! Every member implements three traits:
//! - [`Encode`] writes the value through a [`Serializer`] and reports its exact size
//! - [`Decode`] reads it back through a [`Deserializer`]
//! - [`Describe`] produces the [`TypeDesc`] the schema validator checks

use crate::core::codec::{Deserializer, Serializer, LENGTH_PREFIX_SIZE};
use crate::error::Result;
use crate::protocol::schema::TypeDesc;

/// A value that can be written to the wire.
pub trait Encode {
    /// Write the value at the serializer's cursor.
    fn encode(&self, se: &mut Serializer<'_>) -> Result<()>;

    /// Exact number of bytes `encode` will write.
    fn encoded_len(&self) -> usize;
}

/// A value that can be read from the wire.
pub trait Decode: Sized {
    /// Read the value at the deserializer's cursor.
    fn decode(de: &mut Deserializer<'_>) -> Result<Self>;
}

/// A type with a schema description.
pub trait Describe {
    /// Describe the type for schema validation.
    fn describe() -> TypeDesc;
}

macro_rules! scalar_wire {
    ($ty:ty, $ser:ident, $de:ident, $desc:ident) => {
        impl Encode for $ty {
            #[inline]
            fn encode(&self, se: &mut Serializer<'_>) -> Result<()> {
                se.$ser(*self)
            }

            #[inline]
            fn encoded_len(&self) -> usize {
                std::mem::size_of::<$ty>()
            }
        }

        impl Decode for $ty {
            #[inline]
            fn decode(de: &mut Deserializer<'_>) -> Result<Self> {
                de.$de()
            }
        }

        impl Describe for $ty {
            fn describe() -> TypeDesc {
                TypeDesc::$desc
            }
        }
    };
}

scalar_wire!(bool, serialize_bool, deserialize_bool, Bool);
scalar_wire!(i8, serialize_i8, deserialize_i8, I8);
scalar_wire!(u8, serialize_u8, deserialize_u8, U8);
scalar_wire!(i16, serialize_i16, deserialize_i16, I16);
scalar_wire!(u16, serialize_u16, deserialize_u16, U16);
scalar_wire!(i32, serialize_i32, deserialize_i32, I32);
scalar_wire!(u32, serialize_u32, deserialize_u32, U32);
scalar_wire!(i64, serialize_i64, deserialize_i64, I64);
scalar_wire!(u64, serialize_u64, deserialize_u64, U64);
scalar_wire!(f32, serialize_f32, deserialize_f32, F32);
scalar_wire!(f64, serialize_f64, deserialize_f64, F64);

impl Encode for str {
    fn encode(&self, se: &mut Serializer<'_>) -> Result<()> {
        se.serialize_string(self)
    }

    fn encoded_len(&self) -> usize {
        LENGTH_PREFIX_SIZE + self.len()
    }
}

impl Encode for String {
    fn encode(&self, se: &mut Serializer<'_>) -> Result<()> {
        se.serialize_string(self)
    }

    fn encoded_len(&self) -> usize {
        LENGTH_PREFIX_SIZE + self.len()
    }
}

impl Decode for String {
    fn decode(de: &mut Deserializer<'_>) -> Result<Self> {
        de.deserialize_string()
    }
}

impl Describe for String {
    fn describe() -> TypeDesc {
        TypeDesc::String
    }
}

impl<T: Encode> Encode for [T] {
    fn encode(&self, se: &mut Serializer<'_>) -> Result<()> {
        se.serialize_array(self, |se, _, value| value.encode(se))
    }

    fn encoded_len(&self) -> usize {
        LENGTH_PREFIX_SIZE + self.iter().map(T::encoded_len).sum::<usize>()
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, se: &mut Serializer<'_>) -> Result<()> {
        self.as_slice().encode(se)
    }

    fn encoded_len(&self) -> usize {
        self.as_slice().encoded_len()
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(de: &mut Deserializer<'_>) -> Result<Self> {
        de.deserialize_array(|de, _| T::decode(de))
    }
}

impl<T: Describe> Describe for Vec<T> {
    fn describe() -> TypeDesc {
        TypeDesc::array(T::describe())
    }
}

/// Declare a fieldless enum backed by an integer type that can be used as an
/// event field.
///
/// The enum travels as its underlying integer. Decoding a value that matches no
/// variant fails with [`ProtocolError::InvalidEnumValue`](crate::error::ProtocolError::InvalidEnumValue).
///
/// ```rust
/// eventwire::wire_enum! {
///     pub enum KickReason: u8 {
///         None = 0,
///         Cheating = 1,
///         Idle = 2,
///     }
/// }
///
/// assert_eq!(KickReason::Idle as u8, 2);
/// ```
#[macro_export]
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $repr:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr($repr)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant = $value, )+
        }

        impl $crate::core::wire::Encode for $name {
            #[inline]
            fn encode(
                &self,
                se: &mut $crate::core::codec::Serializer<'_>,
            ) -> $crate::error::Result<()> {
                $crate::core::wire::Encode::encode(&(*self as $repr), se)
            }

            #[inline]
            fn encoded_len(&self) -> usize {
                ::std::mem::size_of::<$repr>()
            }
        }

        impl $crate::core::wire::Decode for $name {
            fn decode(
                de: &mut $crate::core::codec::Deserializer<'_>,
            ) -> $crate::error::Result<Self> {
                let raw = <$repr as $crate::core::wire::Decode>::decode(de)?;
                $(
                    if raw == $name::$variant as $repr {
                        return Ok($name::$variant);
                    }
                )+
                Err($crate::error::ProtocolError::InvalidEnumValue {
                    name: stringify!($name),
                    value: raw as i128,
                })
            }
        }

        impl $crate::core::wire::Describe for $name {
            fn describe() -> $crate::protocol::schema::TypeDesc {
                $crate::protocol::schema::TypeDesc::enumeration(
                    stringify!($name),
                    <$repr as $crate::core::wire::Describe>::describe(),
                )
            }
        }
    };
}
