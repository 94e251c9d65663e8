//! # Event Groups
//!
//! An event group is a closed set of variants sharing one discriminant space.
//! On the wire a group message is:
//!
//! ```text
//! [kind: u8|u16|u32|u64 LE] [variant fields in declared order]
//! ```
//!
//! The group identifier is never embedded; it travels out of band.
//!
//! Groups are usually declared with [`event_group!`](crate::event_group), which
//! generates one struct per variant, the group enum, the field codecs, and the
//! schema description. [`GroupCodec`] validates that description once and then
//! serializes and deserializes group values.
//!
//! ```rust
//! use eventwire::event_group;
//! use eventwire::protocol::event_group::GroupCodec;
//!
//! event_group! {
//!     pub enum ChatEvent {
//!         Say { text: String },
//!         Typing { active: bool },
//!     }
//! }
//!
//! let codec = GroupCodec::<ChatEvent>::new().unwrap();
//! let bytes = codec.to_vec(&Say { text: "Hi".into() }.into()).unwrap();
//! assert_eq!(bytes, [0, 2, 0, 0, 0, b'H', b'i']);
//! assert_eq!(codec.from_bytes(&bytes).unwrap(), ChatEvent::Say(Say { text: "Hi".into() }));
//! ```

use crate::core::codec::{DecodeLimits, Deserializer, Serializer};
use crate::core::kind::KindWidth;
use crate::core::wire::{Decode, Encode};
use crate::error::{ProtocolError, Result};
use crate::protocol::schema::{FieldDesc, GroupDesc};
use crate::protocol::validator::{validate_group, ValidatedGroup};
use std::marker::PhantomData;
use std::sync::Arc;

/// A closed set of variants with field-by-field codecs.
///
/// `kind` must return the declaration index of the value's variant, and
/// `decode_fields` must read fields in exactly the order `encode_fields` wrote them.
pub trait EventGroup: Sized + Send + Sync + 'static {
    /// Group name, as used in schema descriptions and configuration.
    const NAME: &'static str;

    /// Schema description of every declared variant.
    fn schema() -> GroupDesc;

    /// Kind of this value's variant.
    fn kind(&self) -> u64;

    /// Write the variant's fields in declared order.
    fn encode_fields(&self, se: &mut Serializer<'_>) -> Result<()>;

    /// Exact size of the variant's fields on the wire.
    fn fields_len(&self) -> usize;

    /// Read the fields of variant `kind` in declared order.
    ///
    /// Returns [`ProtocolError::UnknownVariant`] when `kind` matches no variant.
    fn decode_fields(kind: u64, de: &mut Deserializer<'_>) -> Result<Self>;
}

/// One concrete message shape within an event group.
pub trait Variant: Encode + Decode + Sized + Send + Sync + 'static {
    type Group: EventGroup;

    const NAME: &'static str;

    /// Declaration index within the group.
    const KIND: u64;

    /// Ordered field descriptions.
    fn fields() -> Vec<FieldDesc>;

    fn from_group(group: &Self::Group) -> Option<&Self>;

    fn into_group(self) -> Self::Group;
}

/// Validated serializer/deserializer for one event group.
///
/// Construction validates the group's schema; a group with unsupported field
/// types never yields a codec. Cloning is cheap.
pub struct GroupCodec<G> {
    schema: Arc<ValidatedGroup>,
    _group: PhantomData<fn() -> G>,
}

impl<G> Clone for GroupCodec<G> {
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            _group: PhantomData,
        }
    }
}

impl<G: EventGroup> GroupCodec<G> {
    /// Validate `G`'s schema and build a codec for it.
    pub fn new() -> Result<Self> {
        Self::validated(&G::schema())
    }

    /// Build a codec against an explicit description of `G`.
    ///
    /// The description must name `G` and list as many variants as `G` declares;
    /// anything else is a [`ProtocolError::ConfigError`], since it would change
    /// the kind width. Variants excluded by the validator keep their kind but can
    /// be neither encoded nor decoded through this codec.
    pub fn from_schema(desc: &GroupDesc) -> Result<Self> {
        if desc.name != G::NAME {
            return Err(ProtocolError::ConfigError(format!(
                "Schema describes group '{}', expected '{}'",
                desc.name,
                G::NAME
            )));
        }
        let declared = G::schema().variants.len();
        if desc.variants.len() != declared {
            return Err(ProtocolError::ConfigError(format!(
                "Schema for {} lists {} variants, the group declares {declared}",
                G::NAME,
                desc.variants.len()
            )));
        }
        Self::validated(desc)
    }

    fn validated(desc: &GroupDesc) -> Result<Self> {
        let schema = validate_group(desc)?;
        Ok(Self {
            schema: Arc::new(schema),
            _group: PhantomData,
        })
    }

    pub fn schema(&self) -> &ValidatedGroup {
        &self.schema
    }

    pub fn width(&self) -> KindWidth {
        self.schema.width()
    }

    /// Exact encoded size of `value`, including the kind.
    pub fn encoded_len(&self, value: &G) -> usize {
        self.width().byte_len() + value.fields_len()
    }

    /// Write the kind followed by the variant's fields.
    pub fn serialize(&self, value: &G, se: &mut Serializer<'_>) -> Result<()> {
        let kind = value.kind();
        if !self.schema.is_registered(kind) {
            return Err(ProtocolError::KindOutOfRange {
                group: G::NAME,
                kind,
                variants: self.schema.variant_count(),
            });
        }
        self.width().write(se, kind)?;
        value.encode_fields(se)
    }

    /// Serialize into `buffer`, returning the number of bytes written.
    pub fn serialize_into(&self, value: &G, buffer: &mut [u8]) -> Result<usize> {
        let mut se = Serializer::new(buffer);
        self.serialize(value, &mut se)?;
        Ok(se.finish())
    }

    /// Serialize into a freshly allocated buffer of exactly the encoded size.
    pub fn to_vec(&self, value: &G) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; self.encoded_len(value)];
        let written = self.serialize_into(value, &mut buffer)?;
        buffer.truncate(written);
        Ok(buffer)
    }

    /// Decode the fields of variant `kind`, the kind having already been read.
    pub fn deserialize_kind(&self, kind: u64, de: &mut Deserializer<'_>) -> Result<G> {
        if !self.schema.is_registered(kind) {
            return Err(ProtocolError::UnknownVariant {
                group: G::NAME,
                kind,
            });
        }
        G::decode_fields(kind, de)
    }

    /// Read the kind, then the matching variant's fields.
    pub fn deserialize(&self, de: &mut Deserializer<'_>) -> Result<G> {
        let kind = self.width().read(de)?;
        self.deserialize_kind(kind, de)
    }

    /// Decode one message from a delimited byte region.
    pub fn from_bytes(&self, bytes: &[u8]) -> Result<G> {
        self.from_bytes_with_limits(bytes, DecodeLimits::UNBOUNDED)
    }

    pub fn from_bytes_with_limits(&self, bytes: &[u8], limits: DecodeLimits) -> Result<G> {
        let mut de = Deserializer::with_limits(bytes, limits);
        self.deserialize(&mut de)
    }
}

/// Declare an event group.
///
/// For every variant this generates a struct with public fields, its
/// [`Encode`]/[`Decode`] implementations (fields in declared order), a
/// [`Variant`] implementation with the variant's declaration index as its kind,
/// and a `From` conversion into the group. The group itself becomes an enum with
/// one tuple variant per struct and implements [`EventGroup`].
///
/// Field types must implement [`Encode`], [`Decode`] and
/// [`Describe`](crate::core::wire::Describe).
///
/// ```rust
/// eventwire::wire_enum! {
///     pub enum KickReason: u8 { None = 0, Cheating = 1, Idle = 2 }
/// }
///
/// eventwire::event_group! {
///     /// Voting lifecycle.
///     pub enum VoteEvent {
///         BeginMapVote { maps: Vec<String> },
///         BeginKickVote { player: String, reason: KickReason },
///         ClearVoting {},
///     }
/// }
///
/// use eventwire::protocol::event_group::{EventGroup, Variant};
/// assert_eq!(BeginKickVote::KIND, 1);
/// assert_eq!(VoteEvent::from(ClearVoting {}).kind(), 2);
/// ```
#[macro_export]
macro_rules! event_group {
    (
        $(#[$meta:meta])*
        $vis:vis enum $group:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident {
                    $( $(#[$fmeta:meta])* $field:ident : $fty:ty ),* $(,)?
                }
            ),+ $(,)?
        }
    ) => {
        $(
            $(#[$vmeta])*
            #[derive(Debug, Clone, PartialEq)]
            $vis struct $variant {
                $( $(#[$fmeta])* pub $field: $fty, )*
            }

            impl $crate::core::wire::Encode for $variant {
                fn encode(
                    &self,
                    se: &mut $crate::core::codec::Serializer<'_>,
                ) -> $crate::error::Result<()> {
                    $( $crate::core::wire::Encode::encode(&self.$field, se)?; )*
                    let _ = se;
                    Ok(())
                }

                fn encoded_len(&self) -> usize {
                    0 $( + $crate::core::wire::Encode::encoded_len(&self.$field) )*
                }
            }

            impl $crate::core::wire::Decode for $variant {
                fn decode(
                    de: &mut $crate::core::codec::Deserializer<'_>,
                ) -> $crate::error::Result<Self> {
                    let _ = &de;
                    Ok(Self {
                        $( $field: <$fty as $crate::core::wire::Decode>::decode(de)?, )*
                    })
                }
            }

            impl ::std::convert::From<$variant> for $group {
                fn from(value: $variant) -> Self {
                    $group::$variant(value)
                }
            }
        )+

        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis enum $group {
            $( $variant($variant), )+
        }

        impl $crate::protocol::event_group::EventGroup for $group {
            const NAME: &'static str = stringify!($group);

            fn schema() -> $crate::protocol::schema::GroupDesc {
                $crate::protocol::schema::GroupDesc {
                    name: stringify!($group).to_string(),
                    variants: vec![
                        $(
                            $crate::protocol::schema::VariantDesc {
                                name: stringify!($variant).to_string(),
                                group: Some(stringify!($group).to_string()),
                                fields: Some(
                                    <$variant as $crate::protocol::event_group::Variant>::fields(),
                                ),
                            },
                        )+
                    ],
                }
            }

            fn kind(&self) -> u64 {
                match self {
                    $(
                        $group::$variant(_) => {
                            <$variant as $crate::protocol::event_group::Variant>::KIND
                        }
                    )+
                }
            }

            fn encode_fields(
                &self,
                se: &mut $crate::core::codec::Serializer<'_>,
            ) -> $crate::error::Result<()> {
                match self {
                    $( $group::$variant(value) => $crate::core::wire::Encode::encode(value, se), )+
                }
            }

            fn fields_len(&self) -> usize {
                match self {
                    $( $group::$variant(value) => $crate::core::wire::Encode::encoded_len(value), )+
                }
            }

            fn decode_fields(
                kind: u64,
                de: &mut $crate::core::codec::Deserializer<'_>,
            ) -> $crate::error::Result<Self> {
                $(
                    if kind == <$variant as $crate::protocol::event_group::Variant>::KIND {
                        return <$variant as $crate::core::wire::Decode>::decode(de)
                            .map($group::$variant);
                    }
                )+
                Err($crate::error::ProtocolError::UnknownVariant {
                    group: stringify!($group),
                    kind,
                })
            }
        }

        // Kinds come from a fieldless mirror of the variant list, so groups of
        // any size expand without recursion.
        const _: () = {
            #[allow(dead_code, non_camel_case_types)]
            enum __Kind {
                $( $variant, )+
            }

            $(
                impl $crate::protocol::event_group::Variant for $variant {
                    type Group = $group;

                    const NAME: &'static str = stringify!($variant);

                    const KIND: u64 = __Kind::$variant as u64;

                    fn fields() -> ::std::vec::Vec<$crate::protocol::schema::FieldDesc> {
                        vec![
                            $(
                                $crate::protocol::schema::FieldDesc::new(
                                    stringify!($field),
                                    <$fty as $crate::core::wire::Describe>::describe(),
                                ),
                            )*
                        ]
                    }

                    #[allow(unreachable_patterns)]
                    fn from_group(group: &$group) -> ::std::option::Option<&Self> {
                        match group {
                            $group::$variant(value) => Some(value),
                            _ => None,
                        }
                    }

                    fn into_group(self) -> $group {
                        $group::$variant(self)
                    }
                }
            )+
        };
    };
}
