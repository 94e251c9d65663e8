//! # Schema Descriptions
//!
//! Abstract, fully-resolved descriptions of event groups: a group name, an ordered
//! list of variants, and for each variant an ordered list of named, typed fields.
//!
//! Descriptions are produced by the [`event_group!`](crate::event_group) macro for
//! Rust types, written by hand, or loaded from TOML:
//!
//! ```toml
//! name = "VoteEvent"
//!
//! [[variants]]
//! name = "BeginMapVote"
//! fields = [{ name = "maps", type = { kind = "array", element = { kind = "string" } } }]
//!
//! [[variants]]
//! name = "EndVote"
//! fields = [
//!     { name = "message", type = { kind = "string" } },
//!     { name = "passed", type = { kind = "bool" } },
//! ]
//! ```
//!
//! A description may contain types outside the encodable set; rejecting those is
//! the validator's job, not the parser's.

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of a single field as declared by the schema author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDesc {
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    String,
    /// Enumeration travelling as its underlying type
    Enum {
        name: String,
        underlying: Box<TypeDesc>,
    },
    /// Homogeneous, length-prefixed array
    Array { element: Box<TypeDesc> },
    /// Any other named type (structs, `char`, decimals, ...)
    Named { name: String },
}

impl TypeDesc {
    pub fn array(element: TypeDesc) -> Self {
        TypeDesc::Array {
            element: Box::new(element),
        }
    }

    pub fn enumeration(name: impl Into<String>, underlying: TypeDesc) -> Self {
        TypeDesc::Enum {
            name: name.into(),
            underlying: Box::new(underlying),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        TypeDesc::Named { name: name.into() }
    }

    /// Whether this is one of the eight fixed-width integer types.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            TypeDesc::I8
                | TypeDesc::U8
                | TypeDesc::I16
                | TypeDesc::U16
                | TypeDesc::I32
                | TypeDesc::U32
                | TypeDesc::I64
                | TypeDesc::U64
        )
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Bool => f.write_str("bool"),
            TypeDesc::I8 => f.write_str("i8"),
            TypeDesc::U8 => f.write_str("u8"),
            TypeDesc::I16 => f.write_str("i16"),
            TypeDesc::U16 => f.write_str("u16"),
            TypeDesc::I32 => f.write_str("i32"),
            TypeDesc::U32 => f.write_str("u32"),
            TypeDesc::I64 => f.write_str("i64"),
            TypeDesc::U64 => f.write_str("u64"),
            TypeDesc::F32 => f.write_str("f32"),
            TypeDesc::F64 => f.write_str("f64"),
            TypeDesc::String => f.write_str("string"),
            TypeDesc::Enum { name, underlying } => write!(f, "{name}: {underlying}"),
            TypeDesc::Array { element } => write!(f, "[{element}]"),
            TypeDesc::Named { name } => f.write_str(name),
        }
    }
}

/// One named field of a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDesc {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDesc,
}

impl FieldDesc {
    pub fn new(name: impl Into<String>, ty: TypeDesc) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// One variant of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantDesc {
    pub name: String,
    /// Group the variant was declared under; `None` means the enclosing group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Ordered field list; `None` when the variant declares no field order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldDesc>>,
}

impl VariantDesc {
    /// A variant with an empty, ordered field list.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: None,
            fields: Some(Vec::new()),
        }
    }

    /// A variant without an ordered field list.
    pub fn unordered(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: None,
            fields: None,
        }
    }

    /// Append a field, creating the field list if needed.
    pub fn field(mut self, name: impl Into<String>, ty: TypeDesc) -> Self {
        self.fields
            .get_or_insert_with(Vec::new)
            .push(FieldDesc::new(name, ty));
        self
    }

    /// Mark the variant as declared under `group`.
    pub fn under(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// A closed set of variants sharing one discriminant space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDesc {
    pub name: String,
    #[serde(default)]
    pub variants: Vec<VariantDesc>,
}

impl GroupDesc {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variants: Vec::new(),
        }
    }

    pub fn variant(mut self, variant: VariantDesc) -> Self {
        self.variants.push(variant);
        self
    }

    /// Parse a group description from TOML.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse schema TOML: {e}")))
    }

    /// Render the description as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to serialize schema: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOTE_SCHEMA: &str = r#"
name = "VoteEvent"

[[variants]]
name = "BeginMapVote"
fields = [{ name = "maps", type = { kind = "array", element = { kind = "string" } } }]

[[variants]]
name = "BeginKickVote"
fields = [
    { name = "player", type = { kind = "string" } },
    { name = "reason", type = { kind = "enum", name = "KickReason", underlying = { kind = "u8" } } },
]

[[variants]]
name = "Stray"
group = "OtherEvent"
fields = []

[[variants]]
name = "NoOrder"
"#;

    #[test]
    fn test_parse_toml_description() {
        let group = GroupDesc::from_toml(VOTE_SCHEMA).unwrap();
        assert_eq!(group.name, "VoteEvent");
        assert_eq!(group.variants.len(), 4);

        let expected = VariantDesc::new("BeginKickVote")
            .field("player", TypeDesc::String)
            .field("reason", TypeDesc::enumeration("KickReason", TypeDesc::U8));
        assert_eq!(group.variants[1], expected);

        assert_eq!(group.variants[2].group.as_deref(), Some("OtherEvent"));
        assert_eq!(group.variants[2].fields, Some(Vec::new()));
        assert_eq!(group.variants[3].fields, None);
    }

    #[test]
    fn test_toml_roundtrip() {
        let group = GroupDesc::new("Chat")
            .variant(VariantDesc::new("Say").field("text", TypeDesc::String))
            .variant(VariantDesc::new("Typing"));
        let rendered = group.to_toml().unwrap();
        assert_eq!(GroupDesc::from_toml(&rendered).unwrap(), group);
    }

    #[test]
    fn test_display() {
        let ty = TypeDesc::array(TypeDesc::enumeration("Team", TypeDesc::I16));
        assert_eq!(ty.to_string(), "[Team: i16]");
        assert_eq!(TypeDesc::named("char").to_string(), "char");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        assert!(matches!(
            GroupDesc::from_toml("name = 5"),
            Err(ProtocolError::ConfigError(_))
        ));
    }
}
