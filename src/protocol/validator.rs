//! # Schema Validation
//!
//! Checks an event group description once, before anything depending on it is
//! built or registered.
//!
//! ## Rules
//! - Every field type must resolve to the encodable set, recursively through
//!   enum underlying types (which must be integers) and array element types.
//! - A variant declared under another group, a variant without an ordered field
//!   list, or a repeated variant name is excluded with a warning. Its kind slot is
//!   kept so the kinds of its siblings do not shift.
//! - Unsupported field types and repeated field names are errors.
//!
//! Validation never stops at the first problem: every offending field of every
//! variant produces its own diagnostic, and the whole batch is returned at once.

use crate::core::kind::KindWidth;
use crate::error::{ProtocolError, Result};
use crate::protocol::schema::{FieldDesc, GroupDesc, TypeDesc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

/// Diagnostic catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// Variant declared under a different group
    IncorrectGroup,
    /// Variant has no ordered field list
    MissingFieldOrder,
    /// Field type is outside the encodable set
    UnsupportedType,
    /// Two variants share a name
    DuplicateVariant,
    /// Two fields of one variant share a name
    DuplicateField,
}

impl DiagnosticCode {
    /// Stable identifier for tooling output.
    pub fn id(self) -> &'static str {
        match self {
            DiagnosticCode::IncorrectGroup => "EW0202",
            DiagnosticCode::MissingFieldOrder => "EW0203",
            DiagnosticCode::UnsupportedType => "EW0204",
            DiagnosticCode::DuplicateVariant => "EW0205",
            DiagnosticCode::DuplicateField => "EW0206",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            DiagnosticCode::IncorrectGroup
            | DiagnosticCode::MissingFieldOrder
            | DiagnosticCode::DuplicateVariant => Severity::Warning,
            DiagnosticCode::UnsupportedType | DiagnosticCode::DuplicateField => Severity::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// The variant is excluded; siblings are unaffected
    Warning,
    /// The group cannot be built
    Error,
}

/// One problem found in a schema description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDiagnostic {
    pub code: DiagnosticCode,
    pub group: String,
    pub variant: Option<String>,
    pub field: Option<String>,
    pub message: String,
}

impl SchemaDiagnostic {
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for SchemaDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code.id(), self.group)?;
        if let Some(variant) = &self.variant {
            write!(f, "::{variant}")?;
        }
        if let Some(field) = &self.field {
            write!(f, ".{field}")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Return the innermost type that makes `ty` unencodable, if any.
pub fn find_unsupported(ty: &TypeDesc) -> Option<&TypeDesc> {
    match ty {
        TypeDesc::Enum { underlying, .. } => {
            if underlying.is_integer() {
                None
            } else {
                Some(underlying)
            }
        }
        TypeDesc::Array { element } => find_unsupported(element),
        TypeDesc::Named { .. } => Some(ty),
        _ => None,
    }
}

/// Whether `ty` resolves to the encodable set.
pub fn is_encodable(ty: &TypeDesc) -> bool {
    find_unsupported(ty).is_none()
}

/// A variant slot after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSlot {
    pub kind: u64,
    pub name: String,
    pub fields: Vec<FieldDesc>,
    /// `false` when the variant was excluded by a structural check
    pub registered: bool,
}

/// A validated event group: kind width, variant slots in declaration order, and
/// any warnings produced along the way.
#[derive(Debug, Clone)]
pub struct ValidatedGroup {
    name: String,
    width: KindWidth,
    slots: Vec<VariantSlot>,
    warnings: Vec<SchemaDiagnostic>,
}

impl ValidatedGroup {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> KindWidth {
        self.width
    }

    /// Number of declared variants, including excluded ones.
    pub fn variant_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[VariantSlot] {
        &self.slots
    }

    pub fn slot(&self, kind: u64) -> Option<&VariantSlot> {
        usize::try_from(kind).ok().and_then(|i| self.slots.get(i))
    }

    /// Whether `kind` names a variant that passed validation.
    pub fn is_registered(&self, kind: u64) -> bool {
        self.slot(kind).is_some_and(|slot| slot.registered)
    }

    pub fn kind_of(&self, variant: &str) -> Option<u64> {
        self.slots
            .iter()
            .find(|slot| slot.registered && slot.name == variant)
            .map(|slot| slot.kind)
    }

    pub fn warnings(&self) -> &[SchemaDiagnostic] {
        &self.warnings
    }
}

/// Validate a group description.
///
/// Returns [`ProtocolError::SchemaValidation`] carrying every diagnostic when at
/// least one error was found; otherwise the validated group with its warnings.
pub fn validate_group(desc: &GroupDesc) -> Result<ValidatedGroup> {
    let mut diagnostics = Vec::new();
    let mut slots = Vec::with_capacity(desc.variants.len());
    let mut seen_variants = HashSet::new();

    for (index, variant) in desc.variants.iter().enumerate() {
        let report = |code: DiagnosticCode, field: Option<&str>, message: String| {
            SchemaDiagnostic {
                code,
                group: desc.name.clone(),
                variant: Some(variant.name.clone()),
                field: field.map(str::to_owned),
                message,
            }
        };

        let mut slot = VariantSlot {
            kind: index as u64,
            name: variant.name.clone(),
            fields: Vec::new(),
            registered: false,
        };

        if !seen_variants.insert(variant.name.as_str()) {
            diagnostics.push(report(
                DiagnosticCode::DuplicateVariant,
                None,
                format!("variant `{}` is declared more than once", variant.name),
            ));
            slots.push(slot);
            continue;
        }

        if let Some(declared) = variant.group.as_deref() {
            if declared != desc.name {
                diagnostics.push(report(
                    DiagnosticCode::IncorrectGroup,
                    None,
                    format!(
                        "variant `{}` must belong to `{}` but is declared under `{declared}`",
                        variant.name, desc.name
                    ),
                ));
                slots.push(slot);
                continue;
            }
        }

        let Some(fields) = &variant.fields else {
            diagnostics.push(report(
                DiagnosticCode::MissingFieldOrder,
                None,
                format!("variant `{}` does not declare an ordered field list", variant.name),
            ));
            slots.push(slot);
            continue;
        };

        let mut seen_fields = HashSet::new();
        for field in fields {
            if !seen_fields.insert(field.name.as_str()) {
                diagnostics.push(report(
                    DiagnosticCode::DuplicateField,
                    Some(&field.name),
                    format!("field `{}` is declared more than once", field.name),
                ));
            }
            if let Some(offending) = find_unsupported(&field.ty) {
                diagnostics.push(report(
                    DiagnosticCode::UnsupportedType,
                    Some(&field.name),
                    format!("type `{offending}` cannot be serialized or deserialized"),
                ));
            }
        }

        slot.fields = fields.clone();
        slot.registered = true;
        slots.push(slot);
    }

    if diagnostics
        .iter()
        .any(|d| d.severity() == Severity::Error)
    {
        return Err(ProtocolError::SchemaValidation(diagnostics));
    }

    for warning in &diagnostics {
        warn!(code = warning.code.id(), "{warning}");
    }

    let width = KindWidth::for_variant_count(slots.len());
    debug!(
        group = %desc.name,
        variants = slots.len(),
        width = %width,
        "Validated event group schema"
    );

    Ok(ValidatedGroup {
        name: desc.name.clone(),
        width,
        slots,
        warnings: diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::schema::VariantDesc;

    fn diagnostics_of(desc: &GroupDesc) -> Vec<SchemaDiagnostic> {
        match validate_group(desc) {
            Err(ProtocolError::SchemaValidation(diagnostics)) => diagnostics,
            other => panic!("expected schema errors, got {other:?}"),
        }
    }

    #[test]
    fn test_encodable_set() {
        assert!(is_encodable(&TypeDesc::F64));
        assert!(is_encodable(&TypeDesc::array(TypeDesc::array(TypeDesc::String))));
        assert!(is_encodable(&TypeDesc::enumeration("Reason", TypeDesc::U8)));
        assert!(!is_encodable(&TypeDesc::named("char")));
        assert!(!is_encodable(&TypeDesc::enumeration("Weird", TypeDesc::F32)));
        assert!(!is_encodable(&TypeDesc::array(TypeDesc::array(TypeDesc::named(
            "Vector3"
        )))));
    }

    #[test]
    fn test_collects_every_invalid_field() {
        let desc = GroupDesc::new("Broken")
            .variant(VariantDesc::new("A").field("a", TypeDesc::named("char")))
            .variant(
                VariantDesc::new("B")
                    .field("ok", TypeDesc::I32)
                    .field("b", TypeDesc::array(TypeDesc::named("Vector3"))),
            )
            .variant(
                VariantDesc::new("C").field("c", TypeDesc::enumeration("E", TypeDesc::String)),
            );

        let diagnostics = diagnostics_of(&desc);
        assert_eq!(diagnostics.len(), 3);
        assert!(diagnostics
            .iter()
            .all(|d| d.code == DiagnosticCode::UnsupportedType));
        let fields: Vec<_> = diagnostics
            .iter()
            .map(|d| d.field.as_deref().unwrap())
            .collect();
        assert_eq!(fields, ["a", "b", "c"]);
        assert!(diagnostics[1].message.contains("Vector3"));
    }

    #[test]
    fn test_structural_failures_exclude_only_that_variant() {
        let desc = GroupDesc::new("Vote")
            .variant(VariantDesc::new("Begin").field("maps", TypeDesc::array(TypeDesc::String)))
            .variant(VariantDesc::new("Stray").under("Chat"))
            .variant(VariantDesc::unordered("Loose"))
            .variant(VariantDesc::new("End").field("passed", TypeDesc::Bool));

        let group = validate_group(&desc).unwrap();
        assert_eq!(group.variant_count(), 4);
        assert!(group.is_registered(0));
        assert!(!group.is_registered(1));
        assert!(!group.is_registered(2));
        assert!(group.is_registered(3));
        assert_eq!(group.kind_of("End"), Some(3));
        assert_eq!(group.kind_of("Stray"), None);

        let codes: Vec<_> = group.warnings().iter().map(|d| d.code).collect();
        assert_eq!(
            codes,
            [DiagnosticCode::IncorrectGroup, DiagnosticCode::MissingFieldOrder]
        );
    }

    #[test]
    fn test_warnings_reported_alongside_errors() {
        let desc = GroupDesc::new("Mixed")
            .variant(VariantDesc::unordered("Loose"))
            .variant(
                VariantDesc::new("Bad")
                    .field("x", TypeDesc::I8)
                    .field("x", TypeDesc::named("Guid")),
            );

        let diagnostics = diagnostics_of(&desc);
        let codes: Vec<_> = diagnostics.iter().map(|d| d.code).collect();
        assert_eq!(
            codes,
            [
                DiagnosticCode::MissingFieldOrder,
                DiagnosticCode::DuplicateField,
                DiagnosticCode::UnsupportedType,
            ]
        );
    }

    #[test]
    fn test_duplicate_variant_keeps_first() {
        let desc = GroupDesc::new("Dup")
            .variant(VariantDesc::new("Same"))
            .variant(VariantDesc::new("Same"));
        let group = validate_group(&desc).unwrap();
        assert_eq!(group.kind_of("Same"), Some(0));
        assert!(!group.is_registered(1));
        assert_eq!(group.warnings()[0].code, DiagnosticCode::DuplicateVariant);
    }

    #[test]
    fn test_width_counts_excluded_slots() {
        let mut desc = GroupDesc::new("Wide");
        for i in 0..256 {
            desc = desc.variant(VariantDesc::new(format!("V{i}")));
        }
        assert_eq!(validate_group(&desc).unwrap().width(), KindWidth::U16);

        desc.variants.pop();
        assert_eq!(validate_group(&desc).unwrap().width(), KindWidth::U8);
    }

    #[test]
    fn test_diagnostic_display() {
        let diagnostic = SchemaDiagnostic {
            code: DiagnosticCode::UnsupportedType,
            group: "Vote".into(),
            variant: Some("Begin".into()),
            field: Some("maps".into()),
            message: "type `char` cannot be serialized or deserialized".into(),
        };
        assert_eq!(
            diagnostic.to_string(),
            "EW0204 Vote::Begin.maps: type `char` cannot be serialized or deserialized"
        );
    }
}
