//! Synthesized relation fields.
//!
//! Relation fields have no backing column. They are declared per table in
//! the configuration and appended to the generated struct, for example a
//! `children: Vec<Child>` field on a parent model.

use std::collections::BTreeMap;

use heck::{ToLowerCamelCase, ToSnakeCase};
use serde::Deserialize;

use crate::model::{field_ident, FieldDescriptor};

/// One configured relation field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExtraFieldSpec {
    /// Property name, e.g. `Children`.
    pub property_name: String,
    /// Full path of the related type, e.g. `models.Child` or `crate::models::Child`.
    pub property_type: String,
    /// Property holding the foreign key, e.g. `AllTypesID`.
    #[serde(default)]
    pub fk_property_name: String,
    /// Property on the referenced model, e.g. `ID`.
    #[serde(default)]
    pub ref_property_name: String,
    /// One-to-many when set, otherwise one-to-one.
    #[serde(default)]
    pub has_many: bool,
    /// Hold a single related record behind an optional box.
    #[serde(default)]
    pub pointer: bool,
}

/// Cardinality of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// One related record.
    HasOne,
    /// Many related records.
    HasMany,
}

/// Relation metadata carried by a synthesized field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// Cardinality.
    pub kind: RelationKind,
    /// Related type exactly as configured.
    pub target_type: String,
    /// Foreign key property name.
    pub foreign_key: String,
    /// Referenced property name.
    pub reference_key: String,
}

/// Returns the last path segment of a type path (`a::b::C` or `pkg.C`).
fn base_type(path: &str) -> &str {
    let after_colons = path.rsplit("::").next().unwrap_or(path);
    after_colons.rsplit('.').next().unwrap_or(after_colons)
}

/// Builds the field descriptor for a configured relation.
///
/// A `has_many` relation is always `Vec<T>`; `pointer` only applies to
/// single relations.
#[must_use]
pub fn synthesize(spec: &ExtraFieldSpec) -> FieldDescriptor {
    let base = base_type(&spec.property_type);
    let type_name = if spec.has_many {
        format!("Vec<{base}>")
    } else if spec.pointer {
        format!("Option<Box<{base}>>")
    } else {
        base.to_string()
    };

    let kind = if spec.has_many {
        RelationKind::HasMany
    } else {
        RelationKind::HasOne
    };

    FieldDescriptor {
        name: field_ident(&spec.property_name.to_snake_case()),
        column_name: None,
        type_name,
        tag: BTreeMap::from([("json".to_string(), spec.property_name.to_lower_camel_case())]),
        relation: Some(Relation {
            kind,
            target_type: spec.property_type.clone(),
            foreign_key: spec.fk_property_name.clone(),
            reference_key: spec.ref_property_name.clone(),
        }),
    }
}
