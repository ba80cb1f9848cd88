//! Generated model descriptions.

use std::collections::BTreeMap;

use heck::{ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};

use crate::relation::Relation;

/// Rust keywords that need a raw identifier when used as a field name.
const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use",
    "where", "while", "abstract", "become", "box", "do", "final", "gen", "macro", "override",
    "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// Keywords that cannot be raw identifiers.
const RESERVED: &[&str] = &["self", "Self", "super", "crate"];

/// One field of a generated struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Rust field identifier (may be a raw identifier such as `r#type`).
    pub name: String,
    /// Backing column; `None` for synthesized relation fields.
    pub column_name: Option<String>,
    /// Rust type of the field.
    pub type_name: String,
    /// Serialization tags, e.g. `json` -> `createdAt`.
    pub tag: BTreeMap<String, String>,
    /// Relation metadata for synthesized fields.
    pub relation: Option<Relation>,
}

impl FieldDescriptor {
    /// Creates a column-backed field. The JSON tag is the lowerCamelCase
    /// column name.
    pub fn column(column: &str, type_name: impl Into<String>) -> Self {
        Self {
            name: field_ident(&column.to_snake_case()),
            column_name: Some(column.to_string()),
            type_name: type_name.into(),
            tag: BTreeMap::from([("json".to_string(), column.to_lower_camel_case())]),
            relation: None,
        }
    }

    /// Returns the JSON tag, if any.
    #[must_use]
    pub fn json_tag(&self) -> Option<&str> {
        self.tag.get("json").map(String::as_str)
    }

    /// Replaces the JSON tag.
    pub fn set_json_tag(&mut self, tag: impl Into<String>) {
        self.tag.insert("json".to_string(), tag.into());
    }

    /// Returns the field name without any `r#` prefix.
    #[must_use]
    pub fn bare_name(&self) -> &str {
        self.name.strip_prefix("r#").unwrap_or(&self.name)
    }
}

/// Kind of relation a model was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// Base table.
    Table,
    /// Plain view.
    View,
    /// PostgreSQL materialized view.
    MaterializedView,
}

/// A generated struct for one table or view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    /// Source table or view name.
    pub table_name: String,
    /// Struct name, e.g. `AllType` for `all_types`.
    pub struct_name: String,
    /// Output file stem; the emitter appends `.gen.rs`.
    pub file_name: String,
    /// Where the model was read from.
    pub kind: TableKind,
    /// Fields in column order, followed by relation fields.
    pub fields: Vec<FieldDescriptor>,
    /// The `CREATE TABLE` statement, when the catalog exposes one.
    pub create_sql: Option<String>,
}

impl Model {
    /// Creates an empty model for `table_name`.
    pub fn new(table_name: impl Into<String>, kind: TableKind) -> Self {
        let table_name = table_name.into();
        Self {
            struct_name: struct_name(&table_name),
            file_name: table_name.to_snake_case(),
            table_name,
            kind,
            fields: Vec::new(),
            create_sql: None,
        }
    }

    /// Returns the field backed by `column`.
    #[must_use]
    pub fn field_by_column(&self, column: &str) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|f| f.column_name.as_deref() == Some(column))
    }

    /// Returns the field named `name` (raw prefix ignored).
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.bare_name() == name)
    }
}

/// Struct name for a table: the singular form in UpperCamelCase.
#[must_use]
pub fn struct_name(table: &str) -> String {
    singularize(&table.to_snake_case()).to_upper_camel_case()
}

/// Escapes Rust keywords in a snake_case identifier.
#[must_use]
pub fn field_ident(name: &str) -> String {
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{name}")
    } else if RESERVED.contains(&name) {
        format!("{name}_")
    } else if KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
}

/// Simple singularization (drops 's', 'es' or 'ies').
fn singularize(name: &str) -> String {
    if let Some(stem) = name.strip_suffix("ies").filter(|s| !s.is_empty()) {
        format!("{stem}y")
    } else if ["sses", "xes", "ches", "shes"].iter().any(|s| name.ends_with(s)) {
        name[..name.len() - 2].to_string()
    } else if name.ends_with("ss") || name.ends_with("us") || name.ends_with("is") {
        name.to_string()
    } else if let Some(stem) = name.strip_suffix('s').filter(|s| !s.is_empty()) {
        stem.to_string()
    } else {
        name.to_string()
    }
}
