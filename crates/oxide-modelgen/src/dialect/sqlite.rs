//! SQLite type vocabulary.

use super::{apply_nullability, ColumnDescriptor, Dialect, Resolver, TypeMapTable, TypeMapper};
use crate::error::{GenError, Result};

const VOCABULARY: &[(&str, &str)] = &[
    ("BOOLEAN", "bool"),
    ("BOOL", "bool"),
    ("TINYINT", "i8"),
    ("SMALLINT", "i16"),
    ("INT2", "i16"),
    ("MEDIUMINT", "i32"),
    ("INTEGER", "i64"),
    ("INT", "i64"),
    ("INT8", "i64"),
    ("BIGINT", "i64"),
    ("UNSIGNED BIG INT", "u64"),
    ("REAL", "f64"),
    ("DOUBLE", "f64"),
    ("FLOAT", "f32"),
    ("TEXT", "String"),
    ("VARCHAR", "String"),
    ("CHAR", "String"),
    ("CLOB", "String"),
    ("UUID", "uuid::Uuid"),
    ("JSON", "serde_json::Value"),
    ("JSONB", "serde_json::Value"),
    ("BLOB", "Vec<u8>"),
    ("DATE", "chrono::DateTime<chrono::Utc>"),
    ("DATETIME", "chrono::DateTime<chrono::Utc>"),
    ("TIMESTAMP", "chrono::DateTime<chrono::Utc>"),
    ("DURATION", "oxide_pgtypes::Interval"),
    ("INTERVAL", "oxide_pgtypes::Interval"),
    ("NUMERIC", "f64"),
    ("DECIMAL", "f64"),
];

/// Type map for SQLite declared types.
///
/// Lookups are case-insensitive and ignore any `(…)` suffix, except that
/// `TINYINT(1)` is a boolean.
#[derive(Debug, Clone)]
pub struct SqliteTypeMap {
    table: TypeMapTable,
}

impl SqliteTypeMap {
    /// Creates the fixed SQLite vocabulary.
    #[must_use]
    pub fn new() -> Self {
        let table = VOCABULARY
            .iter()
            .map(|(declared, ty)| ((*declared).to_string(), Resolver::Fixed((*ty).to_string())))
            .collect();
        Self { table }
    }

    /// Returns the base type for a declared type, ignoring nullability.
    #[must_use]
    pub fn base_type(&self, declared: &str) -> Option<&str> {
        let upper = declared.trim().to_ascii_uppercase();
        if upper.starts_with("TINYINT(1)") {
            return Some("bool");
        }
        let keyword = upper.split('(').next().unwrap_or_default().trim();
        match self.table.get(keyword)? {
            Resolver::Fixed(ty) => Some(ty.as_str()),
            Resolver::Text => Some("String"),
        }
    }
}

impl Default for SqliteTypeMap {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeMapper for SqliteTypeMap {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn resolve(&self, column: &ColumnDescriptor) -> Result<String> {
        let base = self
            .base_type(&column.declared_type)
            .ok_or_else(|| GenError::UnsupportedDeclaredType {
                table: None,
                column: column.name.clone(),
                declared_type: column.declared_type.clone(),
            })?;
        Ok(apply_nullability(base, column.nullable))
    }
}
