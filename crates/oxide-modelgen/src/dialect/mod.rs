//! Column type mapping per database dialect.
//!
//! A [`TypeMapper`] turns a column's declared type into the Rust type name a
//! generated struct field uses. Each dialect keeps its own vocabulary; the
//! tables never share entries.

mod postgres;
mod sqlite;

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

pub use postgres::PostgresTypeMap;
pub use sqlite::SqliteTypeMap;

use crate::config::GenConfig;
use crate::error::Result;

/// Supported database dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// SQLite.
    Sqlite,
    /// PostgreSQL.
    Postgres,
}

impl Dialect {
    /// Returns the dialect name as used in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog metadata for one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,
    /// Declared type as reported by the catalog (e.g. `VARCHAR(255)`, `integer[]`).
    pub declared_type: String,
    /// Named type of the column before domain resolution (postgres domains).
    pub column_type: Option<String>,
    /// Whether the column admits NULL.
    pub nullable: bool,
    /// Dialect the column was read from.
    pub dialect: Dialect,
}

impl ColumnDescriptor {
    /// Creates a descriptor with no domain type.
    pub fn new(
        name: impl Into<String>,
        declared_type: impl Into<String>,
        nullable: bool,
        dialect: Dialect,
    ) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            column_type: None,
            nullable,
            dialect,
        }
    }

    /// Sets the named column type (e.g. a text domain).
    #[must_use]
    pub fn with_column_type(mut self, column_type: impl Into<String>) -> Self {
        self.column_type = Some(column_type.into());
        self
    }
}

/// How one vocabulary entry produces a type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolver {
    /// Always the given type, subject to the nullability rule.
    Fixed(String),
    /// Text columns: a configured domain override, else `String`.
    Text,
}

/// A dialect's vocabulary: declared type to resolver.
pub type TypeMapTable = BTreeMap<String, Resolver>;

/// Scalar types that become `Option<T>` when the column is nullable.
///
/// Byte sequences, structured documents, UUIDs, arrays and relation types are
/// never wrapped.
const WRAPPED_WHEN_NULLABLE: &[&str] = &[
    "bool",
    "i8",
    "i16",
    "i32",
    "i64",
    "u64",
    "f32",
    "f64",
    "String",
    "chrono::DateTime<chrono::Utc>",
    "chrono::NaiveDate",
    "chrono::NaiveDateTime",
    "chrono::NaiveTime",
    "oxide_pgtypes::Interval",
];

/// Applies the nullability rule to a resolved base type.
#[must_use]
pub fn apply_nullability(base: &str, nullable: bool) -> String {
    if nullable && WRAPPED_WHEN_NULLABLE.contains(&base) {
        format!("Option<{base}>")
    } else {
        base.to_string()
    }
}

/// Maps declared column types to Rust type names.
pub trait TypeMapper {
    /// Returns the dialect this mapper serves.
    fn dialect(&self) -> Dialect;

    /// Resolves the field type for a column.
    fn resolve(&self, column: &ColumnDescriptor) -> Result<String>;
}

/// The type map selected for a run.
#[derive(Debug, Clone)]
pub enum TypeMap {
    /// SQLite vocabulary.
    Sqlite(SqliteTypeMap),
    /// PostgreSQL vocabulary with configured overrides.
    Postgres(PostgresTypeMap),
}

impl TypeMap {
    /// Builds the type map for the configured dialect.
    ///
    /// Type overrides apply to PostgreSQL only.
    #[must_use]
    pub fn for_config(config: &GenConfig) -> Self {
        match config.dialect {
            Dialect::Sqlite => Self::Sqlite(SqliteTypeMap::new()),
            Dialect::Postgres => Self::Postgres(PostgresTypeMap::with_overrides(
                &config.type_overrides,
                config.domain_type_overrides.clone(),
            )),
        }
    }
}

impl TypeMapper for TypeMap {
    fn dialect(&self) -> Dialect {
        match self {
            Self::Sqlite(map) => map.dialect(),
            Self::Postgres(map) => map.dialect(),
        }
    }

    fn resolve(&self, column: &ColumnDescriptor) -> Result<String> {
        match self {
            Self::Sqlite(map) => map.resolve(column),
            Self::Postgres(map) => map.resolve(column),
        }
    }
}

/// Removes a trailing `(n)` / `(n,m)` modifier, keeping any `[]` suffix.
pub(crate) fn strip_modifier(declared: &str) -> Option<String> {
    let open = declared.find('(')?;
    let close = open + declared[open..].find(')')?;
    let stripped = format!("{}{}", &declared[..open], &declared[close + 1..]);
    Some(stripped.trim().to_string())
}
