//! PostgreSQL type vocabulary.

use std::collections::BTreeMap;

use super::{
    apply_nullability, strip_modifier, ColumnDescriptor, Dialect, Resolver, TypeMapTable,
    TypeMapper,
};
use crate::error::Result;

/// Built-in scalar types.
const SCALARS: &[(&str, &str)] = &[
    ("smallint", "i16"),
    ("int2", "i16"),
    ("integer", "i32"),
    ("int", "i32"),
    ("int4", "i32"),
    ("bigint", "i64"),
    ("int8", "i64"),
    ("real", "f32"),
    ("float4", "f32"),
    ("double precision", "f64"),
    ("float8", "f64"),
    ("numeric", "f64"),
    ("decimal", "f64"),
    ("boolean", "bool"),
    ("bool", "bool"),
    ("character varying", "String"),
    ("varchar", "String"),
    ("character", "String"),
    ("char", "String"),
    ("bpchar", "String"),
    ("citext", "String"),
    ("bytea", "Vec<u8>"),
    ("date", "chrono::NaiveDate"),
    ("time", "chrono::NaiveTime"),
    ("time without time zone", "chrono::NaiveTime"),
    ("timestamp", "chrono::NaiveDateTime"),
    ("timestamp without time zone", "chrono::NaiveDateTime"),
    ("timestamptz", "chrono::DateTime<chrono::Utc>"),
    ("timestamp with time zone", "chrono::DateTime<chrono::Utc>"),
    ("uuid", "uuid::Uuid"),
    ("json", "serde_json::Value"),
    ("jsonb", "serde_json::Value"),
    ("interval", "oxide_pgtypes::Interval"),
];

/// Array types backed by `oxide_pgtypes` codecs.
const ARRAYS: &[(&str, &str)] = &[
    ("text[]", "oxide_pgtypes::StringArray"),
    ("varchar[]", "oxide_pgtypes::StringArray"),
    ("character varying[]", "oxide_pgtypes::StringArray"),
    ("integer[]", "oxide_pgtypes::Int32Array"),
    ("int4[]", "oxide_pgtypes::Int32Array"),
    ("bigint[]", "oxide_pgtypes::Int64Array"),
    ("int8[]", "oxide_pgtypes::Int64Array"),
    ("bool[]", "oxide_pgtypes::BoolArray"),
    ("boolean[]", "oxide_pgtypes::BoolArray"),
    ("uuid[]", "oxide_pgtypes::UuidArray"),
    ("float8[]", "oxide_pgtypes::Float64Array"),
    ("double precision[]", "oxide_pgtypes::Float64Array"),
    ("timestamptz[]", "oxide_pgtypes::TimestampArray"),
    ("timestamp[]", "oxide_pgtypes::TimestampArray"),
    ("timestamp with time zone[]", "oxide_pgtypes::TimestampArray"),
    ("timestamp without time zone[]", "oxide_pgtypes::TimestampArray"),
    ("interval[]", "oxide_pgtypes::IntervalArray"),
];

/// Type map for PostgreSQL declared types.
///
/// Unknown types fall back to `String`.
#[derive(Debug, Clone)]
pub struct PostgresTypeMap {
    table: TypeMapTable,
    domains: BTreeMap<String, String>,
}

impl PostgresTypeMap {
    /// Creates the built-in vocabulary with no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::with_overrides(&BTreeMap::new(), BTreeMap::new())
    }

    /// Creates the vocabulary, replacing entries with `type_overrides` and
    /// resolving text domains through `domains`.
    #[must_use]
    pub fn with_overrides(
        type_overrides: &BTreeMap<String, String>,
        domains: BTreeMap<String, String>,
    ) -> Self {
        let mut table: TypeMapTable = SCALARS
            .iter()
            .chain(ARRAYS)
            .map(|(declared, ty)| ((*declared).to_string(), Resolver::Fixed((*ty).to_string())))
            .collect();
        table.insert("text".to_string(), Resolver::Text);
        for (declared, ty) in type_overrides {
            table.insert(declared.clone(), Resolver::Fixed(ty.clone()));
        }
        Self { table, domains }
    }

    fn lookup(&self, declared: &str) -> Option<&Resolver> {
        let declared = declared.trim();
        self.table.get(declared).or_else(|| {
            let stripped = strip_modifier(declared)?;
            self.table.get(stripped.as_str())
        })
    }
}

impl Default for PostgresTypeMap {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeMapper for PostgresTypeMap {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn resolve(&self, column: &ColumnDescriptor) -> Result<String> {
        let base = match self.lookup(&column.declared_type) {
            Some(Resolver::Fixed(ty)) => ty.as_str(),
            Some(Resolver::Text) => column
                .column_type
                .as_ref()
                .and_then(|domain| self.domains.get(domain))
                .map_or("String", String::as_str),
            None => "String",
        };
        Ok(apply_nullability(base, column.nullable))
    }
}
