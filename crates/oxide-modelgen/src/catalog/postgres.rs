//! PostgreSQL catalog reader.
//!
//! Tables and plain views come from `information_schema.tables`, materialized
//! views from `pg_matviews`. Columns of all three are read from
//! `pg_attribute`, which covers materialized views without creating a
//! temporary view over them.

use sqlx::postgres::{PgPool, PgPoolOptions};

use super::{Catalog, TableInfo};
use crate::dialect::{ColumnDescriptor, Dialect};
use crate::error::{GenError, Result};
use crate::model::TableKind;

const TABLES_SQL: &str = "SELECT table_name::text, table_type::text \
     FROM information_schema.tables \
     WHERE table_schema = 'public' AND table_name NOT LIKE 'pg\\_%' \
     ORDER BY table_name";

const MATVIEWS_SQL: &str = "SELECT matviewname::text FROM pg_matviews \
     WHERE schemaname = 'public' ORDER BY matviewname";

// Domains report their base type as the declared type and their own name
// as the column type, so text domains can be overridden by name.
const COLUMNS_SQL: &str = "SELECT a.attname::text, \
       format_type(COALESCE(NULLIF(t.typbasetype, 0), a.atttypid), NULL) AS declared_type, \
       CASE WHEN t.typtype = 'd' THEN t.typname::text END AS domain_name, \
       NOT a.attnotnull AS nullable \
     FROM pg_attribute a \
     JOIN pg_class c ON c.oid = a.attrelid \
     JOIN pg_namespace n ON n.oid = c.relnamespace \
     JOIN pg_type t ON t.oid = a.atttypid \
     WHERE n.nspname = 'public' AND c.relname = $1 \
       AND a.attnum > 0 AND NOT a.attisdropped \
     ORDER BY a.attnum";

/// Reads tables, views and columns from the PostgreSQL system catalogs.
#[derive(Debug, Clone)]
pub struct PostgresCatalog {
    pool: PgPool,
}

impl PostgresCatalog {
    /// Wraps an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool for `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .map_err(GenError::Connection)?;
        Ok(Self::new(pool))
    }
}

impl Catalog for PostgresCatalog {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(GenError::Connection)?;
        Ok(())
    }

    async fn tables(&self) -> Result<Vec<TableInfo>> {
        let tables: Vec<(String, String)> = sqlx::query_as(TABLES_SQL)
            .fetch_all(&self.pool)
            .await
            .map_err(GenError::catalog("postgres tables"))?;
        let matviews: Vec<(String,)> = sqlx::query_as(MATVIEWS_SQL)
            .fetch_all(&self.pool)
            .await
            .map_err(GenError::catalog("postgres materialized views"))?;

        let mut all: Vec<TableInfo> = tables
            .into_iter()
            .map(|(name, table_type)| TableInfo {
                name,
                kind: table_kind(&table_type),
                create_sql: None,
            })
            .chain(matviews.into_iter().map(|(name,)| TableInfo {
                name,
                kind: TableKind::MaterializedView,
                create_sql: None,
            }))
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        let rows: Vec<(String, String, Option<String>, bool)> = sqlx::query_as(COLUMNS_SQL)
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(GenError::catalog("postgres columns"))?;

        Ok(rows
            .into_iter()
            .map(|(name, declared_type, domain, nullable)| {
                let column =
                    ColumnDescriptor::new(name, declared_type, nullable, Dialect::Postgres);
                match domain {
                    Some(domain) => column.with_column_type(domain),
                    None => column,
                }
            })
            .collect())
    }
}

fn table_kind(table_type: &str) -> TableKind {
    if table_type.eq_ignore_ascii_case("VIEW") {
        TableKind::View
    } else {
        TableKind::Table
    }
}
