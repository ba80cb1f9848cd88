//! SQLite catalog reader.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use super::{Catalog, TableInfo};
use crate::dialect::{ColumnDescriptor, Dialect};
use crate::error::{GenError, Result};
use crate::model::TableKind;

const TABLES_SQL: &str = "SELECT name, sql FROM sqlite_master \
     WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name";

const COLUMNS_SQL: &str =
    r#"SELECT name, type, "notnull", pk FROM pragma_table_info(?) ORDER BY cid"#;

/// Reads tables and columns from `sqlite_master` and `pragma_table_info`.
#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    /// Wraps an existing pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens a pool for `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .map_err(GenError::Connection)?;
        Ok(Self::new(pool))
    }

    /// Returns the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl Catalog for SqliteCatalog {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(GenError::Connection)?;
        Ok(())
    }

    async fn tables(&self) -> Result<Vec<TableInfo>> {
        let rows: Vec<(String, Option<String>)> = sqlx::query_as(TABLES_SQL)
            .fetch_all(&self.pool)
            .await
            .map_err(GenError::catalog("sqlite tables"))?;

        Ok(rows
            .into_iter()
            .map(|(name, create_sql)| TableInfo {
                name,
                kind: TableKind::Table,
                create_sql,
            })
            .collect())
    }

    async fn columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        let rows: Vec<(String, String, i64, i64)> = sqlx::query_as(COLUMNS_SQL)
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(GenError::catalog("sqlite columns"))?;

        // Primary key columns are never NULL in generated models, even
        // though SQLite allows it for non-INTEGER keys.
        Ok(rows
            .into_iter()
            .map(|(name, declared_type, not_null, pk)| {
                let nullable = not_null == 0 && pk == 0;
                ColumnDescriptor::new(name, declared_type, nullable, Dialect::Sqlite)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn create_test_catalog() -> SqliteCatalog {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .expect("Failed to create in-memory SQLite pool");
        sqlx::query(
            "CREATE TABLE posts (id INTEGER PRIMARY KEY, title VARCHAR(200) NOT NULL, body TEXT)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("CREATE TABLE authors (id INTEGER PRIMARY KEY, name TEXT)")
            .execute(&pool)
            .await
            .unwrap();
        SqliteCatalog::new(pool)
    }

    #[tokio::test]
    async fn test_tables_sorted_with_sql() {
        let catalog = create_test_catalog().await;
        catalog.ping().await.unwrap();

        let tables = catalog.tables().await.unwrap();
        let names: Vec<_> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["authors", "posts"]);
        assert!(tables[1]
            .create_sql
            .as_deref()
            .unwrap()
            .starts_with("CREATE TABLE posts"));
    }

    #[tokio::test]
    async fn test_internal_tables_skipped() {
        let catalog = create_test_catalog().await;
        // AUTOINCREMENT creates sqlite_sequence.
        sqlx::query("CREATE TABLE counters (id INTEGER PRIMARY KEY AUTOINCREMENT)")
            .execute(catalog.pool())
            .await
            .unwrap();
        let tables = catalog.tables().await.unwrap();
        assert!(tables.iter().all(|t| !t.name.starts_with("sqlite_")));
        assert_eq!(tables.len(), 3);
    }

    #[tokio::test]
    async fn test_columns() {
        let catalog = create_test_catalog().await;
        let columns = catalog.columns("posts").await.unwrap();
        assert_eq!(
            columns,
            vec![
                ColumnDescriptor::new("id", "INTEGER", false, Dialect::Sqlite),
                ColumnDescriptor::new("title", "VARCHAR(200)", false, Dialect::Sqlite),
                ColumnDescriptor::new("body", "TEXT", true, Dialect::Sqlite),
            ]
        );
    }

    #[tokio::test]
    async fn test_columns_of_missing_table_is_empty() {
        let catalog = create_test_catalog().await;
        assert!(catalog.columns("nope").await.unwrap().is_empty());
    }
}
