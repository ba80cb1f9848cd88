//! Schema catalog readers.
//!
//! A [`Catalog`] lists the tables of a live database and describes their
//! columns. Each dialect reads its own system catalog.

mod postgres;
mod sqlite;

pub use postgres::PostgresCatalog;
pub use sqlite::SqliteCatalog;

use tracing::debug;

use crate::dialect::{ColumnDescriptor, Dialect};
use crate::error::Result;
use crate::model::TableKind;

/// A table or view found in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    /// Table name.
    pub name: String,
    /// Table, view or materialized view.
    pub kind: TableKind,
    /// Original `CREATE TABLE` statement (SQLite only).
    pub create_sql: Option<String>,
}

impl TableInfo {
    /// Creates a base table entry.
    pub fn table(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TableKind::Table,
            create_sql: None,
        }
    }
}

/// Read access to a database's schema.
#[allow(async_fn_in_trait)]
pub trait Catalog {
    /// Returns the dialect of the connected database.
    fn dialect(&self) -> Dialect;

    /// Verifies the connection is usable.
    async fn ping(&self) -> Result<()>;

    /// Lists user tables and views, ordered by name.
    async fn tables(&self) -> Result<Vec<TableInfo>>;

    /// Describes the columns of `table` in declaration order.
    async fn columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>>;
}

/// A catalog for whichever dialect was configured.
#[derive(Debug, Clone)]
pub enum DatabaseCatalog {
    /// SQLite database.
    Sqlite(SqliteCatalog),
    /// PostgreSQL database.
    Postgres(PostgresCatalog),
}

impl DatabaseCatalog {
    /// Connects to `url` and pings the database.
    pub async fn connect(dialect: Dialect, url: &str) -> Result<Self> {
        debug!(%dialect, "Opening connection pool");
        let catalog = match dialect {
            Dialect::Sqlite => Self::Sqlite(SqliteCatalog::connect(url).await?),
            Dialect::Postgres => Self::Postgres(PostgresCatalog::connect(url).await?),
        };
        catalog.ping().await?;
        Ok(catalog)
    }
}

impl Catalog for DatabaseCatalog {
    fn dialect(&self) -> Dialect {
        match self {
            Self::Sqlite(c) => c.dialect(),
            Self::Postgres(c) => c.dialect(),
        }
    }

    async fn ping(&self) -> Result<()> {
        match self {
            Self::Sqlite(c) => c.ping().await,
            Self::Postgres(c) => c.ping().await,
        }
    }

    async fn tables(&self) -> Result<Vec<TableInfo>> {
        match self {
            Self::Sqlite(c) => c.tables().await,
            Self::Postgres(c) => c.tables().await,
        }
    }

    async fn columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        match self {
            Self::Sqlite(c) => c.columns(table).await,
            Self::Postgres(c) => c.columns(table).await,
        }
    }
}
