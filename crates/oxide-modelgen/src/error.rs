//! Error types for model generation.

use std::path::PathBuf;

/// Errors that can occur while generating models.
#[derive(Debug, thiserror::Error)]
pub enum GenError {
    /// The database could not be opened or pinged.
    #[error("Unable to connect to database: {0}")]
    Connection(#[source] sqlx::Error),

    /// A catalog (schema metadata) query failed.
    #[error("Catalog query failed ({query}): {source}")]
    CatalogQuery {
        /// Short name of the query that failed.
        query: &'static str,
        /// Underlying driver error.
        source: sqlx::Error,
    },

    /// A previously generated file could not be removed.
    #[error("Failed to remove generated file '{}': {source}", path.display())]
    Cleanup {
        /// The file or directory being cleaned.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// A column's declared type is not in the dialect vocabulary.
    #[error(
        "Unsupported declared type '{declared_type}' for column '{}.{column}'",
        .table.as_deref().unwrap_or("?")
    )]
    UnsupportedDeclaredType {
        /// Table holding the column, once known.
        table: Option<String>,
        /// Column name.
        column: String,
        /// The declared type as reported by the catalog.
        declared_type: String,
    },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The configuration file is not valid TOML or has the wrong shape.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The emitter could not write an output file.
    #[error("Failed to write '{}': {source}", path.display())]
    Emit {
        /// Output file path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
}

impl GenError {
    /// Attaches the table name to an unsupported-type error.
    #[must_use]
    pub fn in_table(self, name: &str) -> Self {
        match self {
            Self::UnsupportedDeclaredType {
                table: None,
                column,
                declared_type,
            } => Self::UnsupportedDeclaredType {
                table: Some(name.to_string()),
                column,
                declared_type,
            },
            other => other,
        }
    }

    pub(crate) fn catalog(query: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| Self::CatalogQuery { query, source }
    }
}

/// Result type for model generation.
pub type Result<T> = std::result::Result<T, GenError>;
