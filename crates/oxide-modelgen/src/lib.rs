//! Generate Rust model structs from a live database schema.
//!
//! `oxide-modelgen` reads the tables of a SQLite or PostgreSQL database and
//! writes one `serde` + `sqlx::FromRow` struct per table:
//!
//! - Column types are resolved through a per-dialect [`TypeMapper`]
//!   (`VARCHAR(255)` -> `String`, `integer[]` -> `oxide_pgtypes::Int32Array`)
//! - Nullable scalar columns become `Option<T>`
//! - Relation fields declared in the configuration are appended
//!   (`children: Vec<Child>`)
//! - JSON tags default to lowerCamelCase and can be overridden per column
//!
//! # Example
//!
//! ```rust,ignore
//! use oxide_modelgen::prelude::*;
//!
//! let config = GenConfig::load("modelgen.toml")?;
//! let emitter = RustModelWriter::from_config(&config);
//! let models = GenerationPipeline::new(&config).run(&emitter).await?;
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Generate models into the configured out_path
//! oxide-modelgen modelgen.toml
//!
//! # Override the database and only log what would be generated
//! oxide-modelgen --database sqlite:dev.db --dry-run modelgen.toml
//! ```

pub mod catalog;
pub mod config;
pub mod dialect;
pub mod emit;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod relation;

pub use dialect::TypeMapper;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::catalog::{Catalog, DatabaseCatalog, PostgresCatalog, SqliteCatalog, TableInfo};
    pub use crate::config::GenConfig;
    pub use crate::dialect::{
        ColumnDescriptor, Dialect, PostgresTypeMap, SqliteTypeMap, TypeMap, TypeMapper,
    };
    pub use crate::emit::{ModelEmitter, RustModelWriter};
    pub use crate::error::{GenError, Result};
    pub use crate::model::{FieldDescriptor, Model, TableKind};
    pub use crate::pipeline::{GenerationPipeline, Stage};
    pub use crate::relation::{synthesize, ExtraFieldSpec, Relation, RelationKind};
}
