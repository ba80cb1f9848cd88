//! Rust source emission for resolved models.
//!
//! The [`ModelEmitter`] trait is the seam between the pipeline and the code
//! generator. [`RustModelWriter`] writes one serde/sqlx struct per model:
//!
//! ```text
//! <out>/models/<table>.gen.rs   one struct per table or view
//! <out>/models/mod.gen.rs       module declarations and re-exports
//! <out>/db.gen.rs               connect() and optional auto_migrate()
//! ```

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::GenConfig;
use crate::dialect::Dialect;
use crate::error::{GenError, Result};
use crate::model::{FieldDescriptor, Model};
use crate::relation::RelationKind;

/// Suffix of every generated file; the cleanup stage deletes files with it.
pub const GENERATED_SUFFIX: &str = ".gen.rs";

const HEADER: &str = "// Code generated by oxide-modelgen. DO NOT EDIT.\n";

/// Writes generated code for a set of models.
pub trait ModelEmitter {
    /// Emits all models, returning the paths written.
    fn emit(&self, models: &[Model]) -> Result<Vec<PathBuf>>;
}

/// Emits Rust structs deriving `serde` and `sqlx::FromRow`.
#[derive(Debug, Clone)]
pub struct RustModelWriter {
    out_path: PathBuf,
    dialect: Dialect,
    generate_db_init: bool,
    include_auto_migrate: bool,
}

impl RustModelWriter {
    /// Creates a writer for `out_path`.
    pub fn new(out_path: impl Into<PathBuf>, dialect: Dialect) -> Self {
        Self {
            out_path: out_path.into(),
            dialect,
            generate_db_init: false,
            include_auto_migrate: false,
        }
    }

    /// Creates a writer from the run configuration.
    #[must_use]
    pub fn from_config(config: &GenConfig) -> Self {
        Self::new(&config.out_path, config.dialect)
            .with_db_init(config.generate_db_init, config.include_auto_migrate)
    }

    /// Enables `db.gen.rs`, optionally with `auto_migrate()`.
    #[must_use]
    pub const fn with_db_init(mut self, enabled: bool, auto_migrate: bool) -> Self {
        self.generate_db_init = enabled;
        self.include_auto_migrate = auto_migrate;
        self
    }

    fn write(path: &Path, contents: &str) -> Result<()> {
        debug!(path = %path.display(), "Writing generated file");
        std::fs::write(path, contents).map_err(|source| GenError::Emit {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl ModelEmitter for RustModelWriter {
    fn emit(&self, models: &[Model]) -> Result<Vec<PathBuf>> {
        let models_dir = self.out_path.join("models");
        std::fs::create_dir_all(&models_dir).map_err(|source| GenError::Emit {
            path: models_dir.clone(),
            source,
        })?;

        let mut written = Vec::with_capacity(models.len() + 2);
        for model in models {
            let path = models_dir.join(format!("{}{GENERATED_SUFFIX}", model.file_name));
            Self::write(&path, &render_model(model))?;
            written.push(path);
        }

        let mod_path = models_dir.join(format!("mod{GENERATED_SUFFIX}"));
        Self::write(&mod_path, &render_models_mod(models))?;
        written.push(mod_path);

        if self.generate_db_init {
            let auto_migrate = self.include_auto_migrate && self.dialect == Dialect::Sqlite;
            if self.include_auto_migrate && !auto_migrate {
                warn!(dialect = %self.dialect, "auto_migrate is only generated for sqlite");
            }
            let db_path = self.out_path.join(format!("db{GENERATED_SUFFIX}"));
            Self::write(&db_path, &render_db_init(self.dialect, models, auto_migrate))?;
            written.push(db_path);
        }

        Ok(written)
    }
}

/// Renders the source of one model file.
#[must_use]
pub fn render_model(model: &Model) -> String {
    let mut out = String::from(HEADER);
    out.push_str("\n#![allow(unused_imports)]\n\nuse super::*;\n\n");

    let _ = writeln!(out, "/// Row of the `{}` table.", model.table_name);
    out.push_str(
        "#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, sqlx::FromRow)]\n",
    );
    let _ = writeln!(out, "pub struct {} {{", model.struct_name);
    for field in &model.fields {
        render_field(&mut out, field);
    }
    out.push_str("}\n\n");

    let _ = writeln!(out, "impl {} {{", model.struct_name);
    out.push_str("    /// Name of the backing table.\n");
    let _ = writeln!(
        out,
        "    pub const TABLE_NAME: &'static str = {:?};",
        model.table_name
    );
    out.push_str("}\n");
    out
}

fn render_field(out: &mut String, field: &FieldDescriptor) {
    if let Some(relation) = &field.relation {
        let kind = match relation.kind {
            RelationKind::HasOne => "Has one",
            RelationKind::HasMany => "Has many",
        };
        let _ = writeln!(
            out,
            "    /// {kind} `{}` (foreign key `{}`, references `{}`).",
            relation.target_type, relation.foreign_key, relation.reference_key
        );
    }

    match field.json_tag() {
        Some("-") => out.push_str("    #[serde(skip)]\n"),
        Some(tag) if field.relation.is_some() => {
            let _ = writeln!(out, "    #[serde(rename = {tag:?}, default)]");
        }
        Some(tag) if tag != field.bare_name() => {
            let _ = writeln!(out, "    #[serde(rename = {tag:?})]");
        }
        None if field.relation.is_some() => out.push_str("    #[serde(default)]\n"),
        _ => {}
    }

    match &field.column_name {
        None => out.push_str("    #[sqlx(skip)]\n"),
        Some(column) if column != &field.name => {
            let _ = writeln!(out, "    #[sqlx(rename = {column:?})]");
        }
        Some(_) => {}
    }

    let _ = writeln!(out, "    pub {}: {},", field.name, field.type_name);
}

/// Renders `models/mod.gen.rs`.
#[must_use]
pub fn render_models_mod(models: &[Model]) -> String {
    let mut out = String::from(HEADER);
    for model in models {
        let _ = write!(
            out,
            "\n#[path = \"{file}{GENERATED_SUFFIX}\"]\nmod {module};\npub use {module}::{name};\n",
            file = model.file_name,
            module = model_module(model),
            name = model.struct_name,
        );
    }
    out
}

fn model_module(model: &Model) -> String {
    crate::model::field_ident(&model.file_name)
}

/// Renders `db.gen.rs`.
#[must_use]
pub fn render_db_init(dialect: Dialect, models: &[Model], auto_migrate: bool) -> String {
    let (pool, options) = match dialect {
        Dialect::Sqlite => ("sqlx::sqlite::SqlitePool", "sqlx::sqlite::SqlitePoolOptions"),
        Dialect::Postgres => ("sqlx::postgres::PgPool", "sqlx::postgres::PgPoolOptions"),
    };

    let mut out = String::from(HEADER);
    out.push_str("\n/// Opens a connection pool for `url`.\n");
    let _ = writeln!(
        out,
        "pub async fn connect(url: &str) -> Result<{pool}, sqlx::Error> {{\n    \
         {options}::new().connect(url).await\n}}"
    );

    if auto_migrate {
        out.push_str("\n/// Creates any missing tables.\n");
        let _ = writeln!(
            out,
            "pub async fn auto_migrate(pool: &{pool}) -> Result<(), sqlx::Error> {{\n    \
             for statement in SCHEMA {{\n        \
             sqlx::query(statement).execute(pool).await?;\n    \
             }}\n    \
             Ok(())\n}}"
        );
        out.push_str("\nconst SCHEMA: &[&str] = &[\n");
        for sql in models.iter().filter_map(|m| m.create_sql.as_deref()) {
            let _ = writeln!(out, "    {:?},", create_if_not_exists(sql));
        }
        out.push_str("];\n");
    }
    out
}

/// Rewrites `CREATE TABLE x` as `CREATE TABLE IF NOT EXISTS x`.
fn create_if_not_exists(sql: &str) -> String {
    const PREFIX: &str = "CREATE TABLE";
    let sql = sql.trim();
    let upper = sql.to_ascii_uppercase();
    match upper.strip_prefix(PREFIX) {
        Some(rest) if !rest.trim_start().starts_with("IF NOT EXISTS") => {
            format!("{PREFIX} IF NOT EXISTS{}", &sql[PREFIX.len()..])
        }
        _ => sql.to_string(),
    }
}

/// Removes previously generated files from `out_path` and `out_path/models`.
///
/// Missing directories are skipped. Returns the number of files removed.
pub fn clean_generated(out_path: &Path) -> Result<usize> {
    let mut removed = 0;
    for dir in [out_path.to_path_buf(), out_path.join("models")] {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(source) => return Err(GenError::Cleanup { path: dir, source }),
        };
        for entry in entries {
            let entry = entry.map_err(|source| GenError::Cleanup {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            let is_generated = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(GENERATED_SUFFIX));
            if !is_generated || !path.is_file() {
                continue;
            }
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => return Err(GenError::Cleanup { path, source }),
            }
        }
    }
    Ok(removed)
}
