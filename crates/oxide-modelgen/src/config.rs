//! Generator configuration.
//!
//! Configuration is read once from a TOML file before the run and is not
//! modified afterwards:
//!
//! ```toml
//! out_path = "src/db"
//! dialect = "sqlite"
//! database_url = "sqlite:schema.db"
//! generate_db_init = true
//!
//! [[extra_fields.all_types]]
//! property_name = "Children"
//! property_type = "models.Child"
//! fk_property_name = "AllTypesID"
//! ref_property_name = "ID"
//! has_many = true
//!
//! [json_tag_overrides.ticket]
//! subject_fts = "-"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::dialect::Dialect;
use crate::error::{GenError, Result};
use crate::relation::ExtraFieldSpec;

const fn default_true() -> bool {
    true
}

/// Configuration for one generation run.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenConfig {
    /// Output directory; models go to `<out_path>/models`.
    pub out_path: PathBuf,

    /// Database dialect.
    pub dialect: Dialect,

    /// Connection URL. The CLI `--database` flag takes precedence.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Delete previously generated files before the run.
    #[serde(default = "default_true")]
    pub clean_up: bool,

    /// Emit `db.gen.rs` with a connection helper.
    #[serde(default)]
    pub generate_db_init: bool,

    /// Add an `auto_migrate` function replaying the captured schema.
    #[serde(default)]
    pub include_auto_migrate: bool,

    /// Declared type to Rust type replacements (PostgreSQL only).
    #[serde(default)]
    pub type_overrides: BTreeMap<String, String>,

    /// Text domain name to Rust type (PostgreSQL only).
    #[serde(default)]
    pub domain_type_overrides: BTreeMap<String, String>,

    /// Relation fields to add, keyed by table name.
    #[serde(default)]
    pub extra_fields: BTreeMap<String, Vec<ExtraFieldSpec>>,

    /// JSON tag replacements, keyed by table then column or field name.
    #[serde(default)]
    pub json_tag_overrides: BTreeMap<String, BTreeMap<String, String>>,
}

impl GenConfig {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.out_path.as_os_str().is_empty() {
            return Err(GenError::Config("out_path is required".into()));
        }
        if self.include_auto_migrate && !self.generate_db_init {
            return Err(GenError::Config(
                "include_auto_migrate requires generate_db_init".into(),
            ));
        }
        for (table, fields) in &self.extra_fields {
            for field in fields {
                if field.property_name.is_empty() || field.property_type.is_empty() {
                    return Err(GenError::Config(format!(
                        "extra_fields.{table}: property_name and property_type are required"
                    )));
                }
            }
        }
        if self.dialect == Dialect::Sqlite
            && !(self.type_overrides.is_empty() && self.domain_type_overrides.is_empty())
        {
            warn!("type_overrides and domain_type_overrides are ignored for sqlite");
        }
        Ok(())
    }

    /// Returns the connection URL, or an error if none was configured.
    pub fn database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                GenError::Config(
                    "database_url is required (config, --database or DATABASE_URL)".into(),
                )
            })
    }

    /// Directory holding the generated model files.
    #[must_use]
    pub fn models_path(&self) -> PathBuf {
        self.out_path.join("models")
    }

    /// Relation fields configured for `table`.
    #[must_use]
    pub fn extra_fields_for(&self, table: &str) -> &[ExtraFieldSpec] {
        self.extra_fields
            .get(table)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
