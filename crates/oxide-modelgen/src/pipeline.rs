//! The generation run.
//!
//! A run moves through fixed stages and stops at the first error:
//!
//! ```text
//! Connect -> Clean -> Enumerate -> per table { Resolve -> Inject -> Override }
//!         -> Assemble -> Execute -> Done
//! ```
//!
//! Every column is resolved before anything is emitted, so an unsupported
//! declared type leaves the output directory untouched apart from cleanup.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, info, warn};

use crate::catalog::{Catalog, DatabaseCatalog, TableInfo};
use crate::config::GenConfig;
use crate::dialect::{ColumnDescriptor, TypeMap, TypeMapper};
use crate::emit::{clean_generated, ModelEmitter};
use crate::error::Result;
use crate::model::{FieldDescriptor, Model};
use crate::relation::synthesize;

/// Stages of a generation run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Open and ping the database.
    Connect,
    /// Delete previously generated files.
    Clean,
    /// List tables and views.
    Enumerate,
    /// Map each column to a field type.
    Resolve,
    /// Append configured relation fields.
    Inject,
    /// Apply JSON tag overrides.
    Override,
    /// Collect models keyed by table name.
    Assemble,
    /// Hand the models to the emitter.
    Execute,
    /// Finished.
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connect => "connect",
            Self::Clean => "clean",
            Self::Enumerate => "enumerate",
            Self::Resolve => "resolve",
            Self::Inject => "inject",
            Self::Override => "override",
            Self::Assemble => "assemble",
            Self::Execute => "execute",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Drives one generation run.
#[derive(Debug)]
pub struct GenerationPipeline<'a> {
    config: &'a GenConfig,
    type_map: TypeMap,
    dry_run: bool,
}

impl<'a> GenerationPipeline<'a> {
    /// Creates a pipeline; the type map is built once here.
    #[must_use]
    pub fn new(config: &'a GenConfig) -> Self {
        Self {
            config,
            type_map: TypeMap::for_config(config),
            dry_run: false,
        }
    }

    /// In dry-run mode models are resolved and logged but nothing on disk changes.
    #[must_use]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Connects to the configured database and runs every stage.
    pub async fn run<E: ModelEmitter>(&self, emitter: &E) -> Result<Vec<Model>> {
        info!(stage = %Stage::Connect, dialect = %self.config.dialect, "Connecting to database");
        let catalog =
            DatabaseCatalog::connect(self.config.dialect, self.config.database_url()?).await?;
        self.run_with_catalog(&catalog, emitter).await
    }

    /// Runs every stage after Connect against an open catalog.
    pub async fn run_with_catalog<C: Catalog, E: ModelEmitter>(
        &self,
        catalog: &C,
        emitter: &E,
    ) -> Result<Vec<Model>> {
        if self.config.clean_up && !self.dry_run {
            info!(
                stage = %Stage::Clean,
                out_path = %self.config.out_path.display(),
                "Removing generated files"
            );
            let removed = clean_generated(&self.config.out_path)?;
            debug!(removed, "Cleanup finished");
        }

        info!(stage = %Stage::Enumerate, "Listing tables");
        let tables = catalog.tables().await?;
        info!(count = tables.len(), "Found tables");

        let mut assembled: BTreeMap<String, Model> = BTreeMap::new();
        for table in &tables {
            let columns = catalog.columns(&table.name).await?;
            let model = self.build_model(table, &columns)?;
            if assembled.contains_key(&table.name) {
                warn!(table = %table.name, "Duplicate table name; keeping the first model");
                continue;
            }
            assembled.insert(table.name.clone(), model);
        }

        info!(stage = %Stage::Assemble, models = assembled.len(), "Models assembled");
        let models: Vec<Model> = assembled.into_values().collect();

        if self.dry_run {
            for model in &models {
                info!(
                    table = %model.table_name,
                    model = %model.struct_name,
                    fields = model.fields.len(),
                    "Dry run"
                );
            }
        } else {
            info!(stage = %Stage::Execute, "Emitting models");
            let written = emitter.emit(&models)?;
            info!(files = written.len(), "Files written");
        }

        info!(stage = %Stage::Done, "Generation complete");
        Ok(models)
    }

    /// Builds the model for one table: resolve, inject, override.
    pub fn build_model(&self, table: &TableInfo, columns: &[ColumnDescriptor]) -> Result<Model> {
        let mut model = Model::new(&table.name, table.kind);
        model.create_sql.clone_from(&table.create_sql);

        debug!(
            stage = %Stage::Resolve,
            table = %table.name,
            columns = columns.len(),
            "Resolving columns"
        );
        for column in columns {
            let type_name = self
                .type_map
                .resolve(column)
                .map_err(|e| e.in_table(&table.name))?;
            model.fields.push(FieldDescriptor::column(&column.name, type_name));
        }

        let extra = self.config.extra_fields_for(&table.name);
        if !extra.is_empty() {
            debug!(
                stage = %Stage::Inject,
                table = %table.name,
                count = extra.len(),
                "Adding relation fields"
            );
            model.fields.extend(extra.iter().map(synthesize));
        }

        if let Some(overrides) = self.config.json_tag_overrides.get(&table.name) {
            debug!(stage = %Stage::Override, table = %table.name, "Applying JSON tag overrides");
            for field in &mut model.fields {
                let tag = field
                    .column_name
                    .as_ref()
                    .and_then(|column| overrides.get(column))
                    .or_else(|| overrides.get(field.bare_name()));
                if let Some(tag) = tag.cloned() {
                    field.set_json_tag(tag);
                }
            }
        }

        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::path::PathBuf;

    use super::*;
    use crate::dialect::Dialect;
    use crate::error::GenError;
    use crate::model::TableKind;
    use crate::relation::RelationKind;

    struct FakeCatalog {
        tables: Vec<TableInfo>,
        columns: BTreeMap<String, Vec<ColumnDescriptor>>,
    }

    impl Catalog for FakeCatalog {
        fn dialect(&self) -> Dialect {
            Dialect::Sqlite
        }

        async fn ping(&self) -> Result<()> {
            Ok(())
        }

        async fn tables(&self) -> Result<Vec<TableInfo>> {
            Ok(self.tables.clone())
        }

        async fn columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
            Ok(self.columns.get(table).cloned().unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct RecordingEmitter {
        emitted: RefCell<Vec<String>>,
    }

    impl ModelEmitter for RecordingEmitter {
        fn emit(&self, models: &[Model]) -> Result<Vec<PathBuf>> {
            self.emitted
                .borrow_mut()
                .extend(models.iter().map(|m| m.table_name.clone()));
            Ok(Vec::new())
        }
    }

    fn col(name: &str, declared: &str, nullable: bool) -> ColumnDescriptor {
        ColumnDescriptor::new(name, declared, nullable, Dialect::Sqlite)
    }

    fn catalog() -> FakeCatalog {
        FakeCatalog {
            tables: vec![TableInfo::table("ticket"), TableInfo::table("attachment")],
            columns: BTreeMap::from([
                (
                    "ticket".to_string(),
                    vec![
                        col("id", "INTEGER", false),
                        col("subject", "TEXT", true),
                        col("subject_fts", "TEXT", true),
                    ],
                ),
                (
                    "attachment".to_string(),
                    vec![col("id", "INTEGER", false), col("ticket_id", "INTEGER", false)],
                ),
            ]),
        }
    }

    fn config(extra: &str) -> GenConfig {
        let dir = std::env::temp_dir().join("oxide-modelgen-pipeline-unit");
        GenConfig::from_toml(&format!(
            "out_path = {:?}\ndialect = \"sqlite\"\nclean_up = false\n{extra}",
            dir.display().to_string()
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_models_ordered_by_table() {
        let config = config("");
        let emitter = RecordingEmitter::default();
        let models = GenerationPipeline::new(&config)
            .run_with_catalog(&catalog(), &emitter)
            .await
            .unwrap();

        let names: Vec<_> = models.iter().map(|m| m.table_name.as_str()).collect();
        assert_eq!(names, ["attachment", "ticket"]);
        assert_eq!(*emitter.emitted.borrow(), ["attachment", "ticket"]);
    }

    #[tokio::test]
    async fn test_dry_run_skips_emitter() {
        let config = config("");
        let emitter = RecordingEmitter::default();
        let models = GenerationPipeline::new(&config)
            .dry_run(true)
            .run_with_catalog(&catalog(), &emitter)
            .await
            .unwrap();
        assert_eq!(models.len(), 2);
        assert!(emitter.emitted.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_type_aborts_before_emit() {
        let config = config("");
        let mut catalog = catalog();
        catalog
            .columns
            .get_mut("ticket")
            .unwrap()
            .push(col("shape", "GEOMETRY", true));
        let emitter = RecordingEmitter::default();

        let err = GenerationPipeline::new(&config)
            .run_with_catalog(&catalog, &emitter)
            .await
            .unwrap_err();
        match err {
            GenError::UnsupportedDeclaredType { table, column, .. } => {
                assert_eq!(table.as_deref(), Some("ticket"));
                assert_eq!(column, "shape");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(emitter.emitted.borrow().is_empty());
    }

    #[test]
    fn test_build_model_resolves_inject_and_override() {
        let config = config(
            r#"
[[extra_fields.ticket]]
property_name = "Attachments"
property_type = "models.Attachment"
fk_property_name = "TicketID"
ref_property_name = "ID"
has_many = true
pointer = true

[json_tag_overrides.ticket]
subject_fts = "-"
attachments = "files"
"#,
        );
        let pipeline = GenerationPipeline::new(&config);
        let catalog = catalog();
        let model = pipeline
            .build_model(&TableInfo::table("ticket"), &catalog.columns["ticket"])
            .unwrap();

        assert_eq!(model.struct_name, "Ticket");
        assert_eq!(model.kind, TableKind::Table);
        assert_eq!(model.fields.len(), 4);
        assert_eq!(model.field("id").unwrap().type_name, "i64");
        assert_eq!(model.field("subject").unwrap().type_name, "Option<String>");
        assert_eq!(model.field("subject").unwrap().json_tag(), Some("subject"));
        assert_eq!(model.field_by_column("subject_fts").unwrap().json_tag(), Some("-"));

        let attachments = model.field("attachments").unwrap();
        assert_eq!(attachments.type_name, "Vec<Attachment>");
        assert_eq!(attachments.json_tag(), Some("files"));
        assert_eq!(
            attachments.relation.as_ref().unwrap().kind,
            RelationKind::HasMany
        );
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Connect.to_string(), "connect");
        assert_eq!(Stage::Done.to_string(), "done");
    }
}
