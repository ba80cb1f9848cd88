//! oxide-modelgen CLI
//!
//! Command-line tool for generating model structs from a database schema.

use std::path::PathBuf;

use clap::Parser;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use oxide_modelgen::prelude::*;

/// Generate Rust model structs from a database schema.
#[derive(Parser)]
#[command(name = "oxide-modelgen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    config: PathBuf,

    /// Database URL; overrides `database_url` from the configuration.
    #[arg(short, long, env = "DATABASE_URL")]
    database: Option<String>,

    /// Output directory; overrides `out_path` from the configuration.
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    /// Resolve and log models without cleaning or writing files.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = GenConfig::load(&cli.config)?;
    if let Some(database) = cli.database {
        config.database_url = Some(database);
    }
    if let Some(out) = cli.out {
        config.out_path = out;
    }
    config.validate()?;

    info!(config = %cli.config.display(), dialect = %config.dialect, "Loaded configuration");

    let emitter = RustModelWriter::from_config(&config);
    let pipeline = GenerationPipeline::new(&config).dry_run(cli.dry_run);
    match pipeline.run(&emitter).await {
        Ok(models) => {
            info!(models = models.len(), out_path = %config.out_path.display(), "Done");
            Ok(())
        }
        Err(e) => {
            error!("{e}");
            Err(e.into())
        }
    }
}
