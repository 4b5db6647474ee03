//! Unidata Ingest - one-shot ingestion runs from the command line

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;
use unidata_common::logging::{init_logging, LogConfig, LogLevel};
use unidata_server::{
    config::Config,
    db::{self, PgRecordStore},
    ingest::{Fetcher, IngestConfig, IngestOrchestrator, SourceRegistry},
    storage::ObjectStoreConfig,
    store::{MemoryRecordStore, RecordStore},
};

#[derive(Parser, Debug)]
#[command(name = "unidata-ingest")]
#[command(author, version, about = "Unidata dataset ingestion tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Write to an in-memory store instead of Postgres (dry run)
    #[arg(long, global = true)]
    in_memory: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest one source, or every source with --all
    Run {
        /// Registered source id, e.g. source1
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        source_id: Option<String>,

        /// Ingest every registered source in order
        #[arg(long)]
        all: bool,
    },

    /// Print the source registry as JSON
    Sources,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over the flags
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("unidata-ingest")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    let ingest_config = IngestConfig::from_env().context("Invalid ingestion configuration")?;
    let registry = Arc::new(SourceRegistry::from_config(&ingest_config)?);

    match cli.command {
        Command::Sources => {
            println!("{}", serde_json::to_string_pretty(registry.list_all())?);
        },
        Command::Run { source_id, all } => {
            let store = open_store(cli.in_memory).await?;
            let object_store_config = ObjectStoreConfig::from_env()?;
            let fetcher =
                Arc::new(Fetcher::from_config(&object_store_config, &ingest_config).await?);
            let orchestrator = IngestOrchestrator::new(registry, fetcher, store, &ingest_config);

            match (source_id, all) {
                (Some(source_id), false) => {
                    let count = orchestrator
                        .ingest_one(&source_id)
                        .await
                        .with_context(|| format!("Ingestion of {} failed", source_id))?;
                    info!(source_id = %source_id, count, "Ingestion complete");
                },
                _ => {
                    let results = orchestrator.ingest_all().await;
                    let total: u64 = results.values().sum();
                    for (source_id, count) in &results {
                        info!(source_id = %source_id, count, "Source ingested");
                    }
                    info!(total, "Ingestion complete");
                },
            }
        },
    }

    Ok(())
}

async fn open_store(in_memory: bool) -> Result<Arc<dyn RecordStore>> {
    if in_memory {
        info!("Using in-memory store, nothing will be persisted");
        return Ok(Arc::new(MemoryRecordStore::new()));
    }

    let config = Config::load()?;
    let pool = db::create_pool(&config.database)
        .await
        .context("Failed to connect to the database")?;
    db::run_migrations(&pool).await?;
    Ok(Arc::new(PgRecordStore::new(pool)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_one_source() {
        let cli = Cli::try_parse_from(["unidata-ingest", "run", "source1", "--in-memory"]).unwrap();
        assert!(cli.in_memory);
        assert!(matches!(
            cli.command,
            Command::Run { source_id: Some(ref id), all: false } if id == "source1"
        ));
    }

    #[test]
    fn test_run_all() {
        let cli = Cli::try_parse_from(["unidata-ingest", "-v", "run", "--all"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Run { source_id: None, all: true }));
    }

    #[test]
    fn test_run_requires_a_target() {
        assert!(Cli::try_parse_from(["unidata-ingest", "run"]).is_err());
        assert!(Cli::try_parse_from(["unidata-ingest", "run", "source1", "--all"]).is_err());
    }
}
