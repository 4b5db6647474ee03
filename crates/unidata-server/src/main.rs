//! Unidata Server - Main entry point

use anyhow::Result;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tracing::info;
use unidata_common::logging::{init_logging, LogConfig};

use unidata_server::{
    api::{self, AppState},
    config::Config,
    db::{self, PgRecordStore},
    ingest::{Fetcher, IngestConfig, IngestOrchestrator, IngestScheduler, SourceRegistry},
    storage::ObjectStoreConfig,
    store::RecordStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Environment variables take precedence over these defaults
    let log_config = LogConfig::builder()
        .log_file_prefix("unidata-server")
        .filter_directives("unidata_server=debug,tower_http=debug,sqlx=warn")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    info!("Starting Unidata Server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let ingest_config = IngestConfig::from_env()?;
    let object_store_config = ObjectStoreConfig::from_env()?;

    let pool = db::create_pool(&config.database).await?;
    db::run_migrations(&pool).await?;

    let store: Arc<dyn RecordStore> = Arc::new(PgRecordStore::new(pool));

    let registry = Arc::new(SourceRegistry::from_config(&ingest_config)?);
    let fetcher = Arc::new(Fetcher::from_config(&object_store_config, &ingest_config).await?);
    info!(
        sources = registry.list_all().len(),
        object_storage = object_store_config.enabled,
        "Ingestion pipeline ready"
    );

    let orchestrator = Arc::new(IngestOrchestrator::new(
        registry,
        fetcher,
        store.clone(),
        &ingest_config,
    ));

    let _scheduler_handle = if ingest_config.schedule_enabled {
        info!("Scheduled ingestion is enabled, starting scheduler");
        Some(IngestScheduler::new(orchestrator.clone(), ingest_config.run_timeout()).start())
    } else {
        info!("Scheduled ingestion is disabled (INGEST_SCHEDULE_ENABLED=false)");
        None
    };

    let app = api::app(AppState::new(store, orchestrator), &config.cors);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
