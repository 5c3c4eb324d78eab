//! Event ingestion service binary for Overlore.
//!
//! Wires the realm registry, the event decoder, and the event store
//! together and feeds them newline-delimited JSON envelopes until the input
//! ends or the process is interrupted.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `overlore-config.yaml` (or `OVERLORE_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Load the mode's `.env` file and apply environment overrides
//! 4. Load the realm registry
//! 5. Open the event store, creating the schema on first launch
//! 6. Ingest envelopes from the replay file or stdin
//! 7. Close the store and log the counts

mod config;
mod error;
mod feed;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use overlore_db::EventStore;
use overlore_realms::RealmRegistry;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer as _;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

use crate::config::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, LoggingConfig, ServiceConfig};
use crate::error::ServiceError;
use crate::feed::IngestionReport;

/// Application entry point for the ingestion service.
///
/// # Errors
///
/// Returns an error if any initialization step fails, or if ingestion
/// stops on a read error.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    run().await?;
    Ok(())
}

async fn run() -> Result<(), ServiceError> {
    // 1. Load configuration.
    let (mut config, config_path) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging)?;
    info!("overlore-service starting");
    match &config_path {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }

    // 3. Environment.
    match config::load_env_file(config.mode)? {
        Some(path) => info!(path = %path.display(), prod = config.mode.prod, "Env file loaded"),
        None => info!(file = config.mode.env_file(), "Env file not found, skipping"),
    }
    config.apply_env_overrides();
    config.validate()?;
    info!(
        torii_ws = config.feed.torii_ws.as_deref().unwrap_or_default(),
        torii_graphql = config.feed.torii_graphql.as_deref().unwrap_or_default(),
        katana_url = config.feed.katana_url.as_deref().unwrap_or_default(),
        server_address = %config.server.address,
        server_port = config.server.port,
        "Feed endpoints configured"
    );

    // 4. Realm registry.
    let registry = Arc::new(RealmRegistry::init(&config.realms.path)?);

    // 5. Event store.
    let sqlite = config.database.to_sqlite_config();
    let store = EventStore::init(&sqlite, registry)
        .await?
        .with_selectors(config.selectors.to_selectors());
    info!(
        path = %sqlite.path.display(),
        lock_timeout_ms = config.database.lock_timeout_ms,
        spatialite = sqlite.spatialite_extension.is_some(),
        "Event store ready"
    );

    // 6. Ingest until end of input or Ctrl-C.
    let reader = feed::open_reader(config.feed.replay_file.as_deref()).await?;
    let mut report = IngestionReport::default();
    let outcome =
        feed::run_ingestion(&store, feed::lines(reader), shutdown_signal(), &mut report).await;

    // 7. Shut down.
    if report.interrupted {
        info!("Interrupted, shutting down");
    }
    info!(
        lines_read = report.lines_read,
        envelopes = report.envelopes,
        processed = report.processed,
        failed = report.failed,
        "Ingestion finished"
    );
    store.close().await?;
    outcome
}

/// Load configuration from the file named by `OVERLORE_CONFIG`, or
/// `overlore-config.yaml`.
///
/// Falls back to defaults if the file does not exist. Returns the path
/// that was read, if any.
fn load_config() -> Result<(ServiceConfig, Option<PathBuf>), ServiceError> {
    let path = std::env::var(CONFIG_PATH_ENV)
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if path.exists() {
        let config = ServiceConfig::from_file(&path)?;
        Ok((config, Some(path)))
    } else {
        Ok((ServiceConfig::default(), None))
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `logging.level`. With `logging.file`
/// set, a second plain-text layer appends to that file.
fn init_tracing(logging: &LoggingConfig) -> Result<(), ServiceError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| ServiceError::Logging {
            message: format!("invalid log level {:?}: {e}", logging.level),
        })?;

    let stdout_layer = if logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(true).boxed()
    };

    let file_layer = match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| ServiceError::Logging {
                    message: format!("failed to open log file {}: {e}", path.display()),
                })?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Mutex::new(file))
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| ServiceError::Logging {
            message: format!("failed to install subscriber: {e}"),
        })
}

/// Resolve on Ctrl-C. If the signal handler cannot be installed, never
/// resolve and let the feed run to completion.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
