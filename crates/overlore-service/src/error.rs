//! Error types for the ingestion service binary.
//!
//! [`ServiceError`] wraps every failure mode during startup, ingestion,
//! and shutdown so that `main` can propagate with `?`.

use std::path::Path;

/// Top-level error for the ingestion service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: crate::config::ConfigError,
    },

    /// The realm registry could not be loaded.
    #[error("realm registry error: {source}")]
    Realms {
        /// The underlying registry error.
        #[from]
        source: overlore_realms::RealmError,
    },

    /// The event store failed to open, insert, or close.
    #[error("event store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: overlore_db::DbError,
    },

    /// The envelope feed could not be opened or read.
    #[error("feed error on {source_name}: {source}")]
    Feed {
        /// The replay file, or `stdin`.
        source_name: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The log file could not be opened or the subscriber installed.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the logging failure.
        message: String,
    },
}

impl ServiceError {
    /// Feed error for a replay file.
    pub fn replay_file(path: &Path, source: std::io::Error) -> Self {
        Self::Feed {
            source_name: path.display().to_string(),
            source,
        }
    }
}
