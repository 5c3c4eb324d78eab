//! Error types for the `overlore-realms` crate.

use std::path::PathBuf;

use overlore_types::RealmId;

/// Errors that can occur while building or querying the realm registry.
#[derive(Debug, thiserror::Error)]
pub enum RealmError {
    /// No realm with this id is known.
    #[error("realm not found: {0}")]
    RealmNotFound(RealmId),

    /// The same realm id appeared twice while building the registry.
    #[error("duplicate realm id: {0}")]
    DuplicateRealm(RealmId),

    /// The realms file could not be read.
    #[error("failed to read realms file {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The realms file is not valid JSON of the expected shape.
    #[error("failed to parse realms file: {0}")]
    Parse(#[from] serde_json::Error),

    /// A realm coordinate is NaN or infinite.
    #[error("realm {0} has a non-finite coordinate")]
    NonFiniteCoordinate(RealmId),
}
