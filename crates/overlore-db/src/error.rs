//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`], which wraps the underlying
//! [`sqlx`] and decoding errors with context about which operation failed.

use std::time::Duration;

use overlore_events::DecodeError;
use overlore_realms::RealmError;
use overlore_types::EventId;

use crate::geometry::GeometryError;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `SQLite` statement, commit, or connection operation failed.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    /// Schema creation on first launch failed.
    #[error("schema error: {0}")]
    Schema(String),

    /// A serialization or deserialization error of the metadata column.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored spatial point could not be decoded.
    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// The envelope could not be decoded into an event.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The connection lock was not acquired within the configured bound.
    #[error("timed out after {0:?} waiting for the connection lock")]
    LockTimeout(Duration),

    /// No row with this id exists.
    #[error("event not found: {0}")]
    NotFound(EventId),

    /// The store has been closed.
    #[error("event store is closed")]
    Closed,

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DbError {
    /// Whether this error is a realm lookup miss during decoding.
    pub const fn is_realm_not_found(&self) -> bool {
        matches!(
            self,
            Self::Decode(DecodeError::Realm(RealmError::RealmNotFound(_)))
        )
    }

    /// Whether this error is a structurally invalid envelope.
    pub const fn is_malformed_envelope(&self) -> bool {
        matches!(self, Self::Decode(DecodeError::MalformedEnvelope(_)))
    }
}
