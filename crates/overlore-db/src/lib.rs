//! Data layer for the Overlore event ingestion service (`SQLite`, optionally
//! with `SpatiaLite`).
//!
//! Decoded ledger events are persisted into a single `events` table with two
//! spatial point columns. The store is safe to share between the ingestion
//! loop and any number of readers: all access to its one connection is
//! serialized through a bounded-wait lock.
//!
//! # Architecture
//!
//! ```text
//! RawEventEnvelope
//!     |
//!     +-- validate + decode ----> overlore-events (RealmRegistry reads only)
//!     |
//!     +-- EventStore::add ------> lock -> INSERT + COMMIT -> unlock
//!                                          |
//!                                          +-- events (id, type, importance,
//!                                              ts, metadata, active_pos,
//!                                              passive_pos)
//! ```
//!
//! # Modules
//!
//! - [`sqlite`] -- Backing file configuration, connect, first-launch schema
//! - [`geometry`] -- `SpatiaLite` point BLOB codec
//! - [`event_store`] -- [`EventStore`]: insert, lookup, scan, ingest, close
//! - [`error`] -- Shared error types

pub mod error;
pub mod event_store;
pub mod geometry;
pub mod sqlite;

// Re-export primary types for convenience.
pub use error::DbError;
pub use event_store::{EventRow, EventStore, STORED_IMPORTANCE};
pub use geometry::{GeometryError, PointGeometry};
pub use sqlite::SqliteConfig;
