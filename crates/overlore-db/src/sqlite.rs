//! `SQLite` connection and schema lifecycle.
//!
//! The event store owns exactly one connection to its backing file. The
//! schema is created on first launch only: when the file did not exist
//! before connecting (or, for a pre-existing file, when it has no `events`
//! table yet). Reopening an initialized file never touches the schema.
//!
//! Both modes give each position column an R*Tree spatial index named
//! `idx_events_<column>` with columns `(pkid, xmin, xmax, ymin, ymax)`.
//! With a `SpatiaLite` extension configured, the extension is loaded on
//! every connect, the columns are registered as geometry columns, and
//! `SpatiaLite`'s triggers keep the indexes current. Without it, the
//! columns are plain BLOBs holding the same point encoding and the store
//! writes the index entries itself, in the insert's transaction, using
//! `SQLite`'s built-in `rtree` module.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{ConnectOptions, Connection, SqliteConnection};

use crate::error::DbError;
use crate::geometry::POINT_SRID;

/// Default bound on waiting for the connection lock, in milliseconds.
const DEFAULT_LOCK_TIMEOUT_MS: u64 = 1000;

/// Special path selecting a private in-memory database.
const MEMORY_PATH: &str = ":memory:";

/// The two spatial point columns, in insertion order.
pub const POINT_COLUMNS: [&str; 2] = ["active_pos", "passive_pos"];

/// Spatial index tables, in [`POINT_COLUMNS`] order.
pub const POINT_INDEX_TABLES: [&str; 2] = ["idx_events_active_pos", "idx_events_passive_pos"];

/// Plain-mode R*Tree indexes, in [`POINT_COLUMNS`] order.
const CREATE_POINT_INDEXES: [&str; 2] = [
    "CREATE VIRTUAL TABLE IF NOT EXISTS idx_events_active_pos USING rtree(pkid, xmin, xmax, ymin, ymax)",
    "CREATE VIRTUAL TABLE IF NOT EXISTS idx_events_passive_pos USING rtree(pkid, xmin, xmax, ymin, ymax)",
];

/// Plain-mode index maintenance, in [`POINT_COLUMNS`] order. Binds
/// `pkid, xmin, xmax, ymin, ymax`.
pub(crate) const INSERT_POINT_INDEX: [&str; 2] = [
    "INSERT INTO idx_events_active_pos (pkid, xmin, xmax, ymin, ymax) VALUES (?, ?, ?, ?, ?)",
    "INSERT INTO idx_events_passive_pos (pkid, xmin, xmax, ymin, ymax) VALUES (?, ?, ?, ?, ?)",
];

/// Base table without the point columns (`SpatiaLite` adds those itself).
const CREATE_EVENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS events (
    id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
    type INTEGER NOT NULL,
    importance INTEGER NOT NULL,
    ts INTEGER NOT NULL,
    metadata TEXT
)";

/// Full table for files without `SpatiaLite`.
const CREATE_EVENTS_TABLE_PLAIN: &str = r"
CREATE TABLE IF NOT EXISTS events (
    id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
    type INTEGER NOT NULL,
    importance INTEGER NOT NULL,
    ts INTEGER NOT NULL,
    metadata TEXT,
    active_pos BLOB NOT NULL,
    passive_pos BLOB NOT NULL
)";

/// Configuration for the event store's backing file.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Path of the backing file, or `:memory:`.
    pub path: PathBuf,
    /// How long an operation waits for the connection lock.
    pub lock_timeout: Duration,
    /// `SpatiaLite` extension to load (e.g. `mod_spatialite`), if any.
    pub spatialite_extension: Option<String>,
}

impl SqliteConfig {
    /// Create a configuration for a backing file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout: Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS),
            spatialite_extension: None,
        }
    }

    /// Configuration for a private in-memory database.
    pub fn in_memory() -> Self {
        Self::new(MEMORY_PATH)
    }

    /// Set the connection lock timeout.
    #[must_use]
    pub const fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Load a `SpatiaLite` extension and create real geometry columns.
    #[must_use]
    pub fn with_spatialite(mut self, extension: impl Into<String>) -> Self {
        self.spatialite_extension = Some(extension.into());
        self
    }

    /// Whether `SpatiaLite` manages the geometry columns and their indexes.
    pub const fn uses_spatialite(&self) -> bool {
        self.spatialite_extension.is_some()
    }

    /// Whether this configuration targets an in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.path == Path::new(MEMORY_PATH)
    }

    fn connect_options(&self) -> Result<SqliteConnectOptions, DbError> {
        let mut options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::Config(format!("invalid in-memory options: {e}")))?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
        };
        if let Some(extension) = &self.spatialite_extension {
            options = options.extension(extension.clone());
        }
        Ok(options)
    }
}

/// Open the single connection to the backing file and make sure its schema
/// exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlite`] if the connection fails, or
/// [`DbError::Schema`] if first-launch schema creation fails.
pub async fn open(config: &SqliteConfig) -> Result<SqliteConnection, DbError> {
    let first_launch = config.is_in_memory() || !config.path.exists();
    let mut conn = config.connect_options()?.connect().await?;

    tracing::info!(
        path = %config.path.display(),
        first_launch,
        spatialite = config.uses_spatialite(),
        "Connected to SQLite"
    );

    if first_launch || !events_table_exists(&mut conn).await? {
        create_schema(&mut conn, config.uses_spatialite()).await?;
    }
    Ok(conn)
}

/// Whether the `events` table is present.
async fn events_table_exists(conn: &mut SqliteConnection) -> Result<bool, DbError> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'events'")
            .fetch_optional(&mut *conn)
            .await?;
    Ok(found.is_some())
}

/// Create the `events` table, its spatial columns, and their indexes.
async fn create_schema(conn: &mut SqliteConnection, spatialite: bool) -> Result<(), DbError> {
    if !spatialite {
        let mut tx = conn.begin().await?;
        sqlx::query(CREATE_EVENTS_TABLE_PLAIN)
            .execute(&mut *tx)
            .await?;
        for statement in CREATE_POINT_INDEXES {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        tracing::info!("Created events table with R*Tree point indexes");
        return Ok(());
    }

    // InitSpatialMetaData(1) manages its own transaction.
    sqlx::query("SELECT InitSpatialMetaData(1)")
        .execute(&mut *conn)
        .await?;
    sqlx::query(CREATE_EVENTS_TABLE).execute(&mut *conn).await?;

    for column in POINT_COLUMNS {
        let added: i64 =
            sqlx::query_scalar("SELECT AddGeometryColumn('events', ?, ?, 'POINT', 'XY', 1)")
                .bind(column)
                .bind(POINT_SRID)
                .fetch_one(&mut *conn)
                .await?;
        if added != 1 {
            return Err(DbError::Schema(format!(
                "AddGeometryColumn failed for {column}"
            )));
        }
        let indexed: i64 = sqlx::query_scalar("SELECT CreateSpatialIndex('events', ?)")
            .bind(column)
            .fetch_one(&mut *conn)
            .await?;
        if indexed != 1 {
            return Err(DbError::Schema(format!(
                "CreateSpatialIndex failed for {column}"
            )));
        }
    }

    tracing::info!("Created events table with spatial metadata and indexes");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = SqliteConfig::new("./events.db");
        assert_eq!(config.lock_timeout, Duration::from_millis(1000));
        assert!(config.spatialite_extension.is_none());
        assert!(!config.is_in_memory());
    }

    #[test]
    fn config_builders() {
        let config = SqliteConfig::in_memory()
            .with_lock_timeout(Duration::from_millis(50))
            .with_spatialite("mod_spatialite");
        assert!(config.is_in_memory());
        assert_eq!(config.lock_timeout, Duration::from_millis(50));
        assert_eq!(config.spatialite_extension.as_deref(), Some("mod_spatialite"));
    }
}
