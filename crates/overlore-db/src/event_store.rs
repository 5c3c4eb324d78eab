//! The concurrent event store.
//!
//! [`EventStore`] owns the single connection to the backing file. Every
//! operation that touches the connection takes one mutex for the duration of
//! its statement (or statement + commit pair), waiting at most the configured
//! lock timeout. Readers and writers are not distinguished: the connection
//! handle cannot be shared, so all access is serialized, and the commit order
//! of inserts equals lock-acquisition order.
//!
//! The store is constructed explicitly by the service entry point and passed
//! around behind an `Arc`; there is no global instance.

use std::sync::Arc;
use std::time::Duration;

use overlore_events::{EventSelectors, RawEventEnvelope, decode_envelope};
use overlore_realms::RealmRegistry;
use overlore_types::{EventId, ParsedEvent, StoredEvent};
use sqlx::{Connection, SqliteConnection};
use tokio::sync::{Mutex, MutexGuard};

use crate::error::DbError;
use crate::geometry::{POINT_SRID, decode_point, encode_point};
use crate::sqlite::{self, INSERT_POINT_INDEX, SqliteConfig};

/// Importance written for every inserted row.
///
/// Differs from the importance the decoder computes
/// (`overlore_events::DECODED_IMPORTANCE`). Downstream readers expect the
/// fixed stored value.
pub const STORED_IMPORTANCE: i64 = 4;

const INSERT_EVENT: &str = r"
INSERT INTO events (type, importance, ts, metadata, active_pos, passive_pos)
VALUES (?, ?, ?, ?, ?, ?)";

const SELECT_EVENT_BY_ID: &str = r"
SELECT id, type, importance, ts, metadata, active_pos, passive_pos
FROM events
WHERE id = ?";

const SELECT_ALL_EVENTS: &str = r"
SELECT id, type, importance, ts, metadata, active_pos, passive_pos
FROM events
ORDER BY id";

/// A raw row from the `events` table, points still encoded.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    /// Auto-incremented row id.
    pub id: i64,
    /// Event type code.
    #[sqlx(rename = "type")]
    pub kind_code: i64,
    /// Stored importance.
    pub importance: i64,
    /// Ledger timestamp.
    pub ts: i64,
    /// JSON remainder of the variant fields.
    pub metadata: Option<String>,
    /// Encoded position of the acting realm.
    pub active_pos: Vec<u8>,
    /// Encoded position of the receiving realm.
    pub passive_pos: Vec<u8>,
}

impl TryFrom<EventRow> for StoredEvent {
    type Error = DbError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: EventId(row.id),
            kind_code: row.kind_code,
            importance: row.importance,
            ts: row.ts,
            metadata: row.metadata.unwrap_or_default(),
            active_pos: decode_point(&row.active_pos)?.position_in(POINT_SRID)?,
            passive_pos: decode_point(&row.passive_pos)?.position_in(POINT_SRID)?,
        })
    }
}

/// Event persistence and lookup over one locked connection.
pub struct EventStore {
    conn: Mutex<Option<SqliteConnection>>,
    lock_timeout: Duration,
    /// Write R*Tree index entries on insert (plain mode only).
    index_points: bool,
    registry: Arc<RealmRegistry>,
    selectors: EventSelectors,
}

impl core::fmt::Debug for EventStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventStore")
            .field("lock_timeout", &self.lock_timeout)
            .field("index_points", &self.index_points)
            .field("realms", &self.registry.len())
            .field("selectors", &self.selectors)
            .finish_non_exhaustive()
    }
}

impl EventStore {
    /// Open the backing file, creating the schema on first launch.
    ///
    /// The realm registry is used by [`EventStore::process_event`] to resolve
    /// positions; it is shared read-only.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] or [`DbError::Schema`] if the file cannot
    /// be opened or initialized.
    pub async fn init(config: &SqliteConfig, registry: Arc<RealmRegistry>) -> Result<Self, DbError> {
        let conn = sqlite::open(config).await?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
            lock_timeout: config.lock_timeout,
            index_points: !config.uses_spatialite(),
            registry,
            selectors: EventSelectors::default(),
        })
    }

    /// Replace the event selector table used to classify envelopes.
    #[must_use]
    pub fn with_selectors(mut self, selectors: EventSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    /// The realm registry this store decodes against.
    pub fn registry(&self) -> &RealmRegistry {
        &self.registry
    }

    /// Acquire the connection lock, waiting at most the lock timeout.
    async fn lock(&self) -> Result<MutexGuard<'_, Option<SqliteConnection>>, DbError> {
        tokio::time::timeout(self.lock_timeout, self.conn.lock())
            .await
            .map_err(|elapsed| {
                tracing::warn!(
                    timeout_ms = self.lock_timeout.as_millis(),
                    %elapsed,
                    "Connection lock wait timed out"
                );
                DbError::LockTimeout(self.lock_timeout)
            })
    }

    /// Insert a decoded event and return its assigned id.
    ///
    /// The kind, timestamp, and positions become columns; the remaining
    /// variant fields are serialized into `metadata`. The row's importance is
    /// always [`STORED_IMPORTANCE`]. The row, its spatial index entries, and
    /// the commit run in one transaction, so a failure leaves no partial
    /// row.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if the metadata cannot be encoded,
    /// [`DbError::LockTimeout`] or [`DbError::Closed`] if the connection is
    /// unavailable, or [`DbError::Sqlite`] if the insert fails.
    pub async fn add(&self, event: &ParsedEvent) -> Result<EventId, DbError> {
        let kind = event.kind();
        let metadata = event.metadata().to_json()?;
        let positions = [event.active_pos(), event.passive_pos()];
        let active_pos = encode_point(event.active_pos(), POINT_SRID);
        let passive_pos = encode_point(event.passive_pos(), POINT_SRID);

        let id = {
            let mut guard = self.lock().await?;
            let conn = guard.as_mut().ok_or(DbError::Closed)?;
            let mut tx = conn.begin().await?;
            let result = sqlx::query(INSERT_EVENT)
                .bind(kind.code())
                .bind(STORED_IMPORTANCE)
                .bind(event.ts())
                .bind(metadata)
                .bind(active_pos)
                .bind(passive_pos)
                .execute(&mut *tx)
                .await?;
            let rowid = result.last_insert_rowid();
            if self.index_points {
                for (statement, pos) in INSERT_POINT_INDEX.into_iter().zip(positions) {
                    sqlx::query(statement)
                        .bind(rowid)
                        .bind(pos.x)
                        .bind(pos.x)
                        .bind(pos.y)
                        .bind(pos.y)
                        .execute(&mut *tx)
                        .await?;
                }
            }
            tx.commit().await?;
            EventId(rowid)
        };

        tracing::debug!(
            id = %id,
            kind = %kind,
            ts = event.ts(),
            decoded_importance = event.importance(),
            "Inserted event"
        );
        Ok(id)
    }

    /// Look up one event by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if no row has this id.
    pub async fn get_by_id(&self, id: EventId) -> Result<StoredEvent, DbError> {
        let row = {
            let mut guard = self.lock().await?;
            let conn = guard.as_mut().ok_or(DbError::Closed)?;
            sqlx::query_as::<_, EventRow>(SELECT_EVENT_BY_ID)
                .bind(id.into_inner())
                .fetch_optional(&mut *conn)
                .await?
        };
        row.ok_or(DbError::NotFound(id))?.try_into()
    }

    /// Return every stored event in ascending id order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the scan fails or a stored point is corrupt.
    pub async fn get_all(&self) -> Result<Vec<StoredEvent>, DbError> {
        let rows = {
            let mut guard = self.lock().await?;
            let conn = guard.as_mut().ok_or(DbError::Closed)?;
            sqlx::query_as::<_, EventRow>(SELECT_ALL_EVENTS)
                .fetch_all(&mut *conn)
                .await?
        };
        rows.into_iter().map(StoredEvent::try_from).collect()
    }

    /// Number of rows in the `events` table.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub async fn count(&self) -> Result<i64, DbError> {
        let mut guard = self.lock().await?;
        let conn = guard.as_mut().ok_or(DbError::Closed)?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
            .fetch_one(&mut *conn)
            .await?;
        Ok(count)
    }

    /// Validate, decode, and insert one raw envelope.
    ///
    /// Decoding happens before the lock is taken; a bad envelope never
    /// reaches the connection.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Decode`] for malformed envelopes, unknown
    /// discriminants, wire-format violations, and unknown realms, plus any
    /// error of [`EventStore::add`].
    pub async fn process_event(&self, envelope: &RawEventEnvelope) -> Result<EventId, DbError> {
        let event = decode_envelope(&self.registry, &self.selectors, envelope)?;
        self.add(&event).await
    }

    /// Close the connection. Later operations fail with [`DbError::Closed`].
    ///
    /// Closing an already-closed store is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::LockTimeout`] if the lock is held past the
    /// timeout, or [`DbError::Sqlite`] if closing the connection fails.
    pub async fn close(&self) -> Result<(), DbError> {
        let conn = self.lock().await?.take();
        if let Some(conn) = conn {
            conn.close().await?;
            tracing::info!("Event store closed");
        }
        Ok(())
    }

    /// Whether [`EventStore::close`] has been called.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::LockTimeout`] if the lock is held past the timeout.
    pub async fn is_closed(&self) -> Result<bool, DbError> {
        Ok(self.lock().await?.is_none())
    }
}
