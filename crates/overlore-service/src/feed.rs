//! Newline-delimited JSON envelope feed.
//!
//! Stands in for the live indexer subscription: each line of the input is
//! one `{"eventEmitted": {...}}` envelope. Lines are read as a
//! [`futures::Stream`] and handed to [`EventStore::process_event`] one at a
//! time. A line that fails to parse or decode is logged and skipped; only a
//! read error or a closed store ends ingestion early.

use std::path::Path;

use futures::{Stream, StreamExt as _};
use overlore_db::{DbError, EventStore};
use overlore_events::RawEventEnvelope;
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _, BufReader};

use crate::error::ServiceError;

/// Boxed line source (replay file or stdin).
pub type FeedReader = Box<dyn AsyncBufRead + Unpin + Send>;

/// Counters for one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionReport {
    /// Lines read from the input, blank ones included. While ingesting,
    /// this is the line number of the current envelope.
    pub lines_read: u64,
    /// Non-blank lines seen.
    pub envelopes: u64,
    /// Envelopes stored.
    pub processed: u64,
    /// Envelopes rejected (bad JSON, decode failure, store error).
    pub failed: u64,
    /// Ingestion stopped on a shutdown signal rather than end of input.
    pub interrupted: bool,
}

/// Open the configured replay file, or stdin when none is set.
///
/// # Errors
///
/// Returns [`ServiceError::Feed`] if the replay file cannot be opened.
pub async fn open_reader(replay_file: Option<&Path>) -> Result<FeedReader, ServiceError> {
    match replay_file {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|e| ServiceError::replay_file(path, e))?;
            tracing::info!(path = %path.display(), "Replaying envelopes from file");
            Ok(Box::new(BufReader::new(file)))
        }
        None => {
            tracing::info!("Reading envelopes from stdin");
            Ok(Box::new(BufReader::new(tokio::io::stdin())))
        }
    }
}

/// Turn a buffered reader into a stream of lines.
///
/// The stream ends at end of input, or right after yielding a read error.
pub fn lines<R>(reader: R) -> impl Stream<Item = std::io::Result<String>>
where
    R: AsyncBufRead + Unpin,
{
    futures::stream::unfold(Some(reader.lines()), |state| async move {
        let mut lines = state?;
        match lines.next_line().await {
            Ok(Some(line)) => Some((Ok(line), Some(lines))),
            Ok(None) => None,
            Err(e) => Some((Err(e), None)),
        }
    })
}

/// Ingest every envelope in `lines` into `store` until end of input or
/// until `shutdown` resolves, updating `report` as it goes.
///
/// `shutdown` is only checked between lines: an envelope that has started
/// processing always finishes, so every line read is counted as processed
/// or failed. `report` is borrowed so the counts survive an error return.
///
/// # Errors
///
/// Returns [`ServiceError::Feed`] on a read error, or
/// [`ServiceError::Store`] if the store has been closed.
pub async fn run_ingestion<S, F>(
    store: &EventStore,
    lines: S,
    shutdown: F,
    report: &mut IngestionReport,
) -> Result<(), ServiceError>
where
    S: Stream<Item = std::io::Result<String>>,
    F: Future<Output = ()>,
{
    let mut lines = std::pin::pin!(lines);
    let mut shutdown = std::pin::pin!(shutdown);
    loop {
        let next = tokio::select! {
            biased;
            () = &mut shutdown => {
                report.interrupted = true;
                tracing::info!(line = report.lines_read, "Shutdown requested, feed stopped");
                return Ok(());
            }
            next = lines.next() => next,
        };
        let Some(line) = next else {
            return Ok(());
        };

        let line = line.map_err(|source| ServiceError::Feed {
            source_name: "input".to_owned(),
            source,
        })?;
        report.lines_read = report.lines_read.saturating_add(1);
        let line_number = report.lines_read;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        report.envelopes = report.envelopes.saturating_add(1);

        let envelope: RawEventEnvelope = match serde_json::from_str(line) {
            Ok(envelope) => envelope,
            Err(e) => {
                report.failed = report.failed.saturating_add(1);
                tracing::warn!(line = line_number, error = %e, "Dropping unparseable envelope");
                continue;
            }
        };

        match store.process_event(&envelope).await {
            Ok(id) => {
                report.processed = report.processed.saturating_add(1);
                tracing::debug!(line = line_number, id = %id, "Stored event");
            }
            Err(DbError::Closed) => return Err(DbError::Closed.into()),
            Err(e) => {
                report.failed = report.failed.saturating_add(1);
                tracing::warn!(line = line_number, error = %e, "Dropping event");
            }
        }
    }
}
