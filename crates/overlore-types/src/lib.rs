//! Shared type definitions for the Overlore event ingestion service.
//!
//! This crate is the single source of truth for the records that flow from
//! the decoder into the event store and back out to readers.
//!
//! # Modules
//!
//! - [`ids`] -- Integer newtypes for realm and row identifiers
//! - [`enums`] -- [`EventKind`] and its stored `type` codes
//! - [`structs`] -- Decoded events, metadata blobs, and stored rows

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::EventKind;
pub use ids::{EventId, RealmId};
pub use structs::{
    CombatMetadata, CombatOutcome, EventMetadata, ParsedEvent, RealmPosition, ResourceAmount,
    StoredEvent, StoredEventTuple, TradeAccepted, TradeMetadata,
};
