//! Event records: the transient [`ParsedEvent`] produced by the decoder and
//! the persisted [`StoredEvent`] projection read back from the store.
//!
//! Fields that the store materializes as first-class columns (kind,
//! importance, timestamp, both positions) live on the variant structs next to
//! the variant-specific fields. [`EventMetadata`] is the remainder that gets
//! serialized into the opaque `metadata` column.

use serde::de::Error as _;
use serde::{Deserialize, Serialize};

use crate::enums::EventKind;
use crate::ids::EventId;

// ---------------------------------------------------------------------------
// Positions and resources
// ---------------------------------------------------------------------------

/// Position of a realm in the shared 2-D coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RealmPosition {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl RealmPosition {
    /// Create a position from its two coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The position as an `(x, y)` pair.
    pub const fn as_tuple(self) -> (f64, f64) {
        (self.x, self.y)
    }
}

impl From<(f64, f64)> for RealmPosition {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// A quantity of one resource type.
///
/// `amount` is already scaled down from the on-wire raw quantity
/// (raw / [`ResourceAmount::WIRE_SCALE`], integer division).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAmount {
    /// Resource type identifier.
    #[serde(rename = "type")]
    pub resource_type: u64,
    /// Scaled amount.
    pub amount: u64,
}

impl ResourceAmount {
    /// Fixed divisor between the raw wire quantity and the stored amount.
    pub const WIRE_SCALE: u128 = 1000;
}

// ---------------------------------------------------------------------------
// Decoded variants
// ---------------------------------------------------------------------------

/// Decoded `CombatOutcome` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatOutcome {
    /// Position of the attacking realm.
    pub active_pos: RealmPosition,
    /// Position of the targeted realm.
    pub passive_pos: RealmPosition,
    /// Entities that took part in the attack.
    pub attacking_entity_ids: Vec<u64>,
    /// Resources taken from the target.
    pub stolen_resources: Vec<ResourceAmount>,
    /// Entity id of the winning side.
    pub winner: u64,
    /// Damage dealt.
    pub damage: u64,
    /// Importance computed at decode time.
    pub importance: i64,
    /// Ledger timestamp.
    pub ts: i64,
}

/// Decoded `OrderAccepted` (trade accepted) event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeAccepted {
    /// Position of the maker's realm.
    pub active_pos: RealmPosition,
    /// Position of the taker's realm.
    pub passive_pos: RealmPosition,
    /// Resources offered by the maker.
    pub resources_maker: Vec<ResourceAmount>,
    /// Resources offered by the taker.
    pub resources_taker: Vec<ResourceAmount>,
    /// Importance computed at decode time.
    pub importance: i64,
    /// Ledger timestamp.
    pub ts: i64,
}

/// A decoded event, ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedEvent {
    /// See [`CombatOutcome`].
    CombatOutcome(CombatOutcome),
    /// See [`TradeAccepted`].
    TradeAccepted(TradeAccepted),
}

impl ParsedEvent {
    /// The event kind.
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::CombatOutcome(_) => EventKind::CombatOutcome,
            Self::TradeAccepted(_) => EventKind::TradeAccepted,
        }
    }

    /// Position of the acting realm (attacker or maker).
    pub const fn active_pos(&self) -> RealmPosition {
        match self {
            Self::CombatOutcome(e) => e.active_pos,
            Self::TradeAccepted(e) => e.active_pos,
        }
    }

    /// Position of the receiving realm (target or taker).
    pub const fn passive_pos(&self) -> RealmPosition {
        match self {
            Self::CombatOutcome(e) => e.passive_pos,
            Self::TradeAccepted(e) => e.passive_pos,
        }
    }

    /// Ledger timestamp.
    pub const fn ts(&self) -> i64 {
        match self {
            Self::CombatOutcome(e) => e.ts,
            Self::TradeAccepted(e) => e.ts,
        }
    }

    /// Importance as computed by the decoder.
    pub const fn importance(&self) -> i64 {
        match self {
            Self::CombatOutcome(e) => e.importance,
            Self::TradeAccepted(e) => e.importance,
        }
    }

    /// The variant-specific fields that are not stored as columns.
    pub fn metadata(&self) -> EventMetadata {
        match self {
            Self::CombatOutcome(e) => EventMetadata::CombatOutcome(CombatMetadata {
                attacking_entity_ids: e.attacking_entity_ids.clone(),
                stolen_resources: e.stolen_resources.clone(),
                winner: e.winner,
                damage: e.damage,
            }),
            Self::TradeAccepted(e) => EventMetadata::TradeAccepted(TradeMetadata {
                resources_maker: e.resources_maker.clone(),
                resources_taker: e.resources_taker.clone(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Metadata blob
// ---------------------------------------------------------------------------

/// Serialized remainder of a `CombatOutcome`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatMetadata {
    /// Entities that took part in the attack.
    pub attacking_entity_ids: Vec<u64>,
    /// Resources taken from the target.
    pub stolen_resources: Vec<ResourceAmount>,
    /// Entity id of the winning side.
    pub winner: u64,
    /// Damage dealt.
    pub damage: u64,
}

/// Serialized remainder of a `TradeAccepted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeMetadata {
    /// Resources offered by the maker.
    pub resources_maker: Vec<ResourceAmount>,
    /// Resources offered by the taker.
    pub resources_taker: Vec<ResourceAmount>,
}

/// Contents of the `metadata` column.
///
/// Serialized untagged: the kind lives in the `type` column, so the JSON
/// object only carries the variant's own fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EventMetadata {
    /// Remainder of a combat outcome.
    CombatOutcome(CombatMetadata),
    /// Remainder of an accepted trade.
    TradeAccepted(TradeMetadata),
}

impl EventMetadata {
    /// Serialize to the JSON text stored in the `metadata` column.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse the `metadata` column for a row of the given kind.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if the text does not match the
    /// kind's shape.
    pub fn from_json(kind: EventKind, json: &str) -> Result<Self, serde_json::Error> {
        match kind {
            EventKind::CombatOutcome => serde_json::from_str(json).map(Self::CombatOutcome),
            EventKind::TradeAccepted => serde_json::from_str(json).map(Self::TradeAccepted),
        }
    }
}

// ---------------------------------------------------------------------------
// Stored projection
// ---------------------------------------------------------------------------

/// A row of the `events` table with both spatial points decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Row id assigned at insertion.
    pub id: EventId,
    /// Raw `type` column value (see [`EventKind::code`]).
    #[serde(rename = "type")]
    pub kind_code: i64,
    /// Stored importance.
    pub importance: i64,
    /// Ledger timestamp.
    pub ts: i64,
    /// Opaque JSON remainder of the variant fields.
    pub metadata: String,
    /// Position of the acting realm.
    pub active_pos: RealmPosition,
    /// Position of the receiving realm.
    pub passive_pos: RealmPosition,
}

/// Flat tuple shape consumed by downstream readers:
/// `(id, type, importance, ts, metadata, (active_x, active_y), (passive_x, passive_y))`.
pub type StoredEventTuple = (i64, i64, i64, i64, String, (f64, f64), (f64, f64));

impl StoredEvent {
    /// The event kind, if the stored code is known.
    pub const fn kind(&self) -> Option<EventKind> {
        EventKind::from_code(self.kind_code)
    }

    /// Decode the `metadata` column into the variant-specific fields.
    ///
    /// # Errors
    ///
    /// Fails when the stored type code is unknown or the metadata text does
    /// not match the kind's shape.
    pub fn details(&self) -> Result<EventMetadata, serde_json::Error> {
        let kind = self.kind().ok_or_else(|| {
            serde_json::Error::custom(format!("unknown event type code {}", self.kind_code))
        })?;
        EventMetadata::from_json(kind, &self.metadata)
    }

    /// Rebuild the full decoded event from the columns and metadata.
    ///
    /// The importance is the stored one, not the value the decoder computed.
    ///
    /// # Errors
    ///
    /// See [`StoredEvent::details`].
    pub fn to_parsed(&self) -> Result<ParsedEvent, serde_json::Error> {
        Ok(match self.details()? {
            EventMetadata::CombatOutcome(meta) => ParsedEvent::CombatOutcome(CombatOutcome {
                active_pos: self.active_pos,
                passive_pos: self.passive_pos,
                attacking_entity_ids: meta.attacking_entity_ids,
                stolen_resources: meta.stolen_resources,
                winner: meta.winner,
                damage: meta.damage,
                importance: self.importance,
                ts: self.ts,
            }),
            EventMetadata::TradeAccepted(meta) => ParsedEvent::TradeAccepted(TradeAccepted {
                active_pos: self.active_pos,
                passive_pos: self.passive_pos,
                resources_maker: meta.resources_maker,
                resources_taker: meta.resources_taker,
                importance: self.importance,
                ts: self.ts,
            }),
        })
    }

    /// Flatten into the tuple shape downstream readers consume.
    pub fn into_tuple(self) -> StoredEventTuple {
        (
            self.id.into_inner(),
            self.kind_code,
            self.importance,
            self.ts,
            self.metadata,
            self.active_pos.as_tuple(),
            self.passive_pos.as_tuple(),
        )
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

    use super::*;

    fn combat() -> ParsedEvent {
        ParsedEvent::CombatOutcome(CombatOutcome {
            active_pos: RealmPosition::new(1.5, 2.5),
            passive_pos: RealmPosition::new(-3.0, 4.0),
            attacking_entity_ids: vec![10, 11],
            stolen_resources: vec![ResourceAmount {
                resource_type: 3,
                amount: 5,
            }],
            winner: 1,
            damage: 40,
            importance: 0,
            ts: 1_700_000_000,
        })
    }

    #[test]
    fn combat_metadata_json_shape() {
        let json = combat().metadata().to_json().unwrap();
        assert_eq!(
            json,
            r#"{"attacking_entity_ids":[10,11],"stolen_resources":[{"type":3,"amount":5}],"winner":1,"damage":40}"#
        );
    }

    #[test]
    fn trade_metadata_json_shape() {
        let meta = EventMetadata::TradeAccepted(TradeMetadata {
            resources_maker: vec![ResourceAmount {
                resource_type: 1,
                amount: 2,
            }],
            resources_taker: vec![],
        });
        assert_eq!(
            meta.to_json().unwrap(),
            r#"{"resources_maker":[{"type":1,"amount":2}],"resources_taker":[]}"#
        );
    }

    #[test]
    fn stored_event_rebuilds_parsed_event() {
        let parsed = combat();
        let stored = StoredEvent {
            id: EventId(1),
            kind_code: parsed.kind().code(),
            importance: 0,
            ts: parsed.ts(),
            metadata: parsed.metadata().to_json().unwrap(),
            active_pos: parsed.active_pos(),
            passive_pos: parsed.passive_pos(),
        };
        assert_eq!(stored.to_parsed().unwrap(), parsed);
    }

    #[test]
    fn unknown_kind_code_fails_details() {
        let stored = StoredEvent {
            id: EventId(1),
            kind_code: 9,
            importance: 4,
            ts: 0,
            metadata: "{}".to_owned(),
            active_pos: RealmPosition::new(0.0, 0.0),
            passive_pos: RealmPosition::new(0.0, 0.0),
        };
        assert!(stored.details().is_err());
    }

    #[test]
    fn tuple_shape() {
        let stored = StoredEvent {
            id: EventId(7),
            kind_code: 2,
            importance: 4,
            ts: 99,
            metadata: "{}".to_owned(),
            active_pos: RealmPosition::new(1.0, 2.0),
            passive_pos: RealmPosition::new(3.0, 4.0),
        };
        let (id, kind, importance, ts, _, active, passive) = stored.into_tuple();
        assert_eq!((id, kind, importance, ts), (7, 2, 4, 99));
        assert_eq!(active, (1.0, 2.0));
        assert_eq!(passive, (3.0, 4.0));
    }
}
