//! Wire decoding of ledger events into [`ParsedEvent`] values.
//!
//! # Wire layout
//!
//! ```text
//! CombatOutcome
//!   keys: [selector, attacker_realm_id, target_realm_entity_id]
//!   data: [N, id_1 .. id_N,                    attacking entity ids
//!          M, (type, raw_amount) x M,          stolen resources
//!          winner, damage, timestamp]
//!
//! OrderAccepted
//!   keys: [selector, trade_id]
//!   data: [maker_id, taker_id,
//!          M, (type, raw_amount) x M,          maker resources
//!          K, (type, raw_amount) x K,          taker resources
//!          timestamp]
//! ```
//!
//! Decoding is a pure function of the words and the realm registry. Words
//! after the last field are ignored.

use overlore_realms::RealmRegistry;
use overlore_types::{CombatOutcome, EventKind, ParsedEvent, RealmId, TradeAccepted};

use crate::cursor::WordCursor;
use crate::envelope::RawEventEnvelope;
use crate::error::DecodeError;
use crate::selector::EventSelectors;
use crate::word::{parse_word, to_i64, to_u64};

/// Importance assigned at decode time.
///
/// The store currently persists its own fixed value instead (see
/// `overlore_db::STORED_IMPORTANCE`); both are kept distinct.
pub const DECODED_IMPORTANCE: i64 = 0;

/// Parse `keys[index]` as a realm id.
fn key_realm_id(keys: &[String], index: usize, field: &'static str) -> Result<RealmId, DecodeError> {
    let word = keys.get(index).ok_or(DecodeError::MissingKey(index))?;
    Ok(RealmId(to_u64(parse_word(word)?, field)?))
}

/// Decode a `CombatOutcome` event.
///
/// # Errors
///
/// Returns [`DecodeError`] on missing keys, truncated arrays, invalid words,
/// or unknown realms.
pub fn decode_combat_outcome(
    registry: &RealmRegistry,
    keys: &[String],
    data: &[String],
) -> Result<ParsedEvent, DecodeError> {
    let attacker_id = key_realm_id(keys, 1, "attacker_realm_id")?;
    let target_id = key_realm_id(keys, 2, "target_realm_entity_id")?;

    let mut cursor = WordCursor::new(data);
    let attacking_entity_ids = cursor.read_u64_array("attacking_entity_ids")?;
    let stolen_resources = cursor.read_resources("stolen_resources")?;
    let winner = cursor.read_u64("winner")?;
    let damage = cursor.read_u64("damage")?;
    let ts = to_i64(cursor.read_word("ts")?, "ts")?;

    let active_pos = registry.position_by_id(attacker_id)?;
    let passive_pos = registry.position_by_id(target_id)?;

    tracing::debug!(
        attacker = %attacker_id,
        target = %target_id,
        attackers = attacking_entity_ids.len(),
        winner,
        damage,
        ts,
        "Decoded combat outcome"
    );

    Ok(ParsedEvent::CombatOutcome(CombatOutcome {
        active_pos,
        passive_pos,
        attacking_entity_ids,
        stolen_resources,
        winner,
        damage,
        importance: DECODED_IMPORTANCE,
        ts,
    }))
}

/// Decode an `OrderAccepted` event.
///
/// # Errors
///
/// Returns [`DecodeError`] on truncated arrays, invalid words, or unknown
/// realms.
pub fn decode_trade_accepted(
    registry: &RealmRegistry,
    keys: &[String],
    data: &[String],
) -> Result<ParsedEvent, DecodeError> {
    // The trade id is validated but not persisted.
    let trade_id = keys
        .get(1)
        .map(String::as_str)
        .map(parse_word)
        .transpose()?;

    let mut cursor = WordCursor::new(data);
    let maker_id = RealmId(cursor.read_u64("maker_id")?);
    let taker_id = RealmId(cursor.read_u64("taker_id")?);
    let resources_maker = cursor.read_resources("resources_maker")?;
    let resources_taker = cursor.read_resources("resources_taker")?;
    let ts = to_i64(cursor.read_word("ts")?, "ts")?;

    let active_pos = registry.position_by_id(maker_id)?;
    let passive_pos = registry.position_by_id(taker_id)?;

    tracing::debug!(
        ?trade_id,
        maker = %maker_id,
        taker = %taker_id,
        ts,
        "Decoded accepted trade"
    );

    Ok(ParsedEvent::TradeAccepted(TradeAccepted {
        active_pos,
        passive_pos,
        resources_maker,
        resources_taker,
        importance: DECODED_IMPORTANCE,
        ts,
    }))
}

/// Decode the words of an event whose kind is already known.
///
/// # Errors
///
/// See [`decode_combat_outcome`] and [`decode_trade_accepted`].
pub fn decode_event(
    registry: &RealmRegistry,
    kind: EventKind,
    keys: &[String],
    data: &[String],
) -> Result<ParsedEvent, DecodeError> {
    match kind {
        EventKind::CombatOutcome => decode_combat_outcome(registry, keys, data),
        EventKind::TradeAccepted => decode_trade_accepted(registry, keys, data),
    }
}

/// Validate an envelope, classify it, and decode it.
///
/// # Errors
///
/// Returns [`DecodeError::MalformedEnvelope`] for a bad envelope shape,
/// [`DecodeError::UnknownDiscriminant`] for an unknown selector, and any
/// error of [`decode_event`].
pub fn decode_envelope(
    registry: &RealmRegistry,
    selectors: &EventSelectors,
    envelope: &RawEventEnvelope,
) -> Result<ParsedEvent, DecodeError> {
    let event = envelope.validate()?;
    let selector = event
        .selector()
        .ok_or(DecodeError::MalformedEnvelope("event had no keys"))?;
    let kind = selectors.classify(selector)?;
    decode_event(registry, kind, event.keys, event.data)
}
