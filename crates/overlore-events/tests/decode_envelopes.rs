//! End-to-end decoding of feed-shaped JSON envelopes.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use overlore_events::{
    COMBAT_OUTCOME_SELECTOR, DecodeError, EventSelectors, RawEventEnvelope, decode_envelope,
};
use overlore_realms::RealmRegistry;
use overlore_types::{EventKind, ParsedEvent};

fn registry() -> RealmRegistry {
    RealmRegistry::from_json(
        r#"[{"realm_id": 17, "x": 1.0, "y": 2.0}, {"realm_id": 18, "x": 3.0, "y": 4.0}]"#,
    )
    .expect("registry")
}

fn padded(value: u64) -> String {
    format!("0x{value:064x}")
}

#[test]
fn decodes_zero_padded_combat_envelope() {
    let json = serde_json::json!({
        "eventEmitted": {
            "keys": [COMBAT_OUTCOME_SELECTOR, padded(17), padded(18)],
            "data": [
                padded(1), padded(900),
                padded(1), padded(2), padded(5000),
                padded(900), padded(7), padded(1_705_000_000),
            ],
        }
    });
    let envelope: RawEventEnvelope = serde_json::from_value(json).expect("envelope");

    let event = decode_envelope(&registry(), &EventSelectors::default(), &envelope)
        .expect("decodes");
    assert_eq!(event.kind(), EventKind::CombatOutcome);
    let ParsedEvent::CombatOutcome(combat) = event else {
        panic!("expected combat outcome");
    };
    assert_eq!(combat.attacking_entity_ids, vec![900]);
    assert_eq!(combat.stolen_resources.first().map(|r| r.amount), Some(5));
    assert_eq!(combat.winner, 900);
    assert_eq!(combat.damage, 7);
    assert_eq!(combat.ts, 1_705_000_000);
}

#[test]
fn custom_selectors_are_honoured() {
    let selectors = EventSelectors::new("0xc0", "0x7a");
    let envelope = RawEventEnvelope::new(["0x7a", "0x1"], ["0x11", "0x12", "0x0", "0x0", "0x1"]);
    let event = decode_envelope(&registry(), &selectors, &envelope).expect("decodes");
    assert_eq!(event.kind(), EventKind::TradeAccepted);

    // The default combat selector is unknown to this table.
    let envelope = RawEventEnvelope::new([COMBAT_OUTCOME_SELECTOR], ["0x0"]);
    assert!(matches!(
        decode_envelope(&registry(), &selectors, &envelope),
        Err(DecodeError::UnknownDiscriminant(_))
    ));
}

#[test]
fn envelope_without_data_is_malformed() {
    let envelope: RawEventEnvelope =
        serde_json::from_str(r#"{"eventEmitted": {"keys": ["0x1"]}}"#).expect("envelope");
    assert!(matches!(
        decode_envelope(&registry(), &EventSelectors::default(), &envelope),
        Err(DecodeError::MalformedEnvelope(_))
    ));
}
