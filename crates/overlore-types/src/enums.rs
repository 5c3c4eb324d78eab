//! Enumeration types shared by the decoder and the event store.

use serde::{Deserialize, Serialize};

/// The kind of a decoded ledger event.
///
/// The numeric code is what the `events.type` column holds; readers of the
/// backing file depend on these values staying fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Outcome of a battle between two realms.
    CombatOutcome,
    /// A trade order accepted by a taker.
    TradeAccepted,
}

impl EventKind {
    /// Stored `type` column value for this kind.
    pub const fn code(self) -> i64 {
        match self {
            Self::CombatOutcome => 1,
            Self::TradeAccepted => 2,
        }
    }

    /// Map a stored `type` column value back to a kind.
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::CombatOutcome),
            2 => Some(Self::TradeAccepted),
            _ => None,
        }
    }

    /// Human-readable event name, as emitted on-chain.
    pub const fn name(self) -> &'static str {
        match self {
            Self::CombatOutcome => "CombatOutcome",
            Self::TradeAccepted => "OrderAccepted",
        }
    }
}

impl core::fmt::Display for EventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for kind in [EventKind::CombatOutcome, EventKind::TradeAccepted] {
            assert_eq!(EventKind::from_code(kind.code()), Some(kind));
        }
    }

    #[test]
    fn unknown_code_is_none() {
        assert_eq!(EventKind::from_code(0), None);
        assert_eq!(EventKind::from_code(3), None);
    }
}
