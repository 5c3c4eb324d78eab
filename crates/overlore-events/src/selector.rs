//! Event discriminants: mapping `keys[0]` to an [`EventKind`].
//!
//! On-chain events are keyed by their selector, the `sn_keccak` hash of the
//! event name. Comparison is done on normalized words so zero-padding and
//! case differences between feeds do not matter.

use overlore_types::EventKind;

use crate::error::DecodeError;
use crate::word::normalize_word;

/// Selector of the `CombatOutcome` event.
pub const COMBAT_OUTCOME_SELECTOR: &str =
    "0x1736c207163ad481e2a196c0fb6394f90c66c2e2b52e0c03d4a077ac6cea918";

/// Selector of the `OrderAccepted` (trade accepted) event.
pub const ORDER_ACCEPTED_SELECTOR: &str =
    "0x20e86edfa14c93309aa6559742e993d42d48507f3bf654a12d77a54f10f8945";

/// Table of known event selectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSelectors {
    combat_outcome: String,
    trade_accepted: String,
}

impl EventSelectors {
    /// Build a table from the two selector words.
    pub fn new(combat_outcome: &str, trade_accepted: &str) -> Self {
        Self {
            combat_outcome: normalize_word(combat_outcome),
            trade_accepted: normalize_word(trade_accepted),
        }
    }

    /// Determine the event kind from the first key word.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownDiscriminant`] if the word matches
    /// neither selector.
    pub fn classify(&self, key: &str) -> Result<EventKind, DecodeError> {
        let normalized = normalize_word(key);
        if normalized == self.combat_outcome {
            Ok(EventKind::CombatOutcome)
        } else if normalized == self.trade_accepted {
            Ok(EventKind::TradeAccepted)
        } else {
            Err(DecodeError::UnknownDiscriminant(key.to_owned()))
        }
    }
}

impl Default for EventSelectors {
    fn default() -> Self {
        Self::new(COMBAT_OUTCOME_SELECTOR, ORDER_ACCEPTED_SELECTOR)
    }
}
