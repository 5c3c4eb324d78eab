//! Raw envelopes as delivered by the subscription feed.
//!
//! The feed wraps each emitted event as
//! `{ "eventEmitted": { "keys": [...], "data": [...] } }`. Every level is
//! optional at the serde layer so that a structurally wrong envelope still
//! deserializes and is rejected by [`RawEventEnvelope::validate`] with a
//! typed error instead of a JSON error.

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// The inner `eventEmitted` object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmittedEvent {
    /// Key words; `keys[0]` is the event selector.
    #[serde(default)]
    pub keys: Option<Vec<String>>,
    /// Data words.
    #[serde(default)]
    pub data: Option<Vec<String>>,
}

/// A raw event record from the feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEventEnvelope {
    /// The emitted event, if present.
    #[serde(rename = "eventEmitted", default)]
    pub event_emitted: Option<EmittedEvent>,
}

/// Borrowed view of an envelope that passed validation.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedEvent<'a> {
    /// Non-empty key words.
    pub keys: &'a [String],
    /// Non-empty data words.
    pub data: &'a [String],
}

impl ValidatedEvent<'_> {
    /// The selector word (`keys[0]`).
    pub fn selector(&self) -> Option<&str> {
        self.keys.first().map(String::as_str)
    }
}

impl RawEventEnvelope {
    /// Build an envelope from key and data words.
    pub fn new<K, D>(keys: K, data: D) -> Self
    where
        K: IntoIterator,
        K::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            event_emitted: Some(EmittedEvent {
                keys: Some(keys.into_iter().map(Into::into).collect()),
                data: Some(data.into_iter().map(Into::into).collect()),
            }),
        }
    }

    /// Check the envelope shape.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MalformedEnvelope`] if `eventEmitted`, `keys`,
    /// or `data` is missing or empty.
    pub fn validate(&self) -> Result<ValidatedEvent<'_>, DecodeError> {
        let emitted = self
            .event_emitted
            .as_ref()
            .ok_or(DecodeError::MalformedEnvelope("eventEmitted not present in event"))?;
        let keys = emitted
            .keys
            .as_deref()
            .filter(|keys| !keys.is_empty())
            .ok_or(DecodeError::MalformedEnvelope("event had no keys"))?;
        let data = emitted
            .data
            .as_deref()
            .filter(|data| !data.is_empty())
            .ok_or(DecodeError::MalformedEnvelope("event had no data"))?;
        Ok(ValidatedEvent { keys, data })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn deserializes_feed_shape() {
        let envelope: RawEventEnvelope = serde_json::from_str(
            r#"{"eventEmitted": {"keys": ["0x1", "0x2"], "data": ["0x3"]}}"#,
        )
        .unwrap();
        let validated = envelope.validate().unwrap();
        assert_eq!(validated.keys.len(), 2);
        assert_eq!(validated.selector(), Some("0x1"));
        assert_eq!(validated.data, ["0x3".to_owned()]);
    }

    #[test]
    fn missing_wrapper_is_malformed() {
        let envelope: RawEventEnvelope =
            serde_json::from_str(r#"{"keys": ["0x1"], "data": ["0x2"]}"#).unwrap();
        assert!(matches!(
            envelope.validate(),
            Err(DecodeError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn missing_or_empty_data_is_malformed() {
        let missing: RawEventEnvelope =
            serde_json::from_str(r#"{"eventEmitted": {"keys": ["0x1"]}}"#).unwrap();
        assert!(matches!(
            missing.validate(),
            Err(DecodeError::MalformedEnvelope("event had no data"))
        ));

        let empty = RawEventEnvelope::new(["0x1"], Vec::<String>::new());
        assert!(matches!(
            empty.validate(),
            Err(DecodeError::MalformedEnvelope("event had no data"))
        ));
    }

    #[test]
    fn empty_keys_are_malformed() {
        let envelope = RawEventEnvelope::new(Vec::<String>::new(), ["0x1"]);
        assert!(matches!(
            envelope.validate(),
            Err(DecodeError::MalformedEnvelope("event had no keys"))
        ));
    }
}
