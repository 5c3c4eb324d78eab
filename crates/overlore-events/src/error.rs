//! Error types for envelope validation and wire decoding.
//!
//! A [`DecodeError`] never leaves partial state behind: the decoder is a
//! pure function of its inputs and the realm registry.

use overlore_realms::RealmError;

/// Errors that can occur while turning an envelope into a typed event.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The envelope is missing `eventEmitted`, `keys`, or `data`, or one of
    /// them is empty.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(&'static str),

    /// `keys[0]` matches none of the known event selectors.
    #[error("unknown event discriminant: {0}")]
    UnknownDiscriminant(String),

    /// A read would consume more words than remain in the stream.
    #[error("truncated {field}: needed {needed} words, {remaining} remaining")]
    Truncated {
        /// The field being decoded.
        field: &'static str,
        /// Words the read required.
        needed: usize,
        /// Words left in the stream.
        remaining: usize,
    },

    /// A required key word is absent.
    #[error("missing key at index {0}")]
    MissingKey(usize),

    /// A word is not a hex-encoded unsigned integer.
    #[error("invalid hex word: {0:?}")]
    InvalidWord(String),

    /// A word is valid hex but does not fit the field it decodes into.
    #[error("{field} out of range: {value}")]
    WordOutOfRange {
        /// The field being decoded.
        field: &'static str,
        /// The decoded value, or `u128::MAX` when wider than 128 bits.
        value: u128,
    },

    /// A referenced realm is not in the registry.
    #[error(transparent)]
    Realm(#[from] RealmError),
}
