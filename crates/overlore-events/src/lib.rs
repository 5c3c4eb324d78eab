//! Envelope validation and wire decoding for the Overlore event ingestion
//! service.
//!
//! The decoder turns an opaque envelope of hex words into a typed
//! [`ParsedEvent`](overlore_types::ParsedEvent). It holds no state of its
//! own and only reads the [`RealmRegistry`](overlore_realms::RealmRegistry),
//! so any number of envelopes can be decoded concurrently.
//!
//! # Modules
//!
//! - [`envelope`] -- [`RawEventEnvelope`] and its shape validation
//! - [`selector`] -- [`EventSelectors`], `keys[0]` to event kind
//! - [`word`] -- Hex word parsing and range narrowing
//! - [`cursor`] -- [`WordCursor`] for length-prefixed reads
//! - [`decoder`] -- Per-kind decoding and [`decode_envelope`]
//! - [`error`] -- [`DecodeError`]

pub mod cursor;
pub mod decoder;
pub mod envelope;
pub mod error;
pub mod selector;
pub mod word;

pub use cursor::WordCursor;
pub use decoder::{DECODED_IMPORTANCE, decode_envelope, decode_event};
pub use envelope::{EmittedEvent, RawEventEnvelope, ValidatedEvent};
pub use error::DecodeError;
pub use selector::{COMBAT_OUTCOME_SELECTOR, EventSelectors, ORDER_ACCEPTED_SELECTOR};
