//! Realm position registry for the Overlore event ingestion service.
//!
//! Ledger events reference realms by id; the store persists their map
//! positions. This crate owns the id-to-position lookup.
//!
//! # Modules
//!
//! - [`registry`] -- [`RealmRegistry`], built once and read-only afterwards
//! - [`error`] -- [`RealmError`]

pub mod error;
pub mod registry;

pub use error::RealmError;
pub use registry::{RealmEntry, RealmRegistry};
