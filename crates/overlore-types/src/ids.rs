//! Type-safe identifier wrappers.
//!
//! Realm ids come off the wire as unsigned words; row ids are assigned by
//! `SQLite` and are therefore signed 64-bit values. Keeping them as distinct
//! newtypes prevents passing a row id where a realm id is expected.

use serde::{Deserialize, Serialize};

/// Generates a transparent newtype wrapper around an integer with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident($inner:ty)
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl $name {
            /// Return the inner integer value.
            pub const fn into_inner(self) -> $inner {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(id: $inner) -> Self {
                Self(id)
            }
        }

        impl From<$name> for $inner {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Identifier of a realm (or realm entity) referenced by ledger events.
    RealmId(u64)
}

define_id! {
    /// Row identifier assigned by the event store. Starts at 1, never reused.
    EventId(i64)
}
