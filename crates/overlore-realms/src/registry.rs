//! The realm registry: an immutable map from realm id to map position.
//!
//! The registry is built exactly once at startup, either from an iterator
//! of [`RealmEntry`] values or from a JSON realms file, and is never mutated
//! afterwards. Share it behind an `Arc` and read it from any number of tasks
//! without locking.

use std::collections::BTreeMap;
use std::path::Path;

use overlore_types::{RealmId, RealmPosition};
use serde::Deserialize;

use crate::error::RealmError;

/// One record of the realms file.
///
/// The file is a JSON array of these objects:
///
/// ```json
/// [{ "realm_id": 1, "x": 6.5, "y": -3.25 }]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RealmEntry {
    /// Realm identifier.
    pub realm_id: RealmId,
    /// Horizontal map coordinate.
    pub x: f64,
    /// Vertical map coordinate.
    pub y: f64,
}

/// Read-only mapping from realm id to its position.
#[derive(Debug, Clone, Default)]
pub struct RealmRegistry {
    positions: BTreeMap<RealmId, RealmPosition>,
}

impl RealmRegistry {
    /// Build a registry from a set of entries.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::DuplicateRealm`] if an id appears twice, or
    /// [`RealmError::NonFiniteCoordinate`] for NaN/infinite coordinates.
    pub fn from_entries<I>(entries: I) -> Result<Self, RealmError>
    where
        I: IntoIterator<Item = RealmEntry>,
    {
        let mut positions = BTreeMap::new();
        for entry in entries {
            if !entry.x.is_finite() || !entry.y.is_finite() {
                return Err(RealmError::NonFiniteCoordinate(entry.realm_id));
            }
            if positions
                .insert(entry.realm_id, RealmPosition::new(entry.x, entry.y))
                .is_some()
            {
                return Err(RealmError::DuplicateRealm(entry.realm_id));
            }
        }
        Ok(Self { positions })
    }

    /// Parse a registry from the JSON text of a realms file.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::Parse`] for malformed JSON, plus anything
    /// [`RealmRegistry::from_entries`] rejects.
    pub fn from_json(json: &str) -> Result<Self, RealmError> {
        let entries: Vec<RealmEntry> = serde_json::from_str(json)?;
        Self::from_entries(entries)
    }

    /// Load the full registry from a realms file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::Io`] if the file cannot be read, otherwise see
    /// [`RealmRegistry::from_json`].
    pub fn init(path: &Path) -> Result<Self, RealmError> {
        let contents = std::fs::read_to_string(path).map_err(|source| RealmError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::from_json(&contents)?;
        tracing::info!(
            path = %path.display(),
            realm_count = registry.len(),
            "Realm registry loaded"
        );
        Ok(registry)
    }

    /// Resolve the position of a realm.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::RealmNotFound`] if the id is unknown.
    pub fn position_by_id(&self, id: RealmId) -> Result<RealmPosition, RealmError> {
        self.positions
            .get(&id)
            .copied()
            .ok_or(RealmError::RealmNotFound(id))
    }

    /// Whether the registry knows this realm.
    pub fn contains(&self, id: RealmId) -> bool {
        self.positions.contains_key(&id)
    }

    /// Number of realms in the registry.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

    use super::*;

    fn entry(id: u64, x: f64, y: f64) -> RealmEntry {
        RealmEntry {
            realm_id: RealmId(id),
            x,
            y,
        }
    }

    #[test]
    fn resolves_known_realm() {
        let registry =
            RealmRegistry::from_entries([entry(1, 10.0, 20.0), entry(2, -5.5, 0.25)]).unwrap();
        let pos = registry.position_by_id(RealmId(2)).unwrap();
        assert_eq!(pos.as_tuple(), (-5.5, 0.25));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn unknown_realm_is_not_found() {
        let registry = RealmRegistry::from_entries([entry(1, 0.0, 0.0)]).unwrap();
        let err = registry.position_by_id(RealmId(99)).unwrap_err();
        assert!(matches!(err, RealmError::RealmNotFound(RealmId(99))));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = RealmRegistry::from_entries([entry(4, 0.0, 0.0), entry(4, 1.0, 1.0)])
            .unwrap_err();
        assert!(matches!(err, RealmError::DuplicateRealm(RealmId(4))));
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        let err = RealmRegistry::from_entries([entry(3, f64::NAN, 0.0)]).unwrap_err();
        assert!(matches!(err, RealmError::NonFiniteCoordinate(RealmId(3))));
    }

    #[test]
    fn parses_json_array() {
        let registry =
            RealmRegistry::from_json(r#"[{"realm_id": 7, "x": 1, "y": 2.5}]"#).unwrap();
        assert!(registry.contains(RealmId(7)));
        assert_eq!(
            registry.position_by_id(RealmId(7)).unwrap().as_tuple(),
            (1.0, 2.5)
        );
    }

    #[test]
    fn rejects_wrong_shape() {
        let err = RealmRegistry::from_json(r#"{"realm_id": 7}"#).unwrap_err();
        assert!(matches!(err, RealmError::Parse(_)));
    }
}
