//! The full project aggregate
//!
//! Defines [`ProjectState`]: the singleton project record plus exactly one
//! [`Collection`] per [`Slot`].

use crate::collection::Collection;
use crate::error::ModelError;
use crate::fingerprint::Fingerprint;
use crate::record::ProjectRecord;
use crate::slot::{Slot, PROJECT_SLOT};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Complete project aggregate
///
/// # Invariants
/// - Every slot is present (storage is a fixed array indexed by
///   [`Slot::index`], so a subset is unrepresentable)
/// - Ids are unique within each slot (upheld by [`Collection`])
///
/// `Clone` is a deep copy: the clone shares no record with the original,
/// so mutating one never affects the other.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectState {
    project: ProjectRecord,
    collections: [Collection; Slot::COUNT],
}

impl ProjectState {
    /// Create aggregate with every collection empty
    #[must_use]
    pub fn new(project: ProjectRecord) -> Self {
        Self {
            project,
            collections: std::array::from_fn(|_| Collection::default()),
        }
    }

    /// Parse a full aggregate from JSON
    ///
    /// # Errors
    /// Returns error if the value is not an object, a slot is missing or
    /// unknown, or any slot content is malformed
    pub fn from_value(value: &Value) -> Result<Self, ModelError> {
        let Value::Object(map) = value else {
            return Err(ModelError::shape("$", "object"));
        };

        for key in map.keys() {
            if key != PROJECT_SLOT {
                key.parse::<Slot>()?;
            }
        }

        let project = map
            .get(PROJECT_SLOT)
            .ok_or_else(|| ModelError::MissingSlot(PROJECT_SLOT.to_string()))
            .and_then(|v| ProjectRecord::from_value(v, PROJECT_SLOT))?;

        let mut state = Self::new(project);
        for slot in Slot::ALL {
            let value = map
                .get(slot.as_str())
                .ok_or_else(|| ModelError::MissingSlot(slot.as_str().to_string()))?;
            state.collections[slot.index()] = Collection::from_value(value, slot.as_str())
                .map_err(|e| e.in_slot(slot.as_str()))?;
        }
        Ok(state)
    }

    /// Builder-style collection setter
    #[must_use]
    pub fn with_collection(mut self, slot: Slot, collection: Collection) -> Self {
        self.collections[slot.index()] = collection;
        self
    }

    /// Deep, structurally independent copy
    #[inline]
    #[must_use]
    pub fn clone_aggregate(&self) -> Self {
        self.clone()
    }

    /// Singleton project record
    #[inline]
    #[must_use]
    pub fn project(&self) -> &ProjectRecord {
        &self.project
    }

    /// Mutable singleton project record
    #[inline]
    pub fn project_mut(&mut self) -> &mut ProjectRecord {
        &mut self.project
    }

    /// Replace the singleton project record
    #[inline]
    pub fn set_project(&mut self, project: ProjectRecord) {
        self.project = project;
    }

    /// Collection for a slot
    #[inline]
    #[must_use]
    pub fn collection(&self, slot: Slot) -> &Collection {
        &self.collections[slot.index()]
    }

    /// Mutable collection for a slot
    #[inline]
    pub fn collection_mut(&mut self, slot: Slot) -> &mut Collection {
        &mut self.collections[slot.index()]
    }

    /// Replace a collection, returning the previous one
    #[inline]
    pub fn replace_collection(&mut self, slot: Slot, collection: Collection) -> Collection {
        std::mem::replace(&mut self.collections[slot.index()], collection)
    }

    /// Iterate `(slot, collection)` pairs in canonical order
    pub fn collections(&self) -> impl Iterator<Item = (Slot, &Collection)> {
        Slot::ALL.into_iter().zip(self.collections.iter())
    }

    /// Total number of records across all collections
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.collections.iter().map(Collection::len).sum()
    }

    /// JSON form of the whole aggregate
    ///
    /// # Errors
    /// Returns error if a field value cannot be serialized
    pub fn to_value(&self) -> Result<Value, ModelError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Canonical content fingerprint
    ///
    /// # Errors
    /// Returns error if a field value cannot be serialized
    pub fn fingerprint(&self) -> Result<Fingerprint, ModelError> {
        Fingerprint::of(self)
    }
}

impl Serialize for ProjectState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Slot::COUNT + 1))?;
        map.serialize_entry(PROJECT_SLOT, &self.project)?;
        for (slot, collection) in self.collections() {
            map.serialize_entry(slot.as_str(), collection)?;
        }
        map.end()
    }
}

impl<'de> serde::Deserialize<'de> for ProjectState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = <Value as serde::Deserialize>::deserialize(deserializer)?;
        ProjectState::from_value(&value).map_err(serde::de::Error::custom)
    }
}
