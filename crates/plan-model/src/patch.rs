//! Partial aggregates and the overlay rule
//!
//! A [`ProjectPatch`] supplies values for a subset of slots. It is only ever
//! used as input to [`overlay`]; it is never stored as a state.
//!
//! # Merge rule
//! Per supplied slot, the patch value replaces the whole collection (or the
//! whole project record). There is no element-wise splice: a record absent
//! from a supplied slot is gone after the overlay. Slots the patch does not
//! mention keep their current content.

use crate::collection::Collection;
use crate::error::ModelError;
use crate::record::ProjectRecord;
use crate::slot::{Slot, PROJECT_SLOT};
use crate::state::ProjectState;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Validation rules applied when parsing untrusted patch documents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchRules {
    /// Every record must carry `created_at` and `updated_at`
    pub require_timestamps: bool,
}

/// Partial aggregate: each slot optional
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectPatch {
    project: Option<ProjectRecord>,
    slots: BTreeMap<Slot, Collection>,
}

impl ProjectPatch {
    /// Empty patch (overlay is the identity)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an untrusted patch document
    ///
    /// Keys whose value is `null` count as not supplied.
    ///
    /// # Errors
    /// Returns error if the document is not an object, names an unknown
    /// slot, or carries a malformed record; nothing is partially accepted
    pub fn from_value(value: &Value, rules: PatchRules) -> Result<Self, ModelError> {
        let Value::Object(map) = value else {
            return Err(ModelError::shape("$", "object"));
        };

        let mut patch = Self::new();
        for (key, slot_value) in map {
            if slot_value.is_null() {
                continue;
            }
            if key == PROJECT_SLOT {
                patch.project = Some(ProjectRecord::from_value(slot_value, PROJECT_SLOT)?);
                continue;
            }
            let slot: Slot = key.parse()?;
            let collection = Collection::from_value(slot_value, slot.as_str())
                .map_err(|e| e.in_slot(slot.as_str()))?;
            if rules.require_timestamps {
                for record in &collection {
                    record
                        .require_timestamps()
                        .map_err(|e| e.in_slot(slot.as_str()))?;
                }
            }
            patch.slots.insert(slot, collection);
        }
        Ok(patch)
    }

    /// Builder-style project setter
    #[must_use]
    pub fn with_project(mut self, project: ProjectRecord) -> Self {
        self.project = Some(project);
        self
    }

    /// Builder-style slot setter
    #[must_use]
    pub fn with_slot(mut self, slot: Slot, collection: Collection) -> Self {
        self.slots.insert(slot, collection);
        self
    }

    /// Supplied project record
    #[inline]
    #[must_use]
    pub fn project(&self) -> Option<&ProjectRecord> {
        self.project.as_ref()
    }

    /// Supplied collection for a slot
    #[inline]
    #[must_use]
    pub fn slot(&self, slot: Slot) -> Option<&Collection> {
        self.slots.get(&slot)
    }

    /// Slots this patch replaces
    pub fn touched_slots(&self) -> impl Iterator<Item = Slot> + '_ {
        self.slots.keys().copied()
    }

    /// Check if the patch supplies nothing
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.project.is_none() && self.slots.is_empty()
    }
}

impl Serialize for ProjectPatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.slots.len() + usize::from(self.project.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(project) = &self.project {
            map.serialize_entry(PROJECT_SLOT, project)?;
        }
        for (slot, collection) in &self.slots {
            map.serialize_entry(slot.as_str(), collection)?;
        }
        map.end()
    }
}

/// Apply a patch to a base state, producing a new state
///
/// The base is not modified; the result is built from a deep clone of it.
#[must_use]
pub fn overlay(base: &ProjectState, patch: &ProjectPatch) -> ProjectState {
    overlay_owned(base.clone_aggregate(), patch)
}

/// Apply a patch to an owned state
#[must_use]
pub fn overlay_owned(mut state: ProjectState, patch: &ProjectPatch) -> ProjectState {
    if let Some(project) = &patch.project {
        state.set_project(project.clone());
    }
    for (slot, collection) in &patch.slots {
        state.replace_collection(*slot, collection.clone());
    }
    state
}
