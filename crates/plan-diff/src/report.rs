//! Diff report types
//!
//! A [`DiffReport`] holds one [`SlotDiff`] per [`SlotRef`]. It is derived
//! data: always recomputed from a `(base, candidate)` pair, never edited.

use plan_model::SlotRef;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Kind of change a record underwent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Present only in the candidate
    Added,
    /// Present in both, content differs
    Modified,
    /// Present only in the base
    Deleted,
}

/// A record present on both sides with different content
///
/// `before` and `after` are full record snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modification {
    /// Record id (`"project"` for the singleton)
    pub id: String,
    /// Base snapshot
    pub before: Value,
    /// Candidate snapshot
    pub after: Value,
}

/// Changes within one slot
///
/// # Invariants
/// - `additions`, `deletions` and the ids of `modifications` are pairwise disjoint
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SlotDiff {
    /// Ids present only in the candidate, in candidate order
    pub additions: Vec<String>,
    /// Records changed between base and candidate, in candidate order
    pub modifications: Vec<Modification>,
    /// Ids present only in the base, in base order
    pub deletions: Vec<String>,
}

impl SlotDiff {
    /// Check if the slot has no changes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.modifications.is_empty() && self.deletions.is_empty()
    }

    /// Number of changed records
    #[inline]
    #[must_use]
    pub fn change_count(&self) -> usize {
        self.additions.len() + self.modifications.len() + self.deletions.len()
    }

    /// Change kind for a record id, if it changed
    #[must_use]
    pub fn change_for(&self, id: &str) -> Option<ChangeKind> {
        if self.additions.iter().any(|a| a == id) {
            Some(ChangeKind::Added)
        } else if self.modifications.iter().any(|m| m.id == id) {
            Some(ChangeKind::Modified)
        } else if self.deletions.iter().any(|d| d == id) {
            Some(ChangeKind::Deleted)
        } else {
            None
        }
    }

    /// Modification entry for a record id
    #[must_use]
    pub fn modification(&self, id: &str) -> Option<&Modification> {
        self.modifications.iter().find(|m| m.id == id)
    }
}

/// Aggregate counts across a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiffSummary {
    /// Records added across all slots
    pub additions: usize,
    /// Records modified across all slots
    pub modifications: usize,
    /// Records deleted across all slots
    pub deletions: usize,
    /// Slots with at least one change
    pub slots_changed: usize,
}

impl DiffSummary {
    /// Total changed records
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.additions + self.modifications + self.deletions
    }
}

/// Per-slot differences between a base and a candidate aggregate
///
/// Lookup by slot is O(1); the total change count is cached.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffReport {
    slots: Vec<SlotDiff>,
    total: usize,
}

impl DiffReport {
    /// Report with no changes in any slot
    #[must_use]
    pub fn empty() -> Self {
        Self {
            slots: vec![SlotDiff::default(); SlotRef::COUNT],
            total: 0,
        }
    }

    /// Set the diff for one slot
    pub(crate) fn set(&mut self, slot: SlotRef, diff: SlotDiff) {
        let entry = &mut self.slots[slot.index()];
        self.total = self.total - entry.change_count() + diff.change_count();
        *entry = diff;
    }

    /// Diff for one slot (empty if unchanged)
    #[inline]
    #[must_use]
    pub fn slot(&self, slot: impl Into<SlotRef>) -> &SlotDiff {
        &self.slots[slot.into().index()]
    }

    /// Check if a slot has any change
    #[inline]
    #[must_use]
    pub fn has_changes(&self, slot: impl Into<SlotRef>) -> bool {
        !self.slot(slot).is_empty()
    }

    /// Total changed records across all slots
    #[inline]
    #[must_use]
    pub fn total_changes(&self) -> usize {
        self.total
    }

    /// Check if nothing changed anywhere
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Slots with at least one change, in canonical order
    pub fn changed_slots(&self) -> impl Iterator<Item = (SlotRef, &SlotDiff)> {
        SlotRef::all()
            .zip(self.slots.iter())
            .filter(|(_, diff)| !diff.is_empty())
    }

    /// Change kind for a record in a slot
    #[must_use]
    pub fn change_for(&self, slot: impl Into<SlotRef>, id: &str) -> Option<ChangeKind> {
        self.slot(slot).change_for(id)
    }

    /// Aggregate counts
    #[must_use]
    pub fn summary(&self) -> DiffSummary {
        self.changed_slots()
            .fold(DiffSummary::default(), |mut acc, (_, diff)| {
                acc.additions += diff.additions.len();
                acc.modifications += diff.modifications.len();
                acc.deletions += diff.deletions.len();
                acc.slots_changed += 1;
                acc
            })
    }
}

impl Default for DiffReport {
    fn default() -> Self {
        Self::empty()
    }
}

impl Serialize for DiffReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (slot, diff) in self.changed_slots() {
            map.serialize_entry(slot.as_str(), diff)?;
        }
        map.end()
    }
}
