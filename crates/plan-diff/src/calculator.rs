//! Diff computation
//!
//! Pure, synchronous and O(n) in the number of records: each slot is
//! compared independently through an id index built over the base side.

use crate::report::{DiffReport, Modification, SlotDiff};
use plan_model::canonical;
use plan_model::{Collection, ProjectRecord, ProjectState, Record, SlotRef, PROJECT_SLOT};
use std::collections::{HashMap, HashSet};

/// Compare two aggregates slot by slot
///
/// Every slot of the aggregate is visited, whether or not a patch touched
/// it, so the report is total over the shape.
#[must_use]
pub fn diff_states(base: &ProjectState, candidate: &ProjectState) -> DiffReport {
    let mut report = DiffReport::empty();

    let project = diff_project(base.project(), candidate.project());
    if !project.is_empty() {
        tracing::debug!(slot = PROJECT_SLOT, "project record modified");
        report.set(SlotRef::Project, project);
    }

    for ((slot, before), (_, after)) in base.collections().zip(candidate.collections()) {
        let diff = diff_collection(before, after);
        if !diff.is_empty() {
            tracing::debug!(
                slot = %slot,
                added = diff.additions.len(),
                modified = diff.modifications.len(),
                deleted = diff.deletions.len(),
                "slot changed"
            );
            report.set(SlotRef::Collection(slot), diff);
        }
    }

    report
}

/// Compare the singleton project records
///
/// Reports at most one modification, with id `"project"`.
#[must_use]
pub fn diff_project(base: &ProjectRecord, candidate: &ProjectRecord) -> SlotDiff {
    let before = base.to_value();
    let after = candidate.to_value();
    if canonical::semantically_equal(&before, &after) {
        return SlotDiff::default();
    }
    SlotDiff {
        modifications: vec![Modification {
            id: PROJECT_SLOT.to_string(),
            before,
            after,
        }],
        ..SlotDiff::default()
    }
}

/// Compare two versions of one collection
///
/// Records are matched by id. A record in both whose content is
/// semantically equal (member order and `null` members ignored) is
/// omitted.
#[must_use]
pub fn diff_collection(base: &Collection, candidate: &Collection) -> SlotDiff {
    let base_index: HashMap<&str, &Record> = base.iter().map(|r| (r.id(), r)).collect();
    let candidate_ids: HashSet<&str> = candidate.ids().collect();

    let mut diff = SlotDiff::default();

    for record in candidate {
        match base_index.get(record.id()) {
            None => diff.additions.push(record.id().to_string()),
            Some(previous) if !records_equal(previous, record) => {
                diff.modifications.push(Modification {
                    id: record.id().to_string(),
                    before: previous.to_value(),
                    after: record.to_value(),
                });
            }
            Some(_) => {}
        }
    }

    diff.deletions = base
        .ids()
        .filter(|id| !candidate_ids.contains(id))
        .map(str::to_string)
        .collect();

    diff
}

/// Structural record equality
#[must_use]
pub fn records_equal(a: &Record, b: &Record) -> bool {
    a.id() == b.id()
        && a.created_at == b.created_at
        && a.updated_at == b.updated_at
        && canonical::objects_equal(a.fields(), b.fields())
}
