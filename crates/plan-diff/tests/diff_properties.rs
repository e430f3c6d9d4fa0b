//! Property tests for the diff calculator.
//!
//! Collections are generated from a small id alphabet so that both sides
//! overlap often, exercising additions, deletions and modifications together.

use plan_diff::{diff_collection, diff_states};
use plan_model::{Collection, ProjectRecord, ProjectState, Record, Slot};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};

fn collection_strategy() -> impl Strategy<Value = BTreeMap<String, Option<u8>>> {
    prop::collection::btree_map("[a-h]", prop::option::of(0u8..4), 0..8)
}

fn build(entries: &BTreeMap<String, Option<u8>>) -> Collection {
    let records = entries
        .iter()
        .map(|(id, score)| {
            let value = score.map_or(Value::Null, |s| json!(s));
            Record::new(id.as_str()).unwrap().with_field("score", value)
        })
        .collect();
    Collection::new(records).unwrap()
}

proptest! {
    #[test]
    fn prop_additions_and_deletions_are_disjoint(
        a in collection_strategy(),
        b in collection_strategy(),
    ) {
        let diff = diff_collection(&build(&a), &build(&b));
        let added: HashSet<_> = diff.additions.iter().collect();
        let deleted: HashSet<_> = diff.deletions.iter().collect();
        prop_assert!(added.is_disjoint(&deleted));
    }

    #[test]
    fn prop_every_new_id_is_an_addition_only(
        a in collection_strategy(),
        b in collection_strategy(),
    ) {
        let diff = diff_collection(&build(&a), &build(&b));
        for id in b.keys().filter(|id| !a.contains_key(*id)) {
            prop_assert_eq!(diff.additions.iter().filter(|x| *x == id).count(), 1);
            prop_assert!(diff.modification(id).is_none());
        }
        for id in &diff.additions {
            prop_assert!(!a.contains_key(id));
        }
    }

    #[test]
    fn prop_deletions_are_exactly_removed_ids(
        a in collection_strategy(),
        b in collection_strategy(),
    ) {
        let diff = diff_collection(&build(&a), &build(&b));
        let expected: Vec<_> = a.keys().filter(|id| !b.contains_key(*id)).cloned().collect();
        prop_assert_eq!(diff.deletions, expected);
    }

    #[test]
    fn prop_modifications_match_value_changes(
        a in collection_strategy(),
        b in collection_strategy(),
    ) {
        let diff = diff_collection(&build(&a), &build(&b));
        for (id, before) in &a {
            if let Some(after) = b.get(id) {
                prop_assert_eq!(diff.modification(id).is_some(), before != after);
            }
        }
    }

    #[test]
    fn prop_self_diff_is_empty(a in collection_strategy()) {
        let c = build(&a);
        prop_assert!(diff_collection(&c, &c.clone()).is_empty());
    }

    #[test]
    fn prop_report_total_matches_slot_sum(
        a in collection_strategy(),
        b in collection_strategy(),
    ) {
        let base = ProjectState::new(ProjectRecord::new("p", "t"))
            .with_collection(Slot::TeamTasks, build(&a))
            .with_collection(Slot::Milestones, build(&b));
        let candidate = ProjectState::new(ProjectRecord::new("p", "t"))
            .with_collection(Slot::TeamTasks, build(&b))
            .with_collection(Slot::Milestones, build(&a));

        let report = diff_states(&base, &candidate);
        let sum: usize = report.changed_slots().map(|(_, d)| d.change_count()).sum();
        prop_assert_eq!(report.total_changes(), sum);
        prop_assert_eq!(report.summary().total(), sum);
    }
}
