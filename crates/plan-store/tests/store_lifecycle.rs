//! Lifecycle properties of the dual-state store

use plan_diff::diff_states;
use plan_model::{overlay, Collection, PatchRules, ProjectPatch, ProjectRecord, ProjectState, Record, Slot};
use plan_store::{DualStateStore, StoreError, ViewSide};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

fn collection(ids: &[u8], label: &str) -> Collection {
    let records = ids
        .iter()
        .map(|id| {
            Record::new(format!("r{id}"))
                .unwrap()
                .with_field("label", json!(format!("{label}-{id}")))
        })
        .collect();
    Collection::new(records).unwrap()
}

fn slot_strategy() -> impl Strategy<Value = Slot> {
    (0..Slot::COUNT).prop_map(|i| Slot::ALL[i])
}

fn ids_strategy() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::btree_set(0u8..12, 0..6).prop_map(|s| s.into_iter().collect())
}

fn base_state() -> ProjectState {
    ProjectState::new(ProjectRecord::new("p1", "Acme").with_stage("idea"))
        .with_collection(Slot::CanvasItems, collection(&[1, 2, 3], "base"))
        .with_collection(Slot::TeamTasks, collection(&[7], "base"))
}

proptest! {
    #[test]
    fn prop_discard_is_a_noop_on_current(
        slot in slot_strategy(),
        ids in ids_strategy(),
        label in "[a-z]{1,6}",
    ) {
        let mut store = DualStateStore::new(base_state());
        let before = store.current().clone();

        let patch = ProjectPatch::new().with_slot(slot, collection(&ids, &label));
        store.stage(&patch, "proposal");
        store.discard().unwrap();

        prop_assert_eq!(store.current(), &before);
        prop_assert!(!store.is_comparing());
        prop_assert!(store.diff().is_empty());
    }

    #[test]
    fn prop_commit_promotes_exactly_what_was_staged(
        slot in slot_strategy(),
        ids in ids_strategy(),
        label in "[a-z]{1,6}",
    ) {
        let mut store = DualStateStore::new(base_state());
        let patch = ProjectPatch::new().with_slot(slot, collection(&ids, &label));
        store.stage(&patch, "proposal");

        let staged = store.staged().unwrap().clone();
        let summary = store.diff().summary();
        let receipt = store.commit().unwrap();

        prop_assert_eq!(store.current(), &staged);
        prop_assert_eq!(store.current(), &overlay(&base_state(), &patch));
        prop_assert_eq!(receipt.summary, summary);
        prop_assert!(store.diff().is_empty());
    }

    #[test]
    fn prop_staged_diff_matches_recomputation(
        slot in slot_strategy(),
        ids in ids_strategy(),
    ) {
        let mut store = DualStateStore::new(base_state());
        let patch = ProjectPatch::new().with_slot(slot, collection(&ids, "x"));
        store.stage(&patch, "proposal");

        let recomputed = diff_states(store.current(), store.staged().unwrap());
        prop_assert_eq!(&*store.diff(), &recomputed);
    }
}

#[test]
fn deleting_every_item_shows_deletions_then_commits_empty() {
    let mut store = DualStateStore::new(base_state());
    let patch = ProjectPatch::from_value(&json!({"canvas_items": []}), PatchRules::default()).unwrap();
    store.stage(&patch, "clear the canvas");

    let diff = store.diff();
    let canvas = diff.slot(Slot::CanvasItems);
    assert_eq!(canvas.deletions, vec!["r1", "r2", "r3"]);
    assert!(canvas.additions.is_empty());
    assert!(canvas.modifications.is_empty());
    assert_eq!(diff.total_changes(), 3);
    drop(diff);

    store.commit().unwrap();
    assert!(store.current().collection(Slot::CanvasItems).is_empty());
    assert_eq!(store.current().collection(Slot::TeamTasks).len(), 1);
}

#[test]
fn empty_patch_stages_without_changes() {
    let mut store = DualStateStore::new(base_state());
    store.stage(&ProjectPatch::new(), "nothing");

    assert!(store.is_comparing());
    assert!(store.diff().is_empty());
    assert_eq!(store.staged().unwrap(), store.current());
}

#[test]
fn direct_edit_after_commit_is_allowed_again() {
    let mut store = DualStateStore::new(base_state());
    store.stage(&ProjectPatch::new(), "nothing");

    let err = store
        .apply_direct_edit(Slot::TeamTasks, |tasks| tasks.remove("r7"))
        .unwrap_err();
    assert_eq!(err.to_string(), "direct edit to team_tasks rejected: a staged proposal is under review");
    assert_eq!(store.current().collection(Slot::TeamTasks).len(), 1);

    store.commit().unwrap();
    let removed = store
        .apply_direct_edit(Slot::TeamTasks, |tasks| tasks.remove("r7"))
        .unwrap();
    assert!(removed.is_some());
    assert!(store.current().collection(Slot::TeamTasks).is_empty());
}

#[test]
fn protocol_violations_change_nothing() {
    let mut store = DualStateStore::new(base_state());
    let rx = store.subscribe();

    assert_eq!(store.commit().unwrap_err(), StoreError::CommitWithNoStaged);
    assert_eq!(store.discard().unwrap_err(), StoreError::DiscardWithNoStaged);
    assert_eq!(store.version(), 0);
    assert!(!rx.has_changed().unwrap());
}

#[test]
fn snapshots_follow_the_view() {
    let mut store = DualStateStore::new(base_state());
    let patch = ProjectPatch::new().with_project(ProjectRecord::new("p1", "Acme Labs"));
    store.stage(&patch, "rename");

    let snapshot = store.snapshot();
    assert_eq!(snapshot.view, ViewSide::Staged);
    assert_eq!(snapshot.visible().project().title, "Acme Labs");

    store.toggle_view();
    let snapshot = store.snapshot();
    assert_eq!(snapshot.view, ViewSide::Current);
    assert_eq!(snapshot.visible().project().title, "Acme");
    assert!(snapshot.diff.has_changes(plan_model::SlotRef::Project));
}

#[tokio::test]
async fn subscribers_are_woken_on_commit() {
    let mut store = DualStateStore::new(base_state());
    let mut rx = store.subscribe();

    store.stage(&ProjectPatch::new().with_slot(Slot::Tags, collection(&[1], "t")), "tag");
    rx.changed().await.unwrap();
    assert!(rx.borrow_and_update().comparison_mode);

    store.commit().unwrap();
    rx.changed().await.unwrap();
    let snapshot = rx.borrow_and_update().clone();
    assert!(!snapshot.comparison_mode);
    assert_eq!(snapshot.version, 2);
    assert!(snapshot.current.collection(Slot::Tags).contains("r1"));
}

#[test]
fn dropping_a_document_then_discarding_keeps_both() {
    let documents = Collection::from_value(
        &json!([{"id": "d1", "title": "Pitch deck"}, {"id": "d2", "title": "Survey"}]),
        "documents",
    )
    .unwrap();
    let mut store = DualStateStore::new(base_state().with_collection(Slot::Documents, documents));

    let patch = ProjectPatch::from_value(
        &json!({"documents": [{"id": "d1", "title": "Pitch deck"}]}),
        PatchRules::default(),
    )
    .unwrap();
    store.stage(&patch, "drop the survey");
    assert_eq!(store.diff().slot(Slot::Documents).deletions, vec!["d2"]);
    assert_eq!(store.diff().total_changes(), 1);

    store.discard().unwrap();
    let kept: Vec<&str> = store.current().collection(Slot::Documents).ids().collect();
    assert_eq!(kept, vec!["d1", "d2"]);
}

#[test]
fn canvas_rewrite_commits_both_records() {
    let canvas = Collection::from_value(&json!([{"id": "1", "text": "old"}]), "canvas_items").unwrap();
    let mut store = DualStateStore::new(
        ProjectState::new(ProjectRecord::new("p1", "Acme")).with_collection(Slot::CanvasItems, canvas),
    );

    let patch = ProjectPatch::from_value(
        &json!({"canvas_items": [{"id": "1", "text": "new"}, {"id": "2", "text": "added"}]}),
        PatchRules::default(),
    )
    .unwrap();
    store.stage(&patch, "rewrite canvas");
    {
        let diff = store.diff();
        let canvas = diff.slot(Slot::CanvasItems);
        assert_eq!(canvas.additions, vec!["2"]);
        assert_eq!(canvas.modifications.len(), 1);
        assert_eq!(canvas.modifications[0].before["text"], json!("old"));
        assert_eq!(canvas.modifications[0].after["text"], json!("new"));
        assert!(canvas.deletions.is_empty());
    }

    store.commit().unwrap();
    let items = store.current().collection(Slot::CanvasItems);
    assert_eq!(items.len(), 2);
    assert_eq!(items.get("1").unwrap().field("text"), Some(&json!("new")));
    assert_eq!(items.get("2").unwrap().field("text"), Some(&json!("added")));
}
