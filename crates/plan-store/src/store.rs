//! Dual-state store
//!
//! Holds the baseline (`current`) aggregate and at most one staged
//! proposal. It is the only writer of either.
//!
//! # Guarantees
//! - `current` is always defined
//! - `current` advances only through [`DualStateStore::commit`] (to a value
//!   that was staged and diffed) or through direct edits while idle
//! - a failing operation changes nothing
//!
//! All operations are synchronous and run to completion; callers sharing a
//! store across tasks wrap it in a mutex and never hold it across an await.

use crate::error::StoreError;
use crate::phase::{next_phase, Action, Phase, ViewSide};
use crate::proposal::{CommitReceipt, ProposalId, StagedProposal};
use crate::snapshot::StoreSnapshot;
use chrono::Utc;
use plan_diff::{diff_states, DiffReport};
use plan_model::{overlay, Collection, ProjectPatch, ProjectRecord, ProjectState, Slot, SlotRef};
use std::borrow::Cow;
use std::sync::Arc;
use tokio::sync::watch;

/// Current aggregate plus an optional staged candidate
#[derive(Debug)]
pub struct DualStateStore {
    current: Arc<ProjectState>,
    staged: Option<StagedProposal>,
    view: ViewSide,
    version: u64,
    revision: u64,
    publisher: watch::Sender<Arc<StoreSnapshot>>,
}

impl DualStateStore {
    /// Create store around a freshly loaded aggregate
    #[must_use]
    pub fn new(current: ProjectState) -> Self {
        let current = Arc::new(current);
        let initial = StoreSnapshot {
            version: 0,
            current: Arc::clone(&current),
            staged: None,
            comparison_mode: false,
            diff: Arc::new(DiffReport::empty()),
            view: ViewSide::Current,
            proposal_id: None,
            description: None,
        };
        let (publisher, _) = watch::channel(Arc::new(initial));
        Self {
            current,
            staged: None,
            view: ViewSide::Current,
            version: 0,
            revision: 0,
            publisher,
        }
    }

    /// Baseline aggregate
    #[inline]
    #[must_use]
    pub fn current(&self) -> &ProjectState {
        &self.current
    }

    /// Shared handle to the baseline aggregate
    ///
    /// The handle stays valid (and unchanged) after later store mutations.
    #[inline]
    #[must_use]
    pub fn current_shared(&self) -> Arc<ProjectState> {
        Arc::clone(&self.current)
    }

    /// Candidate aggregate, when comparing
    #[inline]
    #[must_use]
    pub fn staged(&self) -> Option<&ProjectState> {
        self.staged.as_ref().map(StagedProposal::state)
    }

    /// Staged proposal with its metadata
    #[inline]
    #[must_use]
    pub fn proposal(&self) -> Option<&StagedProposal> {
        self.staged.as_ref()
    }

    /// Derived phase
    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.staged.is_some() {
            Phase::Comparing
        } else {
            Phase::Idle
        }
    }

    /// Comparison-mode flag (`staged` is present)
    #[inline]
    #[must_use]
    pub fn is_comparing(&self) -> bool {
        self.phase().is_comparing()
    }

    /// Diff for `(current, staged)`, or an empty report when idle
    #[must_use]
    pub fn diff(&self) -> Cow<'_, DiffReport> {
        match &self.staged {
            Some(proposal) => Cow::Borrowed(proposal.diff()),
            None => Cow::Owned(DiffReport::empty()),
        }
    }

    /// Change stamp, bumped on every published transition
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Bumped whenever `current` itself changes (commit or direct edit)
    #[inline]
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Side currently shown
    #[inline]
    #[must_use]
    pub fn view(&self) -> ViewSide {
        self.view
    }

    /// Aggregate on the side currently shown
    #[must_use]
    pub fn visible(&self) -> &ProjectState {
        match (self.view, &self.staged) {
            (ViewSide::Staged, Some(proposal)) => proposal.state(),
            _ => &self.current,
        }
    }

    /// Stage a proposal: `overlay(clone(current), patch)`
    ///
    /// Replaces any previously staged proposal (last proposal wins). The
    /// diff is computed immediately and the view switches to the staged side.
    pub fn stage(&mut self, patch: &ProjectPatch, description: impl Into<String>) -> ProposalId {
        debug_assert_eq!(next_phase(self.phase(), Action::Stage), Ok(Phase::Comparing));

        let state = overlay(&self.current, patch);
        let diff = diff_states(&self.current, &state);
        let proposal = StagedProposal {
            id: ProposalId::new(),
            description: description.into(),
            state: Arc::new(state),
            diff: Arc::new(diff),
            staged_at: Utc::now(),
        };
        let id = proposal.id;

        if let Some(previous) = self.staged.replace(proposal) {
            tracing::info!(replaced = %previous.id, proposal = %id, "replacing staged proposal");
        }
        self.view = ViewSide::Staged;

        tracing::info!(
            proposal = %id,
            changes = self.diff().total_changes(),
            "proposal staged"
        );
        self.publish();
        id
    }

    /// Promote the staged proposal to `current`
    ///
    /// # Errors
    /// Returns `StoreError::CommitWithNoStaged` (and changes nothing) if
    /// nothing is staged
    pub fn commit(&mut self) -> Result<CommitReceipt, StoreError> {
        if let Err(e) = next_phase(self.phase(), Action::Commit) {
            tracing::warn!(error = %e, "commit ignored");
            return Err(e);
        }
        let Some(proposal) = self.staged.take() else {
            return Err(StoreError::CommitWithNoStaged);
        };

        self.current = proposal.state;
        self.revision += 1;
        self.view = ViewSide::Current;
        self.publish();

        tracing::info!(proposal = %proposal.id, version = self.version, "proposal committed");
        Ok(CommitReceipt {
            proposal_id: proposal.id,
            description: proposal.description,
            summary: proposal.diff.summary(),
            version: self.version,
        })
    }

    /// Drop the staged proposal; `current` is untouched
    ///
    /// # Errors
    /// Returns `StoreError::DiscardWithNoStaged` (and changes nothing) if
    /// nothing is staged
    pub fn discard(&mut self) -> Result<ProposalId, StoreError> {
        if let Err(e) = next_phase(self.phase(), Action::Discard) {
            tracing::debug!(error = %e, "discard ignored");
            return Err(e);
        }
        let Some(proposal) = self.staged.take() else {
            return Err(StoreError::DiscardWithNoStaged);
        };

        self.view = ViewSide::Current;
        self.publish();

        tracing::info!(proposal = %proposal.id, "proposal discarded");
        Ok(proposal.id)
    }

    /// Flip between current and staged views while comparing
    ///
    /// Outside comparison the view stays on `Current` and nothing is published.
    pub fn toggle_view(&mut self) -> ViewSide {
        if self.is_comparing() {
            self.view = self.view.flipped();
            self.publish();
        }
        self.view
    }

    /// Mutate one collection of `current` directly
    ///
    /// # Errors
    /// Returns `StoreError::ConcurrentEdit` while a proposal is staged; the
    /// mutator is not called
    pub fn apply_direct_edit<R>(
        &mut self,
        slot: Slot,
        mutator: impl FnOnce(&mut Collection) -> R,
    ) -> Result<R, StoreError> {
        next_phase(self.phase(), Action::DirectEdit(SlotRef::Collection(slot)))?;
        let result = mutator(Arc::make_mut(&mut self.current).collection_mut(slot));
        self.after_direct_edit(SlotRef::Collection(slot));
        Ok(result)
    }

    /// Mutate the singleton project record of `current` directly
    ///
    /// # Errors
    /// Returns `StoreError::ConcurrentEdit` while a proposal is staged; the
    /// mutator is not called
    pub fn edit_project<R>(
        &mut self,
        mutator: impl FnOnce(&mut ProjectRecord) -> R,
    ) -> Result<R, StoreError> {
        next_phase(self.phase(), Action::DirectEdit(SlotRef::Project))?;
        let result = mutator(Arc::make_mut(&mut self.current).project_mut());
        self.after_direct_edit(SlotRef::Project);
        Ok(result)
    }

    /// Receive a snapshot after every transition
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<StoreSnapshot>> {
        self.publisher.subscribe()
    }

    /// Latest published snapshot
    #[must_use]
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        Arc::clone(&self.publisher.borrow())
    }

    fn after_direct_edit(&mut self, slot: SlotRef) {
        self.revision += 1;
        tracing::debug!(%slot, revision = self.revision, "direct edit applied");
        self.publish();
    }

    fn publish(&mut self) {
        self.version += 1;
        let snapshot = StoreSnapshot {
            version: self.version,
            current: Arc::clone(&self.current),
            staged: self.staged.as_ref().map(|p| Arc::clone(&p.state)),
            comparison_mode: self.staged.is_some(),
            diff: self
                .staged
                .as_ref()
                .map_or_else(|| Arc::new(DiffReport::empty()), |p| Arc::clone(&p.diff)),
            view: self.view,
            proposal_id: self.staged.as_ref().map(StagedProposal::id),
            description: self.staged.as_ref().map(|p| p.description.clone()),
        };
        self.publisher.send_replace(Arc::new(snapshot));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_model::{PatchRules, Record};
    use serde_json::json;

    fn store() -> DualStateStore {
        let items = Collection::from_value(&json!([{"id": "1", "text": "old"}]), "c").unwrap();
        DualStateStore::new(
            ProjectState::new(ProjectRecord::new("p1", "Acme"))
                .with_collection(Slot::CanvasItems, items),
        )
    }

    fn patch(value: serde_json::Value) -> ProjectPatch {
        ProjectPatch::from_value(&value, PatchRules::default()).unwrap()
    }

    #[test]
    fn new_store_is_idle() {
        let store = store();
        assert!(!store.is_comparing());
        assert!(store.staged().is_none());
        assert!(store.diff().is_empty());
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn stage_enters_comparison() {
        let mut store = store();
        let id = store.stage(&patch(json!({"tags": [{"id": "t1"}]})), "add a tag");

        assert!(store.is_comparing());
        assert_eq!(store.proposal().unwrap().id(), id);
        assert_eq!(store.proposal().unwrap().description(), "add a tag");
        assert!(store.diff().has_changes(Slot::Tags));
        assert_eq!(store.view(), ViewSide::Staged);
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn restage_replaces_previous_proposal() {
        let mut store = store();
        let first = store.stage(&patch(json!({"tags": [{"id": "t1"}]})), "first");
        let second = store.stage(&patch(json!({"milestones": [{"id": "m1"}]})), "second");

        assert_ne!(first, second);
        assert_eq!(store.phase(), Phase::Comparing);
        assert_eq!(store.proposal().unwrap().description(), "second");
        assert!(!store.diff().has_changes(Slot::Tags));
        assert!(store.diff().has_changes(Slot::Milestones));
    }

    #[test]
    fn commit_promotes_staged() {
        let mut store = store();
        store.stage(&patch(json!({"tags": [{"id": "t1"}]})), "tag");
        let receipt = store.commit().unwrap();

        assert_eq!(receipt.summary.additions, 1);
        assert!(!store.is_comparing());
        assert!(store.diff().is_empty());
        assert!(store.current().collection(Slot::Tags).contains("t1"));
        assert_eq!(store.view(), ViewSide::Current);
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn commit_without_staged_is_rejected() {
        let mut store = store();
        let before = store.current().clone();
        assert_eq!(store.commit(), Err(StoreError::CommitWithNoStaged));
        assert_eq!(store.current(), &before);
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn discard_leaves_current_untouched() {
        let mut store = store();
        let before = store.current_shared();
        store.stage(&patch(json!({"canvas_items": []})), "wipe");
        store.discard().unwrap();

        assert!(Arc::ptr_eq(&before, &store.current_shared()));
        assert!(!store.is_comparing());
        assert_eq!(store.discard(), Err(StoreError::DiscardWithNoStaged));
    }

    #[test]
    fn direct_edit_rejected_while_comparing() {
        let mut store = store();
        store.stage(&patch(json!({"tags": []})), "noop");
        let mut called = false;
        let result = store.apply_direct_edit(Slot::CanvasItems, |_| called = true);

        assert!(matches!(result, Err(StoreError::ConcurrentEdit { .. })));
        assert!(!called);
        assert!(store.edit_project(|p| p.title = "x".into()).is_err());
        assert_eq!(store.current().project().title, "Acme");
    }

    #[test]
    fn direct_edit_when_idle() {
        let mut store = store();
        let snapshot_before = store.current_shared();
        store
            .apply_direct_edit(Slot::CanvasItems, |items| {
                items.insert(Record::new("2").unwrap()).unwrap();
            })
            .unwrap();

        assert_eq!(store.current().collection(Slot::CanvasItems).len(), 2);
        assert_eq!(snapshot_before.collection(Slot::CanvasItems).len(), 1);
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn toggle_view_only_while_comparing() {
        let mut store = store();
        assert_eq!(store.toggle_view(), ViewSide::Current);
        assert_eq!(store.version(), 0);

        store.stage(&patch(json!({"tags": [{"id": "t1"}]})), "tag");
        assert!(store.visible().collection(Slot::Tags).contains("t1"));
        assert_eq!(store.toggle_view(), ViewSide::Current);
        assert!(!store.visible().collection(Slot::Tags).contains("t1"));
        assert_eq!(store.toggle_view(), ViewSide::Staged);
    }

    #[test]
    fn subscribers_see_every_transition() {
        let mut store = store();
        let rx = store.subscribe();
        store.stage(&patch(json!({"tags": [{"id": "t1"}]})), "tag");
        {
            let snapshot = rx.borrow();
            assert!(snapshot.comparison_mode);
            assert_eq!(snapshot.version, 1);
            assert_eq!(snapshot.description.as_deref(), Some("tag"));
            assert!(snapshot.diff.has_changes(Slot::Tags));
        }
        store.discard().unwrap();
        let snapshot = rx.borrow();
        assert!(!snapshot.comparison_mode);
        assert!(snapshot.staged.is_none());
        assert!(snapshot.diff.is_empty());
        assert_eq!(snapshot.version, 2);
    }
}
