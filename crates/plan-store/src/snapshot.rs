//! Snapshots published to subscribers
//!
//! Snapshots share the store's aggregates through `Arc`; the store never
//! mutates an aggregate a snapshot can see (direct edits copy on write).

use crate::phase::ViewSide;
use crate::proposal::ProposalId;
use plan_diff::DiffReport;
use plan_model::ProjectState;
use std::sync::Arc;

/// Everything a presentation layer needs to render the store
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    /// Monotonic change stamp, one step per published transition
    pub version: u64,
    /// Baseline aggregate
    pub current: Arc<ProjectState>,
    /// Candidate aggregate, when comparing
    pub staged: Option<Arc<ProjectState>>,
    /// `staged.is_some()`
    pub comparison_mode: bool,
    /// Diff for the pair (empty when not comparing)
    pub diff: Arc<DiffReport>,
    /// Side being shown
    pub view: ViewSide,
    /// Staged proposal id
    pub proposal_id: Option<ProposalId>,
    /// Staged proposal description
    pub description: Option<String>,
}

impl StoreSnapshot {
    /// Aggregate on the side being shown
    #[must_use]
    pub fn visible(&self) -> &ProjectState {
        match (self.view, &self.staged) {
            (ViewSide::Staged, Some(staged)) => staged,
            _ => &self.current,
        }
    }
}
