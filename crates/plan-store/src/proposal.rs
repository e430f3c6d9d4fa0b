//! Staged proposals and commit receipts

use chrono::{DateTime, Utc};
use plan_diff::{DiffReport, DiffSummary};
use plan_model::ProjectState;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use ulid::Ulid;

/// Unique proposal identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProposalId(pub Ulid);

impl ProposalId {
    /// Generate new proposal ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ProposalId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ProposalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A candidate aggregate under review
///
/// # Invariants
/// - `state` never shares records with the store's `current`
/// - `diff` is `diff_states(current, state)` for the `current` it was staged on
#[derive(Debug, Clone)]
pub struct StagedProposal {
    pub(crate) id: ProposalId,
    pub(crate) description: String,
    pub(crate) state: Arc<ProjectState>,
    pub(crate) diff: Arc<DiffReport>,
    pub(crate) staged_at: DateTime<Utc>,
}

impl StagedProposal {
    /// Proposal id
    #[inline]
    #[must_use]
    pub fn id(&self) -> ProposalId {
        self.id
    }

    /// Human-readable description (usually the instruction that produced it)
    #[inline]
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Candidate aggregate
    #[inline]
    #[must_use]
    pub fn state(&self) -> &ProjectState {
        &self.state
    }

    /// Diff against the current aggregate
    #[inline]
    #[must_use]
    pub fn diff(&self) -> &DiffReport {
        &self.diff
    }

    /// When the proposal was staged
    #[inline]
    #[must_use]
    pub fn staged_at(&self) -> DateTime<Utc> {
        self.staged_at
    }
}

/// What a successful commit promoted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReceipt {
    /// Committed proposal
    pub proposal_id: ProposalId,
    /// Its description
    pub description: String,
    /// Changes that became current
    pub summary: DiffSummary,
    /// Store version after the commit
    pub version: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposal_ids_are_unique() {
        let a = ProposalId::new();
        let b = ProposalId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string().len(), 26);
    }
}
