//! Error types for the dual-state store
//!
//! None of these leave the store in an inconsistent state: every failing
//! operation is rejected before it mutates anything.

use plan_model::SlotRef;

/// Store protocol errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Direct edit attempted while a proposal is under review
    #[error("direct edit to {slot} rejected: a staged proposal is under review")]
    ConcurrentEdit { slot: SlotRef },

    /// Commit requested with nothing staged
    #[error("nothing staged to commit")]
    CommitWithNoStaged,

    /// Discard requested with nothing staged
    #[error("nothing staged to discard")]
    DiscardWithNoStaged,
}

impl StoreError {
    /// Caller asked for commit/discard outside comparison mode
    ///
    /// These are treated as no-ops by the store.
    #[inline]
    #[must_use]
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::CommitWithNoStaged | Self::DiscardWithNoStaged)
    }
}
