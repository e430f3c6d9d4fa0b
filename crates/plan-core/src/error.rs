//! Error types for Plan Core
//!
//! Provides error handling for:
//! - Proposal generation failures
//! - Repository load/save failures
//! - Proposal validation and application
//! - Session-level operations

use plan_model::ModelError;
use plan_store::{CommitReceipt, StoreError};

/// Proposal generator failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationError {
    /// Generator could not be reached
    #[error("generator unavailable: {0}")]
    Unavailable(String),

    /// Generator refused the instruction
    #[error("instruction rejected: {0}")]
    Rejected(String),

    /// Generator answered but the answer is unusable
    #[error("invalid generator output: {0}")]
    InvalidOutput(String),

    /// Generator timed out
    #[error("generator timed out after {duration_secs}s")]
    Timeout { duration_secs: u64 },
}

impl GenerationError {
    /// Whether retrying the same instruction may succeed
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout { .. })
    }
}

/// Persistence collaborator failures
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// No stored aggregate for the project
    #[error("project not found: {0}")]
    NotFound(String),

    /// Project id cannot be used as a storage key
    #[error("invalid project id: {0:?}")]
    InvalidProjectId(String),

    /// Stored document does not form a valid aggregate
    #[error("corrupt project document {project_id}: {source}")]
    Corrupt {
        project_id: String,
        #[source]
        source: ModelError,
    },

    /// Filesystem failure
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding failure
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend-specific failure
    #[error("storage backend failed: {0}")]
    Backend(String),
}

impl RepositoryError {
    /// Whether retrying may succeed
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Backend(_))
    }
}

/// Failures of a single `propose` call
///
/// In every case no state change has occurred.
#[derive(Debug, thiserror::Error)]
pub enum ProposalError {
    /// Instruction is empty or too long
    #[error("invalid instruction: {0}")]
    InvalidInstruction(String),

    /// Generator failed
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// Generator output is not a well-formed patch
    #[error("malformed proposal: {0}")]
    Malformed(#[from] ModelError),
}

impl ProposalError {
    /// Whether retrying the same instruction may succeed
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Generation(e) => e.is_recoverable(),
            Self::InvalidInstruction(_) | Self::Malformed(_) => false,
        }
    }
}

/// Session-level errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Store rejected the operation
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Proposal failed
    #[error("proposal error: {0}")]
    Proposal(#[from] ProposalError),

    /// Repository failed
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Commit applied in memory but could not be persisted
    #[error("commit {} applied but not persisted: {source}", .receipt.proposal_id)]
    PersistFailed {
        /// The commit that stands in memory
        receipt: CommitReceipt,
        #[source]
        source: RepositoryError,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl SessionError {
    /// Whether the in-memory state changed despite the error
    #[inline]
    #[must_use]
    pub fn committed(&self) -> bool {
        matches!(self, Self::PersistFailed { .. })
    }

    /// Whether retrying may succeed
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Proposal(e) => e.is_recoverable(),
            Self::Repository(e) | Self::PersistFailed { source: e, .. } => e.is_recoverable(),
            Self::Store(_) | Self::Config(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_diff::DiffSummary;
    use plan_store::ProposalId;

    #[test]
    fn generation_error_recoverable() {
        assert!(GenerationError::Unavailable("down".into()).is_recoverable());
        assert!(GenerationError::Timeout { duration_secs: 30 }.is_recoverable());
        assert!(!GenerationError::Rejected("no".into()).is_recoverable());
    }

    #[test]
    fn proposal_error_display() {
        let err = ProposalError::from(GenerationError::Rejected("off topic".into()));
        assert!(err.to_string().contains("off topic"));
        assert!(!err.is_recoverable());

        let err = ProposalError::from(ModelError::UnknownSlot("gadgets".into()));
        assert!(err.to_string().starts_with("malformed proposal"));
    }

    #[test]
    fn persist_failure_reports_commit() {
        let receipt = CommitReceipt {
            proposal_id: ProposalId::new(),
            description: "add tags".into(),
            summary: DiffSummary::default(),
            version: 2,
        };
        let err = SessionError::PersistFailed {
            receipt,
            source: RepositoryError::Backend("disk full".into()),
        };
        assert!(err.committed());
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("not persisted"));
        assert!(!SessionError::from(StoreError::CommitWithNoStaged).committed());
    }
}
