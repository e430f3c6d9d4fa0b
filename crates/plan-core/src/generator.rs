//! Proposal generator collaborator
//!
//! The generator turns a free-text instruction plus a snapshot of the
//! current aggregate into a JSON patch document. It runs asynchronously and
//! may take arbitrarily long; the coordinator decides whether its answer is
//! still wanted.

use crate::error::GenerationError;
use plan_model::ProjectState;
use serde_json::Value;
use std::sync::Arc;

/// Produces proposal patches from instructions
///
/// The returned value is a JSON object keyed by slot name (and optionally
/// `project`). Unknown keys and malformed records are rejected by the caller.
#[async_trait::async_trait]
pub trait ProposalGenerator: Send + Sync {
    /// Generate a patch for `instruction` against `snapshot`
    async fn generate(
        &self,
        instruction: &str,
        snapshot: Arc<ProjectState>,
    ) -> Result<Value, GenerationError>;
}

