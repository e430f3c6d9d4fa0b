//! Proposal coordinator
//!
//! Runs instructions through the generator and stages the result, with
//! last-call-wins semantics:
//! - every `propose` call takes a fresh token and becomes the latest
//! - when the generator answers, the result is applied only if its token is
//!   still the latest; otherwise it is dropped and reported as superseded
//! - the token check and `stage` happen under the same store lock
//!
//! Cancellation suppresses results; it never aborts the generator.

use crate::config::SessionConfig;
use crate::error::ProposalError;
use crate::generator::ProposalGenerator;
use parking_lot::Mutex;
use plan_model::{PatchRules, ProjectPatch};
use plan_store::{DualStateStore, ProposalId};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Result of a `propose` call that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalOutcome {
    /// The proposal is staged and under review
    Staged(ProposalId),
    /// A newer call (or a cancel) made this result stale; nothing changed
    Superseded,
}

impl ProposalOutcome {
    /// Whether the call staged its proposal
    #[inline]
    #[must_use]
    pub fn is_staged(&self) -> bool {
        matches!(self, Self::Staged(_))
    }

    /// Staged proposal id
    #[inline]
    #[must_use]
    pub fn proposal_id(&self) -> Option<ProposalId> {
        match self {
            Self::Staged(id) => Some(*id),
            Self::Superseded => None,
        }
    }
}

/// Coordinator statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoordinatorStats {
    /// Calls that reached the generator
    pub started: u64,
    /// Calls whose proposal was staged
    pub staged: u64,
    /// Calls whose result was dropped as stale
    pub superseded: u64,
    /// Calls that failed (generator error or malformed output)
    pub failed: u64,
    /// Calls currently awaiting the generator
    pub in_flight: usize,
}

#[derive(Debug, Default)]
struct Counters {
    started: AtomicU64,
    staged: AtomicU64,
    superseded: AtomicU64,
    failed: AtomicU64,
}

/// Decrements the in-flight count however the call ends (including drop)
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(count: &'a AtomicUsize) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        Self(count)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Turns instructions into staged proposals
pub struct ProposalCoordinator {
    store: Arc<Mutex<DualStateStore>>,
    generator: Arc<dyn ProposalGenerator>,
    rules: PatchRules,
    max_instruction_len: usize,
    /// Last issued token
    issued: AtomicU64,
    /// Token allowed to stage; anything else is stale
    latest: AtomicU64,
    in_flight: AtomicUsize,
    counters: Counters,
}

impl ProposalCoordinator {
    /// Create coordinator over a shared store
    #[must_use]
    pub fn new(
        store: Arc<Mutex<DualStateStore>>,
        generator: Arc<dyn ProposalGenerator>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            store,
            generator,
            rules: config.patch_rules(),
            max_instruction_len: config.max_instruction_len,
            issued: AtomicU64::new(0),
            latest: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            counters: Counters::default(),
        }
    }

    /// Generate and stage a proposal for `instruction`
    ///
    /// Supersedes any call still in flight. A stale result (newer call or
    /// cancel in the meantime) is dropped without touching the store, even
    /// if the generator failed.
    ///
    /// # Errors
    /// - `ProposalError::InvalidInstruction` if empty or too long (generator not called)
    /// - `ProposalError::Generation` if the generator fails
    /// - `ProposalError::Malformed` if the output is not a valid patch
    ///
    /// No state change occurs on error.
    pub async fn propose(&self, instruction: &str) -> Result<ProposalOutcome, ProposalError> {
        self.validate(instruction)?;

        let token = self.issue();
        let _guard = InFlight::enter(&self.in_flight);
        self.counters.started.fetch_add(1, Ordering::Relaxed);

        let (snapshot, base_revision) = {
            let store = self.store.lock();
            (store.current_shared(), store.revision())
        };
        tracing::info!(token, "proposal requested");

        let generated = self.generator.generate(instruction, snapshot).await;

        if !self.is_latest(token) {
            if let Err(e) = &generated {
                tracing::debug!(token, error = %e, "stale proposal failed");
            }
            return Ok(self.superseded(token));
        }

        let value = generated.map_err(|e| {
            self.counters.failed.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(token, error = %e, "proposal generation failed");
            ProposalError::from(e)
        })?;

        let patch = ProjectPatch::from_value(&value, self.rules).map_err(|e| {
            self.counters.failed.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(token, error = %e, "malformed proposal rejected");
            ProposalError::from(e)
        })?;

        let mut store = self.store.lock();
        if !self.is_latest(token) {
            drop(store);
            return Ok(self.superseded(token));
        }
        if store.revision() != base_revision {
            tracing::warn!(
                token,
                base_revision,
                revision = store.revision(),
                "current changed while generating; staging over the new current"
            );
        }
        let id = store.stage(&patch, instruction);
        drop(store);

        self.counters.staged.fetch_add(1, Ordering::Relaxed);
        Ok(ProposalOutcome::Staged(id))
    }

    /// Suppress the result of whatever call is in flight
    ///
    /// Returns whether any call was in flight.
    pub fn cancel_pending(&self) -> bool {
        let token = self.issue();
        let pending = self.in_flight.load(Ordering::SeqCst) > 0;
        if pending {
            tracing::info!(token, "pending proposal cancelled");
        }
        pending
    }

    /// Whether a call is awaiting the generator
    #[inline]
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Counters so far
    #[must_use]
    pub fn stats(&self) -> CoordinatorStats {
        CoordinatorStats {
            started: self.counters.started.load(Ordering::Relaxed),
            staged: self.counters.staged.load(Ordering::Relaxed),
            superseded: self.counters.superseded.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::SeqCst),
        }
    }

    fn validate(&self, instruction: &str) -> Result<(), ProposalError> {
        if instruction.trim().is_empty() {
            return Err(ProposalError::InvalidInstruction("instruction is empty".into()));
        }
        let len = instruction.chars().count();
        if len > self.max_instruction_len {
            return Err(ProposalError::InvalidInstruction(format!(
                "instruction is {len} characters (max: {})",
                self.max_instruction_len
            )));
        }
        Ok(())
    }

    /// Take a fresh token and make it the latest
    fn issue(&self) -> u64 {
        let token = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.latest.store(token, Ordering::SeqCst);
        token
    }

    fn is_latest(&self, token: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == token
    }

    fn superseded(&self, token: u64) -> ProposalOutcome {
        self.counters.superseded.fetch_add(1, Ordering::Relaxed);
        tracing::info!(token, "stale proposal dropped");
        ProposalOutcome::Superseded
    }
}

impl std::fmt::Debug for ProposalCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProposalCoordinator")
            .field("max_instruction_len", &self.max_instruction_len)
            .field("latest", &self.latest.load(Ordering::SeqCst))
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
