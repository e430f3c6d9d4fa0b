//! Project session
//!
//! One session per open project: the store, the coordinator feeding it, and
//! the repository it was hydrated from. Callers hold the session explicitly;
//! there is no process-wide instance.

use crate::config::SessionConfig;
use crate::coordinator::{CoordinatorStats, ProposalCoordinator, ProposalOutcome};
use crate::error::SessionError;
use crate::generator::ProposalGenerator;
use crate::repository::ProjectRepository;
use parking_lot::Mutex;
use plan_diff::DiffReport;
use plan_model::{Collection, ProjectRecord, ProjectState, Slot};
use plan_store::{CommitReceipt, DualStateStore, ProposalId, StoreSnapshot, ViewSide};
use std::sync::Arc;
use tokio::sync::watch;

/// An open project
pub struct ProjectSession {
    project_id: String,
    config: SessionConfig,
    store: Arc<Mutex<DualStateStore>>,
    coordinator: ProposalCoordinator,
    repository: Arc<dyn ProjectRepository>,
    /// Store version of the last commit written to the repository
    persisted: tokio::sync::Mutex<u64>,
}

impl ProjectSession {
    /// Hydrate `project_id` from the repository and open a session on it
    ///
    /// # Errors
    /// Returns `SessionError::Repository` if the project cannot be loaded
    pub async fn open(
        project_id: impl Into<String>,
        generator: Arc<dyn ProposalGenerator>,
        repository: Arc<dyn ProjectRepository>,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let project_id = project_id.into();
        let state = repository.load(&project_id).await?;
        tracing::info!(
            project_id = %project_id,
            records = state.record_count(),
            "session opened"
        );
        Ok(Self::with_state(project_id, state, generator, repository, config))
    }

    /// Open a session on an already-loaded aggregate
    #[must_use]
    pub fn with_state(
        project_id: impl Into<String>,
        state: ProjectState,
        generator: Arc<dyn ProposalGenerator>,
        repository: Arc<dyn ProjectRepository>,
        config: SessionConfig,
    ) -> Self {
        let store = Arc::new(Mutex::new(DualStateStore::new(state)));
        let coordinator = ProposalCoordinator::new(Arc::clone(&store), generator, &config);
        Self {
            project_id: project_id.into(),
            config,
            store,
            coordinator,
            repository,
            persisted: tokio::sync::Mutex::new(0),
        }
    }

    /// Project id
    #[inline]
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Generate and stage a proposal (last call wins)
    ///
    /// # Errors
    /// Returns `SessionError::Proposal` on invalid instruction, generator
    /// failure or malformed output; no state changes in that case
    pub async fn propose(&self, instruction: &str) -> Result<ProposalOutcome, SessionError> {
        Ok(self.coordinator.propose(instruction).await?)
    }

    /// Promote the staged proposal and persist the new `current`
    ///
    /// # Errors
    /// - `SessionError::Store` if nothing is staged
    /// - `SessionError::PersistFailed` if the save fails; the commit stands
    pub async fn commit(&self) -> Result<CommitReceipt, SessionError> {
        let (receipt, committed) = {
            let mut store = self.store.lock();
            let receipt = store.commit()?;
            (receipt, store.current_shared())
        };

        if self.config.persist_on_commit {
            // Saves are serialized; a commit overtaken by a newer one on disk is not written.
            let mut persisted = self.persisted.lock().await;
            if receipt.version <= *persisted {
                tracing::debug!(
                    project_id = %self.project_id,
                    proposal = %receipt.proposal_id,
                    persisted = *persisted,
                    "newer commit already persisted"
                );
                return Ok(receipt);
            }
            if let Err(source) = self.repository.save(&self.project_id, &committed).await {
                tracing::error!(
                    project_id = %self.project_id,
                    proposal = %receipt.proposal_id,
                    error = %source,
                    "commit not persisted"
                );
                return Err(SessionError::PersistFailed { receipt, source });
            }
            *persisted = receipt.version;
        }
        Ok(receipt)
    }

    /// Drop the staged proposal
    ///
    /// # Errors
    /// Returns `SessionError::Store` if nothing is staged
    pub fn discard(&self) -> Result<ProposalId, SessionError> {
        Ok(self.store.lock().discard()?)
    }

    /// Flip the visible side while comparing
    pub fn toggle_view(&self) -> ViewSide {
        self.store.lock().toggle_view()
    }

    /// Mutate one collection of `current` outside the proposal path
    ///
    /// Not persisted until the next commit.
    ///
    /// # Errors
    /// Returns `SessionError::Store` while a proposal is staged
    pub fn apply_direct_edit<R>(
        &self,
        slot: Slot,
        mutator: impl FnOnce(&mut Collection) -> R,
    ) -> Result<R, SessionError> {
        Ok(self.store.lock().apply_direct_edit(slot, mutator)?)
    }

    /// Mutate the project record of `current` outside the proposal path
    ///
    /// # Errors
    /// Returns `SessionError::Store` while a proposal is staged
    pub fn edit_project<R>(
        &self,
        mutator: impl FnOnce(&mut ProjectRecord) -> R,
    ) -> Result<R, SessionError> {
        Ok(self.store.lock().edit_project(mutator)?)
    }

    /// Diff of the staged proposal (empty when idle)
    #[must_use]
    pub fn diff(&self) -> Arc<DiffReport> {
        Arc::clone(&self.store.lock().snapshot().diff)
    }

    /// Shared handle to `current`
    #[must_use]
    pub fn current(&self) -> Arc<ProjectState> {
        self.store.lock().current_shared()
    }

    /// Shared handle to the staged aggregate
    #[must_use]
    pub fn staged(&self) -> Option<Arc<ProjectState>> {
        self.store.lock().snapshot().staged.clone()
    }

    /// Whether a proposal is under review
    #[must_use]
    pub fn is_comparing(&self) -> bool {
        self.store.lock().is_comparing()
    }

    /// Latest store snapshot
    #[must_use]
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.store.lock().snapshot()
    }

    /// Receive a snapshot after every store transition
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<StoreSnapshot>> {
        self.store.lock().subscribe()
    }

    /// Suppress the result of an in-flight proposal
    pub fn cancel_pending(&self) -> bool {
        self.coordinator.cancel_pending()
    }

    /// Coordinator counters
    #[must_use]
    pub fn stats(&self) -> CoordinatorStats {
        self.coordinator.stats()
    }
}

impl std::fmt::Debug for ProjectSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectSession")
            .field("project_id", &self.project_id)
            .field("config", &self.config)
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}
