//! Plan Core - proposal coordination and project sessions
//!
//! Connects the staging engine to its collaborators:
//! - Runs free-text instructions through a [`ProposalGenerator`]
//! - Stages the generated patch, last call wins
//! - Hydrates and persists the aggregate through a [`ProjectRepository`]
//!
//! # Example
//!
//! ```rust,ignore
//! use plan_core::prelude::*;
//!
//! # async fn example(generator: Arc<dyn ProposalGenerator>) -> Result<(), SessionError> {
//! let repository = Arc::new(JsonFileRepository::new("projects"));
//! let session = ProjectSession::open("p1", generator, repository, SessionConfig::new()).await?;
//!
//! if session.propose("add two competitor entries").await?.is_staged() {
//!     println!("{} changes staged", session.diff().total_changes());
//!     session.commit().await?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod config;
pub mod coordinator;
pub mod error;
pub mod generator;
pub mod repository;
pub mod session;

// Re-exports for convenience
pub use config::SessionConfig;
pub use coordinator::{CoordinatorStats, ProposalCoordinator, ProposalOutcome};
pub use error::{GenerationError, ProposalError, RepositoryError, SessionError};
pub use generator::ProposalGenerator;
pub use repository::{InMemoryRepository, JsonFileRepository, ProjectRepository};
pub use session::ProjectSession;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Plan Core
    pub use crate::{
        GenerationError, InMemoryRepository, JsonFileRepository, ProjectRepository,
        ProjectSession, ProposalGenerator, ProposalOutcome, SessionConfig, SessionError,
    };
    pub use plan_diff::DiffReport;
    pub use plan_model::{ProjectState, Slot};
    pub use plan_store::{CommitReceipt, ViewSide};
    pub use std::sync::Arc;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
