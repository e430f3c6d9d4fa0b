//! Plan Store
//!
//! Dual-state store: the committed `current` aggregate and at most one
//! staged proposal under review.
//!
//! # Core Concepts
//!
//! - [`DualStateStore`]: owns `current` and the staged proposal; sole writer of both
//! - [`Phase`]: `Idle` or `Comparing`, derived from whether a proposal is staged
//! - [`next_phase`]: the transition table for stage / commit / discard / direct edit
//! - [`StoreSnapshot`]: published through a `watch` channel after every transition
//!
//! # Example
//!
//! ```rust,ignore
//! use plan_store::DualStateStore;
//!
//! let mut store = DualStateStore::new(current);
//! store.stage(&patch, "add two personas");
//! assert!(store.is_comparing());
//! let receipt = store.commit()?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod phase;
mod proposal;
mod snapshot;
mod store;

// Re-exports
pub use error::StoreError;
pub use phase::{next_phase, Action, Phase, ViewSide};
pub use proposal::{CommitReceipt, ProposalId, StagedProposal};
pub use snapshot::StoreSnapshot;
pub use store::DualStateStore;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
