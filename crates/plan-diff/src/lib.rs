//! Plan Diff
//!
//! Structural (not textual) comparison of two project aggregates.
//!
//! # Core Concepts
//!
//! - [`diff_states`]: whole-aggregate diff, one [`SlotDiff`] per slot
//! - [`DiffReport`]: O(1) per-slot lookup, cached total, [`DiffSummary`]
//! - [`ChangeKind`]: added / modified / deleted, for presentation lookups
//!
//! Records are matched by id; content is compared by canonical JSON
//! equality, so member order and `null`-versus-absent never produce a
//! modification.
//!
//! # Example
//!
//! ```rust,ignore
//! use plan_diff::diff_states;
//!
//! let report = diff_states(&current, &staged);
//! for (slot, diff) in report.changed_slots() {
//!     println!("{slot}: +{} ~{} -{}", diff.additions.len(), diff.modifications.len(), diff.deletions.len());
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod calculator;
mod report;

pub use calculator::{diff_collection, diff_project, diff_states, records_equal};
pub use report::{ChangeKind, DiffReport, DiffSummary, Modification, SlotDiff};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
