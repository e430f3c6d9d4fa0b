//! Plan Model
//!
//! The project aggregate that the staging engine compares and commits.
//!
//! # Core Concepts
//!
//! - [`ProjectState`]: singleton [`ProjectRecord`] plus one [`Collection`] per [`Slot`]
//! - [`Record`]: id, timestamps and arbitrary JSON fields
//! - [`ProjectPatch`]: partial aggregate, applied with [`overlay`] (full-slot replacement)
//! - [`Fingerprint`]: Blake3 digest of the canonical JSON form
//! - [`canonical`]: structural equality where `null` and absent coincide
//!
//! # Example
//!
//! ```rust,ignore
//! use plan_model::{overlay, PatchRules, ProjectPatch, ProjectRecord, ProjectState};
//!
//! let current = ProjectState::new(ProjectRecord::new("p1", "Acme"));
//! let patch = ProjectPatch::from_value(&generator_output, PatchRules::default())?;
//! let candidate = overlay(&current, &patch);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod canonical;
mod collection;
mod error;
mod fingerprint;
mod patch;
mod record;
mod slot;
mod state;

// Re-exports
pub use collection::Collection;
pub use error::ModelError;
pub use fingerprint::Fingerprint;
pub use patch::{overlay, overlay_owned, PatchRules, ProjectPatch};
pub use record::{ProjectRecord, Record, CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD};
pub use slot::{Slot, SlotRef, PROJECT_SLOT};
pub use state::ProjectState;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn patch_overlay_lifecycle() {
        let current = ProjectState::new(ProjectRecord::new("p1", "Acme").with_stage("idea"));
        let before = current.fingerprint().unwrap();

        let patch = ProjectPatch::from_value(
            &json!({
                "canvas_items": [{"id": "1", "text": "new"}, {"id": "2", "text": "added"}],
            }),
            PatchRules::default(),
        )
        .unwrap();
        let candidate = overlay(&current, &patch);

        assert_eq!(candidate.collection(Slot::CanvasItems).len(), 2);
        assert_eq!(current.fingerprint().unwrap(), before);
        assert_ne!(candidate.fingerprint().unwrap(), before);
    }

    #[test]
    fn state_survives_serde_roundtrip() {
        let state = ProjectState::new(ProjectRecord::new("p1", "Acme"));
        let text = serde_json::to_string(&state).unwrap();
        let back: ProjectState = serde_json::from_str(&text).unwrap();
        assert_eq!(back, state);
    }
}
