//! Store phases and the transition table
//!
//! The phase is derived from whether a proposal is staged; it is never set
//! directly. [`next_phase`] is the single place that decides which actions
//! are legal in which phase.

use crate::error::StoreError;
use plan_model::SlotRef;
use serde::{Deserialize, Serialize};

/// Store phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No staged proposal, only `current` is visible
    Idle,
    /// A staged proposal is under review
    Comparing,
}

impl Phase {
    /// Comparison-mode flag
    #[inline]
    #[must_use]
    pub fn is_comparing(self) -> bool {
        matches!(self, Phase::Comparing)
    }
}

/// Which side of a comparison the presentation layer shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewSide {
    /// The baseline
    #[default]
    Current,
    /// The staged proposal
    Staged,
}

impl ViewSide {
    /// The other side
    #[inline]
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            ViewSide::Current => ViewSide::Staged,
            ViewSide::Staged => ViewSide::Current,
        }
    }
}

/// Store actions subject to the transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stage (or replace) a proposal
    Stage,
    /// Promote the staged proposal to current
    Commit,
    /// Drop the staged proposal
    Discard,
    /// Mutate `current` outside the proposal path
    DirectEdit(SlotRef),
}

/// Phase reached by applying `action` in phase `from`
///
/// # Errors
/// - `StoreError::CommitWithNoStaged` / `DiscardWithNoStaged` when idle
/// - `StoreError::ConcurrentEdit` for a direct edit while comparing
pub fn next_phase(from: Phase, action: Action) -> Result<Phase, StoreError> {
    use Phase::{Comparing, Idle};
    match (from, action) {
        (_, Action::Stage) => Ok(Comparing),
        (Comparing, Action::Commit | Action::Discard) => Ok(Idle),
        (Idle, Action::Commit) => Err(StoreError::CommitWithNoStaged),
        (Idle, Action::Discard) => Err(StoreError::DiscardWithNoStaged),
        (Idle, Action::DirectEdit(_)) => Ok(Idle),
        (Comparing, Action::DirectEdit(slot)) => Err(StoreError::ConcurrentEdit { slot }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_model::Slot;
    use proptest::prelude::*;

    #[test]
    fn idle_transitions() {
        assert_eq!(next_phase(Phase::Idle, Action::Stage), Ok(Phase::Comparing));
        assert_eq!(
            next_phase(Phase::Idle, Action::DirectEdit(SlotRef::Project)),
            Ok(Phase::Idle)
        );
        assert_eq!(
            next_phase(Phase::Idle, Action::Commit),
            Err(StoreError::CommitWithNoStaged)
        );
        assert_eq!(
            next_phase(Phase::Idle, Action::Discard),
            Err(StoreError::DiscardWithNoStaged)
        );
    }

    #[test]
    fn comparing_transitions() {
        assert_eq!(next_phase(Phase::Comparing, Action::Stage), Ok(Phase::Comparing));
        assert_eq!(next_phase(Phase::Comparing, Action::Commit), Ok(Phase::Idle));
        assert_eq!(next_phase(Phase::Comparing, Action::Discard), Ok(Phase::Idle));
        assert!(matches!(
            next_phase(Phase::Comparing, Action::DirectEdit(Slot::Tags.into())),
            Err(StoreError::ConcurrentEdit { .. })
        ));
    }

    #[test]
    fn view_side_flips() {
        assert_eq!(ViewSide::default(), ViewSide::Current);
        assert_eq!(ViewSide::Current.flipped(), ViewSide::Staged);
        assert_eq!(ViewSide::Staged.flipped(), ViewSide::Current);
    }

    proptest! {
        #[test]
        fn prop_commit_and_discard_always_end_idle(
            from in prop_oneof![Just(Phase::Idle), Just(Phase::Comparing)],
            action in prop_oneof![Just(Action::Commit), Just(Action::Discard)],
        ) {
            match next_phase(from, action) {
                Ok(to) => {
                    prop_assert_eq!(from, Phase::Comparing);
                    prop_assert_eq!(to, Phase::Idle);
                }
                Err(e) => {
                    prop_assert_eq!(from, Phase::Idle);
                    prop_assert!(e.is_protocol_violation());
                }
            }
        }
    }
}
