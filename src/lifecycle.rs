//! Transaction lifecycle.
//!
//! A submission walks Idle → Submitting → Included → Finalized, or
//! drops into Failed. The walk is one-way: status events can arrive
//! duplicated or out of order, and [`TxPhase::apply`] never moves
//! backwards because of them.

use crate::node::{ProfileCall, TxStatus};

/// What a submission is trying to do, kept for wording notices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxKind {
    SetProfile,
    RemoveProfile,
}

impl TxKind {
    /// Notice text for the inclusion milestone.
    pub fn included_text(&self) -> &'static str {
        match self {
            TxKind::SetProfile => "Your profile update has been included in a block",
            TxKind::RemoveProfile => "Your profile removal has been included in a block",
        }
    }

    /// Notice text for finality.
    pub fn finalized_text(&self) -> &'static str {
        match self {
            TxKind::SetProfile => "Profile successfully updated",
            TxKind::RemoveProfile => "Profile successfully removed",
        }
    }
}

impl From<&ProfileCall> for TxKind {
    fn from(call: &ProfileCall) -> Self {
        match call {
            ProfileCall::SetProfile { .. } => TxKind::SetProfile,
            ProfileCall::RemoveProfile => TxKind::RemoveProfile,
        }
    }
}

/// Phase of the current submission.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TxPhase {
    /// Nothing in flight. The phase after startup and after a failed
    /// submission has been reported.
    #[default]
    Idle,
    /// Signed and handed to the node, no block yet.
    Submitting,
    /// In a block that could still be reverted.
    Included,
    /// In a finalized block. Stays until the next submission starts.
    Finalized,
    /// Rejected or lost. Transient, reported through a notice.
    Failed,
}

impl TxPhase {
    /// Advances the phase by one status event.
    ///
    /// Terminal phases absorb everything, so a straggling `InBlock`
    /// after `Finalized` changes nothing. Idle ignores events too;
    /// only an explicit submission leaves it.
    pub fn apply(self, status: &TxStatus) -> TxPhase {
        match (self, status) {
            (TxPhase::Idle, _) | (TxPhase::Finalized, _) | (TxPhase::Failed, _) => self,
            (_, TxStatus::Rejected { .. }) => TxPhase::Failed,
            (_, TxStatus::InBlock) => TxPhase::Included,
            (_, TxStatus::Finalized) => TxPhase::Finalized,
        }
    }

    /// True while a submission occupies the pipeline. New submissions
    /// are refused in these phases.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, TxPhase::Submitting | TxPhase::Included)
    }

    /// True once no further status event can change the phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TxPhase::Finalized | TxPhase::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_stream_reaches_finality() {
        let phase = TxPhase::Submitting.apply(&TxStatus::InBlock);
        assert_eq!(phase, TxPhase::Included);
        assert_eq!(phase.apply(&TxStatus::Finalized), TxPhase::Finalized);
    }

    #[test]
    fn finality_absorbs_later_events() {
        let phase = TxPhase::Submitting.apply(&TxStatus::Finalized);
        assert_eq!(phase, TxPhase::Finalized);
        assert_eq!(phase.apply(&TxStatus::InBlock), TxPhase::Finalized);
        let late = TxStatus::Rejected {
            reason: "too late".to_string(),
        };
        assert_eq!(phase.apply(&late), TxPhase::Finalized);
    }

    #[test]
    fn rejection_fails_any_phase_in_flight() {
        let rejected = TxStatus::Rejected {
            reason: "invalid".to_string(),
        };
        assert_eq!(TxPhase::Submitting.apply(&rejected), TxPhase::Failed);
        assert_eq!(TxPhase::Included.apply(&rejected), TxPhase::Failed);
        assert_eq!(TxPhase::Failed.apply(&TxStatus::Finalized), TxPhase::Failed);
    }

    #[test]
    fn duplicate_inclusion_changes_nothing() {
        let phase = TxPhase::Included.apply(&TxStatus::InBlock);
        assert_eq!(phase, TxPhase::Included);
    }

    #[test]
    fn idle_ignores_stray_events() {
        assert_eq!(TxPhase::Idle.apply(&TxStatus::InBlock), TxPhase::Idle);
        assert_eq!(TxPhase::Idle.apply(&TxStatus::Finalized), TxPhase::Idle);
    }

    #[test]
    fn in_flight_and_terminal_partition_the_phases() {
        assert!(!TxPhase::Idle.is_in_flight());
        assert!(TxPhase::Submitting.is_in_flight());
        assert!(TxPhase::Included.is_in_flight());
        assert!(!TxPhase::Finalized.is_in_flight());
        assert!(TxPhase::Finalized.is_terminal());
        assert!(TxPhase::Failed.is_terminal());
        assert!(!TxPhase::Submitting.is_terminal());
    }

    #[test]
    fn kind_follows_the_call() {
        let set = ProfileCall::SetProfile {
            username: "a".to_string(),
            bio: "b".to_string(),
        };
        assert_eq!(TxKind::from(&set), TxKind::SetProfile);
        assert_eq!(TxKind::from(&ProfileCall::RemoveProfile), TxKind::RemoveProfile);
    }
}
