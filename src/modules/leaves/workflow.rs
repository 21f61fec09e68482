//! Leave request state machine.
//!
//! ```text
//! pending_parent --parent approves--> pending_school --school approves--> approved
//!       |                                   |
//!       +--parent rejects--> rejected <-----+--school rejects
//! ```
//!
//! The school can only act once the parent has approved, and a decided
//! request never changes again.

use super::model::LeaveStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Parent,
    School,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Parent => "parent",
            Stage::School => "school",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Leave request was already {0}")]
    AlreadyDecided(&'static str),
    #[error("Leave request is still awaiting parent approval")]
    AwaitingParent,
    #[error("Parent has already approved this leave request")]
    ParentStageClosed,
}

/// Status after `stage` approves (`approve == true`) or rejects a request in `current`.
pub fn next_status(
    current: LeaveStatus,
    stage: Stage,
    approve: bool,
) -> Result<LeaveStatus, TransitionError> {
    use LeaveStatus::*;

    match (current, stage) {
        (PendingParent, Stage::Parent) => Ok(if approve { PendingSchool } else { Rejected }),
        (PendingSchool, Stage::School) => Ok(if approve { Approved } else { Rejected }),
        (PendingParent, Stage::School) => Err(TransitionError::AwaitingParent),
        (PendingSchool, Stage::Parent) => Err(TransitionError::ParentStageClosed),
        (Approved, _) => Err(TransitionError::AlreadyDecided("approved")),
        (Rejected, _) => Err(TransitionError::AlreadyDecided("rejected")),
    }
}
