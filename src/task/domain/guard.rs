//! Transition guard: the pure predicate deciding whether a requested
//! status change is legal.
//!
//! Denial is an expected, common outcome that drives caller affordances
//! (greying out a drag target, surfacing a 403), so the guard returns a
//! typed verdict rather than an error.

use super::{Task, TaskId, TaskRole, TaskStatus, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where a status-change request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOrigin {
    /// A direct client request (drag, API call).
    External,
    /// The orchestrator's internal review-decision propagation path.
    ReviewWorkflow,
}

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DenialReason {
    /// The task is done; done tasks accept no further transitions.
    #[error("task {task_id} is done and accepts no further transitions")]
    TerminalStatus {
        /// The task that was addressed.
        task_id: TaskId,
    },

    /// Follow-up tasks change status only as a side effect of a review
    /// decision on their pair.
    #[error("follow-up task {task_id} does not accept direct status changes")]
    FollowUpDirectChange {
        /// The follow-up task that was addressed.
        task_id: TaskId,
    },

    /// The task sits behind a review gate; a bare move cannot bypass it.
    #[error("task {task_id} is in review; moving to {requested:?} requires a review decision")]
    ReviewDecisionRequired {
        /// The gated task.
        task_id: TaskId,
        /// The status the request asked for.
        requested: TaskStatus,
    },

    /// The task has no pending review to decide on.
    #[error("task {task_id} is not awaiting review")]
    NotAwaitingReview {
        /// The task that was addressed.
        task_id: TaskId,
    },

    /// The acting user is not the reviewing assignee.
    #[error("user {actor} is not the reviewing assignee of task {task_id}")]
    NotReviewer {
        /// The task under review.
        task_id: TaskId,
        /// The acting user.
        actor: UserId,
    },

    /// The decision requires manager authority.
    #[error("task {task_id} requires a manager-tier decision")]
    ManagerRequired {
        /// The task awaiting validation.
        task_id: TaskId,
    },

    /// A manager decision was submitted but no validation is pending.
    #[error("task {task_id} has no pending manager validation")]
    NoValidationPending {
        /// The task that was addressed.
        task_id: TaskId,
    },
}

/// Outcome of the transition guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardVerdict {
    /// The transition may proceed.
    Allowed,
    /// The transition was refused for the stated reason.
    Denied(DenialReason),
}

impl GuardVerdict {
    /// Returns `true` when the transition may proceed.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Converts the verdict into a result, for callers that propagate
    /// denial with `?`.
    ///
    /// # Errors
    ///
    /// Returns the wrapped [`DenialReason`] when the verdict is a denial.
    pub const fn into_result(self) -> Result<(), DenialReason> {
        match self {
            Self::Allowed => Ok(()),
            Self::Denied(reason) => Err(reason),
        }
    }
}

/// Decides whether `task` may move to `requested`, given the origin of the
/// request. Rules are evaluated in order; the first match wins.
#[must_use]
pub fn can_transition(task: &Task, requested: TaskStatus, origin: ChangeOrigin) -> GuardVerdict {
    if task.status().is_terminal() {
        return GuardVerdict::Denied(DenialReason::TerminalStatus { task_id: task.id() });
    }
    if origin == ChangeOrigin::External && task.role() == TaskRole::FollowUp {
        return GuardVerdict::Denied(DenialReason::FollowUpDirectChange { task_id: task.id() });
    }
    if origin == ChangeOrigin::External
        && task.status() == TaskStatus::InReview
        && (task.needs_validation() || task.role() == TaskRole::Realization)
    {
        return GuardVerdict::Denied(DenialReason::ReviewDecisionRequired {
            task_id: task.id(),
            requested,
        });
    }
    GuardVerdict::Allowed
}
