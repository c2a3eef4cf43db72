//! Mutation sets: the atomic unit of change across one or two tasks.
//!
//! A review decision or status change never writes to the store directly;
//! it is planned as a [`MutationSet`] that the store commits all-or-nothing
//! with a compare-and-swap on every member's version.

use super::{Progress, ReviewState, Subtask, TaskId, TaskStatus, Version};
use serde::{Deserialize, Serialize};

/// The mutable fields a single committed change may touch.
///
/// Fields absent from the record are left untouched by the commit. Identity,
/// role, pairing, and the validation-requirement flag have no representation
/// here and are therefore immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldChanges {
    status: Option<TaskStatus>,
    review_state: Option<ReviewState>,
    progress: Option<Progress>,
    subtasks: Option<Vec<Subtask>>,
}

impl FieldChanges {
    /// Creates an empty change record.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            status: None,
            review_state: None,
            progress: None,
            subtasks: None,
        }
    }

    /// Sets the lifecycle status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the review state.
    #[must_use]
    pub fn with_review_state(mut self, review_state: ReviewState) -> Self {
        self.review_state = Some(review_state);
        self
    }

    /// Sets the completion percentage.
    #[must_use]
    pub const fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Replaces the checklist.
    #[must_use]
    pub fn with_subtasks(mut self, subtasks: Vec<Subtask>) -> Self {
        self.subtasks = Some(subtasks);
        self
    }

    /// Returns the requested status change, if any.
    #[must_use]
    pub const fn status(&self) -> Option<TaskStatus> {
        self.status
    }

    /// Returns the requested review-state change, if any.
    #[must_use]
    pub const fn review_state(&self) -> Option<&ReviewState> {
        self.review_state.as_ref()
    }

    /// Returns the requested progress change, if any.
    #[must_use]
    pub const fn progress(&self) -> Option<Progress> {
        self.progress
    }

    /// Returns the requested checklist replacement, if any.
    #[must_use]
    pub fn subtasks(&self) -> Option<&[Subtask]> {
        self.subtasks.as_deref()
    }

    /// Returns `true` when the record changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.review_state.is_none()
            && self.progress.is_none()
            && self.subtasks.is_none()
    }
}

/// A change record addressed to one task at a known version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMutation {
    /// The task to mutate.
    pub task_id: TaskId,
    /// The version the planner observed; the commit fails if the stored
    /// version differs.
    pub expected_version: Version,
    /// The field changes to apply.
    pub changes: FieldChanges,
}

impl TaskMutation {
    /// Creates a mutation record.
    #[must_use]
    pub const fn new(task_id: TaskId, expected_version: Version, changes: FieldChanges) -> Self {
        Self {
            task_id,
            expected_version,
            changes,
        }
    }
}

/// The complete, atomic group of changes produced by one decision.
///
/// A set spans one task, or both members of a linked pair. The store commits
/// every member or none; a partially applied set is never observable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationSet {
    mutations: Vec<TaskMutation>,
}

impl MutationSet {
    /// Creates a set touching a single task.
    #[must_use]
    pub fn single(mutation: TaskMutation) -> Self {
        Self {
            mutations: vec![mutation],
        }
    }

    /// Creates a set touching both members of a pair.
    ///
    /// The two mutations must address distinct tasks; a decision never
    /// produces two records for the same aggregate.
    #[must_use]
    pub fn pair(first: TaskMutation, second: TaskMutation) -> Self {
        debug_assert!(
            first.task_id != second.task_id,
            "pair mutation sets must address distinct tasks"
        );
        Self {
            mutations: vec![first, second],
        }
    }

    /// Returns the mutations in commit order.
    #[must_use]
    pub fn mutations(&self) -> &[TaskMutation] {
        &self.mutations
    }

    /// Returns the number of tasks touched.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// Returns `true` when the set touches no task.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Consumes the set, returning the mutations in commit order.
    #[must_use]
    pub fn into_mutations(self) -> Vec<TaskMutation> {
        self.mutations
    }
}
