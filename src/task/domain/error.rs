//! Error types for task domain validation and parsing.

use super::{SubtaskId, TaskId};
use thiserror::Error;

/// Errors returned while constructing or mutating domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// Review feedback is empty after trimming.
    #[error("review feedback must not be empty")]
    EmptyFeedback,

    /// Review feedback exceeds the persisted size bound.
    #[error("review feedback is {actual_bytes} bytes, exceeds limit of {limit_bytes}")]
    FeedbackTooLong {
        /// Size of the supplied feedback in bytes.
        actual_bytes: usize,
        /// Maximum accepted size in bytes.
        limit_bytes: usize,
    },

    /// The progress value lies outside 0–100.
    #[error("invalid progress value {0}, expected 0-100")]
    InvalidProgress(u8),

    /// The version counter cannot be represented in the storage schema.
    #[error("version {0} exceeds the persistable range")]
    VersionOutOfRange(u64),

    /// The subtask list exceeds the per-task bound.
    #[error("task has {actual} subtasks, exceeds limit of {max}")]
    TooManySubtasks {
        /// Maximum accepted number of subtasks.
        max: usize,
        /// Number of subtasks supplied.
        actual: usize,
    },

    /// The referenced subtask does not exist on the task.
    #[error("subtask {subtask_id} not found on task {task_id}")]
    SubtaskNotFound {
        /// The task that was searched.
        task_id: TaskId,
        /// The missing subtask identifier.
        subtask_id: SubtaskId,
    },
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing task roles from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task role: {0}")]
pub struct ParseTaskRoleError(pub String);
