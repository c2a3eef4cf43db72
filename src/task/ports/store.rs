//! Store port for task persistence and atomic mutation-set commits.

use crate::task::domain::{MutationSet, Task, TaskId, Version};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;

/// Task persistence contract.
///
/// All writes after creation go through [`TaskStore::commit`], which applies
/// a complete mutation set or nothing: every member's stored version must
/// match the version the planner observed, and a single mismatch rejects
/// the whole set with [`TaskStoreError::VersionConflict`].
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::DuplicateTask`] when the task ID already
    /// exists.
    async fn insert(&self, task: &Task) -> TaskStoreResult<()>;

    /// Stores both members of a freshly created pair atomically.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::DuplicateTask`] when either ID already
    /// exists; in that case neither task is stored.
    async fn insert_pair(&self, first: &Task, second: &Task) -> TaskStoreResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn get(&self, id: TaskId) -> TaskStoreResult<Option<Task>>;

    /// Commits a mutation set atomically, returning the updated tasks in
    /// set order.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] when a member does not exist, or
    /// [`TaskStoreError::VersionConflict`] when any member's stored version
    /// differs from the expected one. On either error nothing is applied.
    async fn commit(&self, set: MutationSet) -> TaskStoreResult<Vec<Task>>;
}

/// Errors returned by task store implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskStoreError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// A mutation carried a stale expected version.
    #[error("version conflict on task {task_id}: expected {expected}, found {actual}")]
    VersionConflict {
        /// The task whose version moved.
        task_id: TaskId,
        /// The version the caller expected.
        expected: Version,
        /// The version actually stored.
        actual: Version,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
