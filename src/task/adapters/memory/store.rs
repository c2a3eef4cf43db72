//! In-memory task store for tests and embedded use.

use async_trait::async_trait;
use mockable::Clock;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{MutationSet, Task, TaskId},
    ports::{TaskStore, TaskStoreError, TaskStoreResult},
};

/// Thread-safe in-memory task store.
///
/// Commits are all-or-nothing: every version check runs before any state is
/// replaced, under a single write lock, so a stale member leaves the whole
/// set unapplied.
#[derive(Debug)]
pub struct InMemoryTaskStore<C: Clock + Send + Sync> {
    state: Arc<RwLock<HashMap<TaskId, Task>>>,
    clock: Arc<C>,
}

impl<C: Clock + Send + Sync> Clone for InMemoryTaskStore<C> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C: Clock + Send + Sync> InMemoryTaskStore<C> {
    /// Creates an empty store with the given clock.
    #[must_use]
    pub fn new(clock: Arc<C>) -> Self {
        Self {
            state: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Returns the number of stored tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().map(|guard| guard.len()).unwrap_or(0)
    }

    /// Returns `true` when no tasks are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write_guard(
        &self,
    ) -> TaskStoreResult<std::sync::RwLockWriteGuard<'_, HashMap<TaskId, Task>>> {
        self.state
            .write()
            .map_err(|err| TaskStoreError::persistence(std::io::Error::other(err.to_string())))
    }
}

#[async_trait]
impl<C: Clock + Send + Sync> TaskStore for InMemoryTaskStore<C> {
    async fn insert(&self, task: &Task) -> TaskStoreResult<()> {
        let mut state = self.write_guard()?;
        if state.contains_key(&task.id()) {
            return Err(TaskStoreError::DuplicateTask(task.id()));
        }
        state.insert(task.id(), task.clone());
        Ok(())
    }

    async fn insert_pair(&self, first: &Task, second: &Task) -> TaskStoreResult<()> {
        let mut state = self.write_guard()?;
        for task in [first, second] {
            if state.contains_key(&task.id()) {
                return Err(TaskStoreError::DuplicateTask(task.id()));
            }
        }
        state.insert(first.id(), first.clone());
        state.insert(second.id(), second.clone());
        Ok(())
    }

    async fn get(&self, id: TaskId) -> TaskStoreResult<Option<Task>> {
        let state = self
            .state
            .read()
            .map_err(|err| TaskStoreError::persistence(std::io::Error::other(err.to_string())))?;
        Ok(state.get(&id).cloned())
    }

    async fn commit(&self, set: MutationSet) -> TaskStoreResult<Vec<Task>> {
        let mut state = self.write_guard()?;

        // Validate and stage every member before replacing any state, so a
        // failure partway leaves nothing applied.
        let mut staged = Vec::with_capacity(set.len());
        for mutation in set.mutations() {
            let current = state
                .get(&mutation.task_id)
                .ok_or(TaskStoreError::NotFound(mutation.task_id))?;
            if current.version() != mutation.expected_version {
                return Err(TaskStoreError::VersionConflict {
                    task_id: mutation.task_id,
                    expected: mutation.expected_version,
                    actual: current.version(),
                });
            }
            let mut updated = current.clone();
            updated
                .apply(&mutation.changes, &*self.clock)
                .map_err(TaskStoreError::persistence)?;
            staged.push(updated);
        }

        for task in &staged {
            state.insert(task.id(), task.clone());
        }
        Ok(staged)
    }
}
