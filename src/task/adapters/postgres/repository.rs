//! `PostgreSQL` task store implementation.
//!
//! Mutation sets commit inside a single database transaction: every member
//! row is locked, version-checked against the planner's expectation, and
//! rewritten, with any mismatch rolling the whole transaction back.

use super::{
    models::{NewTaskRow, TaskRow, TaskRowChanges},
    schema::tasks,
};
use crate::task::{
    domain::{
        MutationSet, PersistedTaskData, Progress, ReviewState, Subtask, Task, TaskId, TaskMutation,
        TaskRole, TaskStatus, UserId, Version,
    },
    ports::{TaskStore, TaskStoreError, TaskStoreResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use mockable::Clock;
use std::sync::Arc;

/// `PostgreSQL` connection pool type used by the task store.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task store.
#[derive(Debug, Clone)]
pub struct PostgresTaskStore<C: Clock + Send + Sync + 'static> {
    pool: TaskPgPool,
    clock: Arc<C>,
}

impl From<DieselError> for TaskStoreError {
    fn from(err: DieselError) -> Self {
        // Unique violations are mapped to DuplicateTask at the insert call
        // sites, where the offending identifier is known; everything else
        // is an opaque persistence failure.
        Self::persistence(err)
    }
}

impl<C: Clock + Send + Sync + 'static> PostgresTaskStore<C> {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool, clock: Arc<C>) -> Self {
        Self { pool, clock }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskStoreError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskStoreError::persistence)?
    }
}

#[async_trait]
impl<C: Clock + Send + Sync + 'static> TaskStore for PostgresTaskStore<C> {
    async fn insert(&self, task: &Task) -> TaskStoreResult<()> {
        let task_id = task.id();
        let new_row = to_new_row(task)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| map_insert_error(err, task_id))?;
            Ok(())
        })
        .await
    }

    async fn insert_pair(&self, first: &Task, second: &Task) -> TaskStoreResult<()> {
        let first_id = first.id();
        let second_id = second.id();
        let rows = [to_new_row(first)?, to_new_row(second)?];

        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskStoreError, _>(|conn| {
                for (row, task_id) in rows.iter().zip([first_id, second_id]) {
                    diesel::insert_into(tasks::table)
                        .values(row)
                        .execute(conn)
                        .map_err(|err| map_insert_error(err, task_id))?;
                }
                Ok(())
            })
        })
        .await
    }

    async fn get(&self, id: TaskId) -> TaskStoreResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskStoreError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn commit(&self, set: MutationSet) -> TaskStoreResult<Vec<Task>> {
        let clock = Arc::clone(&self.clock);
        let mutations = set.into_mutations();

        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskStoreError, _>(|conn| {
                let mut updated = Vec::with_capacity(mutations.len());
                for mutation in &mutations {
                    updated.push(apply_mutation(conn, mutation, &*clock)?);
                }
                Ok(updated)
            })
        })
        .await
    }
}

/// Version-checks and rewrites a single member row.
///
/// The write is a compare-and-swap: the `UPDATE` matches on both id and the
/// expected version, so a row that moved between read and write updates
/// zero rows and the surrounding transaction rolls back.
fn apply_mutation(
    conn: &mut PgConnection,
    mutation: &TaskMutation,
    clock: &impl Clock,
) -> TaskStoreResult<Task> {
    let row = tasks::table
        .filter(tasks::id.eq(mutation.task_id.into_inner()))
        .select(TaskRow::as_select())
        .first::<TaskRow>(conn)
        .optional()?
        .ok_or(TaskStoreError::NotFound(mutation.task_id))?;

    let mut task = row_to_task(row)?;
    if task.version() != mutation.expected_version {
        return Err(TaskStoreError::VersionConflict {
            task_id: mutation.task_id,
            expected: mutation.expected_version,
            actual: task.version(),
        });
    }

    task.apply(&mutation.changes, clock)
        .map_err(TaskStoreError::persistence)?;

    let expected = i64::try_from(mutation.expected_version.value())
        .map_err(TaskStoreError::persistence)?;
    let affected = diesel::update(
        tasks::table
            .filter(tasks::id.eq(mutation.task_id.into_inner()))
            .filter(tasks::version.eq(expected)),
    )
    .set(to_changeset(&task)?)
    .execute(conn)?;
    if affected == 0 {
        return Err(stale_row_error(conn, mutation));
    }
    Ok(task)
}

/// Builds the conflict error for a row that moved between read and write.
fn stale_row_error(conn: &mut PgConnection, mutation: &TaskMutation) -> TaskStoreError {
    let current = tasks::table
        .filter(tasks::id.eq(mutation.task_id.into_inner()))
        .select(TaskRow::as_select())
        .first::<TaskRow>(conn)
        .optional()
        .ok()
        .flatten();
    current
        .and_then(|row| row_to_task(row).ok())
        .map_or(TaskStoreError::NotFound(mutation.task_id), |task| {
            TaskStoreError::VersionConflict {
                task_id: mutation.task_id,
                expected: mutation.expected_version,
                actual: task.version(),
            }
        })
}

fn map_insert_error(err: DieselError, task_id: TaskId) -> TaskStoreError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            TaskStoreError::DuplicateTask(task_id)
        }
        _ => TaskStoreError::persistence(err),
    }
}

fn row_to_task(row: TaskRow) -> TaskStoreResult<Task> {
    let role = TaskRole::try_from(row.role.as_str()).map_err(TaskStoreError::persistence)?;
    let status = TaskStatus::try_from(row.status.as_str()).map_err(TaskStoreError::persistence)?;
    let review_state: ReviewState =
        serde_json::from_value(row.review_state).map_err(TaskStoreError::persistence)?;
    let subtasks: Vec<Subtask> =
        serde_json::from_value(row.subtasks).map_err(TaskStoreError::persistence)?;
    let progress = u8::try_from(row.progress)
        .map_err(TaskStoreError::persistence)
        .and_then(|value| Progress::new(value).map_err(TaskStoreError::persistence))?;
    let version = u64::try_from(row.version)
        .map_err(TaskStoreError::persistence)
        .and_then(|value| Version::new(value).map_err(TaskStoreError::persistence))?;

    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(row.id),
        title: row.title,
        description: row.description,
        role,
        status,
        assignee_id: UserId::from_uuid(row.assignee_id),
        creator_id: UserId::from_uuid(row.creator_id),
        linked_task_id: row.linked_task_id.map(TaskId::from_uuid),
        needs_validation: row.needs_validation,
        review_state,
        progress,
        subtasks,
        version,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

fn to_new_row(task: &Task) -> TaskStoreResult<NewTaskRow> {
    Ok(NewTaskRow {
        id: task.id().into_inner(),
        title: task.title().to_owned(),
        description: task.description().to_owned(),
        role: task.role().as_str().to_owned(),
        status: task.status().as_str().to_owned(),
        assignee_id: task.assignee_id().into_inner(),
        creator_id: task.creator_id().into_inner(),
        linked_task_id: task.linked_task_id().map(TaskId::into_inner),
        needs_validation: task.needs_validation(),
        review_state: serde_json::to_value(task.review_state())
            .map_err(TaskStoreError::persistence)?,
        progress: i16::from(task.progress().value()),
        subtasks: serde_json::to_value(task.subtasks()).map_err(TaskStoreError::persistence)?,
        version: i64::try_from(task.version().value()).map_err(TaskStoreError::persistence)?,
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    })
}

fn to_changeset(task: &Task) -> TaskStoreResult<TaskRowChanges> {
    Ok(TaskRowChanges {
        status: task.status().as_str().to_owned(),
        review_state: serde_json::to_value(task.review_state())
            .map_err(TaskStoreError::persistence)?,
        progress: i16::from(task.progress().value()),
        subtasks: serde_json::to_value(task.subtasks()).map_err(TaskStoreError::persistence)?,
        version: i64::try_from(task.version().value()).map_err(TaskStoreError::persistence)?,
        updated_at: task.updated_at(),
    })
}
