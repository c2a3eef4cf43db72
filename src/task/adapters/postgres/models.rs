//! Diesel row models for task persistence.

use super::schema::tasks;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Task title.
    pub title: String,
    /// Task description.
    pub description: String,
    /// Workflow role.
    pub role: String,
    /// Lifecycle status.
    pub status: String,
    /// Assignee reference.
    pub assignee_id: uuid::Uuid,
    /// Creator reference.
    pub creator_id: uuid::Uuid,
    /// Paired task identifier, when linked.
    pub linked_task_id: Option<uuid::Uuid>,
    /// Whether completion requires manager validation.
    pub needs_validation: bool,
    /// Review state JSON payload.
    pub review_state: Value,
    /// Completion percentage.
    pub progress: i16,
    /// Checklist JSON payload.
    pub subtasks: Value,
    /// Optimistic-concurrency version counter.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Task title.
    pub title: String,
    /// Task description.
    pub description: String,
    /// Workflow role.
    pub role: String,
    /// Lifecycle status.
    pub status: String,
    /// Assignee reference.
    pub assignee_id: uuid::Uuid,
    /// Creator reference.
    pub creator_id: uuid::Uuid,
    /// Paired task identifier, when linked.
    pub linked_task_id: Option<uuid::Uuid>,
    /// Whether completion requires manager validation.
    pub needs_validation: bool,
    /// Review state JSON payload.
    pub review_state: Value,
    /// Completion percentage.
    pub progress: i16,
    /// Checklist JSON payload.
    pub subtasks: Value,
    /// Optimistic-concurrency version counter.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Update model for the mutable slice of a task record.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tasks)]
pub struct TaskRowChanges {
    /// Lifecycle status.
    pub status: String,
    /// Review state JSON payload.
    pub review_state: Value,
    /// Completion percentage.
    pub progress: i16,
    /// Checklist JSON payload.
    pub subtasks: Value,
    /// Optimistic-concurrency version counter.
    pub version: i64,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}
