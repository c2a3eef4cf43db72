//! Task aggregate root and related lifecycle types.

use super::{
    Feedback, ParseTaskRoleError, ParseTaskStatusError, Progress, SubtaskId, TaskDomainError,
    TaskId, UserId, Version, mutation::FieldChanges,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Work has not started.
    Todo,
    /// Work is underway.
    InProgress,
    /// Work is awaiting a review decision.
    InReview,
    /// Work is complete; no further transitions are accepted.
    Done,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::InReview => "in_review",
            Self::Done => "done",
        }
    }

    /// Returns `true` when the status accepts no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done)
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "todo" => Ok(Self::Todo),
            "in_progress" => Ok(Self::InProgress),
            "in_review" => Ok(Self::InReview),
            "done" => Ok(Self::Done),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Structural role of a task within the review workflow.
///
/// The role is an explicit field set at creation time; it is never inferred
/// from title text or tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskRole {
    /// An unpaired task.
    Standalone,
    /// The reviewing half of a pair; its assignee judges the linked
    /// realization task.
    FollowUp,
    /// The work-product half of a pair.
    Realization,
}

impl TaskRole {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standalone => "standalone",
            Self::FollowUp => "follow_up",
            Self::Realization => "realization",
        }
    }
}

impl TryFrom<&str> for TaskRole {
    type Error = ParseTaskRoleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "standalone" => Ok(Self::Standalone),
            "follow_up" => Ok(Self::FollowUp),
            "realization" => Ok(Self::Realization),
            _ => Err(ParseTaskRoleError(value.to_owned())),
        }
    }
}

/// Review progress attached to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReviewState {
    /// No review activity is pending or recorded.
    #[default]
    None,
    /// The task entered review and awaits a first-tier decision.
    AwaitingReview,
    /// A reviewer bounced the work; the feedback records why.
    ReturnedWithFeedback {
        /// The reviewer's explanation.
        feedback: Feedback,
    },
    /// A first-tier acceptance is awaiting manager validation.
    AwaitingManagerValidation,
}

impl ReviewState {
    /// Returns `true` when no review activity is recorded.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Returns `true` when a manager validation is pending.
    #[must_use]
    pub const fn is_awaiting_manager_validation(&self) -> bool {
        matches!(self, Self::AwaitingManagerValidation)
    }

    /// Returns the recorded feedback, if any.
    #[must_use]
    pub const fn feedback(&self) -> Option<&Feedback> {
        match self {
            Self::ReturnedWithFeedback { feedback } => Some(feedback),
            _ => None,
        }
    }
}

/// A checklist entry within a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    /// Subtask identifier, unique within the owning task.
    pub id: SubtaskId,
    /// Checklist label.
    pub text: String,
    /// Completion flag.
    pub completed: bool,
}

impl Subtask {
    /// Creates an incomplete subtask with a fresh identifier.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: SubtaskId::new(),
            text: text.into(),
            completed: false,
        }
    }
}

/// Validated parameters for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskParams {
    title: String,
    description: String,
    assignee_id: UserId,
    creator_id: UserId,
    subtasks: Vec<Subtask>,
}

impl NewTaskParams {
    /// Creates parameters with a validated title.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the title is empty after
    /// trimming.
    pub fn new(
        title: impl Into<String>,
        assignee_id: UserId,
        creator_id: UserId,
    ) -> Result<Self, TaskDomainError> {
        let raw = title.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        Ok(Self {
            title: normalized.to_owned(),
            description: String::new(),
            assignee_id,
            creator_id,
            subtasks: Vec::new(),
        })
    }

    /// Sets the task description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Seeds the task with an initial checklist.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TooManySubtasks`] when the list exceeds
    /// [`Task::MAX_SUBTASKS`].
    pub fn with_subtasks(
        mut self,
        texts: impl IntoIterator<Item = String>,
    ) -> Result<Self, TaskDomainError> {
        let subtasks: Vec<Subtask> = texts.into_iter().map(Subtask::new).collect();
        if subtasks.len() > Task::MAX_SUBTASKS {
            return Err(TaskDomainError::TooManySubtasks {
                max: Task::MAX_SUBTASKS,
                actual: subtasks.len(),
            });
        }
        self.subtasks = subtasks;
        Ok(self)
    }
}

/// A freshly created follow-up/realization pair with symmetric links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPair {
    /// The work-product task.
    pub realization: Task,
    /// The reviewing task.
    pub follow_up: Task,
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: String,
    description: String,
    role: TaskRole,
    status: TaskStatus,
    assignee_id: UserId,
    creator_id: UserId,
    linked_task_id: Option<TaskId>,
    needs_validation: bool,
    review_state: ReviewState,
    progress: Progress,
    subtasks: Vec<Subtask>,
    version: Version,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted title.
    pub title: String,
    /// Persisted description.
    pub description: String,
    /// Persisted workflow role.
    pub role: TaskRole,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// Persisted assignee reference.
    pub assignee_id: UserId,
    /// Persisted creator reference.
    pub creator_id: UserId,
    /// Persisted link to the paired task, if any.
    pub linked_task_id: Option<TaskId>,
    /// Persisted manager-validation flag.
    pub needs_validation: bool,
    /// Persisted review state.
    pub review_state: ReviewState,
    /// Persisted completion percentage.
    pub progress: Progress,
    /// Persisted checklist.
    pub subtasks: Vec<Subtask>,
    /// Persisted optimistic-concurrency version.
    pub version: Version,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Largest checklist accepted on a single task.
    pub const MAX_SUBTASKS: usize = 64;

    /// Creates an unpaired task.
    #[must_use]
    pub fn new_standalone(
        params: NewTaskParams,
        needs_validation: bool,
        clock: &impl Clock,
    ) -> Self {
        Self::from_params(params, TaskRole::Standalone, None, needs_validation, clock)
    }

    /// Creates a follow-up/realization pair with symmetric links.
    ///
    /// Both members share the `needs_validation` flag: escalation to the
    /// manager tier is a property of the pair, not of one member.
    #[must_use]
    pub fn new_pair(
        realization: NewTaskParams,
        follow_up: NewTaskParams,
        needs_validation: bool,
        clock: &impl Clock,
    ) -> TaskPair {
        let realization_id = TaskId::new();
        let follow_up_id = TaskId::new();
        let mut realization_task = Self::from_params(
            realization,
            TaskRole::Realization,
            Some(follow_up_id),
            needs_validation,
            clock,
        );
        realization_task.id = realization_id;
        let mut follow_up_task = Self::from_params(
            follow_up,
            TaskRole::FollowUp,
            Some(realization_id),
            needs_validation,
            clock,
        );
        follow_up_task.id = follow_up_id;
        TaskPair {
            realization: realization_task,
            follow_up: follow_up_task,
        }
    }

    fn from_params(
        params: NewTaskParams,
        role: TaskRole,
        linked_task_id: Option<TaskId>,
        needs_validation: bool,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            title: params.title,
            description: params.description,
            role,
            status: TaskStatus::Todo,
            assignee_id: params.assignee_id,
            creator_id: params.creator_id,
            linked_task_id,
            needs_validation,
            review_state: ReviewState::None,
            progress: Progress::ZERO,
            subtasks: params.subtasks,
            version: Version::initial(),
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            role: data.role,
            status: data.status,
            assignee_id: data.assignee_id,
            creator_id: data.creator_id,
            linked_task_id: data.linked_task_id,
            needs_validation: data.needs_validation,
            review_state: data.review_state,
            progress: data.progress,
            subtasks: data.subtasks,
            version: data.version,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the task description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the workflow role.
    #[must_use]
    pub const fn role(&self) -> TaskRole {
        self.role
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the assignee reference.
    #[must_use]
    pub const fn assignee_id(&self) -> UserId {
        self.assignee_id
    }

    /// Returns the creator reference.
    #[must_use]
    pub const fn creator_id(&self) -> UserId {
        self.creator_id
    }

    /// Returns the paired task identifier, if any.
    #[must_use]
    pub const fn linked_task_id(&self) -> Option<TaskId> {
        self.linked_task_id
    }

    /// Returns `true` when completion requires manager validation.
    #[must_use]
    pub const fn needs_validation(&self) -> bool {
        self.needs_validation
    }

    /// Returns the review state.
    #[must_use]
    pub const fn review_state(&self) -> &ReviewState {
        &self.review_state
    }

    /// Returns the completion percentage.
    #[must_use]
    pub const fn progress(&self) -> Progress {
        self.progress
    }

    /// Returns the checklist entries in order.
    #[must_use]
    pub fn subtasks(&self) -> &[Subtask] {
        &self.subtasks
    }

    /// Returns the optimistic-concurrency version.
    #[must_use]
    pub const fn version(&self) -> Version {
        self.version
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` when moving this task into review gates completion
    /// behind a review decision.
    #[must_use]
    pub const fn is_reviewable(&self) -> bool {
        matches!(self.role, TaskRole::Realization) || self.needs_validation
    }

    /// Returns the checklist with the given entry's completion flag flipped.
    ///
    /// The list itself is not mutated; the caller commits the returned list
    /// through a mutation set so the change is version-checked like any
    /// other write.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::SubtaskNotFound`] when the task has no
    /// such entry.
    pub fn toggled_subtasks(&self, subtask_id: SubtaskId) -> Result<Vec<Subtask>, TaskDomainError> {
        if !self.subtasks.iter().any(|entry| entry.id == subtask_id) {
            return Err(TaskDomainError::SubtaskNotFound {
                task_id: self.id,
                subtask_id,
            });
        }
        Ok(self
            .subtasks
            .iter()
            .map(|entry| {
                let mut updated = entry.clone();
                if updated.id == subtask_id {
                    updated.completed = !updated.completed;
                }
                updated
            })
            .collect())
    }

    /// Applies a committed field-change record, bumping the version.
    ///
    /// Only the store calls this, inside its atomic commit path. Identity,
    /// role, link, and validation-requirement fields are not expressible as
    /// changes and therefore never move after creation.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::VersionOutOfRange`] when the version
    /// counter would leave the persistable range, or
    /// [`TaskDomainError::TooManySubtasks`] when a checklist replacement
    /// exceeds [`Self::MAX_SUBTASKS`].
    pub fn apply(
        &mut self,
        changes: &FieldChanges,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if let Some(subtasks) = changes.subtasks()
            && subtasks.len() > Self::MAX_SUBTASKS
        {
            return Err(TaskDomainError::TooManySubtasks {
                max: Self::MAX_SUBTASKS,
                actual: subtasks.len(),
            });
        }
        self.version = self.version.next()?;
        if let Some(status) = changes.status() {
            self.status = status;
        }
        if let Some(review_state) = changes.review_state() {
            self.review_state = review_state.clone();
        }
        if let Some(progress) = changes.progress() {
            self.progress = progress;
        }
        if let Some(subtasks) = changes.subtasks() {
            self.subtasks = subtasks.to_vec();
        }
        self.updated_at = clock.utc();
        Ok(())
    }
}
