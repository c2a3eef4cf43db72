//! Review workflow orchestration service.
//!
//! The orchestrator is the single entry point for task mutation: it runs
//! the transition guard, asks the synchronizer for the mutation set,
//! commits the set atomically, and emits effect requests afterwards. It is
//! the only component performing I/O beyond the store.

use crate::notification::{
    domain::{EffectRequest, NotificationKind},
    ports::NotificationDispatcher,
};
use crate::task::{
    domain::{
        ChangeOrigin, DenialReason, Feedback, FieldChanges, MutationSet, NewTaskParams, Progress,
        ReviewDecision, ReviewTier, SubtaskId, Task, TaskDomainError, TaskId, TaskMutation,
        TaskPair, TaskRole, TaskStatus, UserId, Version, can_transition, plan_review,
        plan_status_change,
    },
    ports::{IdentityError, IdentityProvider, TaskStore, TaskStoreError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors for workflow operations.
///
/// Each variant drives distinct caller behaviour: a denial is surfaced as
/// guidance, a conflict asks the caller to re-fetch and retry, a validation
/// failure asks for corrected input, and a missing task is a stale
/// reference.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Policy refused the request; retrying unchanged will not succeed.
    #[error("denied: {0}")]
    Denied(DenialReason),

    /// The aggregate moved since the caller read it; re-fetch and retry.
    #[error("version conflict on task {task_id}: expected {expected}, found {actual}")]
    Conflict {
        /// The task whose version moved.
        task_id: TaskId,
        /// The version the caller expected.
        expected: Version,
        /// The version actually stored.
        actual: Version,
    },

    /// The referenced task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The request payload failed domain validation.
    #[error(transparent)]
    Validation(#[from] TaskDomainError),

    /// A stored pair violates the symmetric-link invariant.
    #[error("task {task_id} has a broken pair link to {linked_task_id:?}")]
    LinkIntegrity {
        /// The task whose link is broken.
        task_id: TaskId,
        /// The link it carries, if any.
        linked_task_id: Option<TaskId>,
    },

    /// Persistence failed for a reason other than a version race.
    #[error("store error: {0}")]
    Store(TaskStoreError),

    /// The identity provider could not resolve the acting user.
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

impl From<DenialReason> for WorkflowError {
    fn from(reason: DenialReason) -> Self {
        Self::Denied(reason)
    }
}

impl From<TaskStoreError> for WorkflowError {
    fn from(err: TaskStoreError) -> Self {
        match err {
            TaskStoreError::NotFound(task_id) => Self::NotFound(task_id),
            TaskStoreError::VersionConflict {
                task_id,
                expected,
                actual,
            } => Self::Conflict {
                task_id,
                expected,
                actual,
            },
            other => Self::Store(other),
        }
    }
}

/// Result type for workflow operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Raw payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    title: String,
    description: Option<String>,
    assignee_id: UserId,
    creator_id: UserId,
    subtasks: Vec<String>,
}

impl TaskDraft {
    /// Creates a draft with required fields.
    #[must_use]
    pub fn new(title: impl Into<String>, assignee_id: UserId, creator_id: UserId) -> Self {
        Self {
            title: title.into(),
            description: None,
            assignee_id,
            creator_id,
            subtasks: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Seeds the checklist.
    #[must_use]
    pub fn with_subtasks(mut self, texts: impl IntoIterator<Item = String>) -> Self {
        self.subtasks = texts.into_iter().collect();
        self
    }

    fn into_params(self) -> Result<NewTaskParams, TaskDomainError> {
        let mut params = NewTaskParams::new(self.title, self.assignee_id, self.creator_id)?;
        if let Some(description) = self.description {
            params = params.with_description(description);
        }
        params.with_subtasks(self.subtasks)
    }
}

/// Request payload for an external status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateStatusRequest {
    /// The task to move.
    pub task_id: TaskId,
    /// The requested status.
    pub new_status: TaskStatus,
    /// The acting user.
    pub actor_id: UserId,
    /// The version the caller read.
    pub expected_version: Version,
}

impl UpdateStatusRequest {
    /// Creates a status-change request.
    #[must_use]
    pub const fn new(
        task_id: TaskId,
        new_status: TaskStatus,
        actor_id: UserId,
        expected_version: Version,
    ) -> Self {
        Self {
            task_id,
            new_status,
            actor_id,
            expected_version,
        }
    }
}

/// The raw review action carried by a request, before feedback validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewAction {
    /// Approve the work.
    Accept,
    /// Bounce the work for rework.
    Return {
        /// Raw feedback text; must be non-empty after trimming.
        feedback: String,
    },
    /// Reject the work wholesale.
    Decline {
        /// Raw feedback text; must be non-empty after trimming.
        feedback: String,
    },
}

/// Request payload for a review decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewTaskRequest {
    /// The task the decision addresses; either member of a pair is
    /// accepted, the decision always lands on the reviewing side.
    pub task_id: TaskId,
    /// The acting user.
    pub actor_id: UserId,
    /// The version the caller read for the addressed task.
    pub expected_version: Version,
    /// The requested action.
    pub action: ReviewAction,
}

impl ReviewTaskRequest {
    /// Creates an accept request.
    #[must_use]
    pub const fn accept(task_id: TaskId, actor_id: UserId, expected_version: Version) -> Self {
        Self {
            task_id,
            actor_id,
            expected_version,
            action: ReviewAction::Accept,
        }
    }

    /// Creates a return request with feedback.
    #[must_use]
    pub fn return_with_feedback(
        task_id: TaskId,
        actor_id: UserId,
        expected_version: Version,
        feedback: impl Into<String>,
    ) -> Self {
        Self {
            task_id,
            actor_id,
            expected_version,
            action: ReviewAction::Return {
                feedback: feedback.into(),
            },
        }
    }

    /// Creates a decline request with feedback.
    #[must_use]
    pub fn decline_with_feedback(
        task_id: TaskId,
        actor_id: UserId,
        expected_version: Version,
        feedback: impl Into<String>,
    ) -> Self {
        Self {
            task_id,
            actor_id,
            expected_version,
            action: ReviewAction::Decline {
                feedback: feedback.into(),
            },
        }
    }
}

/// Review workflow orchestration service.
#[derive(Clone)]
pub struct ReviewWorkflow<S, I, N, C>
where
    S: TaskStore,
    I: IdentityProvider,
    N: NotificationDispatcher,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    identity: Arc<I>,
    dispatcher: Arc<N>,
    clock: Arc<C>,
}

impl<S, I, N, C> ReviewWorkflow<S, I, N, C>
where
    S: TaskStore,
    I: IdentityProvider,
    N: NotificationDispatcher,
    C: Clock + Send + Sync,
{
    /// Creates a new workflow service.
    #[must_use]
    pub const fn new(store: Arc<S>, identity: Arc<I>, dispatcher: Arc<N>, clock: Arc<C>) -> Self {
        Self {
            store,
            identity,
            dispatcher,
            clock,
        }
    }

    /// Creates and stores a standalone task.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Validation`] when the draft fails domain
    /// validation, or a store error when persistence rejects the insert.
    pub async fn create_task(
        &self,
        draft: TaskDraft,
        needs_validation: bool,
    ) -> WorkflowResult<Task> {
        let params = draft.into_params()?;
        let task = Task::new_standalone(params, needs_validation, &*self.clock);
        self.store.insert(&task).await?;
        tracing::info!(task_id = %task.id(), "created standalone task");
        Ok(task)
    }

    /// Creates and stores a follow-up/realization pair atomically.
    ///
    /// Both members carry symmetric links from construction, so the pairing
    /// invariant holds for every task the engine ever stores.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Validation`] when either draft fails domain
    /// validation, or a store error when persistence rejects the insert.
    pub async fn create_linked_pair(
        &self,
        realization: TaskDraft,
        follow_up: TaskDraft,
        needs_validation: bool,
    ) -> WorkflowResult<TaskPair> {
        let realization_params = realization.into_params()?;
        let follow_up_params = follow_up.into_params()?;
        let pair = Task::new_pair(
            realization_params,
            follow_up_params,
            needs_validation,
            &*self.clock,
        );
        self.store
            .insert_pair(&pair.realization, &pair.follow_up)
            .await?;
        tracing::info!(
            realization_id = %pair.realization.id(),
            follow_up_id = %pair.follow_up.id(),
            needs_validation,
            "created linked pair"
        );
        Ok(pair)
    }

    /// Returns the task with the given identifier.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotFound`] when no such task exists.
    pub async fn get_task(&self, task_id: TaskId) -> WorkflowResult<Task> {
        self.fetch(task_id).await
    }

    /// Applies an external status-change request.
    ///
    /// Runs the guard, mirrors the status onto the paired task, and commits
    /// the resulting set atomically. Returns every updated task.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Denied`] when the guard refuses the move,
    /// [`WorkflowError::Conflict`] when any touched aggregate moved since
    /// the caller read it, or [`WorkflowError::NotFound`] for a stale id.
    pub async fn update_status(&self, request: UpdateStatusRequest) -> WorkflowResult<Vec<Task>> {
        let task = self.fetch(request.task_id).await?;
        ensure_fresh(&task, request.expected_version)?;
        can_transition(&task, request.new_status, ChangeOrigin::External).into_result()?;
        let partner = self.resolve_partner(&task).await?;

        let set = plan_status_change(&task, partner.as_ref(), request.new_status);
        let updated = self.store.commit(set).await?;
        tracing::info!(
            task_id = %request.task_id,
            actor = %request.actor_id,
            status = request.new_status.as_str(),
            touched = updated.len(),
            "status change committed"
        );

        if request.new_status == TaskStatus::Done {
            self.dispatch(EffectRequest::new(
                task.assignee_id(),
                NotificationKind::TaskCompleted,
                task.id(),
                format!("Task '{}' is complete", task.title()),
            ))
            .await;
        }
        Ok(updated)
    }

    /// Applies a review decision.
    ///
    /// The request may address either member of a pair; the decision always
    /// lands on the reviewing side. First-tier decisions require the
    /// reviewing task's assignee; second-tier decisions require manager
    /// authority.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Validation`] when feedback is missing for a
    /// non-accept decision, [`WorkflowError::Denied`] when the actor or the
    /// review state refuses the decision, [`WorkflowError::Conflict`] on a
    /// version race, or [`WorkflowError::LinkIntegrity`] when the stored
    /// pair is broken.
    pub async fn review_task(&self, request: ReviewTaskRequest) -> WorkflowResult<Vec<Task>> {
        let addressed = self.fetch(request.task_id).await?;
        ensure_fresh(&addressed, request.expected_version)?;
        let partner = self.resolve_partner(&addressed).await?;
        let (subject, realization) = review_targets(&addressed, partner.as_ref());

        let tier = derive_tier(subject, realization);
        self.authorize(subject, tier, request.actor_id).await?;
        let decision = build_decision(&request.action)?;

        let set = plan_review(subject, realization, &decision, tier)?;
        let updated = self.store.commit(set).await?;
        tracing::info!(
            subject_id = %subject.id(),
            actor = %request.actor_id,
            accepted = decision.is_accept(),
            touched = updated.len(),
            "review decision committed"
        );

        self.notify_review_outcome(subject, realization, &decision, tier)
            .await;
        Ok(updated)
    }

    /// Updates the completion percentage of a single task.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Validation`] for a value above 100,
    /// [`WorkflowError::Denied`] on a done task, or
    /// [`WorkflowError::Conflict`] on a version race.
    pub async fn update_progress(
        &self,
        task_id: TaskId,
        value: u8,
        actor_id: UserId,
        expected_version: Version,
    ) -> WorkflowResult<Task> {
        let progress = Progress::new(value)?;
        let task = self.fetch(task_id).await?;
        ensure_fresh(&task, expected_version)?;
        ensure_not_terminal(&task)?;

        let set = MutationSet::single(TaskMutation::new(
            task.id(),
            task.version(),
            FieldChanges::new().with_progress(progress),
        ));
        let updated = self.commit_single(set, task_id).await?;
        tracing::debug!(task_id = %task_id, actor = %actor_id, value, "progress updated");
        Ok(updated)
    }

    /// Flips the completion flag of one checklist entry.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Validation`] when the entry does not exist,
    /// [`WorkflowError::Denied`] on a done task, or
    /// [`WorkflowError::Conflict`] on a version race.
    pub async fn toggle_subtask(
        &self,
        task_id: TaskId,
        subtask_id: SubtaskId,
        actor_id: UserId,
        expected_version: Version,
    ) -> WorkflowResult<Task> {
        let task = self.fetch(task_id).await?;
        ensure_fresh(&task, expected_version)?;
        ensure_not_terminal(&task)?;

        let subtasks = task.toggled_subtasks(subtask_id)?;
        let set = MutationSet::single(TaskMutation::new(
            task.id(),
            task.version(),
            FieldChanges::new().with_subtasks(subtasks),
        ));
        let updated = self.commit_single(set, task_id).await?;
        tracing::debug!(task_id = %task_id, actor = %actor_id, subtask_id = %subtask_id, "subtask toggled");
        Ok(updated)
    }

    async fn fetch(&self, task_id: TaskId) -> WorkflowResult<Task> {
        self.store
            .get(task_id)
            .await?
            .ok_or(WorkflowError::NotFound(task_id))
    }

    /// Resolves and verifies the pair partner of `task`.
    ///
    /// Enforces the symmetric-link invariant at runtime: a linked task must
    /// point back, roles must be complementary, and an unpaired role must
    /// carry no link.
    async fn resolve_partner(&self, task: &Task) -> WorkflowResult<Option<Task>> {
        let broken = |task: &Task| WorkflowError::LinkIntegrity {
            task_id: task.id(),
            linked_task_id: task.linked_task_id(),
        };

        let Some(linked_id) = task.linked_task_id() else {
            if task.role() == TaskRole::Standalone {
                return Ok(None);
            }
            return Err(broken(task));
        };
        if task.role() == TaskRole::Standalone {
            return Err(broken(task));
        }

        let partner = self
            .store
            .get(linked_id)
            .await?
            .ok_or_else(|| broken(task))?;
        let symmetric = partner.linked_task_id() == Some(task.id());
        let complementary = matches!(
            (task.role(), partner.role()),
            (TaskRole::FollowUp, TaskRole::Realization)
                | (TaskRole::Realization, TaskRole::FollowUp)
        );
        if !symmetric || !complementary {
            return Err(broken(task));
        }
        Ok(Some(partner))
    }

    async fn authorize(
        &self,
        subject: &Task,
        tier: ReviewTier,
        actor_id: UserId,
    ) -> WorkflowResult<()> {
        match tier {
            ReviewTier::Reviewer => {
                if actor_id != subject.assignee_id() {
                    return Err(WorkflowError::Denied(DenialReason::NotReviewer {
                        task_id: subject.id(),
                        actor: actor_id,
                    }));
                }
            }
            ReviewTier::Manager => {
                let role = self.identity.role_of(actor_id).await?;
                if !role.is_manager() {
                    return Err(WorkflowError::Denied(DenialReason::ManagerRequired {
                        task_id: subject.id(),
                    }));
                }
            }
        }
        Ok(())
    }

    async fn commit_single(&self, set: MutationSet, task_id: TaskId) -> WorkflowResult<Task> {
        self.store
            .commit(set)
            .await?
            .into_iter()
            .next()
            .ok_or(WorkflowError::NotFound(task_id))
    }

    async fn notify_review_outcome(
        &self,
        subject: &Task,
        realization: Option<&Task>,
        decision: &ReviewDecision,
        tier: ReviewTier,
    ) {
        let worked_on = realization.unwrap_or(subject);
        let request = match decision {
            ReviewDecision::Accept if tier == ReviewTier::Manager => EffectRequest::new(
                worked_on.assignee_id(),
                NotificationKind::TaskValidated,
                worked_on.id(),
                format!("Task '{}' was validated", worked_on.title()),
            ),
            ReviewDecision::Accept if subject.needs_validation() => EffectRequest::new(
                subject.creator_id(),
                NotificationKind::ManagerValidationRequested,
                subject.id(),
                format!("Task '{}' awaits manager validation", worked_on.title()),
            ),
            ReviewDecision::Accept => EffectRequest::new(
                worked_on.assignee_id(),
                NotificationKind::TaskCompleted,
                worked_on.id(),
                format!("Task '{}' is complete", worked_on.title()),
            ),
            ReviewDecision::Return { feedback } | ReviewDecision::Decline { feedback } => {
                EffectRequest::new(
                    worked_on.assignee_id(),
                    NotificationKind::TaskReturned,
                    worked_on.id(),
                    format!("Task '{}' was returned: {feedback}", worked_on.title()),
                )
            }
        };
        self.dispatch(request).await;
    }

    /// Enqueues an effect request, logging and swallowing failures.
    ///
    /// The committed transition is the source of truth; delivery is
    /// best-effort and must never surface as a workflow failure.
    async fn dispatch(&self, request: EffectRequest) {
        if let Err(err) = self.dispatcher.enqueue(request).await {
            tracing::warn!(error = %err, "notification dispatch failed");
        }
    }
}

/// Maps the addressed task onto (reviewing subject, realization partner).
fn review_targets<'a>(
    addressed: &'a Task,
    partner: Option<&'a Task>,
) -> (&'a Task, Option<&'a Task>) {
    match addressed.role() {
        TaskRole::Realization => match partner {
            Some(follow_up) => (follow_up, Some(addressed)),
            // Unreachable after link verification; treated as standalone.
            None => (addressed, None),
        },
        TaskRole::FollowUp | TaskRole::Standalone => (addressed, partner),
    }
}

/// Derives the tier a decision on `subject` must be made at.
const fn derive_tier(subject: &Task, realization: Option<&Task>) -> ReviewTier {
    if subject.review_state().is_awaiting_manager_validation() {
        return ReviewTier::Manager;
    }
    if realization.is_none() && subject.needs_validation() {
        // A standalone task has no reviewing assignee; the manager rules.
        return ReviewTier::Manager;
    }
    ReviewTier::Reviewer
}

fn build_decision(action: &ReviewAction) -> WorkflowResult<ReviewDecision> {
    match action {
        ReviewAction::Accept => Ok(ReviewDecision::Accept),
        ReviewAction::Return { feedback } => Ok(ReviewDecision::Return {
            feedback: Feedback::new(feedback.clone())?,
        }),
        ReviewAction::Decline { feedback } => Ok(ReviewDecision::Decline {
            feedback: Feedback::new(feedback.clone())?,
        }),
    }
}

fn ensure_fresh(task: &Task, expected_version: Version) -> WorkflowResult<()> {
    if task.version() != expected_version {
        return Err(WorkflowError::Conflict {
            task_id: task.id(),
            expected: expected_version,
            actual: task.version(),
        });
    }
    Ok(())
}

fn ensure_not_terminal(task: &Task) -> WorkflowResult<()> {
    if task.status().is_terminal() {
        return Err(WorkflowError::Denied(DenialReason::TerminalStatus {
            task_id: task.id(),
        }));
    }
    Ok(())
}
