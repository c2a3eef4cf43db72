//! Link synchronizer: plans the atomic mutation set for a decision.
//!
//! The planner is pure. It never touches the store; it computes the complete
//! set of field changes for the task itself and for its paired task when one
//! exists, and leaves the atomic commit to the caller. Two linked tasks are
//! never written through independent racing updates.

use super::{
    DenialReason, FieldChanges, MutationSet, Progress, ReviewDecision, ReviewState, ReviewTier,
    Task, TaskMutation, TaskStatus,
};

/// Plans a plain status change, mirroring the status onto the paired task.
///
/// The caller has already run the transition guard; `linked` is the resolved
/// pair partner when `task` is linked. Entering review on a reviewable task
/// records `AwaitingReview`; the mirror never overwrites the partner's
/// review-state record.
#[must_use]
pub fn plan_status_change(task: &Task, linked: Option<&Task>, requested: TaskStatus) -> MutationSet {
    let mut changes = FieldChanges::new().with_status(requested);
    if requested == TaskStatus::InReview && task.is_reviewable() {
        changes = changes.with_review_state(ReviewState::AwaitingReview);
    }
    if task.status() == TaskStatus::InReview
        && requested != TaskStatus::InReview
        && matches!(task.review_state(), ReviewState::AwaitingReview)
    {
        changes = changes.with_review_state(ReviewState::None);
    }
    if requested == TaskStatus::Done {
        changes = changes.with_progress(Progress::COMPLETE);
    }
    let own = TaskMutation::new(task.id(), task.version(), changes);

    match linked {
        Some(partner) => {
            let mut mirror = FieldChanges::new().with_status(requested);
            if requested == TaskStatus::Done {
                mirror = mirror.with_progress(Progress::COMPLETE);
            }
            MutationSet::pair(
                own,
                TaskMutation::new(partner.id(), partner.version(), mirror),
            )
        }
        None => MutationSet::single(own),
    }
}

/// Plans the mutation set for a review decision on `subject`.
///
/// `subject` is the task the decision addresses: the follow-up member of a
/// pair, or a standalone task that requires manager validation.
/// `realization` is the resolved pair partner when `subject` is linked.
///
/// # Errors
///
/// Returns a [`DenialReason`] when the decision does not fit the subject's
/// current review state: the pair is not awaiting review, the decision
/// needs manager authority, or a manager decision was submitted with no
/// validation pending.
pub fn plan_review(
    subject: &Task,
    realization: Option<&Task>,
    decision: &ReviewDecision,
    tier: ReviewTier,
) -> Result<MutationSet, DenialReason> {
    debug_assert_eq!(
        subject.linked_task_id().is_some(),
        realization.is_some(),
        "caller resolves the pair partner before planning"
    );
    match realization {
        Some(partner) => plan_paired_review(subject, partner, decision, tier),
        None => plan_standalone_review(subject, decision, tier),
    }
}

fn plan_paired_review(
    subject: &Task,
    realization: &Task,
    decision: &ReviewDecision,
    tier: ReviewTier,
) -> Result<MutationSet, DenialReason> {
    let awaiting_validation = subject.review_state().is_awaiting_manager_validation();
    match tier {
        ReviewTier::Reviewer => {
            if awaiting_validation {
                return Err(DenialReason::ManagerRequired {
                    task_id: subject.id(),
                });
            }
            if realization.status() != TaskStatus::InReview {
                return Err(DenialReason::NotAwaitingReview {
                    task_id: realization.id(),
                });
            }
        }
        ReviewTier::Manager => {
            if !awaiting_validation {
                return Err(DenialReason::NoValidationPending {
                    task_id: subject.id(),
                });
            }
        }
    }

    match decision {
        ReviewDecision::Accept => {
            if subject.needs_validation() && tier == ReviewTier::Reviewer {
                // First-tier approval parks the pair until a manager rules.
                Ok(MutationSet::single(TaskMutation::new(
                    subject.id(),
                    subject.version(),
                    FieldChanges::new().with_review_state(ReviewState::AwaitingManagerValidation),
                )))
            } else {
                Ok(MutationSet::pair(
                    TaskMutation::new(subject.id(), subject.version(), completion_changes()),
                    TaskMutation::new(
                        realization.id(),
                        realization.version(),
                        completion_changes(),
                    ),
                ))
            }
        }
        ReviewDecision::Return { feedback } => Ok(MutationSet::pair(
            TaskMutation::new(
                subject.id(),
                subject.version(),
                FieldChanges::new().with_review_state(ReviewState::ReturnedWithFeedback {
                    feedback: feedback.clone(),
                }),
            ),
            TaskMutation::new(
                realization.id(),
                realization.version(),
                FieldChanges::new()
                    .with_status(TaskStatus::InProgress)
                    .with_review_state(ReviewState::None),
            ),
        )),
        ReviewDecision::Decline { feedback } => Ok(MutationSet::pair(
            TaskMutation::new(
                subject.id(),
                subject.version(),
                FieldChanges::new().with_review_state(ReviewState::ReturnedWithFeedback {
                    feedback: feedback.clone(),
                }),
            ),
            TaskMutation::new(
                realization.id(),
                realization.version(),
                FieldChanges::new()
                    .with_status(TaskStatus::Todo)
                    .with_review_state(ReviewState::None)
                    .with_progress(Progress::ZERO),
            ),
        )),
    }
}

fn plan_standalone_review(
    subject: &Task,
    decision: &ReviewDecision,
    tier: ReviewTier,
) -> Result<MutationSet, DenialReason> {
    if !subject.needs_validation() || subject.status() != TaskStatus::InReview {
        return Err(DenialReason::NotAwaitingReview {
            task_id: subject.id(),
        });
    }
    // A standalone task has no reviewing assignee; only a manager rules.
    if tier != ReviewTier::Manager {
        return Err(DenialReason::ManagerRequired {
            task_id: subject.id(),
        });
    }

    let changes = match decision {
        ReviewDecision::Accept => completion_changes(),
        ReviewDecision::Return { feedback } => FieldChanges::new()
            .with_status(TaskStatus::InProgress)
            .with_review_state(ReviewState::ReturnedWithFeedback {
                feedback: feedback.clone(),
            }),
        ReviewDecision::Decline { feedback } => FieldChanges::new()
            .with_status(TaskStatus::Todo)
            .with_review_state(ReviewState::ReturnedWithFeedback {
                feedback: feedback.clone(),
            })
            .with_progress(Progress::ZERO),
    };
    Ok(MutationSet::single(TaskMutation::new(
        subject.id(),
        subject.version(),
        changes,
    )))
}

fn completion_changes() -> FieldChanges {
    FieldChanges::new()
        .with_status(TaskStatus::Done)
        .with_review_state(ReviewState::None)
        .with_progress(Progress::COMPLETE)
}
