//! Domain-focused tests for task construction, validated scalars, and
//! field-change application.

use crate::task::domain::{
    Feedback, FieldChanges, NewTaskParams, Progress, ReviewState, SubtaskId, Task,
    TaskDomainError, TaskRole, TaskStatus, UserId, Version,
};
use eyre::{bail, ensure};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

#[fixture]
fn clock() -> DefaultClock {
    DefaultClock
}

fn params(title: &str) -> Result<NewTaskParams, TaskDomainError> {
    NewTaskParams::new(title, UserId::new(), UserId::new())
}

#[rstest]
fn feedback_rejects_empty_and_whitespace() {
    assert_eq!(Feedback::new(""), Err(TaskDomainError::EmptyFeedback));
    assert_eq!(Feedback::new("   \t\n"), Err(TaskDomainError::EmptyFeedback));
}

#[rstest]
fn feedback_trims_surrounding_whitespace() -> eyre::Result<()> {
    let feedback = Feedback::new("  needs error handling  ")?;
    ensure!(feedback.as_str() == "needs error handling");
    Ok(())
}

#[rstest]
fn feedback_rejects_oversized_payload() {
    let oversized = "x".repeat(Feedback::MAX_BYTES + 1);
    let result = Feedback::new(oversized);
    assert_eq!(
        result,
        Err(TaskDomainError::FeedbackTooLong {
            actual_bytes: Feedback::MAX_BYTES + 1,
            limit_bytes: Feedback::MAX_BYTES,
        })
    );
}

#[rstest]
#[case(0, true)]
#[case(50, true)]
#[case(100, true)]
#[case(101, false)]
#[case(u8::MAX, false)]
fn progress_validates_range(#[case] value: u8, #[case] accepted: bool) {
    assert_eq!(Progress::new(value).is_ok(), accepted);
}

#[rstest]
fn version_starts_at_one_and_increments() -> eyre::Result<()> {
    let initial = Version::initial();
    ensure!(initial.value() == 1);
    ensure!(initial.next()?.value() == 2);
    Ok(())
}

#[rstest]
fn version_rejects_zero_and_out_of_range_values() {
    assert_eq!(Version::new(0), Err(TaskDomainError::VersionOutOfRange(0)));
    assert!(Version::new(u64::MAX).is_err());
}

#[rstest]
fn new_task_params_rejects_empty_title() {
    assert_eq!(params("   "), Err(TaskDomainError::EmptyTitle));
}

#[rstest]
fn new_task_params_rejects_oversized_checklist() -> eyre::Result<()> {
    let texts: Vec<String> = (0..=Task::MAX_SUBTASKS).map(|i| format!("step {i}")).collect();
    let result = params("Oversized checklist")?.with_subtasks(texts);
    let expected = Err(TaskDomainError::TooManySubtasks {
        max: Task::MAX_SUBTASKS,
        actual: Task::MAX_SUBTASKS + 1,
    });
    if result != expected {
        bail!("expected {expected:?}, got {result:?}");
    }
    Ok(())
}

#[rstest]
fn new_standalone_sets_initial_state(clock: DefaultClock) -> eyre::Result<()> {
    let task = Task::new_standalone(params("Draft the report")?, false, &clock);

    ensure!(task.role() == TaskRole::Standalone);
    ensure!(task.status() == TaskStatus::Todo);
    ensure!(task.review_state().is_none());
    ensure!(task.progress() == Progress::ZERO);
    ensure!(task.version() == Version::initial());
    ensure!(task.linked_task_id().is_none());
    ensure!(!task.needs_validation());
    ensure!(task.created_at() == task.updated_at());
    Ok(())
}

#[rstest]
fn new_pair_links_members_symmetrically(clock: DefaultClock) -> eyre::Result<()> {
    let pair = Task::new_pair(
        params("Write the migration")?,
        params("Check the migration")?,
        true,
        &clock,
    );

    ensure!(pair.realization.role() == TaskRole::Realization);
    ensure!(pair.follow_up.role() == TaskRole::FollowUp);
    ensure!(pair.realization.linked_task_id() == Some(pair.follow_up.id()));
    ensure!(pair.follow_up.linked_task_id() == Some(pair.realization.id()));
    ensure!(pair.realization.needs_validation());
    ensure!(pair.follow_up.needs_validation());
    Ok(())
}

#[rstest]
#[case(TaskStatus::Todo, "todo")]
#[case(TaskStatus::InProgress, "in_progress")]
#[case(TaskStatus::InReview, "in_review")]
#[case(TaskStatus::Done, "done")]
fn task_status_round_trips_through_storage_form(
    #[case] status: TaskStatus,
    #[case] stored: &str,
) -> eyre::Result<()> {
    ensure!(status.as_str() == stored);
    ensure!(TaskStatus::try_from(stored)? == status);
    Ok(())
}

#[rstest]
#[case(TaskRole::Standalone, "standalone")]
#[case(TaskRole::FollowUp, "follow_up")]
#[case(TaskRole::Realization, "realization")]
fn task_role_round_trips_through_storage_form(
    #[case] role: TaskRole,
    #[case] stored: &str,
) -> eyre::Result<()> {
    ensure!(role.as_str() == stored);
    ensure!(TaskRole::try_from(stored)? == role);
    Ok(())
}

#[rstest]
fn task_status_parsing_rejects_unknown_values() {
    assert!(TaskStatus::try_from("paused").is_err());
    assert!(TaskRole::try_from("suivi").is_err());
}

#[rstest]
fn toggled_subtasks_flips_only_the_target(clock: DefaultClock) -> eyre::Result<()> {
    let seeded = params("Checklist task")?
        .with_subtasks(vec!["first".to_owned(), "second".to_owned()])?;
    let task = Task::new_standalone(seeded, false, &clock);
    let Some(target) = task.subtasks().first() else {
        bail!("expected a seeded subtask");
    };

    let toggled = task.toggled_subtasks(target.id)?;

    ensure!(toggled.iter().filter(|entry| entry.completed).count() == 1);
    ensure!(
        toggled
            .iter()
            .find(|entry| entry.id == target.id)
            .is_some_and(|entry| entry.completed)
    );
    Ok(())
}

#[rstest]
fn toggled_subtasks_rejects_unknown_entry(clock: DefaultClock) -> eyre::Result<()> {
    let task = Task::new_standalone(params("No checklist")?, false, &clock);
    let missing = SubtaskId::new();

    let result = task.toggled_subtasks(missing);
    let expected = Err(TaskDomainError::SubtaskNotFound {
        task_id: task.id(),
        subtask_id: missing,
    });
    if result != expected {
        bail!("expected {expected:?}, got {result:?}");
    }
    Ok(())
}

#[rstest]
fn apply_bumps_version_and_replaces_fields(clock: DefaultClock) -> eyre::Result<()> {
    let mut task = Task::new_standalone(params("Apply target")?, false, &clock);
    let changes = FieldChanges::new()
        .with_status(TaskStatus::InProgress)
        .with_progress(Progress::new(40)?);

    task.apply(&changes, &clock)?;

    ensure!(task.status() == TaskStatus::InProgress);
    ensure!(task.progress().value() == 40);
    ensure!(task.version().value() == 2);
    ensure!(matches!(task.review_state(), ReviewState::None));
    Ok(())
}

#[rstest]
fn apply_leaves_untouched_fields_alone(clock: DefaultClock) -> eyre::Result<()> {
    let mut task = Task::new_standalone(params("Partial change")?, true, &clock);
    let original_status = task.status();

    task.apply(
        &FieldChanges::new().with_progress(Progress::new(10)?),
        &clock,
    )?;

    ensure!(task.status() == original_status);
    ensure!(task.needs_validation());
    ensure!(task.version().value() == 2);
    Ok(())
}
