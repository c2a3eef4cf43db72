//! Unit tests for the transition guard's ordered rules.

use crate::task::domain::{
    ChangeOrigin, DenialReason, FieldChanges, GuardVerdict, NewTaskParams, Task, TaskRole,
    TaskStatus, UserId, can_transition,
};
use eyre::{bail, ensure};
use mockable::DefaultClock;
use rstest::rstest;

fn make_task(role: TaskRole, status: TaskStatus, needs_validation: bool) -> eyre::Result<Task> {
    let clock = DefaultClock;
    let params = |title: &str| NewTaskParams::new(title, UserId::new(), UserId::new());
    let mut task = match role {
        TaskRole::Standalone => {
            Task::new_standalone(params("Guard subject")?, needs_validation, &clock)
        }
        TaskRole::FollowUp => {
            Task::new_pair(
                params("Guard pair work")?,
                params("Guard pair review")?,
                needs_validation,
                &clock,
            )
            .follow_up
        }
        TaskRole::Realization => {
            Task::new_pair(
                params("Guard pair work")?,
                params("Guard pair review")?,
                needs_validation,
                &clock,
            )
            .realization
        }
    };
    if status != TaskStatus::Todo {
        task.apply(&FieldChanges::new().with_status(status), &clock)?;
    }
    Ok(task)
}

#[rstest]
// Rule 1: done is terminal, regardless of role or origin.
#[case(TaskRole::Standalone, TaskStatus::Done, false, ChangeOrigin::External, false)]
#[case(TaskRole::Realization, TaskStatus::Done, true, ChangeOrigin::ReviewWorkflow, false)]
#[case(TaskRole::FollowUp, TaskStatus::Done, false, ChangeOrigin::ReviewWorkflow, false)]
// Rule 2: follow-up tasks refuse direct requests but accept propagation.
#[case(TaskRole::FollowUp, TaskStatus::Todo, false, ChangeOrigin::External, false)]
#[case(TaskRole::FollowUp, TaskStatus::InReview, true, ChangeOrigin::External, false)]
#[case(TaskRole::FollowUp, TaskStatus::Todo, false, ChangeOrigin::ReviewWorkflow, true)]
#[case(TaskRole::FollowUp, TaskStatus::InReview, true, ChangeOrigin::ReviewWorkflow, true)]
// Rule 3: a review gate cannot be bypassed by a bare move.
#[case(TaskRole::Realization, TaskStatus::InReview, false, ChangeOrigin::External, false)]
#[case(TaskRole::Realization, TaskStatus::InReview, true, ChangeOrigin::External, false)]
#[case(TaskRole::Standalone, TaskStatus::InReview, true, ChangeOrigin::External, false)]
#[case(TaskRole::Realization, TaskStatus::InReview, true, ChangeOrigin::ReviewWorkflow, true)]
// Rule 4: everything else is allowed.
#[case(TaskRole::Standalone, TaskStatus::InReview, false, ChangeOrigin::External, true)]
#[case(TaskRole::Standalone, TaskStatus::Todo, false, ChangeOrigin::External, true)]
#[case(TaskRole::Standalone, TaskStatus::Todo, true, ChangeOrigin::External, true)]
#[case(TaskRole::Realization, TaskStatus::InProgress, true, ChangeOrigin::External, true)]
#[case(TaskRole::Realization, TaskStatus::Todo, false, ChangeOrigin::External, true)]
fn guard_applies_ordered_rules(
    #[case] role: TaskRole,
    #[case] status: TaskStatus,
    #[case] needs_validation: bool,
    #[case] origin: ChangeOrigin,
    #[case] allowed: bool,
) -> eyre::Result<()> {
    let task = make_task(role, status, needs_validation)?;
    let verdict = can_transition(&task, TaskStatus::Done, origin);
    ensure!(
        verdict.is_allowed() == allowed,
        "expected allowed={allowed} for {role:?}/{status:?}/nv={needs_validation}/{origin:?}, got {verdict:?}"
    );
    Ok(())
}

#[rstest]
fn terminal_rule_wins_over_follow_up_rule() -> eyre::Result<()> {
    let task = make_task(TaskRole::FollowUp, TaskStatus::Done, false)?;

    let verdict = can_transition(&task, TaskStatus::InProgress, ChangeOrigin::External);

    match verdict {
        GuardVerdict::Denied(DenialReason::TerminalStatus { task_id }) => {
            ensure!(task_id == task.id());
        }
        other => bail!("expected terminal denial, got {other:?}"),
    }
    Ok(())
}

#[rstest]
fn follow_up_denial_identifies_the_task() -> eyre::Result<()> {
    let task = make_task(TaskRole::FollowUp, TaskStatus::InProgress, false)?;

    let verdict = can_transition(&task, TaskStatus::Done, ChangeOrigin::External);

    match verdict {
        GuardVerdict::Denied(DenialReason::FollowUpDirectChange { task_id }) => {
            ensure!(task_id == task.id());
        }
        other => bail!("expected follow-up denial, got {other:?}"),
    }
    Ok(())
}

#[rstest]
fn review_gate_denial_reports_the_requested_status() -> eyre::Result<()> {
    let task = make_task(TaskRole::Realization, TaskStatus::InReview, true)?;

    let verdict = can_transition(&task, TaskStatus::Done, ChangeOrigin::External);

    match verdict {
        GuardVerdict::Denied(DenialReason::ReviewDecisionRequired { task_id, requested }) => {
            ensure!(task_id == task.id());
            ensure!(requested == TaskStatus::Done);
        }
        other => bail!("expected review-gate denial, got {other:?}"),
    }
    Ok(())
}

#[rstest]
fn into_result_propagates_denial() -> eyre::Result<()> {
    let task = make_task(TaskRole::Standalone, TaskStatus::Done, false)?;

    let result = can_transition(&task, TaskStatus::Todo, ChangeOrigin::External).into_result();

    ensure!(result.is_err());
    ensure!(
        can_transition(&task, TaskStatus::Todo, ChangeOrigin::ReviewWorkflow)
            .into_result()
            .is_err()
    );
    Ok(())
}
