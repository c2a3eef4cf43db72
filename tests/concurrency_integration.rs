//! Concurrency and atomicity tests for the task store and workflow.
//!
//! These cover the two guarantees concurrent callers depend on: a mutation
//! set spanning a pair commits all-or-nothing, and reviewers racing on the
//! same observed version produce exactly one winner.

#![expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]
#![expect(
    clippy::indexing_slicing,
    reason = "Test code indexes commit results after length checks"
)]

use std::sync::Arc;

use jalon::notification::adapters::memory::InMemoryDispatcher;
use jalon::task::{
    adapters::memory::{InMemoryTaskStore, StaticIdentityProvider},
    domain::{
        FieldChanges, MutationSet, ReviewState, Task, TaskMutation, TaskPair, TaskStatus, UserId,
    },
    ports::{TaskStore, TaskStoreError},
    services::{ReviewTaskRequest, ReviewWorkflow, TaskDraft, UpdateStatusRequest, WorkflowError},
};
use mockable::DefaultClock;

type TestWorkflow =
    ReviewWorkflow<InMemoryTaskStore<DefaultClock>, StaticIdentityProvider, InMemoryDispatcher, DefaultClock>;

struct Harness {
    workflow: TestWorkflow,
    store: InMemoryTaskStore<DefaultClock>,
    worker: UserId,
    reviewer: UserId,
}

fn harness() -> Harness {
    let clock = Arc::new(DefaultClock);
    let store = InMemoryTaskStore::new(Arc::clone(&clock));
    let workflow = ReviewWorkflow::new(
        Arc::new(store.clone()),
        Arc::new(StaticIdentityProvider::new()),
        Arc::new(InMemoryDispatcher::new()),
        clock,
    );
    Harness {
        workflow,
        store,
        worker: UserId::new(),
        reviewer: UserId::new(),
    }
}

impl Harness {
    /// Creates a pair and walks the realization into review.
    async fn reviewed_pair(&self) -> TaskPair {
        let creator = UserId::new();
        let pair = self
            .workflow
            .create_linked_pair(
                TaskDraft::new("Produce the dataset", self.worker, creator),
                TaskDraft::new("Validate the dataset", self.reviewer, creator),
                false,
            )
            .await
            .expect("pair creation should succeed");
        self.workflow
            .update_status(UpdateStatusRequest::new(
                pair.realization.id(),
                TaskStatus::InReview,
                self.worker,
                pair.realization.version(),
            ))
            .await
            .expect("submitting for review should succeed");
        TaskPair {
            realization: self.fetch(&pair.realization).await,
            follow_up: self.fetch(&pair.follow_up).await,
        }
    }

    async fn fetch(&self, task: &Task) -> Task {
        self.store
            .get(task.id())
            .await
            .expect("store read should succeed")
            .expect("task should exist")
    }
}

// ============================================================================
// Atomic pair commits (no partial update)
// ============================================================================

/// A set whose second member carries a stale version commits nothing: both
/// tasks keep their status, review state, and version.
#[tokio::test(flavor = "multi_thread")]
async fn a_stale_member_rejects_the_whole_mutation_set() {
    let h = harness();
    let pair = h.reviewed_pair().await;

    let stale_version = pair
        .realization
        .version()
        .next()
        .expect("version increment should succeed");
    let set = MutationSet::pair(
        TaskMutation::new(
            pair.follow_up.id(),
            pair.follow_up.version(),
            FieldChanges::new()
                .with_status(TaskStatus::Done)
                .with_review_state(ReviewState::None),
        ),
        TaskMutation::new(
            pair.realization.id(),
            stale_version,
            FieldChanges::new()
                .with_status(TaskStatus::Done)
                .with_review_state(ReviewState::None),
        ),
    );

    let result = h.store.commit(set).await;

    assert!(matches!(
        result,
        Err(TaskStoreError::VersionConflict { task_id, .. }) if task_id == pair.realization.id()
    ));
    let follow_up = h.fetch(&pair.follow_up).await;
    let realization = h.fetch(&pair.realization).await;
    assert_eq!(follow_up.status(), TaskStatus::InReview);
    assert_eq!(follow_up.version(), pair.follow_up.version());
    assert_eq!(realization.status(), TaskStatus::InReview);
    assert_eq!(realization.version(), pair.realization.version());
}

/// The happy path of the same set commits both members together, and both
/// versions increment by exactly one.
#[tokio::test(flavor = "multi_thread")]
async fn a_valid_pair_set_commits_both_members_together() {
    let h = harness();
    let pair = h.reviewed_pair().await;

    let set = MutationSet::pair(
        TaskMutation::new(
            pair.follow_up.id(),
            pair.follow_up.version(),
            FieldChanges::new().with_status(TaskStatus::Done),
        ),
        TaskMutation::new(
            pair.realization.id(),
            pair.realization.version(),
            FieldChanges::new().with_status(TaskStatus::Done),
        ),
    );

    let updated = h.store.commit(set).await.expect("commit should succeed");

    assert_eq!(updated.len(), 2);
    for (before, after) in [
        (&pair.follow_up, &updated[0]),
        (&pair.realization, &updated[1]),
    ] {
        assert_eq!(after.status(), TaskStatus::Done);
        assert_eq!(after.version().value(), before.version().value() + 1);
    }
}

// ============================================================================
// Optimistic concurrency (exactly one winner)
// ============================================================================

/// Two reviewers race the same accept with the same observed version;
/// exactly one commit wins and the loser is told to re-fetch.
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_reviews_produce_exactly_one_winner() {
    let h = harness();
    let pair = h.reviewed_pair().await;
    let observed_version = pair.follow_up.version();

    let first = h.workflow.review_task(ReviewTaskRequest::accept(
        pair.follow_up.id(),
        h.reviewer,
        observed_version,
    ));
    let second = h.workflow.review_task(ReviewTaskRequest::accept(
        pair.follow_up.id(),
        h.reviewer,
        observed_version,
    ));

    let (first_result, second_result) = tokio::join!(first, second);

    let successes = [&first_result, &second_result]
        .into_iter()
        .filter(|result| result.is_ok())
        .count();
    assert_eq!(successes, 1, "exactly one review must win the race");
    let loser = if first_result.is_ok() {
        second_result
    } else {
        first_result
    };
    assert!(matches!(
        loser,
        Err(WorkflowError::Conflict { .. }) | Err(WorkflowError::Denied(_))
    ));

    // The winner completed the pair.
    let follow_up = h.fetch(&pair.follow_up).await;
    let realization = h.fetch(&pair.realization).await;
    assert_eq!(follow_up.status(), TaskStatus::Done);
    assert_eq!(realization.status(), TaskStatus::Done);
}

/// Replaying a status change after a commit is rejected rather than
/// silently overwriting the newer state.
#[tokio::test(flavor = "multi_thread")]
async fn a_lost_update_is_reported_not_absorbed() {
    let h = harness();
    let creator = UserId::new();
    let task = h
        .workflow
        .create_task(
            TaskDraft::new("Single writer task", h.worker, creator),
            false,
        )
        .await
        .expect("creation should succeed");

    h.workflow
        .update_progress(task.id(), 30, h.worker, task.version())
        .await
        .expect("first write should succeed");

    let replay = h
        .workflow
        .update_progress(task.id(), 70, h.worker, task.version())
        .await;

    assert!(matches!(replay, Err(WorkflowError::Conflict { .. })));
    let stored = h.fetch(&task).await;
    assert_eq!(stored.progress().value(), 30);
}
