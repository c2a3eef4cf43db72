//! Effect requests emitted after committed transitions.
//!
//! Notification delivery is decoupled from the commit: the orchestrator
//! emits requests after the store accepts a mutation set, and the
//! dispatcher delivers them at-least-once. A delivery failure can never
//! roll back a committed transition.

use crate::task::domain::{TaskId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of workflow event a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A reviewer bounced the work with feedback.
    TaskReturned,
    /// A manager validated the work.
    TaskValidated,
    /// The pair (or task) completed without manager validation.
    TaskCompleted,
    /// A first-tier acceptance awaits manager validation.
    ManagerValidationRequested,
}

impl NotificationKind {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskReturned => "task_returned",
            Self::TaskValidated => "task_validated",
            Self::TaskCompleted => "task_completed",
            Self::ManagerValidationRequested => "manager_validation_requested",
        }
    }
}

/// Deduplication key for effect requests.
///
/// Derived from the task, event kind, and recipient, so re-emitted requests
/// (retries, replays) collapse at the dispatcher instead of relying on
/// process-global state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Derives the key for a (task, kind, recipient) triple.
    #[must_use]
    pub fn from_parts(task_id: TaskId, kind: NotificationKind, recipient: UserId) -> Self {
        Self(format!("{task_id}:{}:{recipient}", kind.as_str()))
    }

    /// Returns the key as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A request for the dispatcher to deliver one notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectRequest {
    /// The user to notify.
    pub recipient: UserId,
    /// The event being reported.
    pub kind: NotificationKind,
    /// The task the event concerns.
    pub task_id: TaskId,
    /// Human-readable payload for the delivery channel.
    pub message: String,
    /// Deduplication key for at-least-once delivery.
    pub idempotency_key: IdempotencyKey,
}

impl EffectRequest {
    /// Creates a request, deriving its idempotency key.
    #[must_use]
    pub fn new(
        recipient: UserId,
        kind: NotificationKind,
        task_id: TaskId,
        message: impl Into<String>,
    ) -> Self {
        Self {
            recipient,
            kind,
            task_id,
            message: message.into(),
            idempotency_key: IdempotencyKey::from_parts(task_id, kind, recipient),
        }
    }
}
