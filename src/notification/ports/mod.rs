//! Dispatcher port for notification delivery.

use crate::notification::domain::EffectRequest;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Notification delivery contract.
///
/// Delivery is best-effort and asynchronous; the orchestrator logs and
/// swallows failures so a transition never fails on notification grounds.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Enqueues a notification for at-least-once delivery.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when the request cannot be queued; the
    /// caller treats this as non-fatal.
    async fn enqueue(&self, request: EffectRequest) -> DispatchResult<()>;
}

/// Errors returned by dispatcher implementations.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// The delivery queue rejected the request.
    #[error("dispatch queue unavailable: {0}")]
    QueueUnavailable(String),

    /// Delivery-layer failure.
    #[error("dispatch error: {0}")]
    Delivery(Arc<dyn std::error::Error + Send + Sync>),
}

impl DispatchError {
    /// Wraps a delivery error.
    pub fn delivery(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Delivery(Arc::new(err))
    }
}
