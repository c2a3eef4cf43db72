//! In-memory recording dispatcher for tests and embedded use.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::notification::{
    domain::{EffectRequest, IdempotencyKey},
    ports::{DispatchError, DispatchResult, NotificationDispatcher},
};

/// Dispatcher that records requests and deduplicates on the idempotency key.
///
/// A re-enqueued request whose key was already seen is dropped, which is the
/// at-least-once contract's collapse point: replays are harmless.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDispatcher {
    state: Arc<RwLock<DispatcherState>>,
}

#[derive(Debug, Default)]
struct DispatcherState {
    delivered: Vec<EffectRequest>,
    seen: HashSet<IdempotencyKey>,
}

impl InMemoryDispatcher {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the requests accepted so far, in enqueue order.
    #[must_use]
    pub fn delivered(&self) -> Vec<EffectRequest> {
        self.state
            .read()
            .map(|guard| guard.delivered.clone())
            .unwrap_or_default()
    }

    /// Returns the number of accepted requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state
            .read()
            .map(|guard| guard.delivered.len())
            .unwrap_or(0)
    }

    /// Returns `true` when no request was accepted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl NotificationDispatcher for InMemoryDispatcher {
    async fn enqueue(&self, request: EffectRequest) -> DispatchResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| DispatchError::QueueUnavailable(err.to_string()))?;
        if state.seen.contains(&request.idempotency_key) {
            tracing::debug!(key = %request.idempotency_key, "dropping duplicate effect request");
            return Ok(());
        }
        state.seen.insert(request.idempotency_key.clone());
        state.delivered.push(request);
        Ok(())
    }
}
