//! Identity port for resolving an acting user's authority tier.

use crate::task::domain::{ActorRole, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for identity lookups.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Authorization lookup contract.
///
/// The engine consults the provider only when a decision claims manager
/// authority; first-tier authorization is an identity comparison against
/// the reviewing task's assignee.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns the authority tier of the given user.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::UnknownUser`] when the user is not known to
    /// the identity system.
    async fn role_of(&self, user_id: UserId) -> IdentityResult<ActorRole>;
}

/// Errors returned by identity provider implementations.
#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    /// The user is not known to the identity system.
    #[error("unknown user: {0}")]
    UnknownUser(UserId),

    /// Lookup-layer failure.
    #[error("identity lookup error: {0}")]
    Lookup(Arc<dyn std::error::Error + Send + Sync>),
}

impl IdentityError {
    /// Wraps a lookup error.
    pub fn lookup(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Lookup(Arc::new(err))
    }
}
