//! Static in-memory identity provider for tests and embedded use.

use async_trait::async_trait;
use std::collections::HashSet;

use crate::task::{
    domain::{ActorRole, UserId},
    ports::{IdentityProvider, IdentityResult},
};

/// Identity provider backed by a fixed manager set.
///
/// Every user is a member; users listed at construction additionally hold
/// manager authority.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    managers: HashSet<UserId>,
}

impl StaticIdentityProvider {
    /// Creates a provider with no managers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider granting manager authority to the given users.
    #[must_use]
    pub fn with_managers(managers: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            managers: managers.into_iter().collect(),
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn role_of(&self, user_id: UserId) -> IdentityResult<ActorRole> {
        if self.managers.contains(&user_id) {
            Ok(ActorRole::Manager)
        } else {
            Ok(ActorRole::Member)
        }
    }
}
