//! Review decisions and reviewing tiers.

use super::Feedback;
use serde::{Deserialize, Serialize};

/// A validated review decision.
///
/// Feedback is mandatory for any non-accept decision, which the
/// [`Feedback`] type enforces at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ReviewDecision {
    /// Approve the work under review.
    Accept,
    /// Bounce the work for rework, keeping a record of why.
    Return {
        /// The reviewer's explanation.
        feedback: Feedback,
    },
    /// Reject the work wholesale; it goes back to planning.
    Decline {
        /// The reviewer's explanation.
        feedback: Feedback,
    },
}

impl ReviewDecision {
    /// Returns `true` for an accepting decision.
    #[must_use]
    pub const fn is_accept(&self) -> bool {
        matches!(self, Self::Accept)
    }

    /// Returns the attached feedback, if any.
    #[must_use]
    pub const fn feedback(&self) -> Option<&Feedback> {
        match self {
            Self::Accept => None,
            Self::Return { feedback } | Self::Decline { feedback } => Some(feedback),
        }
    }
}

/// The tier a review decision is made at.
///
/// Exactly two tiers exist: the follow-up assignee and a manager-authorized
/// actor. Deeper validation chains are out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewTier {
    /// The first tier: the follow-up task's assignee.
    Reviewer,
    /// The second tier: an actor with manager authority.
    Manager,
}

/// Authority level of an acting user, as reported by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    /// A regular member without manager authority.
    Member,
    /// An actor holding manager authority for second-tier validation.
    Manager,
}

impl ActorRole {
    /// Returns `true` when the actor may make manager-tier decisions.
    #[must_use]
    pub const fn is_manager(self) -> bool {
        matches!(self, Self::Manager)
    }
}
