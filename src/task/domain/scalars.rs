//! Validated scalar types for the task domain.

use super::TaskDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reviewer feedback attached to a returned or declined task.
///
/// Feedback is mandatory for any non-accept review decision, so the type
/// rejects empty or whitespace-only values at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Feedback(String);

impl Feedback {
    /// Largest feedback payload accepted for persistence.
    pub const MAX_BYTES: usize = 4096;

    /// Creates validated feedback, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyFeedback`] when the value is empty
    /// after trimming, or [`TaskDomainError::FeedbackTooLong`] when it
    /// exceeds [`Self::MAX_BYTES`].
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(TaskDomainError::EmptyFeedback);
        }
        if normalized.len() > Self::MAX_BYTES {
            return Err(TaskDomainError::FeedbackTooLong {
                actual_bytes: normalized.len(),
                limit_bytes: Self::MAX_BYTES,
            });
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the feedback text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Feedback {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task completion percentage, always within 0–100.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Progress(u8);

impl Progress {
    /// No recorded progress.
    pub const ZERO: Self = Self(0);

    /// Full completion.
    pub const COMPLETE: Self = Self(100);

    /// Creates a validated progress value.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidProgress`] when the value exceeds
    /// 100.
    pub const fn new(value: u8) -> Result<Self, TaskDomainError> {
        if value > 100 {
            return Err(TaskDomainError::InvalidProgress(value));
        }
        Ok(Self(value))
    }

    /// Returns the underlying percentage.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic aggregate version used for optimistic concurrency.
///
/// Every committed mutation increments the version by exactly one; a commit
/// carrying a stale expected version is rejected by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    /// Largest version representable in the current `PostgreSQL` schema.
    const MAX_PERSISTED_VALUE: u64 = i64::MAX as u64;

    /// Version assigned to a freshly created aggregate.
    #[must_use]
    pub const fn initial() -> Self {
        Self(1)
    }

    /// Creates a version from a persisted counter value.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::VersionOutOfRange`] when the value is zero
    /// or exceeds the schema-backed maximum (`i64::MAX`).
    pub const fn new(value: u64) -> Result<Self, TaskDomainError> {
        if value == 0 || value > Self::MAX_PERSISTED_VALUE {
            return Err(TaskDomainError::VersionOutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Returns the successor version.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::VersionOutOfRange`] when the counter would
    /// leave the persistable range.
    pub const fn next(self) -> Result<Self, TaskDomainError> {
        if self.0 >= Self::MAX_PERSISTED_VALUE {
            return Err(TaskDomainError::VersionOutOfRange(self.0));
        }
        Ok(Self(self.0 + 1))
    }

    /// Returns the underlying counter value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
