//! Port contracts for the task review workflow.

pub mod identity;
pub mod store;

pub use identity::{IdentityError, IdentityProvider, IdentityResult};
pub use store::{TaskStore, TaskStoreError, TaskStoreResult};
