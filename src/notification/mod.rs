//! Notification effects emitted by the review workflow.
//!
//! The module follows hexagonal architecture:
//!
//! - Effect request types in [`domain`]
//! - The dispatcher contract in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
