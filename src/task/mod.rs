//! Task lifecycle and linked-task review workflow.
//!
//! This module implements the review/approval state machine over task
//! aggregates: external status changes run through a pure transition guard,
//! review decisions are planned as atomic mutation sets spanning both
//! members of a follow-up/realization pair, and completion escalates to a
//! manager tier when a task requires validation. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
