//! Jalon: task lifecycle and linked-task validation engine.
//!
//! This crate advances units of work through a review/approval state
//! machine, keeps a follow-up task and its paired realization task
//! consistent with each other, and escalates approval to a manager tier
//! when a task requires validation.
//!
//! # Architecture
//!
//! Jalon follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, in-memory)
//!
//! # Modules
//!
//! - [`task`]: The task aggregate, transition guard, link synchronizer,
//!   and review workflow orchestration
//! - [`notification`]: Effect requests emitted after committed transitions

pub mod notification;
pub mod task;
