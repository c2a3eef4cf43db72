//! `PostgreSQL` adapter for the task store port.

pub mod models;
pub mod repository;
pub mod schema;

pub use repository::{PostgresTaskStore, TaskPgPool};
