//! Orchestration services for the task review workflow.

mod workflow;

pub use workflow::{
    ReviewAction, ReviewTaskRequest, ReviewWorkflow, TaskDraft, UpdateStatusRequest,
    WorkflowError, WorkflowResult,
};
