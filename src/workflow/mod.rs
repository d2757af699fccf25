/// Workflow Management Layer
///
/// This module handles workflow definitions and their management:
/// - Type definitions (Workflow, NodeSpec, Connection, ExecutionLog)
/// - Validation and CRUD through the workflow service

// Core workflow and execution record definitions
pub mod types;

// Workflow CRUD with validation
pub mod service;

// Re-export commonly used types
pub use service::WorkflowService;
pub use types::{
    Connection, ExecuteRequest, ExecutionData, ExecutionLog, ExecutionStatus, ExecutionSummary, NodeResult, NodeSpec,
    Workflow, WorkflowData,
};
