/// integraflow: credentialed third-party integrations chained into workflows
///
/// This library provides the workflow execution engine: deterministic
/// petgraph-based ordering, fail-fast sequential node execution against a
/// registry of connector tasks, and durable execution logs.

// Core configuration and setup
pub mod config;

// Engine-level error taxonomy
pub mod error;

// Credential encryption at rest
pub mod vault;

// SQLite persistence - schema and record stores
pub mod store;

// Connector registry and built-in connectors
pub mod connectors;

// Integration management layer - connector types and credentialed integrations
pub mod integration;

// Workflow management layer - definitions and validation
pub mod workflow;

// Runtime execution engine - planning, node execution and orchestration
pub mod runtime;

// HTTP API layer - REST endpoints over the services
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use connectors::{ConnectorRegistry, TaskResult};
pub use error::EngineError;
pub use runtime::{ExecutionEngine, NodeExecutor};
pub use server::start_server;
pub use workflow::{ExecutionLog, ExecutionStatus, Workflow, WorkflowData};
