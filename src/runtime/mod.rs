/// Runtime Execution Engine
///
/// This module runs stored workflows:
/// - Planning a deterministic node order from the workflow graph
/// - Executing single nodes against the connector registry
/// - Orchestrating a whole execution with fail-fast semantics

// Sequential orchestrator that owns the execution log lifecycle
pub mod engine;

// Single node resolution and task dispatch
pub mod executor;

// Kahn topological ordering over petgraph
pub mod planner;

// Re-export main types
pub use engine::{ExecutionEngine, ExecutionReport};
pub use executor::{NodeExecutor, NodeFailure};
pub use planner::{plan, ExecutionPlan};
