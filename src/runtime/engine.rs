/// Workflow execution orchestrator
///
/// Drives one execution from start to a persisted terminal record: loads the
/// workflow, opens a `running` log, plans the node order, runs the nodes one
/// after another with fail-fast semantics and completes the log. Every
/// failure after the log is opened ends in a terminal, queryable record.

use crate::error::EngineError;
use crate::runtime::executor::NodeExecutor;
use crate::runtime::planner;
use crate::store::{now, ExecutionLogStore, WorkflowStorage};
use crate::workflow::types::{
    ExecuteRequest, ExecutionData, ExecutionLog, ExecutionMetadata, ExecutionStatus, ExecutionSummary, NodeResult,
    Workflow, WorkflowData, MANUAL_TRIGGER,
};
use anyhow::Context;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;

/// Sequential, fail-fast workflow execution engine
#[derive(Debug)]
pub struct ExecutionEngine {
    workflows: WorkflowStorage,
    executions: ExecutionLogStore,
    /// Node executor for handling individual node execution
    executor: Arc<NodeExecutor>,
}

/// Finished execution together with the workflow name for API summaries
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub workflow_name: String,
    pub log: ExecutionLog,
}

impl ExecutionReport {
    pub fn summary(&self) -> ExecutionSummary {
        ExecutionSummary::new(&self.log, &self.workflow_name)
    }
}

/// Results accumulated while nodes run; survives an orchestrator fault
#[derive(Debug, Default)]
struct RunState {
    node_results: Vec<NodeResult>,
    nodes_total: usize,
    planner_fallback: Vec<String>,
}

impl ExecutionEngine {
    pub fn new(workflows: WorkflowStorage, executions: ExecutionLogStore, executor: Arc<NodeExecutor>) -> Self {
        Self {
            workflows,
            executions,
            executor,
        }
    }

    /// Execute a workflow and return its completed execution log
    ///
    /// Only a missing workflow or a failure to persist the log surfaces as an
    /// error; node failures and malformed workflow data produce a `failed` log.
    pub async fn execute(&self, workflow_id: i64, request: ExecuteRequest) -> Result<ExecutionReport, EngineError> {
        let workflow = self
            .workflows
            .get_workflow(workflow_id)
            .await?
            .ok_or(EngineError::WorkflowNotFound(workflow_id))?;

        let runtime_params = request.runtime_params.unwrap_or_default();
        let metadata = ExecutionMetadata {
            trigger_source: request.trigger_source.unwrap_or_else(|| MANUAL_TRIGGER.to_string()),
            trigger_metadata: request.trigger_metadata.unwrap_or_default(),
            runtime_params: runtime_params.clone(),
        };

        let workflow_start_time = Instant::now();
        let log = self.executions.create_running(workflow_id, now()).await?;
        tracing::info!(
            "🚀 Starting workflow execution: {} '{}' (execution {}, trigger: {})",
            workflow.id,
            workflow.name,
            log.id,
            metadata.trigger_source
        );

        let mut run = RunState::default();
        let (status, error_message, fault) = match self.run_nodes(&workflow, &runtime_params, &mut run).await {
            Ok(None) => (ExecutionStatus::Success, None, None),
            Ok(Some(failure)) => (ExecutionStatus::Failed, Some(failure), None),
            Err(e) => {
                let fault = describe(&e);
                tracing::error!("💥 Workflow {} execution {} aborted: {}", workflow.id, log.id, fault);
                (
                    ExecutionStatus::Failed,
                    Some(format!("Workflow execution error: {}", fault)),
                    Some(fault),
                )
            }
        };

        let execution_data =
            ExecutionData::assemble(run.node_results, metadata, run.nodes_total, run.planner_fallback, fault);
        let completed_at = now();

        let log = match self
            .executions
            .complete(log.id, status, completed_at, &execution_data, error_message.as_deref())
            .await
        {
            Ok(true) => ExecutionLog {
                status,
                completed_at: Some(completed_at),
                execution_data: Some(execution_data),
                error_message,
                ..log
            },
            Ok(false) => {
                tracing::warn!("⚠️ Execution {} was already completed; result discarded", log.id);
                self.executions
                    .get(log.id)
                    .await?
                    .ok_or(EngineError::ExecutionNotFound(log.id))?
            }
            Err(e) => {
                let fault = describe(&e);
                tracing::error!("❌ Failed to store result of execution {}: {}", log.id, fault);
                self.executions
                    .mark_failed(log.id, completed_at, &format!("Failed to store execution result: {}", fault))
                    .await?;
                self.executions
                    .get(log.id)
                    .await?
                    .ok_or(EngineError::ExecutionNotFound(log.id))?
            }
        };

        match log.status {
            ExecutionStatus::Success => tracing::info!(
                "🎉 Workflow '{}' execution {} completed successfully in {:?}",
                workflow.name,
                log.id,
                workflow_start_time.elapsed()
            ),
            _ => tracing::warn!(
                "⏹️ Workflow '{}' execution {} failed in {:?}: {}",
                workflow.name,
                log.id,
                workflow_start_time.elapsed(),
                log.error_message.as_deref().unwrap_or("unknown error")
            ),
        }

        Ok(ExecutionReport {
            workflow_name: workflow.name,
            log,
        })
    }

    /// Run the planned nodes in order
    ///
    /// `Ok(Some(message))` is a fail-fast stop, `Err` an orchestrator fault.
    async fn run_nodes(
        &self,
        workflow: &Workflow,
        runtime_params: &Map<String, Value>,
        run: &mut RunState,
    ) -> anyhow::Result<Option<String>> {
        let data = WorkflowData::from_value(&workflow.workflow_data).context("Invalid workflow_data")?;
        run.nodes_total = data.nodes.len();

        tracing::debug!(
            "📊 Planning {} nodes and {} connections",
            data.nodes.len(),
            data.connections.len()
        );
        let plan = planner::plan(&data.nodes, &data.connections);
        if plan.has_fallback() {
            tracing::warn!(
                "🔁 Workflow {} has a cycle or unreachable nodes; appended in declaration order: {:?}",
                workflow.id,
                plan.unordered
            );
            run.planner_fallback = plan.unordered.clone();
        }
        tracing::debug!("📋 Execution order: {:?}", plan.order);

        for (step, node_id) in plan.order.iter().enumerate() {
            let Some(node) = data.node(node_id) else {
                continue;
            };

            let mut params = node.params.clone();
            for (key, value) in runtime_params {
                params.insert(key.clone(), value.clone());
            }

            tracing::info!("📍 Step {}/{}: executing node '{}'", step + 1, plan.order.len(), node_id);
            let result = self.executor.execute_node(node, params).await?;

            let failure = (!result.success)
                .then(|| format!("Node {} ({}) failed: {}", result.node_id, result.task, result.message));
            run.node_results.push(result);

            if let Some(failure) = failure {
                tracing::warn!("⏸️ Stopping workflow {} at step {}: {}", workflow.id, step + 1, failure);
                return Ok(Some(failure));
            }
        }

        Ok(None)
    }

    /// Execution logs, most recent first
    pub async fn get_execution_logs(&self, workflow_id: Option<i64>) -> Result<Vec<ExecutionLog>, EngineError> {
        Ok(self.executions.list(workflow_id).await?)
    }

    pub async fn get_execution(&self, execution_id: i64) -> Result<ExecutionLog, EngineError> {
        self.executions
            .get(execution_id)
            .await?
            .ok_or(EngineError::ExecutionNotFound(execution_id))
    }
}

/// Error chain joined with ": ", skipping a cause that repeats the previous message
fn describe(error: &anyhow::Error) -> String {
    let mut parts: Vec<String> = Vec::new();
    for cause in error.chain() {
        let text = cause.to_string();
        if parts
            .last()
            .is_some_and(|last| last.contains(&text) || text.contains(last.as_str()))
        {
            continue;
        }
        parts.push(text);
    }
    parts.join(": ")
}
