/// Node execution
///
/// Resolves one workflow node to an integration, its decrypted credentials
/// and a registered connector task, runs the task and normalizes the outcome
/// into a [`NodeResult`]. Expected failures (bad node definition, missing
/// records, undecryptable credentials, broken or failing tasks) come back as
/// a failed result. Only storage faults escape as `Err`.

use crate::connectors::{run_isolated, ConnectorRegistry, TaskParams, TaskResult};
use crate::store::{now, ConnectorTypeStore, IntegrationStore};
use crate::vault::{CredentialVault, VaultError};
use crate::workflow::types::{IntegrationRef, NodeErrorKind, NodeResult, NodeSpec, INTEGRATION_NODE_TYPE};
use anyhow::Result;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Why a node did not produce a successful result
#[derive(Debug, Error)]
pub enum NodeFailure {
    #[error("Unsupported node type: {0}")]
    UnsupportedType(String),

    #[error("Missing integration_id or task name")]
    MissingBinding,

    #[error("Integration {0} not found")]
    IntegrationNotFound(String),

    #[error("Integration type {0} not found")]
    ConnectorTypeNotFound(i64),

    #[error("Failed to decrypt credentials for integration {integration_id}: {source}")]
    Credentials {
        integration_id: i64,
        #[source]
        source: VaultError,
    },

    #[error("Task '{task}' is not declared by integration type {connector}")]
    UndeclaredTask { connector: String, task: String },

    #[error("Task '{task}' not found in {connector}")]
    TaskNotFound { connector: String, task: String },

    #[error("{0}")]
    Task(String),
}

impl NodeFailure {
    pub fn kind(&self) -> NodeErrorKind {
        match self {
            NodeFailure::UnsupportedType(_) | NodeFailure::MissingBinding => NodeErrorKind::Validation,
            NodeFailure::IntegrationNotFound(_)
            | NodeFailure::ConnectorTypeNotFound(_)
            | NodeFailure::UndeclaredTask { .. }
            | NodeFailure::TaskNotFound { .. } => NodeErrorKind::NotFound,
            NodeFailure::Credentials { .. } => NodeErrorKind::Credential,
            NodeFailure::Task(_) => NodeErrorKind::Connector,
        }
    }
}

/// Executes single workflow nodes against the connector registry
#[derive(Debug)]
pub struct NodeExecutor {
    integrations: IntegrationStore,
    connector_types: ConnectorTypeStore,
    vault: Arc<CredentialVault>,
    registry: Arc<ConnectorRegistry>,
}

impl NodeExecutor {
    pub fn new(
        integrations: IntegrationStore,
        connector_types: ConnectorTypeStore,
        vault: Arc<CredentialVault>,
        registry: Arc<ConnectorRegistry>,
    ) -> Self {
        Self {
            integrations,
            connector_types,
            vault,
            registry,
        }
    }

    /// Execute one node with its effective parameters
    ///
    /// Timing covers the whole resolution plus the task call.
    pub async fn execute_node(&self, node: &NodeSpec, params: TaskParams) -> Result<NodeResult> {
        let task = node.task_name().unwrap_or("unknown").to_string();
        tracing::info!("🚀 Starting node execution: {} ({})", node.id, task);
        tracing::debug!("📥 Effective params: {}", json!(params));

        let timestamp = now();
        let start_time = Instant::now();
        let outcome = self.run_node(node, params).await?;
        let execution_time_seconds = start_time.elapsed().as_secs_f64();

        let result = match outcome {
            Ok(task_result) => {
                let error_kind = (!task_result.success).then_some(NodeErrorKind::Connector);
                NodeResult {
                    node_id: node.id.clone(),
                    task,
                    integration_id: node.integration_id.as_ref().and_then(IntegrationRef::id),
                    success: task_result.success,
                    message: task_result.message,
                    data: task_result.data,
                    execution_time_seconds,
                    timestamp,
                    error_kind,
                }
            }
            Err(failure) => NodeResult {
                node_id: node.id.clone(),
                task,
                integration_id: node.integration_id.as_ref().and_then(IntegrationRef::id),
                success: false,
                message: failure.to_string(),
                data: json!({}),
                execution_time_seconds,
                timestamp,
                error_kind: Some(failure.kind()),
            },
        };

        if result.success {
            tracing::info!("✅ Node {} completed in {:.3}s", result.node_id, execution_time_seconds);
        } else {
            tracing::warn!(
                "❌ Node {} failed in {:.3}s: {}",
                result.node_id,
                execution_time_seconds,
                result.message
            );
        }
        tracing::debug!("📤 Node {} data: {}", result.node_id, result.data);

        Ok(result)
    }

    /// Inner result: node-level outcome; outer result: storage fault
    async fn run_node(&self, node: &NodeSpec, params: TaskParams) -> Result<Result<TaskResult, NodeFailure>> {
        if node.node_type != INTEGRATION_NODE_TYPE {
            return Ok(Err(NodeFailure::UnsupportedType(node.node_type.clone())));
        }
        let (Some(reference), Some(task)) = (node.integration_id.as_ref(), node.task_name()) else {
            return Ok(Err(NodeFailure::MissingBinding));
        };
        let Some(integration_id) = reference.id() else {
            return Ok(Err(NodeFailure::IntegrationNotFound(reference.to_string())));
        };

        let Some(integration) = self.integrations.get(integration_id).await? else {
            return Ok(Err(NodeFailure::IntegrationNotFound(integration_id.to_string())));
        };

        let credentials = match self.vault.decrypt_credentials(&integration.encrypted_credentials) {
            Ok(credentials) => credentials,
            Err(source) => {
                tracing::warn!("🔐 Credential decryption failed for integration {}: {}", integration_id, source);
                return Ok(Err(NodeFailure::Credentials { integration_id, source }));
            }
        };

        let Some(connector_type) = self.connector_types.get(integration.integration_type_id).await? else {
            return Ok(Err(NodeFailure::ConnectorTypeNotFound(integration.integration_type_id)));
        };
        if !connector_type.tasks.is_empty() && !connector_type.declares_task(task) {
            return Ok(Err(NodeFailure::UndeclaredTask {
                connector: connector_type.name,
                task: task.to_string(),
            }));
        }

        let connector = connector_type.name.to_lowercase();
        let Some(handler) = self.registry.resolve_task(&connector, task) else {
            return Ok(Err(NodeFailure::TaskNotFound {
                connector,
                task: task.to_string(),
            }));
        };

        tracing::debug!("🔌 Dispatching {}::{} for node {}", connector, task, node.id);
        Ok(run_isolated(handler, credentials, params)
            .await
            .map_err(|e| NodeFailure::Task(e.to_string())))
    }
}
