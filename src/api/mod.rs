/// HTTP API Layer
///
/// Thin axum routes over the integration, workflow and execution services.
/// It handles:
/// - Integration type and integration management
/// - Workflow CRUD plus execute / trigger
/// - Execution history queries

// Integration type (connector type) endpoints
pub mod integration_types;

// Integration endpoints including the connection test
pub mod integrations;

// Workflow management and execution endpoints
pub mod workflows;

// Execution log queries
pub mod executions;

use crate::{
    connectors::ConnectorRegistry,
    error::EngineError,
    integration::IntegrationService,
    runtime::{ExecutionEngine, NodeExecutor},
    store::{ConnectorTypeStore, Database, ExecutionLogStore, IntegrationStore, WorkflowStorage},
    vault::CredentialVault,
    workflow::WorkflowService,
};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Router,
};
use serde_json::json;
use std::sync::Arc;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub integrations: IntegrationService,
    pub workflows: WorkflowService,
    /// Engine used by execute / trigger and execution queries
    pub engine: Arc<ExecutionEngine>,
}

impl AppState {
    /// Wire services and the execution engine over one database
    pub fn new(database: &Database, vault: Arc<CredentialVault>, registry: Arc<ConnectorRegistry>) -> Self {
        let pool = database.pool().clone();
        let connector_types = ConnectorTypeStore::new(pool.clone());
        let integration_store = IntegrationStore::new(pool.clone());
        let workflow_storage = WorkflowStorage::new(pool.clone());

        let executor = Arc::new(NodeExecutor::new(
            integration_store.clone(),
            connector_types.clone(),
            Arc::clone(&vault),
            Arc::clone(&registry),
        ));
        let engine = Arc::new(ExecutionEngine::new(
            workflow_storage.clone(),
            ExecutionLogStore::new(pool),
            executor,
        ));

        Self {
            integrations: IntegrationService::new(connector_types, integration_store, vault, registry),
            workflows: WorkflowService::new(workflow_storage),
            engine,
        }
    }
}

/// All `/api` routes
pub fn create_api_routes() -> Router<AppState> {
    Router::new()
        .merge(integration_types::create_integration_type_routes())
        .merge(integrations::create_integration_routes())
        .merge(workflows::create_workflow_routes())
        .merge(executions::create_execution_routes())
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = match &self {
            e if e.is_not_found() => StatusCode::NOT_FOUND,
            EngineError::Conflict(_) | EngineError::ConnectorTypeInUse { .. } => StatusCode::CONFLICT,
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("❌ Request failed: {}", self);
        }

        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
