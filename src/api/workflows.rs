/// Workflow management REST API endpoints
///
/// CRUD over stored workflow definitions plus the two ways of running one:
/// `execute` (interactive, trigger source "manual") and `trigger` (external
/// callers, trigger source "api"). Both answer with the execution summary.

use crate::{
    api::AppState,
    error::EngineError,
    workflow::{
        types::{NewWorkflow, WorkflowUpdate, API_TRIGGER, MANUAL_TRIGGER},
        ExecuteRequest, ExecutionLog, ExecutionSummary, Workflow,
    },
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

/// Create workflow management routes
pub fn create_workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/api/workflows", post(create_workflow).get(list_workflows))
        .route(
            "/api/workflows/{id}",
            get(get_workflow).put(update_workflow).delete(delete_workflow),
        )
        .route("/api/workflows/{id}/execute", post(execute_workflow))
        .route("/api/workflows/{id}/trigger", post(trigger_workflow))
        .route("/api/workflows/{id}/executions", get(list_workflow_executions))
}

async fn create_workflow(
    State(state): State<AppState>,
    Json(workflow): Json<NewWorkflow>,
) -> Result<Json<Workflow>, EngineError> {
    tracing::info!("📝 Creating workflow '{}'", workflow.name);
    Ok(Json(state.workflows.create_workflow(workflow).await?))
}

async fn list_workflows(State(state): State<AppState>) -> Result<Json<Vec<Workflow>>, EngineError> {
    Ok(Json(state.workflows.list_workflows().await?))
}

async fn get_workflow(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Workflow>, EngineError> {
    Ok(Json(state.workflows.get_workflow(id).await?))
}

async fn update_workflow(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<WorkflowUpdate>,
) -> Result<Json<Workflow>, EngineError> {
    Ok(Json(state.workflows.update_workflow(id, update).await?))
}

async fn delete_workflow(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Value>, EngineError> {
    if !state.workflows.delete_workflow(id).await? {
        return Err(EngineError::WorkflowNotFound(id));
    }
    Ok(Json(json!({ "message": "Workflow deleted successfully" })))
}

async fn run_workflow(
    state: &AppState,
    id: i64,
    request: Option<ExecuteRequest>,
    default_source: &str,
) -> Result<Json<ExecutionSummary>, EngineError> {
    let mut request = request.unwrap_or_default();
    if request.trigger_source.is_none() {
        request = request.with_trigger_source(default_source);
    }

    tracing::info!("▶️ Running workflow {} (trigger: {})", id, default_source);
    let report = state.engine.execute(id, request).await?;
    Ok(Json(report.summary()))
}

/// Execute a workflow from the editor or the CLI
async fn execute_workflow(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Option<Json<ExecuteRequest>>,
) -> Result<Json<ExecutionSummary>, EngineError> {
    run_workflow(&state, id, body.map(|Json(request)| request), MANUAL_TRIGGER).await
}

/// Trigger a workflow from an external system
async fn trigger_workflow(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Option<Json<ExecuteRequest>>,
) -> Result<Json<ExecutionSummary>, EngineError> {
    run_workflow(&state, id, body.map(|Json(request)| request), API_TRIGGER).await
}

/// Execution history of one workflow, most recent first
async fn list_workflow_executions(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<ExecutionLog>>, EngineError> {
    state.workflows.get_workflow(id).await?;
    Ok(Json(state.engine.get_execution_logs(Some(id)).await?))
}
