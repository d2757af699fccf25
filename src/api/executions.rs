/// Execution log REST API endpoints

use crate::{api::AppState, error::EngineError, workflow::ExecutionLog};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;

/// Optional filter for the execution list
#[derive(Debug, Default, Deserialize)]
pub struct ExecutionFilter {
    pub workflow_id: Option<i64>,
}

/// Create execution query routes
pub fn create_execution_routes() -> Router<AppState> {
    Router::new()
        .route("/api/executions", get(list_executions))
        .route("/api/executions/{id}", get(get_execution))
}

async fn list_executions(
    State(state): State<AppState>,
    Query(filter): Query<ExecutionFilter>,
) -> Result<Json<Vec<ExecutionLog>>, EngineError> {
    Ok(Json(state.engine.get_execution_logs(filter.workflow_id).await?))
}

async fn get_execution(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<ExecutionLog>, EngineError> {
    Ok(Json(state.engine.get_execution(id).await?))
}
