/// Integration REST API endpoints
///
/// Credentials go in with create and test; they never come back out.

use crate::{
    api::AppState,
    connectors::TaskResult,
    error::EngineError,
    integration::{ConnectionTest, Integration, NewIntegration},
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

/// Request body for toggling an integration
#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

/// Create integration routes
pub fn create_integration_routes() -> Router<AppState> {
    Router::new()
        .route("/api/integrations", post(create_integration).get(list_integrations))
        .route("/api/integrations/test", post(test_integration))
        .route("/api/integrations/{id}", get(get_integration).delete(delete_integration))
        .route("/api/integrations/{id}/active", put(set_integration_active))
}

/// Try credentials against the remote system without storing them
async fn test_integration(
    State(state): State<AppState>,
    Json(test): Json<ConnectionTest>,
) -> Result<Json<TaskResult>, EngineError> {
    Ok(Json(state.integrations.test_integration(test).await?))
}

async fn create_integration(
    State(state): State<AppState>,
    Json(new_integration): Json<NewIntegration>,
) -> Result<Json<Integration>, EngineError> {
    tracing::info!("📝 Creating integration '{}'", new_integration.name);
    Ok(Json(state.integrations.create_integration(new_integration).await?))
}

async fn list_integrations(State(state): State<AppState>) -> Result<Json<Vec<Integration>>, EngineError> {
    Ok(Json(state.integrations.list_integrations().await?))
}

async fn get_integration(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Integration>, EngineError> {
    Ok(Json(state.integrations.get_integration(id).await?))
}

async fn delete_integration(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Value>, EngineError> {
    if !state.integrations.delete_integration(id).await? {
        return Err(EngineError::IntegrationNotFound(id));
    }
    Ok(Json(json!({ "message": "Integration deleted successfully" })))
}

async fn set_integration_active(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<SetActiveRequest>,
) -> Result<Json<Integration>, EngineError> {
    Ok(Json(state.integrations.set_integration_active(id, request.is_active).await?))
}
