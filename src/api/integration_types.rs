/// Integration type REST API endpoints
///
/// Integration types describe a kind of external system: its credential
/// parameters and the tasks its connector offers.

use crate::{
    api::AppState,
    error::EngineError,
    integration::{ConnectorType, ConnectorTypeUpdate, NewConnectorType},
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

/// Create integration type routes
pub fn create_integration_type_routes() -> Router<AppState> {
    Router::new()
        .route("/api/integration-types", post(create_integration_type).get(list_integration_types))
        .route(
            "/api/integration-types/{id}",
            get(get_integration_type)
                .put(update_integration_type)
                .delete(delete_integration_type),
        )
}

async fn create_integration_type(
    State(state): State<AppState>,
    Json(new_type): Json<NewConnectorType>,
) -> Result<Json<ConnectorType>, EngineError> {
    tracing::info!("📝 Creating integration type '{}'", new_type.name);
    Ok(Json(state.integrations.create_connector_type(new_type).await?))
}

async fn list_integration_types(State(state): State<AppState>) -> Result<Json<Vec<ConnectorType>>, EngineError> {
    Ok(Json(state.integrations.list_connector_types().await?))
}

async fn get_integration_type(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ConnectorType>, EngineError> {
    Ok(Json(state.integrations.get_connector_type(id).await?))
}

async fn update_integration_type(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<ConnectorTypeUpdate>,
) -> Result<Json<ConnectorType>, EngineError> {
    Ok(Json(state.integrations.update_connector_type(id, update).await?))
}

async fn delete_integration_type(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, EngineError> {
    state.integrations.delete_connector_type(id).await?;
    Ok(Json(json!({ "message": "Integration type deleted successfully" })))
}
