/// Server setup and initialization
///
/// Wires together all components: database, credential vault, connector
/// registry, execution engine, and HTTP routes. Provides the main application
/// factory function for creating the Axum app.

use crate::{
    api::{create_api_routes, AppState},
    config::Config,
    connectors::{build_http_client, ConnectorRegistry},
    store::Database,
    vault::CredentialVault,
};
use anyhow::{Context, Result};
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Create the main Axum application with all routes
///
/// Opens the database, unlocks the credential vault, registers the built-in
/// connectors and optionally seeds their integration types.
pub async fn create_app(config: Config) -> Result<Router> {
    tracing::info!("🔐 Initializing credential vault");
    let vault = CredentialVault::from_config(&config.vault)
        .context("Cannot start without a valid INTEGRAFLOW_ENCRYPTION_KEY")?;

    tracing::info!("📋 Initializing database");
    let database = Database::connect(&config.database.url).await?;

    tracing::info!("🔌 Registering built-in connectors");
    let client = build_http_client(config.connectors.http_timeout())?;
    let registry = ConnectorRegistry::with_builtin_connectors(client);
    tracing::debug!("🔌 Connectors: {:?}", registry.connector_names());

    tracing::info!("🏗️ Creating application state");
    let state = AppState::new(&database, Arc::new(vault), Arc::new(registry));

    if config.connectors.seed_builtin_types {
        state
            .integrations
            .seed_builtin_connector_types()
            .await
            .context("Failed to seed built-in integration types")?;
    }

    tracing::info!("📡 Creating HTTP router with all endpoints");
    let app = build_router(state);

    tracing::info!("✅ Application initialized successfully");
    Ok(app)
}

/// Router over an already wired application state
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(create_api_routes().with_state(state))
}

/// Start the HTTP server with the given configuration
///
/// Creates the application and starts the Axum server on the configured address and port.
pub async fn start_server(config: Config) -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting integraflow server...");

    let app = create_app(config.clone()).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "integraflow workflow engine",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Health check endpoint handler
async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
