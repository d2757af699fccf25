/// integraflow server entry point
///
/// Initializes configuration and starts the HTTP server with integration,
/// workflow and execution endpoints.

use integraflow::{config::Config, server::start_server};

/// Application entry point
///
/// The server provides:
/// - Integration type and integration management at /api/integration-types/* and /api/integrations/*
/// - Workflow management and execution at /api/workflows/*
/// - Execution history at /api/executions/*
/// - Health check at /health
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from the environment (INTEGRAFLOW_* variables)
    let config = Config::default();

    start_server(config).await?;

    Ok(())
}
