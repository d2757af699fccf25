/// Configuration management for the integraflow server
///
/// Handles server binding, database location, the credential vault key and
/// connector HTTP settings. Every value can be overridden through environment
/// variables for container deployments.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Credential vault configuration
    pub vault: VaultConfig,
    /// Connector runtime configuration
    pub connectors: ConnectorConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// SQLite database location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx connection URL (e.g., "sqlite://integraflow.db")
    pub url: String,
}

/// Credential vault configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Base64-encoded 32 byte AES-256 key. Startup fails without one.
    pub encryption_key: Option<String>,
}

impl std::fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultConfig")
            .field("encryption_key", &self.encryption_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Settings shared by the built-in connectors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Request timeout for connector HTTP calls, in seconds
    pub http_timeout_secs: u64,
    /// Insert the built-in connector type definitions at startup when absent
    pub seed_builtin_types: bool,
}

impl ConnectorConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for k8s/container deployment
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("INTEGRAFLOW_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("INTEGRAFLOW_PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .unwrap_or(8000),
            },
            database: DatabaseConfig {
                url: std::env::var("INTEGRAFLOW_DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite://integraflow.db".to_string()),
            },
            vault: VaultConfig {
                encryption_key: std::env::var("INTEGRAFLOW_ENCRYPTION_KEY")
                    .ok()
                    .filter(|key| !key.trim().is_empty()),
            },
            connectors: ConnectorConfig {
                http_timeout_secs: std::env::var("INTEGRAFLOW_HTTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|raw| raw.parse().ok())
                    .unwrap_or(10),
                seed_builtin_types: std::env::var("INTEGRAFLOW_SEED_CONNECTOR_TYPES")
                    .ok()
                    .and_then(|raw| parse_flag(&raw))
                    .unwrap_or(true),
            },
        }
    }
}

/// Parse a boolean-ish environment value ("1", "true", "yes", "off", ...)
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
