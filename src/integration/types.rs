/// Connector type and integration definitions
///
/// A connector type describes a category of external system (issue tracker,
/// source control, cloud provider, chat webhook) with the credential
/// parameters it needs and the tasks it offers. An integration is one
/// credentialed instance of a connector type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One declared credential or task parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    /// Input kind shown by editors ("string", "password", "number", ...)
    #[serde(rename = "type", default = "default_parameter_type")]
    pub param_type: String,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

/// One entry of a connector type's task catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
}

fn default_parameter_type() -> String {
    "string".to_string()
}

fn default_required() -> bool {
    true
}

/// A named category of external system with its parameter and task schema
///
/// The name is the identity used to resolve connector implementations and
/// never changes once created. Schema revisions do not migrate existing
/// integrations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorType {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterSpec>,
    pub tasks: Vec<TaskSpec>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConnectorType {
    /// Whether the task catalog lists `task`
    pub fn declares_task(&self, task: &str) -> bool {
        self.tasks.iter().any(|spec| spec.name == task)
    }
}

/// Request body for connector type creation
#[derive(Debug, Clone, Deserialize)]
pub struct NewConnectorType {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    #[serde(default)]
    pub tasks: Vec<TaskSpec>,
}

/// Partial update for a connector type. The name cannot be changed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectorTypeUpdate {
    pub description: Option<String>,
    pub parameters: Option<Vec<ParameterSpec>>,
    pub tasks: Option<Vec<TaskSpec>>,
}

/// A credentialed instance of a connector type
///
/// The encrypted credential blob never leaves the process through serde.
#[derive(Debug, Clone, Serialize)]
pub struct Integration {
    pub id: i64,
    pub name: String,
    pub integration_type_id: i64,
    pub integration_type_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub encrypted_credentials: String,
}

/// Request body for integration creation
#[derive(Debug, Clone, Deserialize)]
pub struct NewIntegration {
    pub name: String,
    pub integration_type_id: i64,
    #[serde(default)]
    pub credentials: Map<String, Value>,
}

/// Request body for a connection test (nothing is stored)
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionTest {
    pub integration_type_id: i64,
    #[serde(default)]
    pub credentials: Map<String, Value>,
}
