/// Core workflow and execution record definitions
///
/// `workflow_data` and `execution_data` are JSON documents at the storage
/// boundary; in memory they are the typed structures below. Field names are
/// kept stable so previously stored workflows and logs stay readable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The only node kind the engine knows how to run
pub const INTEGRATION_NODE_TYPE: &str = "integration";

/// Default trigger source for manual executions
pub const MANUAL_TRIGGER: &str = "manual";

/// Default trigger source for the API trigger alias
pub const API_TRIGGER: &str = "api";

/// A stored workflow definition
///
/// `workflow_data` is kept as raw JSON here and only parsed into
/// [`WorkflowData`] when the workflow is executed, so a malformed payload
/// surfaces as a failed execution instead of an unreadable workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub workflow_data: Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for workflow creation
#[derive(Debug, Clone, Deserialize)]
pub struct NewWorkflow {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub workflow_data: Value,
}

/// Partial workflow update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkflowUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub workflow_data: Option<Value>,
}

/// Parsed graph payload of a workflow
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowData {
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    /// Editor-only fields, preserved untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkflowData {
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    /// First node declared with `id`
    pub fn node(&self, id: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|node| node.id == id)
    }
}

/// A single step of the workflow graph, bound to one integration task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Unique node identifier within the workflow (e.g., "node-1")
    pub id: String,
    /// Node kind; only "integration" is executable
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default, deserialize_with = "deserialize_integration_id")]
    pub integration_id: Option<IntegrationRef>,
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub params: Map<String, Value>,
    /// Editor-only fields such as `position`
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeSpec {
    /// Task name, treating an empty string as missing
    pub fn task_name(&self) -> Option<&str> {
        self.task.as_deref().filter(|task| !task.is_empty())
    }
}

/// A node's reference to a stored integration
///
/// Editors sometimes send numeric ids as strings. Anything that is not an
/// integer id is kept as `Invalid` so the node, not the whole workflow,
/// fails when it runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum IntegrationRef {
    Id(i64),
    Invalid(String),
}

impl IntegrationRef {
    pub fn id(&self) -> Option<i64> {
        match self {
            IntegrationRef::Id(id) => Some(*id),
            IntegrationRef::Invalid(_) => None,
        }
    }
}

impl fmt::Display for IntegrationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrationRef::Id(id) => write!(f, "{}", id),
            IntegrationRef::Invalid(raw) => f.write_str(raw),
        }
    }
}

fn deserialize_integration_id<'de, D>(deserializer: D) -> Result<Option<IntegrationRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let reference = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::Number(number)) => Some(
            number
                .as_i64()
                .map(IntegrationRef::Id)
                .unwrap_or_else(|| IntegrationRef::Invalid(number.to_string())),
        ),
        Some(Value::String(raw)) if raw.trim().is_empty() => None,
        Some(Value::String(raw)) => Some(
            raw.trim()
                .parse()
                .map(IntegrationRef::Id)
                .unwrap_or_else(|_| IntegrationRef::Invalid(raw.trim().to_string())),
        ),
        Some(other) => Some(IntegrationRef::Invalid(other.to_string())),
    };
    Ok(reference)
}

/// Directed edge between two nodes
///
/// Edges naming unknown nodes are ignored by the planner, so missing ends
/// default to an empty id instead of failing the parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
}

impl Connection {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Lifecycle of one execution: running, then exactly one terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Running,
    Success,
    Failed,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Running => "running",
            ExecutionStatus::Success => "success",
            ExecutionStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExecutionStatus::Running)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "running" => Some(ExecutionStatus::Running),
            "success" => Some(ExecutionStatus::Success),
            "failed" => Some(ExecutionStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a failed node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeErrorKind {
    /// Node definition problem (unsupported type, missing binding)
    Validation,
    /// Integration, connector or task does not exist
    NotFound,
    /// Stored credentials could not be decrypted
    Credential,
    /// The connector task failed or reported failure
    Connector,
}

/// Outcome of one node, embedded in the execution record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeResult {
    pub node_id: String,
    pub task: String,
    pub integration_id: Option<i64>,
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Value,
    pub execution_time_seconds: f64,
    /// When the node started
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<NodeErrorKind>,
}

/// Trigger information recorded with every execution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionMetadata {
    pub trigger_source: String,
    pub trigger_metadata: Map<String, Value>,
    pub runtime_params: Map<String, Value>,
}

/// Structured payload of an execution log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionData {
    pub node_results: Vec<NodeResult>,
    pub metadata: ExecutionMetadata,
    pub nodes_total: usize,
    pub nodes_executed: usize,
    pub nodes_successful: usize,
    /// Nodes the planner could not order (cycle fallback)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub planner_fallback: Vec<String>,
    /// Orchestrator fault text, if the run aborted unexpectedly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionData {
    /// Assemble the record payload, deriving the counters from `node_results`
    pub fn assemble(
        node_results: Vec<NodeResult>,
        metadata: ExecutionMetadata,
        nodes_total: usize,
        planner_fallback: Vec<String>,
        error: Option<String>,
    ) -> Self {
        let nodes_executed = node_results.len();
        let nodes_successful = node_results.iter().filter(|result| result.success).count();
        Self {
            node_results,
            metadata,
            nodes_total,
            nodes_executed,
            nodes_successful,
            planner_fallback,
            error,
        }
    }
}

/// One run of a workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLog {
    pub id: i64,
    pub workflow_id: i64,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub execution_data: Option<ExecutionData>,
    pub error_message: Option<String>,
}

impl ExecutionLog {
    /// Wall-clock duration, once the execution is terminal
    pub fn execution_time_seconds(&self) -> Option<f64> {
        self.completed_at
            .map(|completed| (completed - self.started_at).num_microseconds().unwrap_or(0) as f64 / 1_000_000.0)
    }
}

/// Options accepted by execute / trigger
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecuteRequest {
    #[serde(default)]
    pub runtime_params: Option<Map<String, Value>>,
    #[serde(default)]
    pub trigger_source: Option<String>,
    #[serde(default)]
    pub trigger_metadata: Option<Map<String, Value>>,
}

impl ExecuteRequest {
    pub fn with_runtime_params(mut self, params: Map<String, Value>) -> Self {
        self.runtime_params = Some(params);
        self
    }

    pub fn with_trigger_source(mut self, source: impl Into<String>) -> Self {
        self.trigger_source = Some(source.into());
        self
    }
}

/// Execution result shape returned to API callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionSummary {
    pub execution_id: i64,
    pub workflow_id: i64,
    pub workflow_name: String,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub execution_time_seconds: Option<f64>,
    pub nodes_executed: usize,
    pub nodes_total: usize,
    pub node_results: Vec<NodeResult>,
    pub error_message: Option<String>,
    pub trigger_source: String,
}

impl ExecutionSummary {
    pub fn new(log: &ExecutionLog, workflow_name: &str) -> Self {
        let data = log.execution_data.clone().unwrap_or_default();
        Self {
            execution_id: log.id,
            workflow_id: log.workflow_id,
            workflow_name: workflow_name.to_string(),
            status: log.status,
            started_at: log.started_at,
            completed_at: log.completed_at,
            execution_time_seconds: log.execution_time_seconds(),
            nodes_executed: data.nodes_executed,
            nodes_total: data.nodes_total,
            node_results: data.node_results,
            error_message: log.error_message.clone(),
            trigger_source: data.metadata.trigger_source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn workflow_data_keeps_editor_fields() {
        let raw = json!({
            "nodes": [{
                "id": "n1",
                "type": "integration",
                "integration_id": 3,
                "task": "create_issue",
                "params": {"title": "Bug"},
                "position": {"x": 10, "y": 20}
            }],
            "connections": [{"from": "n1", "to": "n2"}],
            "viewport": {"zoom": 1.5}
        });

        let data = WorkflowData::from_value(&raw).unwrap();
        assert_eq!(data.nodes[0].integration_id, Some(IntegrationRef::Id(3)));
        assert_eq!(data.nodes[0].extra["position"], json!({"x": 10, "y": 20}));
        assert_eq!(data.extra["viewport"], json!({"zoom": 1.5}));
        assert_eq!(serde_json::to_value(&data).unwrap(), raw);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let data = WorkflowData::from_value(&json!({})).unwrap();
        assert!(data.nodes.is_empty());
        assert!(data.connections.is_empty());
    }

    #[test]
    fn integration_id_is_lenient() {
        let node: NodeSpec = serde_json::from_value(json!({"id": "a", "integration_id": "42"})).unwrap();
        assert_eq!(node.integration_id, Some(IntegrationRef::Id(42)));

        let node: NodeSpec = serde_json::from_value(json!({"id": "a", "integration_id": null})).unwrap();
        assert_eq!(node.integration_id, None);

        let node: NodeSpec = serde_json::from_value(json!({"id": "a", "integration_id": "abc"})).unwrap();
        assert_eq!(node.integration_id, Some(IntegrationRef::Invalid("abc".into())));
        assert_eq!(node.integration_id.as_ref().and_then(IntegrationRef::id), None);

        let node: NodeSpec = serde_json::from_value(json!({"id": "a", "integration_id": 1.5})).unwrap();
        assert_eq!(node.integration_id.unwrap().to_string(), "1.5");
    }

    #[test]
    fn nodes_field_must_be_a_list() {
        assert!(WorkflowData::from_value(&json!({"nodes": "oops"})).is_err());
    }

    #[test]
    fn empty_task_counts_as_missing() {
        let node = NodeSpec {
            id: "a".into(),
            task: Some(String::new()),
            ..NodeSpec::default()
        };
        assert_eq!(node.task_name(), None);
    }

    #[test]
    fn legacy_fault_records_still_parse() {
        let data: ExecutionData = serde_json::from_value(json!({
            "node_results": [],
            "metadata": {"trigger_source": "manual", "trigger_metadata": {}, "runtime_params": {}},
            "error": "Expecting value: line 1 column 1"
        }))
        .unwrap();
        assert_eq!(data.nodes_total, 0);
        assert_eq!(data.error.as_deref(), Some("Expecting value: line 1 column 1"));
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [ExecutionStatus::Running, ExecutionStatus::Success, ExecutionStatus::Failed] {
            assert_eq!(ExecutionStatus::parse(status.as_str()), Some(status));
        }
        assert!(!ExecutionStatus::Running.is_terminal());
        assert!(ExecutionStatus::Failed.is_terminal());
    }
}
