//! Shared fixtures for the integration tests
#![allow(dead_code)]

use integraflow::api::AppState;
use integraflow::connectors::{ConnectorRegistry, Credentials, TaskParams, TaskResult};
use integraflow::integration::{NewConnectorType, NewIntegration};
use integraflow::store::Database;
use integraflow::vault::CredentialVault;
use integraflow::workflow::types::NewWorkflow;
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};

pub const TEST_KEY: [u8; 32] = [42u8; 32];

/// In-memory database, vault and a registry holding the `mock` connector
///
/// `mock` tasks:
/// - `echo` succeeds and returns its params and credentials
/// - `record` succeeds and appends `params.label` to `calls`
/// - `fail` reports failure with `params.reason`
/// - `boom` returns an error
/// - `panic` panics
pub struct TestContext {
    pub database: Database,
    pub vault: Arc<CredentialVault>,
    pub registry: Arc<ConnectorRegistry>,
    pub state: AppState,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl TestContext {
    pub async fn new() -> Self {
        let database = Database::in_memory().await.expect("in-memory database");
        let vault = Arc::new(CredentialVault::new(&TEST_KEY).expect("vault"));
        let registry = Arc::new(ConnectorRegistry::new());
        let calls = Arc::new(Mutex::new(Vec::new()));
        register_mock_connector(&registry, Arc::clone(&calls));

        let state = AppState::new(&database, Arc::clone(&vault), Arc::clone(&registry));
        Self {
            database,
            vault,
            registry,
            state,
            calls,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub async fn create_type(&self, name: &str) -> i64 {
        self.state
            .integrations
            .create_connector_type(NewConnectorType {
                name: name.to_string(),
                description: format!("{} test type", name),
                parameters: Vec::new(),
                tasks: Vec::new(),
            })
            .await
            .expect("create connector type")
            .id
    }

    pub async fn create_integration(&self, type_id: i64, credentials: Value) -> i64 {
        self.state
            .integrations
            .create_integration(NewIntegration {
                name: "test integration".to_string(),
                integration_type_id: type_id,
                credentials: object(credentials),
            })
            .await
            .expect("create integration")
            .id
    }

    /// A `mock` type with one integration holding `{"token": "secret"}`
    pub async fn mock_integration(&self) -> i64 {
        let type_id = self.create_type("mock").await;
        self.create_integration(type_id, json!({"token": "secret"})).await
    }

    pub async fn create_workflow(&self, workflow_data: Value) -> i64 {
        self.state
            .workflows
            .create_workflow(NewWorkflow {
                name: "test workflow".to_string(),
                description: String::new(),
                workflow_data,
            })
            .await
            .expect("create workflow")
            .id
    }
}

pub fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("JSON object")
}

/// An integration node bound to the mock connector
pub fn node(id: &str, integration_id: i64, task: &str, params: Value) -> Value {
    json!({
        "id": id,
        "type": "integration",
        "integration_id": integration_id,
        "task": task,
        "params": params,
    })
}

fn register_mock_connector(registry: &ConnectorRegistry, calls: Arc<Mutex<Vec<String>>>) {
    registry.register_task(
        "mock",
        "echo",
        Arc::new(|credentials: Credentials, params: TaskParams| async move {
            Ok::<_, anyhow::Error>(TaskResult::ok(
                "echoed",
                json!({"params": params, "credentials": credentials}),
            ))
        }),
    );

    registry.register_task(
        "mock",
        "record",
        Arc::new(move |_: Credentials, params: TaskParams| {
            let calls = Arc::clone(&calls);
            async move {
                let label = params.get("label").and_then(Value::as_str).unwrap_or("?").to_string();
                calls.lock().unwrap().push(label.clone());
                Ok::<_, anyhow::Error>(TaskResult::ok(format!("recorded {}", label), json!({"label": label})))
            }
        }),
    );

    registry.register_task(
        "mock",
        "fail",
        Arc::new(|_: Credentials, params: TaskParams| async move {
            let reason = params.get("reason").and_then(Value::as_str).unwrap_or("no reason").to_string();
            Ok::<_, anyhow::Error>(TaskResult::failed(reason))
        }),
    );

    registry.register_task(
        "mock",
        "boom",
        Arc::new(|_: Credentials, _: TaskParams| async move {
            Err::<TaskResult, _>(anyhow::anyhow!("remote exploded"))
        }),
    );

    registry.register_task(
        "mock",
        "panic",
        Arc::new(|_: Credentials, _: TaskParams| async move {
            if true {
                panic!("connector bug");
            }
            Ok::<_, anyhow::Error>(TaskResult::ok("unreachable", json!({})))
        }),
    );
}
