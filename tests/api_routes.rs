mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{node, TestContext};
use integraflow::server::build_router;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn health_reports_healthy() {
    let ctx = TestContext::new().await;
    let app = build_router(ctx.state.clone());

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy"}));
}

#[tokio::test]
async fn integration_lifecycle_over_http() {
    let ctx = TestContext::new().await;
    let app = build_router(ctx.state.clone());

    let (status, created_type) = send(
        &app,
        "POST",
        "/api/integration-types",
        Some(json!({"name": "mock", "parameters": [{"name": "token", "type": "password", "required": true}]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let type_id = created_type["id"].as_i64().unwrap();

    let (status, body) = send(&app, "POST", "/api/integration-types", Some(json!({"name": "mock"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "Integration type 'mock' already exists");

    let (status, integration) = send(
        &app,
        "POST",
        "/api/integrations",
        Some(json!({"name": "prod", "integration_type_id": type_id, "credentials": {"token": "hunter2"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(integration["integration_type_name"], "mock");
    assert!(!integration.to_string().contains("hunter2"));
    let integration_id = integration["id"].as_i64().unwrap();

    let (status, body) = send(&app, "DELETE", &format!("/api/integration-types/{}", type_id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["detail"].as_str().unwrap().contains("still used"));

    let (status, listed) = send(&app, "GET", "/api/integrations", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "DELETE", &format!("/api/integrations/{}", integration_id), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", &format!("/api/integrations/{}", integration_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "DELETE", &format!("/api/integration-types/{}", type_id), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn connection_test_route_reports_results() {
    let ctx = TestContext::new().await;
    let app = build_router(ctx.state.clone());

    let (status, body) = send(
        &app,
        "POST",
        "/api/integrations/test",
        Some(json!({"integration_type_id": 42, "credentials": {}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Integration type not found");
}

#[tokio::test]
async fn workflow_validation_errors_are_bad_requests() {
    let ctx = TestContext::new().await;
    let app = build_router(ctx.state.clone());

    let (status, body) = send(
        &app,
        "POST",
        "/api/workflows",
        Some(json!({"name": "wf", "workflow_data": [1, 2, 3]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Validation error: workflow_data must be a JSON object");

    let (status, _) = send(&app, "GET", "/api/workflows/31", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn execute_and_trigger_return_summaries() {
    let ctx = TestContext::new().await;
    let integration = ctx.mock_integration().await;
    let app = build_router(ctx.state.clone());

    let (status, workflow) = send(
        &app,
        "POST",
        "/api/workflows",
        Some(json!({
            "name": "notify",
            "workflow_data": {
                "nodes": [node("a", integration, "echo", json!({"channel": "ops"}))],
                "connections": [],
                "viewport": {"zoom": 1.5},
            },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(workflow["workflow_data"]["viewport"], json!({"zoom": 1.5}));
    let workflow_id = workflow["id"].as_i64().unwrap();

    let (status, summary) = send(&app, "POST", &format!("/api/workflows/{}/execute", workflow_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["status"], "success");
    assert_eq!(summary["workflow_name"], "notify");
    assert_eq!(summary["trigger_source"], "manual");
    assert_eq!(summary["nodes_executed"], 1);

    let (status, summary) = send(
        &app,
        "POST",
        &format!("/api/workflows/{}/trigger", workflow_id),
        Some(json!({"runtime_params": {"channel": "alerts"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["trigger_source"], "api");
    assert_eq!(summary["node_results"][0]["data"]["params"]["channel"], "alerts");
    let execution_id = summary["execution_id"].as_i64().unwrap();

    let (status, history) = send(&app, "GET", &format!("/api/workflows/{}/executions", workflow_id), None).await;
    assert_eq!(status, StatusCode::OK);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["id"].as_i64(), Some(execution_id));

    let (status, log) = send(&app, "GET", &format!("/api/executions/{}", execution_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(log["status"], "success");

    let (status, filtered) = send(&app, "GET", &format!("/api/executions?workflow_id={}", workflow_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(filtered.as_array().unwrap().len(), 2);

    let (status, _) = send(&app, "POST", "/api/workflows/999/execute", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
