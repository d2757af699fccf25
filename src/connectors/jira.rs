/// Jira connector
///
/// Talks to the Jira Cloud REST API v3 with basic auth (email + API token).
/// Credentials: `url`, `email`, `api_token`.

use crate::connectors::{json_body, text, Connector, Credentials, TaskParams, TaskResult, TEST_CONNECTION_TASK};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};

const TASKS: &[&str] = &[TEST_CONNECTION_TASK, "create_issue"];

#[derive(Debug, Clone)]
pub struct JiraConnector {
    client: reqwest::Client,
}

/// Resolved Jira credentials
struct JiraAuth {
    base_url: String,
    email: String,
    api_token: String,
}

impl JiraAuth {
    fn from_credentials(credentials: &Credentials) -> Option<Self> {
        Some(Self {
            base_url: text(credentials, "url")?.trim_end_matches('/').to_string(),
            email: text(credentials, "email")?,
            api_token: text(credentials, "api_token")?,
        })
    }
}

impl JiraConnector {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn test_connection(&self, credentials: &Credentials) -> Result<TaskResult> {
        let Some(auth) = JiraAuth::from_credentials(credentials) else {
            return Ok(TaskResult::failed("Missing required credentials: url, email, or api_token"));
        };

        let response = self
            .client
            .get(format!("{}/rest/api/3/myself", auth.base_url))
            .basic_auth(&auth.email, Some(&auth.api_token))
            .header("Accept", "application/json")
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Ok(TaskResult::failed("Connection timeout - please check the URL"));
            }
            Err(e) => return Ok(TaskResult::failed(format!("Connection error: {}", e))),
        };

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Ok(TaskResult::failed(format!(
                "Connection failed with status {}: {}",
                status.as_u16(),
                body
            )));
        }

        let user = json_body(response).await;
        let display_name = user.get("displayName").cloned().unwrap_or(Value::Null);
        Ok(TaskResult::ok(
            format!(
                "Connected successfully as {}",
                display_name.as_str().unwrap_or("Unknown")
            ),
            json!({
                "account_id": user.get("accountId").cloned().unwrap_or(Value::Null),
                "display_name": display_name,
            }),
        ))
    }

    async fn create_issue(&self, credentials: &Credentials, params: &TaskParams) -> Result<TaskResult> {
        let Some(auth) = JiraAuth::from_credentials(credentials) else {
            return Ok(TaskResult::failed("Missing required credentials: url, email, or api_token"));
        };
        let (Some(project), Some(summary)) = (text(params, "project"), text(params, "summary")) else {
            return Ok(TaskResult::failed("Missing required parameters: project or summary"));
        };
        let description = text(params, "description").unwrap_or_default();
        let issue_type = text(params, "issue_type").unwrap_or_else(|| "Task".to_string());

        let payload = json!({
            "fields": {
                "project": {"key": project},
                "summary": summary,
                "description": {
                    "type": "doc",
                    "version": 1,
                    "content": [{
                        "type": "paragraph",
                        "content": [{"type": "text", "text": description}]
                    }]
                },
                "issuetype": {"name": issue_type}
            }
        });

        tracing::debug!("📝 Creating Jira issue in project {}", project);
        let response = self
            .client
            .post(format!("{}/rest/api/3/issue", auth.base_url))
            .basic_auth(&auth.email, Some(&auth.api_token))
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await
            .context("Error creating issue")?;

        if response.status() != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Ok(TaskResult::failed(format!("Failed to create issue: {}", body)));
        }

        let issue = json_body(response).await;
        let key = issue.get("key").cloned().unwrap_or(Value::Null);
        Ok(TaskResult::ok(
            format!("Issue created successfully: {}", key.as_str().unwrap_or("")),
            json!({
                "key": key,
                "id": issue.get("id").cloned().unwrap_or(Value::Null),
                "self": issue.get("self").cloned().unwrap_or(Value::Null),
            }),
        ))
    }
}

#[async_trait]
impl Connector for JiraConnector {
    fn name(&self) -> &'static str {
        "jira"
    }

    fn tasks(&self) -> &'static [&'static str] {
        TASKS
    }

    async fn run(&self, task: &str, credentials: &Credentials, params: &TaskParams) -> Result<TaskResult> {
        match task {
            TEST_CONNECTION_TASK => self.test_connection(credentials).await,
            "create_issue" => self.create_issue(credentials, params).await,
            other => anyhow::bail!("Task '{}' not found in jira", other),
        }
    }
}
