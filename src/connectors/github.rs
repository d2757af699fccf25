/// GitHub connector
///
/// Uses the GitHub REST API with a bearer token. Credentials: `token`
/// (required), `username` (informational).

use crate::connectors::{json_body, text, Connector, Credentials, TaskParams, TaskResult, TEST_CONNECTION_TASK};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};

const TASKS: &[&str] = &[TEST_CONNECTION_TASK, "create_repo", "create_issue"];

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const ACCEPT: &str = "application/vnd.github.v3+json";

#[derive(Debug, Clone)]
pub struct GithubConnector {
    client: reqwest::Client,
    api_base: String,
}

impl GithubConnector {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Point the connector at another API root (GitHub Enterprise, test servers)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn authorized(&self, builder: reqwest::RequestBuilder, token: &str) -> reqwest::RequestBuilder {
        builder.bearer_auth(token).header("Accept", ACCEPT)
    }

    async fn test_connection(&self, credentials: &Credentials) -> Result<TaskResult> {
        let Some(token) = text(credentials, "token") else {
            return Ok(TaskResult::failed("Missing required credential: token"));
        };

        let response = self
            .authorized(self.client.get(format!("{}/user", self.api_base)), &token)
            .send()
            .await;
        let response = match response {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return Ok(TaskResult::failed("Connection timeout")),
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
        let login = user.get("login").cloned().unwrap_or(Value::Null);
        Ok(TaskResult::ok(
            format!("Connected successfully as {}", login.as_str().unwrap_or("Unknown")),
            json!({
                "username": login,
                "name": user.get("name").cloned().unwrap_or(Value::Null),
                "email": user.get("email").cloned().unwrap_or(Value::Null),
            }),
        ))
    }

    async fn create_repo(&self, credentials: &Credentials, params: &TaskParams) -> Result<TaskResult> {
        let Some(repo_name) = text(params, "repo_name") else {
            return Ok(TaskResult::failed("Missing required parameter: repo_name"));
        };
        let token = text(credentials, "token").unwrap_or_default();
        let payload = json!({
            "name": repo_name,
            "description": text(params, "description").unwrap_or_default(),
            "private": params.get("private").and_then(Value::as_bool).unwrap_or(false),
            "auto_init": true,
        });

        tracing::debug!("📦 Creating GitHub repository {}", repo_name);
        let response = self
            .authorized(self.client.post(format!("{}/user/repos", self.api_base)), &token)
            .json(&payload)
            .send()
            .await
            .context("Error creating repository")?;

        if response.status() != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Ok(TaskResult::failed(format!("Failed to create repository: {}", body)));
        }

        let repo = json_body(response).await;
        let full_name = repo.get("full_name").cloned().unwrap_or(Value::Null);
        Ok(TaskResult::ok(
            format!("Repository created successfully: {}", full_name.as_str().unwrap_or("")),
            json!({
                "name": repo.get("name").cloned().unwrap_or(Value::Null),
                "full_name": full_name,
                "url": repo.get("html_url").cloned().unwrap_or(Value::Null),
                "clone_url": repo.get("clone_url").cloned().unwrap_or(Value::Null),
            }),
        ))
    }

    async fn create_issue(&self, credentials: &Credentials, params: &TaskParams) -> Result<TaskResult> {
        let (Some(repo), Some(title)) = (text(params, "repo"), text(params, "title")) else {
            return Ok(TaskResult::failed("Missing required parameters: repo or title"));
        };
        let token = text(credentials, "token").unwrap_or_default();
        let payload = json!({
            "title": title,
            "body": text(params, "body").unwrap_or_default(),
        });

        tracing::debug!("📝 Creating GitHub issue in {}", repo);
        let response = self
            .authorized(
                self.client.post(format!("{}/repos/{}/issues", self.api_base, repo)),
                &token,
            )
            .json(&payload)
            .send()
            .await
            .context("Error creating issue")?;

        if response.status() != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Ok(TaskResult::failed(format!("Failed to create issue: {}", body)));
        }

        let issue = json_body(response).await;
        let number = issue.get("number").cloned().unwrap_or(Value::Null);
        Ok(TaskResult::ok(
            format!("Issue created successfully: #{}", number),
            json!({
                "number": number,
                "url": issue.get("html_url").cloned().unwrap_or(Value::Null),
                "state": issue.get("state").cloned().unwrap_or(Value::Null),
            }),
        ))
    }
}

#[async_trait]
impl Connector for GithubConnector {
    fn name(&self) -> &'static str {
        "github"
    }

    fn tasks(&self) -> &'static [&'static str] {
        TASKS
    }

    async fn run(&self, task: &str, credentials: &Credentials, params: &TaskParams) -> Result<TaskResult> {
        match task {
            TEST_CONNECTION_TASK => self.test_connection(credentials).await,
            "create_repo" => self.create_repo(credentials, params).await,
            "create_issue" => self.create_issue(credentials, params).await,
            other => anyhow::bail!("Task '{}' not found in github", other),
        }
    }
}
