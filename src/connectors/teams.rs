/// Microsoft Teams connector
///
/// Posts MessageCards to an incoming webhook. Credentials: `webhook_url`.
/// Every send task succeeds only on HTTP 200.

use crate::connectors::{text, Connector, Credentials, TaskParams, TaskResult, TEST_CONNECTION_TASK};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Map, Value};

const TASKS: &[&str] = &[
    TEST_CONNECTION_TASK,
    "send_simple_message",
    "send_card_message",
    "send_notification",
    "send_rich_card",
    "send_workflow_status",
    "send_alert",
];

const TEAMS_BLUE: &str = "0078D4";

#[derive(Debug, Clone)]
pub struct TeamsConnector {
    client: reqwest::Client,
}

/// Status/severity styling: theme color, title emoji, label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CardStyle {
    color: &'static str,
    emoji: &'static str,
    label: &'static str,
}

fn notification_style(status: &str) -> CardStyle {
    match status {
        "success" => CardStyle { color: "28A745", emoji: "✅", label: "Success" },
        "warning" => CardStyle { color: "FFC107", emoji: "⚠️", label: "Warning" },
        "error" | "danger" => CardStyle { color: "DC3545", emoji: "❌", label: "Error" },
        "info" => CardStyle { color: TEAMS_BLUE, emoji: "ℹ️", label: "Info" },
        _ => CardStyle { color: TEAMS_BLUE, emoji: "📢", label: "Notice" },
    }
}

fn workflow_status_style(status: &str) -> CardStyle {
    match status {
        "success" => CardStyle { color: "28A745", emoji: "✅", label: "Completed Successfully" },
        "failed" => CardStyle { color: "DC3545", emoji: "❌", label: "Failed" },
        "error" => CardStyle { color: "DC3545", emoji: "❌", label: "Error" },
        "pending" => CardStyle { color: "FFC107", emoji: "⏳", label: "Pending" },
        _ => CardStyle { color: TEAMS_BLUE, emoji: "🔄", label: "Running" },
    }
}

fn severity_style(severity: &str) -> CardStyle {
    match severity {
        "critical" => CardStyle { color: "8B0000", emoji: "🚨", label: "CRITICAL" },
        "high" => CardStyle { color: "DC3545", emoji: "⚠️", label: "HIGH" },
        "low" => CardStyle { color: "17A2B8", emoji: "ℹ️", label: "LOW" },
        _ => CardStyle { color: "FFC107", emoji: "⚡", label: "MEDIUM" },
    }
}

/// Empty MessageCard envelope
fn message_card() -> Map<String, Value> {
    let mut card = Map::new();
    card.insert("@type".into(), json!("MessageCard"));
    card.insert("@context".into(), json!("https://schema.org/extensions"));
    card
}

fn local_time() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn lowercase_param(params: &TaskParams, key: &str, default: &str) -> String {
    text(params, key).unwrap_or_else(|| default.to_string()).to_lowercase()
}

impl TeamsConnector {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Post a card; `Ok(None)` on HTTP 200, otherwise the failure text
    async fn post_card(&self, webhook_url: &str, card: &Map<String, Value>) -> Result<Option<String>> {
        let response = self.client.post(webhook_url).json(card).send().await?;
        let status = response.status();
        if status == StatusCode::OK {
            return Ok(None);
        }
        let body = response.text().await.unwrap_or_default();
        Ok(Some(format!("{} - {}", status.as_u16(), body)))
    }

    /// Post a card for a send task, mapping the reply to a result
    async fn send(
        &self,
        credentials: &Credentials,
        card: Map<String, Value>,
        action: &str,
        on_success: TaskResult,
    ) -> Result<TaskResult> {
        let Some(webhook_url) = text(credentials, "webhook_url") else {
            return Ok(TaskResult::failed("Missing webhook_url in credentials"));
        };

        match self
            .post_card(&webhook_url, &card)
            .await
            .with_context(|| format!("Error sending {}", action))?
        {
            None => Ok(on_success),
            Some(failure) => Ok(TaskResult::failed(format!("Failed to send {}: {}", action, failure))),
        }
    }

    async fn test_connection(&self, credentials: &Credentials) -> Result<TaskResult> {
        let Some(webhook_url) = text(credentials, "webhook_url") else {
            return Ok(TaskResult::failed("Missing webhook_url in credentials"));
        };
        if !webhook_url.starts_with("https://") || !webhook_url.contains("office.com/webhook") {
            return Ok(TaskResult::failed("Invalid Teams webhook URL format"));
        }

        let mut card = message_card();
        card.insert("summary".into(), json!("Connection Test"));
        card.insert("themeColor".into(), json!(TEAMS_BLUE));
        card.insert("title".into(), json!("✅ Connection Test Successful"));
        card.insert("text".into(), json!("Your Microsoft Teams integration is working correctly!"));

        let response = self.client.post(&webhook_url).json(&card).send().await;
        let response = match response {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Ok(TaskResult::failed("Connection timeout. Please check your webhook URL."));
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

        Ok(TaskResult::ok(
            "Successfully connected to Microsoft Teams!",
            json!({"status": "connected", "webhook_valid": true}),
        ))
    }

    async fn send_simple_message(&self, credentials: &Credentials, params: &TaskParams) -> Result<TaskResult> {
        let Some(message) = text(params, "text") else {
            return Ok(TaskResult::failed("Missing 'text' parameter"));
        };

        let mut card = message_card();
        card.insert("text".into(), json!(message));

        let done = TaskResult::ok("Message sent successfully to Teams!", json!({"text": message}));
        self.send(credentials, card, "message", done).await
    }

    async fn send_card_message(&self, credentials: &Credentials, params: &TaskParams) -> Result<TaskResult> {
        let Some(message) = text(params, "text") else {
            return Ok(TaskResult::failed("Missing 'text' parameter"));
        };
        let title = text(params, "title");
        let color = text(params, "color").unwrap_or_else(|| TEAMS_BLUE.to_string());

        let mut card = message_card();
        card.insert("summary".into(), json!(title.as_deref().unwrap_or("Notification")));
        card.insert("themeColor".into(), json!(color));
        card.insert("title".into(), json!(title));
        card.insert("text".into(), json!(message));

        let done = TaskResult::ok("Card message sent successfully!", json!({"title": title, "text": message}));
        self.send(credentials, card, "card", done).await
    }

    async fn send_notification(&self, credentials: &Credentials, params: &TaskParams) -> Result<TaskResult> {
        let Some(message) = text(params, "message") else {
            return Ok(TaskResult::failed("Missing 'message' parameter"));
        };
        let title = text(params, "title").unwrap_or_else(|| "Notification".to_string());
        let status = lowercase_param(params, "status", "info");
        let style = notification_style(&status);

        let mut card = message_card();
        card.insert("summary".into(), json!(title));
        card.insert("themeColor".into(), json!(style.color));
        card.insert("title".into(), json!(format!("{} {}", style.emoji, title)));
        card.insert("text".into(), json!(message));
        if let Some(subtitle) = text(params, "subtitle") {
            card.insert("sections".into(), json!([{"text": subtitle}]));
        }

        let done = TaskResult::ok(
            format!("Notification sent successfully! (Status: {})", status),
            json!({"title": title, "status": status}),
        );
        self.send(credentials, card, "notification", done).await
    }

    async fn send_rich_card(&self, credentials: &Credentials, params: &TaskParams) -> Result<TaskResult> {
        let title = text(params, "title").unwrap_or_else(|| "Notification".to_string());
        let summary = text(params, "summary").unwrap_or_else(|| title.clone());
        let color = text(params, "color").unwrap_or_else(|| TEAMS_BLUE.to_string());
        let sections: Vec<Value> = params
            .get("sections")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut card = message_card();
        card.insert("summary".into(), json!(summary));
        card.insert("themeColor".into(), json!(color));
        card.insert("title".into(), json!(title));
        if !sections.is_empty() {
            let formatted: Vec<Value> = sections.iter().map(format_section).collect();
            card.insert("sections".into(), Value::Array(formatted));
        }

        let done = TaskResult::ok(
            "Rich card sent successfully!",
            json!({"title": title, "sections_count": sections.len()}),
        );
        self.send(credentials, card, "rich card", done).await
    }

    async fn send_workflow_status(&self, credentials: &Credentials, params: &TaskParams) -> Result<TaskResult> {
        let workflow_name = text(params, "workflow_name").unwrap_or_else(|| "Workflow".to_string());
        let status = lowercase_param(params, "status", "running");
        let style = workflow_status_style(&status);

        let mut facts = vec![
            json!({"name": "Workflow", "value": workflow_name}),
            json!({"name": "Status", "value": format!("{} {}", style.emoji, style.label)}),
        ];
        if let Some(execution_time) = text(params, "execution_time") {
            facts.push(json!({"name": "Execution Time", "value": execution_time}));
        }
        if let Some(extra) = params.get("facts").and_then(Value::as_array) {
            facts.extend(extra.iter().cloned());
        }
        facts.push(json!({"name": "Time", "value": local_time()}));

        let mut section = Map::new();
        section.insert("facts".into(), Value::Array(facts));
        if let Some(details) = text(params, "details") {
            section.insert("text".into(), json!(details));
        }

        let mut card = message_card();
        card.insert("summary".into(), json!(format!("Workflow: {}", workflow_name)));
        card.insert("themeColor".into(), json!(style.color));
        card.insert("title".into(), json!(format!("{} Workflow Notification", style.emoji)));
        card.insert("sections".into(), json!([section]));

        let done = TaskResult::ok(
            format!("Workflow status notification sent! (Status: {})", status),
            json!({"workflow": workflow_name, "status": status}),
        );
        self.send(credentials, card, "workflow status", done).await
    }

    async fn send_alert(&self, credentials: &Credentials, params: &TaskParams) -> Result<TaskResult> {
        let Some(message) = text(params, "message") else {
            return Ok(TaskResult::failed("Missing 'message' parameter"));
        };
        let title = text(params, "title").unwrap_or_else(|| "Alert".to_string());
        let severity = lowercase_param(params, "severity", "medium");
        let source = text(params, "source").unwrap_or_else(|| "Workflow Automation".to_string());
        let style = severity_style(&severity);

        let mut card = message_card();
        card.insert("summary".into(), json!(title));
        card.insert("themeColor".into(), json!(style.color));
        card.insert("title".into(), json!(format!("{} ALERT: {}", style.emoji, title)));
        card.insert("text".into(), json!(message));
        card.insert(
            "sections".into(),
            json!([{
                "facts": [
                    {"name": "Severity", "value": severity.to_uppercase()},
                    {"name": "Source", "value": source},
                    {"name": "Time", "value": local_time()}
                ]
            }]),
        );

        let done = TaskResult::ok(
            format!("Alert sent successfully! (Severity: {})", severity),
            json!({"title": title, "severity": severity}),
        );
        self.send(credentials, card, "alert", done).await
    }
}

/// Map a rich-card section onto MessageCard section fields
fn format_section(section: &Value) -> Value {
    let mut formatted = Map::new();
    if let Some(title) = section.get("title").filter(|value| is_present(value)) {
        formatted.insert("activityTitle".into(), title.clone());
    }
    if let Some(text) = section.get("text").filter(|value| is_present(value)) {
        formatted.insert("text".into(), text.clone());
    }
    if let Some(facts) = section.get("facts").filter(|value| is_present(value)) {
        formatted.insert("facts".into(), facts.clone());
    }
    Value::Object(formatted)
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

#[async_trait]
impl Connector for TeamsConnector {
    fn name(&self) -> &'static str {
        "teams"
    }

    fn tasks(&self) -> &'static [&'static str] {
        TASKS
    }

    async fn run(&self, task: &str, credentials: &Credentials, params: &TaskParams) -> Result<TaskResult> {
        match task {
            TEST_CONNECTION_TASK => self.test_connection(credentials).await,
            "send_simple_message" => self.send_simple_message(credentials, params).await,
            "send_card_message" => self.send_card_message(credentials, params).await,
            "send_notification" => self.send_notification(credentials, params).await,
            "send_rich_card" => self.send_rich_card(credentials, params).await,
            "send_workflow_status" => self.send_workflow_status(credentials, params).await,
            "send_alert" => self.send_alert(credentials, params).await,
            other => anyhow::bail!("Task '{}' not found in teams", other),
        }
    }
}
