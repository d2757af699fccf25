/// Built-in connector type definitions
///
/// Parameter schemas and task catalogs for the connectors shipped with the
/// server. They are inserted at startup when no type of the same name exists.

use crate::integration::types::{NewConnectorType, ParameterSpec, TaskSpec};

fn param(name: &str, param_type: &str, required: bool, description: &str) -> ParameterSpec {
    ParameterSpec {
        name: name.to_string(),
        param_type: param_type.to_string(),
        required,
        description: description.to_string(),
    }
}

fn task(name: &str, display_name: &str, description: &str, parameters: Vec<ParameterSpec>) -> TaskSpec {
    TaskSpec {
        name: name.to_string(),
        display_name: display_name.to_string(),
        description: description.to_string(),
        parameters,
    }
}

fn test_connection() -> TaskSpec {
    task("test_connection", "Test Connection", "Verify the stored credentials", Vec::new())
}

/// Every built-in connector type, in registration order
pub fn builtin_connector_types() -> Vec<NewConnectorType> {
    vec![jira(), github(), aws(), azure(), teams()]
}

fn jira() -> NewConnectorType {
    NewConnectorType {
        name: "jira".into(),
        description: "Atlassian Jira project management integration".into(),
        parameters: vec![
            param("url", "string", true, "Jira instance URL (e.g., https://your-domain.atlassian.net)"),
            param("email", "string", true, "Your Jira email address"),
            param("api_token", "password", true, "Jira API token (generate from account settings)"),
        ],
        tasks: vec![
            test_connection(),
            task(
                "create_issue",
                "Create Issue",
                "Create an issue in a Jira project",
                vec![
                    param("project", "string", true, "Project key"),
                    param("summary", "string", true, "Issue summary"),
                    param("description", "text", false, "Issue description"),
                    param("issue_type", "string", false, "Issue type (defaults to Task)"),
                ],
            ),
        ],
    }
}

fn github() -> NewConnectorType {
    NewConnectorType {
        name: "github".into(),
        description: "GitHub code repository integration".into(),
        parameters: vec![
            param("token", "password", true, "GitHub Personal Access Token"),
            param("username", "string", false, "GitHub username (optional)"),
        ],
        tasks: vec![
            test_connection(),
            task(
                "create_repo",
                "Create Repository",
                "Create a repository for the authenticated user",
                vec![
                    param("repo_name", "string", true, "Repository name"),
                    param("description", "string", false, "Repository description"),
                    param("private", "boolean", false, "Create as private repository"),
                ],
            ),
            task(
                "create_issue",
                "Create Issue",
                "Open an issue in a repository",
                vec![
                    param("repo", "string", true, "Repository as owner/name"),
                    param("title", "string", true, "Issue title"),
                    param("body", "text", false, "Issue body"),
                ],
            ),
        ],
    }
}

fn aws() -> NewConnectorType {
    NewConnectorType {
        name: "aws".into(),
        description: "Amazon Web Services integration".into(),
        parameters: vec![
            param("access_key_id", "string", true, "AWS Access Key ID"),
            param("secret_access_key", "password", true, "AWS Secret Access Key"),
            param("region", "string", true, "AWS Region (e.g., us-east-1)"),
        ],
        tasks: vec![
            test_connection(),
            task("list_s3_buckets", "List S3 Buckets", "List the account's S3 buckets", Vec::new()),
        ],
    }
}

fn azure() -> NewConnectorType {
    NewConnectorType {
        name: "azure".into(),
        description: "Microsoft Azure cloud integration".into(),
        parameters: vec![
            param("tenant_id", "string", true, "Azure Tenant ID"),
            param("client_id", "string", true, "Azure Client ID"),
            param("client_secret", "password", true, "Azure Client Secret"),
        ],
        tasks: vec![
            test_connection(),
            task(
                "list_resource_groups",
                "List Resource Groups",
                "List the subscription's resource groups",
                Vec::new(),
            ),
        ],
    }
}

fn teams() -> NewConnectorType {
    NewConnectorType {
        name: "teams".into(),
        description: "Microsoft Teams channel notifications via incoming webhook".into(),
        parameters: vec![param(
            "webhook_url",
            "password",
            true,
            "Incoming webhook URL (https://outlook.office.com/webhook/...)",
        )],
        tasks: vec![
            test_connection(),
            task(
                "send_simple_message",
                "Send Simple Message",
                "Post a plain text message",
                vec![param("text", "text", true, "Message text")],
            ),
            task(
                "send_card_message",
                "Send Card Message",
                "Post a titled card",
                vec![
                    param("title", "string", false, "Card title"),
                    param("text", "text", true, "Card body"),
                    param("color", "string", false, "Hex theme color (default 0078D4)"),
                ],
            ),
            task(
                "send_notification",
                "Send Notification",
                "Post a notification with a status indicator",
                vec![
                    param("title", "string", false, "Notification title"),
                    param("message", "text", true, "Notification message"),
                    param("status", "string", false, "success, warning, error or info"),
                    param("subtitle", "string", false, "Optional subtitle"),
                ],
            ),
            task(
                "send_rich_card",
                "Send Rich Card",
                "Post a card with sections and facts",
                vec![
                    param("title", "string", false, "Card title"),
                    param("summary", "string", false, "Brief summary"),
                    param("sections", "json", false, "Sections with title, text and facts"),
                    param("color", "string", false, "Hex theme color"),
                ],
            ),
            task(
                "send_workflow_status",
                "Send Workflow Status",
                "Report a workflow run",
                vec![
                    param("workflow_name", "string", false, "Workflow name"),
                    param("status", "string", false, "success, failed, running or pending"),
                    param("execution_time", "string", false, "Execution time (e.g., 2.5s)"),
                    param("details", "text", false, "Additional details"),
                    param("facts", "json", false, "Extra name/value facts"),
                ],
            ),
            task(
                "send_alert",
                "Send Alert",
                "Post an urgent alert",
                vec![
                    param("title", "string", false, "Alert title"),
                    param("message", "text", true, "Alert message"),
                    param("severity", "string", false, "critical, high, medium or low"),
                    param("source", "string", false, "Alert source"),
                ],
            ),
        ],
    }
}
