/// Azure connector
///
/// Checks that a service principal is fully specified; no Azure API is
/// called. Credentials: `tenant_id`, `client_id`, `client_secret`.

use crate::connectors::{mask, text, Connector, Credentials, TaskParams, TaskResult, TEST_CONNECTION_TASK};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;

const TASKS: &[&str] = &[TEST_CONNECTION_TASK, "list_resource_groups"];

#[derive(Debug, Clone, Copy, Default)]
pub struct AzureConnector;

#[async_trait]
impl Connector for AzureConnector {
    fn name(&self) -> &'static str {
        "azure"
    }

    fn tasks(&self) -> &'static [&'static str] {
        TASKS
    }

    async fn run(&self, task: &str, credentials: &Credentials, _params: &TaskParams) -> Result<TaskResult> {
        match task {
            TEST_CONNECTION_TASK => {
                let (Some(tenant_id), Some(client_id), Some(_)) = (
                    text(credentials, "tenant_id"),
                    text(credentials, "client_id"),
                    text(credentials, "client_secret"),
                ) else {
                    return Ok(TaskResult::failed(
                        "Missing required credentials: tenant_id, client_id, or client_secret",
                    ));
                };
                Ok(TaskResult::ok(
                    "Azure credentials validated",
                    json!({
                        "tenant_id": mask(&tenant_id),
                        "client_id": mask(&client_id),
                    }),
                ))
            }
            "list_resource_groups" => Ok(TaskResult::ok(
                "Resource group listing is not implemented by this connector",
                json!({"note": "Resource group listing requires an Azure management client"}),
            )),
            other => anyhow::bail!("Task '{}' not found in azure", other),
        }
    }
}
