/// Connector registry using ArcSwap
///
/// Maps `(connector type name, task name)` to a callable task. Lookups are
/// lock-free reads of the current table; registrations swap in a new table
/// so executions that already resolved a task are unaffected.

use crate::connectors::{
    aws::AwsConnector, azure::AzureConnector, github::GithubConnector, jira::JiraConnector, teams::TeamsConnector,
    Connector, Credentials, TaskHandler, TaskParams, TaskResult,
};
use anyhow::Result;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};

/// Task every connector exposes for credential checks
pub const TEST_CONNECTION_TASK: &str = "test_connection";

type TaskTable = HashMap<String, HashMap<String, Arc<dyn TaskHandler>>>;

/// Lock-free table of connector tasks
pub struct ConnectorRegistry {
    /// Key: lowercase connector type name, then task name
    tasks: ArcSwap<TaskTable>,
}

impl std::fmt::Debug for ConnectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.tasks.load();
        let mut connectors: Vec<_> = table
            .iter()
            .map(|(name, tasks)| {
                let mut task_names: Vec<_> = tasks.keys().cloned().collect();
                task_names.sort();
                (name.clone(), task_names)
            })
            .collect();
        connectors.sort();
        f.debug_struct("ConnectorRegistry").field("connectors", &connectors).finish()
    }
}

impl Default for ConnectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Adapts one task of a [`Connector`] to the [`TaskHandler`] contract
struct ConnectorTask {
    connector: Arc<dyn Connector>,
    task: &'static str,
}

#[async_trait]
impl TaskHandler for ConnectorTask {
    async fn call(&self, credentials: Credentials, params: TaskParams) -> Result<TaskResult> {
        self.connector.run(self.task, &credentials, &params).await
    }
}

impl ConnectorRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            tasks: ArcSwap::new(Arc::new(HashMap::new())),
        }
    }

    /// Registry populated with every built-in connector
    pub fn with_builtin_connectors(client: reqwest::Client) -> Self {
        let registry = Self::new();
        registry.register_connector(Arc::new(JiraConnector::new(client.clone())));
        registry.register_connector(Arc::new(GithubConnector::new(client.clone())));
        registry.register_connector(Arc::new(AwsConnector));
        registry.register_connector(Arc::new(AzureConnector));
        registry.register_connector(Arc::new(TeamsConnector::new(client)));
        registry
    }

    /// Register (or replace) a single task
    pub fn register_task(&self, connector: &str, task: &str, handler: Arc<dyn TaskHandler>) {
        let connector = connector.to_lowercase();
        self.tasks.rcu(|current| {
            let mut next = (**current).clone();
            next.entry(connector.clone())
                .or_default()
                .insert(task.to_string(), handler.clone());
            next
        });
        tracing::debug!("🔌 Registered task {}::{}", connector, task);
    }

    /// Register every task of a connector implementation
    pub fn register_connector(&self, connector: Arc<dyn Connector>) {
        for &task in connector.tasks() {
            self.register_task(
                connector.name(),
                task,
                Arc::new(ConnectorTask {
                    connector: connector.clone(),
                    task,
                }),
            );
        }
        tracing::info!("🔌 Registered connector '{}' ({} tasks)", connector.name(), connector.tasks().len());
    }

    /// Resolve a task; a miss is `None`, not an error
    pub fn resolve_task(&self, connector: &str, task: &str) -> Option<Arc<dyn TaskHandler>> {
        self.tasks
            .load()
            .get(&connector.to_lowercase())
            .and_then(|tasks| tasks.get(task))
            .cloned()
    }

    pub fn has_connector(&self, connector: &str) -> bool {
        self.tasks.load().contains_key(&connector.to_lowercase())
    }

    /// Registered connector names, sorted
    pub fn connector_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tasks.load().keys().cloned().collect();
        names.sort();
        names
    }

    /// Registered task names of one connector, sorted
    pub fn task_names(&self, connector: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .tasks
            .load()
            .get(&connector.to_lowercase())
            .map(|tasks| tasks.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo(label: &'static str) -> Arc<dyn TaskHandler> {
        Arc::new(move |_: Credentials, _: TaskParams| async move {
            Ok::<_, anyhow::Error>(TaskResult::ok(label, json!({})))
        })
    }

    #[tokio::test]
    async fn lookups_ignore_connector_name_case() {
        let registry = ConnectorRegistry::new();
        registry.register_task("Jira", "create_issue", echo("created"));

        let handler = registry.resolve_task("JIRA", "create_issue").unwrap();
        let result = handler.call(Credentials::new(), TaskParams::new()).await.unwrap();
        assert_eq!(result.message, "created");
        assert!(registry.has_connector("jira"));
    }

    #[test]
    fn misses_are_none() {
        let registry = ConnectorRegistry::new();
        registry.register_task("jira", "create_issue", echo("created"));

        assert!(registry.resolve_task("jira", "delete_everything").is_none());
        assert!(registry.resolve_task("gitlab", "create_issue").is_none());
        assert!(registry.task_names("gitlab").is_empty());
    }

    #[tokio::test]
    async fn re_registering_replaces_the_task() {
        let registry = ConnectorRegistry::new();
        registry.register_task("teams", "send_alert", echo("old"));
        let old = registry.resolve_task("teams", "send_alert").unwrap();
        registry.register_task("teams", "send_alert", echo("new"));

        let current = registry.resolve_task("teams", "send_alert").unwrap();
        assert_eq!(current.call(Credentials::new(), TaskParams::new()).await.unwrap().message, "new");
        assert_eq!(old.call(Credentials::new(), TaskParams::new()).await.unwrap().message, "old");
    }

    #[test]
    fn builtin_connectors_are_registered() {
        let registry = ConnectorRegistry::with_builtin_connectors(reqwest::Client::new());
        assert_eq!(registry.connector_names(), vec!["aws", "azure", "github", "jira", "teams"]);
        for connector in registry.connector_names() {
            assert!(registry.resolve_task(&connector, TEST_CONNECTION_TASK).is_some(), "{}", connector);
        }
        assert_eq!(
            registry.task_names("github"),
            vec!["create_issue", "create_repo", "test_connection"]
        );
        assert_eq!(registry.task_names("teams").len(), 7);
    }
}
