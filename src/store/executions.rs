/// SQLite storage for execution logs
///
/// A log is created in `running` state and completed exactly once. The
/// completion update only matches running rows, so a terminal log can never
/// be overwritten.

use crate::store::{format_timestamp, parse_timestamp};
use crate::workflow::types::{ExecutionData, ExecutionLog, ExecutionStatus};
use anyhow::{ensure, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

#[derive(Debug, Clone)]
pub struct ExecutionLogStore {
    pool: SqlitePool,
}

const SELECT_COLUMNS: &str =
    "SELECT id, workflow_id, status, started_at, completed_at, execution_data, error_message FROM execution_logs";

impl ExecutionLogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a new log in `running` state
    pub async fn create_running(&self, workflow_id: i64, started_at: DateTime<Utc>) -> Result<ExecutionLog> {
        let result = sqlx::query(
            r#"
            INSERT INTO execution_logs (workflow_id, status, started_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(workflow_id)
        .bind(ExecutionStatus::Running.as_str())
        .bind(format_timestamp(started_at))
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to open execution log for workflow {}", workflow_id))?;

        Ok(ExecutionLog {
            id: result.last_insert_rowid(),
            workflow_id,
            status: ExecutionStatus::Running,
            started_at,
            completed_at: None,
            execution_data: None,
            error_message: None,
        })
    }

    /// Move a running log to a terminal state
    ///
    /// Returns false if the log does not exist or is already terminal.
    pub async fn complete(
        &self,
        id: i64,
        status: ExecutionStatus,
        completed_at: DateTime<Utc>,
        execution_data: &ExecutionData,
        error_message: Option<&str>,
    ) -> Result<bool> {
        ensure!(status.is_terminal(), "Execution {} cannot complete as '{}'", id, status);

        let result = sqlx::query(
            r#"
            UPDATE execution_logs
            SET status = ?, completed_at = ?, execution_data = ?, error_message = ?
            WHERE id = ? AND status = 'running'
            "#,
        )
        .bind(status.as_str())
        .bind(format_timestamp(completed_at))
        .bind(serde_json::to_string(execution_data)?)
        .bind(error_message)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Last-resort completion that stores no payload
    pub async fn mark_failed(&self, id: i64, completed_at: DateTime<Utc>, error_message: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE execution_logs
            SET status = 'failed', completed_at = ?, error_message = ?
            WHERE id = ? AND status = 'running'
            "#,
        )
        .bind(format_timestamp(completed_at))
        .bind(error_message)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get(&self, id: i64) -> Result<Option<ExecutionLog>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| execution_from_row(&row)).transpose()
    }

    /// Most recent first; ties on `started_at` resolve by descending id
    pub async fn list(&self, workflow_id: Option<i64>) -> Result<Vec<ExecutionLog>> {
        let rows = match workflow_id {
            Some(workflow_id) => {
                sqlx::query(&format!(
                    "{} WHERE workflow_id = ? ORDER BY started_at DESC, id DESC",
                    SELECT_COLUMNS
                ))
                .bind(workflow_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!("{} ORDER BY started_at DESC, id DESC", SELECT_COLUMNS))
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.iter().map(execution_from_row).collect()
    }
}

fn execution_from_row(row: &SqliteRow) -> Result<ExecutionLog> {
    let id: i64 = row.try_get("id")?;
    let status: String = row.try_get("status")?;
    let started_at: String = row.try_get("started_at")?;
    let completed_at: Option<String> = row.try_get("completed_at")?;
    let execution_data: Option<String> = row.try_get("execution_data")?;

    Ok(ExecutionLog {
        id,
        workflow_id: row.try_get("workflow_id")?,
        status: ExecutionStatus::parse(&status)
            .with_context(|| format!("Execution {} has unknown status '{}'", id, status))?,
        started_at: parse_timestamp(&started_at)?,
        completed_at: completed_at.as_deref().map(parse_timestamp).transpose()?,
        execution_data: execution_data
            .as_deref()
            .map(serde_json::from_str::<ExecutionData>)
            .transpose()
            .with_context(|| format!("Execution {} has unreadable execution_data", id))?,
        error_message: row.try_get("error_message")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{now, Database, WorkflowStorage};
    use crate::workflow::types::{ExecutionMetadata, NewWorkflow};
    use chrono::Duration;
    use serde_json::json;

    async fn setup() -> (Database, i64) {
        let db = Database::in_memory().await.unwrap();
        let workflow = WorkflowStorage::new(db.pool().clone())
            .create_workflow(&NewWorkflow {
                name: "wf".into(),
                description: String::new(),
                workflow_data: json!({"nodes": [], "connections": []}),
            })
            .await
            .unwrap();
        (db, workflow.id)
    }

    fn payload() -> ExecutionData {
        ExecutionData::assemble(
            Vec::new(),
            ExecutionMetadata {
                trigger_source: "manual".into(),
                ..ExecutionMetadata::default()
            },
            0,
            Vec::new(),
            None,
        )
    }

    #[tokio::test]
    async fn terminal_logs_are_immutable() {
        let (db, workflow_id) = setup().await;
        let store = ExecutionLogStore::new(db.pool().clone());

        let log = store.create_running(workflow_id, now()).await.unwrap();
        assert_eq!(store.get(log.id).await.unwrap().unwrap(), log);

        assert!(store
            .complete(log.id, ExecutionStatus::Success, now(), &payload(), None)
            .await
            .unwrap());
        assert!(!store
            .complete(log.id, ExecutionStatus::Failed, now(), &payload(), Some("late"))
            .await
            .unwrap());
        assert!(!store.mark_failed(log.id, now(), "late").await.unwrap());

        let stored = store.get(log.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ExecutionStatus::Success);
        assert_eq!(stored.error_message, None);
        assert_eq!(stored.execution_data, Some(payload()));
        assert!(stored.completed_at.unwrap() >= stored.started_at);
    }

    #[tokio::test]
    async fn running_is_not_a_completion_status() {
        let (db, workflow_id) = setup().await;
        let store = ExecutionLogStore::new(db.pool().clone());
        let log = store.create_running(workflow_id, now()).await.unwrap();

        assert!(store
            .complete(log.id, ExecutionStatus::Running, now(), &payload(), None)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn listing_is_most_recent_first() {
        let (db, workflow_id) = setup().await;
        let store = ExecutionLogStore::new(db.pool().clone());
        let base = now();

        let older = store.create_running(workflow_id, base - Duration::seconds(5)).await.unwrap();
        let newer = store.create_running(workflow_id, base).await.unwrap();
        let tied = store.create_running(workflow_id, base).await.unwrap();

        let ids: Vec<i64> = store.list(Some(workflow_id)).await.unwrap().iter().map(|log| log.id).collect();
        assert_eq!(ids, vec![tied.id, newer.id, older.id]);
        assert!(store.list(Some(workflow_id + 1)).await.unwrap().is_empty());
        assert_eq!(store.list(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn deleting_workflow_cascades_to_logs() {
        let (db, workflow_id) = setup().await;
        let store = ExecutionLogStore::new(db.pool().clone());
        let log = store.create_running(workflow_id, now()).await.unwrap();

        WorkflowStorage::new(db.pool().clone())
            .delete_workflow(workflow_id)
            .await
            .unwrap();
        assert!(store.get(log.id).await.unwrap().is_none());
    }
}
