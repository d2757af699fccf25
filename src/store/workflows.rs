/// SQLite persistence layer for workflow storage
///
/// Handles workflow CRUD operations. The graph payload is stored as JSON
/// text and handed back untouched.

use crate::store::{format_timestamp, now, parse_timestamp};
use crate::workflow::types::{NewWorkflow, Workflow, WorkflowUpdate};
use anyhow::{Context, Result};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

/// SQLite-based workflow storage manager
#[derive(Debug, Clone)]
pub struct WorkflowStorage {
    /// SQLite connection pool for workflow database
    pool: SqlitePool,
}

const SELECT_COLUMNS: &str =
    "SELECT id, name, description, workflow_data, is_active, created_at, updated_at FROM workflows";

impl WorkflowStorage {
    /// Create new storage instance with database connection
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a new workflow
    pub async fn create_workflow(&self, workflow: &NewWorkflow) -> Result<Workflow> {
        let timestamp = format_timestamp(now());

        let result = sqlx::query(
            r#"
            INSERT INTO workflows (name, description, workflow_data, is_active, created_at, updated_at)
            VALUES (?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&workflow.name)
        .bind(&workflow.description)
        .bind(serde_json::to_string(&workflow.workflow_data)?)
        .bind(&timestamp)
        .bind(&timestamp)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_workflow(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Workflow {} vanished after insert", id))
    }

    /// Retrieve a workflow by ID
    pub async fn get_workflow(&self, id: i64) -> Result<Option<Workflow>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| workflow_from_row(&row)).transpose()
    }

    /// List all workflows in creation order
    pub async fn list_workflows(&self) -> Result<Vec<Workflow>> {
        let rows = sqlx::query(&format!("{} ORDER BY id", SELECT_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(workflow_from_row).collect()
    }

    /// Apply a partial update, returning the new state (None if absent)
    pub async fn update_workflow(&self, id: i64, update: &WorkflowUpdate) -> Result<Option<Workflow>> {
        let Some(mut current) = self.get_workflow(id).await? else {
            return Ok(None);
        };

        if let Some(name) = &update.name {
            current.name = name.clone();
        }
        if let Some(description) = &update.description {
            current.description = description.clone();
        }
        if let Some(workflow_data) = &update.workflow_data {
            current.workflow_data = workflow_data.clone();
        }

        sqlx::query(
            r#"
            UPDATE workflows
            SET name = ?, description = ?, workflow_data = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&current.name)
        .bind(&current.description)
        .bind(serde_json::to_string(&current.workflow_data)?)
        .bind(format_timestamp(now()))
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get_workflow(id).await
    }

    /// Delete a workflow by ID (its execution logs cascade)
    pub async fn delete_workflow(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM workflows WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn workflow_from_row(row: &SqliteRow) -> Result<Workflow> {
    let id: i64 = row.try_get("id")?;
    let workflow_data: String = row.try_get("workflow_data")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Workflow {
        id,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        workflow_data: serde_json::from_str(&workflow_data)
            .with_context(|| format!("Workflow {} has unreadable workflow_data", id))?,
        is_active: row.try_get("is_active")?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}
