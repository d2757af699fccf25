/// SQLite storage for connector (integration) types
///
/// Parameter schemas and task catalogs are stored as JSON text. Deletion is
/// guarded: a type that integrations still reference is never removed.

use crate::integration::types::{ConnectorType, ConnectorTypeUpdate, NewConnectorType};
use crate::store::{format_timestamp, now, parse_timestamp};
use anyhow::Result;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

/// Outcome of a guarded delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDeletion {
    Deleted,
    NotFound,
    /// Rejected; nothing was changed
    InUse { name: String, integrations: i64 },
}

#[derive(Debug, Clone)]
pub struct ConnectorTypeStore {
    pool: SqlitePool,
}

const SELECT_COLUMNS: &str =
    "SELECT id, name, description, parameters, tasks, created_at, updated_at FROM integration_types";

impl ConnectorTypeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new type. Name uniqueness is enforced by the schema.
    pub async fn create(&self, new_type: &NewConnectorType) -> Result<ConnectorType> {
        let timestamp = format_timestamp(now());
        let tasks_json = if new_type.tasks.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&new_type.tasks)?)
        };

        let result = sqlx::query(
            r#"
            INSERT INTO integration_types (name, description, parameters, tasks, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new_type.name)
        .bind(&new_type.description)
        .bind(serde_json::to_string(&new_type.parameters)?)
        .bind(tasks_json)
        .bind(&timestamp)
        .bind(&timestamp)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Integration type {} vanished after insert", id))
    }

    pub async fn get(&self, id: i64) -> Result<Option<ConnectorType>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| connector_type_from_row(&row)).transpose()
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<ConnectorType>> {
        let row = sqlx::query(&format!("{} WHERE name = ?", SELECT_COLUMNS))
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| connector_type_from_row(&row)).transpose()
    }

    pub async fn list(&self) -> Result<Vec<ConnectorType>> {
        let rows = sqlx::query(&format!("{} ORDER BY id", SELECT_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(connector_type_from_row).collect()
    }

    /// Apply a partial update, returning the new state (None if absent)
    pub async fn update(&self, id: i64, update: &ConnectorTypeUpdate) -> Result<Option<ConnectorType>> {
        let Some(mut current) = self.get(id).await? else {
            return Ok(None);
        };

        if let Some(description) = &update.description {
            current.description = description.clone();
        }
        if let Some(parameters) = &update.parameters {
            current.parameters = parameters.clone();
        }
        if let Some(tasks) = &update.tasks {
            current.tasks = tasks.clone();
        }

        let tasks_json = if current.tasks.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&current.tasks)?)
        };

        sqlx::query(
            r#"
            UPDATE integration_types
            SET description = ?, parameters = ?, tasks = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&current.description)
        .bind(serde_json::to_string(&current.parameters)?)
        .bind(tasks_json)
        .bind(format_timestamp(now()))
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get(id).await
    }

    /// Delete a type unless integrations still reference it
    ///
    /// The reference check and the delete run in one transaction.
    pub async fn delete(&self, id: i64) -> Result<TypeDeletion> {
        let mut tx = self.pool.begin().await?;

        let name: Option<String> = sqlx::query_scalar("SELECT name FROM integration_types WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(name) = name else {
            tx.rollback().await?;
            return Ok(TypeDeletion::NotFound);
        };

        let integrations: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM integrations WHERE integration_type_id = ?")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if integrations > 0 {
            tx.rollback().await?;
            return Ok(TypeDeletion::InUse { name, integrations });
        }

        sqlx::query("DELETE FROM integration_types WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(TypeDeletion::Deleted)
    }
}

fn connector_type_from_row(row: &SqliteRow) -> Result<ConnectorType> {
    let parameters: String = row.try_get("parameters")?;
    let tasks: Option<String> = row.try_get("tasks")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(ConnectorType {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        parameters: serde_json::from_str(&parameters)?,
        tasks: match tasks.as_deref() {
            None | Some("") | Some("null") => Vec::new(),
            Some(raw) => serde_json::from_str(raw)?,
        },
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}
