/// SQLite storage for integrations
///
/// Credentials arrive here already encrypted; this layer never sees
/// plaintext secrets.

use crate::integration::types::Integration;
use crate::store::{format_timestamp, now, parse_timestamp};
use anyhow::Result;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

#[derive(Debug, Clone)]
pub struct IntegrationStore {
    pool: SqlitePool,
}

const SELECT_JOINED: &str = r#"
    SELECT i.id, i.name, i.integration_type_id, t.name AS integration_type_name,
           i.credentials, i.is_active, i.created_at, i.updated_at
    FROM integrations i
    JOIN integration_types t ON t.id = i.integration_type_id
"#;

impl IntegrationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert an integration with an already-encrypted credential blob
    pub async fn create(&self, name: &str, integration_type_id: i64, encrypted_credentials: &str) -> Result<Integration> {
        let timestamp = format_timestamp(now());

        let result = sqlx::query(
            r#"
            INSERT INTO integrations (name, integration_type_id, credentials, is_active, created_at, updated_at)
            VALUES (?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(name)
        .bind(integration_type_id)
        .bind(encrypted_credentials)
        .bind(&timestamp)
        .bind(&timestamp)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Integration {} vanished after insert", id))
    }

    pub async fn get(&self, id: i64) -> Result<Option<Integration>> {
        let row = sqlx::query(&format!("{} WHERE i.id = ?", SELECT_JOINED))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| integration_from_row(&row)).transpose()
    }

    pub async fn list(&self) -> Result<Vec<Integration>> {
        let rows = sqlx::query(&format!("{} ORDER BY i.id", SELECT_JOINED))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(integration_from_row).collect()
    }

    pub async fn set_active(&self, id: i64, is_active: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE integrations SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(is_active)
            .bind(format_timestamp(now()))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM integrations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn integration_from_row(row: &SqliteRow) -> Result<Integration> {
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Integration {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        integration_type_id: row.try_get("integration_type_id")?,
        integration_type_name: row.try_get("integration_type_name")?,
        is_active: row.try_get("is_active")?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
        encrypted_credentials: row.try_get("credentials")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::types::NewConnectorType;
    use crate::store::{ConnectorTypeStore, Database, TypeDeletion};

    async fn setup() -> (Database, i64) {
        let db = Database::in_memory().await.unwrap();
        let types = ConnectorTypeStore::new(db.pool().clone());
        let jira = types
            .create(&NewConnectorType {
                name: "jira".into(),
                description: String::new(),
                parameters: Vec::new(),
                tasks: Vec::new(),
            })
            .await
            .unwrap();
        (db, jira.id)
    }

    #[tokio::test]
    async fn create_joins_type_name() {
        let (db, type_id) = setup().await;
        let store = IntegrationStore::new(db.pool().clone());

        let integration = store.create("Team Jira", type_id, "sealed").await.unwrap();
        assert_eq!(integration.integration_type_name, "jira");
        assert_eq!(integration.encrypted_credentials, "sealed");
        assert!(integration.is_active);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_type_is_rejected_by_foreign_key() {
        let (db, _) = setup().await;
        let store = IntegrationStore::new(db.pool().clone());
        assert!(store.create("Orphan", 404, "sealed").await.is_err());
    }

    #[tokio::test]
    async fn type_with_integrations_cannot_be_deleted() {
        let (db, type_id) = setup().await;
        let store = IntegrationStore::new(db.pool().clone());
        let types = ConnectorTypeStore::new(db.pool().clone());
        let integration = store.create("Team Jira", type_id, "sealed").await.unwrap();

        assert_eq!(
            types.delete(type_id).await.unwrap(),
            TypeDeletion::InUse {
                name: "jira".into(),
                integrations: 1
            }
        );
        assert!(types.get(type_id).await.unwrap().is_some());
        assert_eq!(store.get(integration.id).await.unwrap().unwrap().name, "Team Jira");

        assert!(store.delete(integration.id).await.unwrap());
        assert_eq!(types.delete(type_id).await.unwrap(), TypeDeletion::Deleted);
    }

    #[tokio::test]
    async fn toggling_active_flag() {
        let (db, type_id) = setup().await;
        let store = IntegrationStore::new(db.pool().clone());
        let integration = store.create("Team Jira", type_id, "sealed").await.unwrap();

        assert!(store.set_active(integration.id, false).await.unwrap());
        assert!(!store.get(integration.id).await.unwrap().unwrap().is_active);
        assert!(!store.set_active(999, false).await.unwrap());
    }
}
