/// Connector type and integration management
///
/// Owns the credential boundary: credentials are encrypted by the vault on
/// the way in and only decrypted for connection tests and node execution.

use crate::connectors::{catalog, run_isolated, ConnectorRegistry, Credentials, TaskResult, TEST_CONNECTION_TASK};
use crate::error::EngineError;
use crate::integration::types::{
    ConnectionTest, ConnectorType, ConnectorTypeUpdate, Integration, NewConnectorType, NewIntegration,
};
use crate::store::{ConnectorTypeStore, IntegrationStore, TypeDeletion};
use crate::vault::CredentialVault;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct IntegrationService {
    connector_types: ConnectorTypeStore,
    integrations: IntegrationStore,
    vault: Arc<CredentialVault>,
    registry: Arc<ConnectorRegistry>,
}

fn is_unique_violation(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

fn type_conflict(name: &str) -> EngineError {
    EngineError::Conflict(format!("Integration type '{}' already exists", name))
}

impl IntegrationService {
    pub fn new(
        connector_types: ConnectorTypeStore,
        integrations: IntegrationStore,
        vault: Arc<CredentialVault>,
        registry: Arc<ConnectorRegistry>,
    ) -> Self {
        Self {
            connector_types,
            integrations,
            vault,
            registry,
        }
    }

    pub async fn create_connector_type(&self, mut new_type: NewConnectorType) -> Result<ConnectorType, EngineError> {
        new_type.name = new_type.name.trim().to_string();
        if new_type.name.is_empty() {
            return Err(EngineError::Validation("Integration type name must not be empty".to_string()));
        }
        if self.connector_types.get_by_name(&new_type.name).await?.is_some() {
            return Err(type_conflict(&new_type.name));
        }

        match self.connector_types.create(&new_type).await {
            Ok(created) => {
                if !self.registry.has_connector(&created.name) {
                    tracing::warn!("⚠️ Integration type '{}' has no registered connector", created.name);
                }
                tracing::info!("💾 Created integration type {} '{}'", created.id, created.name);
                Ok(created)
            }
            Err(e) if is_unique_violation(&e) => Err(type_conflict(&new_type.name)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_connector_types(&self) -> Result<Vec<ConnectorType>, EngineError> {
        Ok(self.connector_types.list().await?)
    }

    pub async fn get_connector_type(&self, id: i64) -> Result<ConnectorType, EngineError> {
        self.connector_types
            .get(id)
            .await?
            .ok_or(EngineError::ConnectorTypeNotFound(id))
    }

    /// Revise description or schema; existing integrations are not migrated
    pub async fn update_connector_type(
        &self,
        id: i64,
        update: ConnectorTypeUpdate,
    ) -> Result<ConnectorType, EngineError> {
        let updated = self
            .connector_types
            .update(id, &update)
            .await?
            .ok_or(EngineError::ConnectorTypeNotFound(id))?;
        tracing::info!("🔄 Updated integration type {} '{}'", updated.id, updated.name);
        Ok(updated)
    }

    /// Delete a type that no integration references
    pub async fn delete_connector_type(&self, id: i64) -> Result<(), EngineError> {
        match self.connector_types.delete(id).await? {
            TypeDeletion::Deleted => {
                tracing::info!("🗑️ Deleted integration type {}", id);
                Ok(())
            }
            TypeDeletion::NotFound => Err(EngineError::ConnectorTypeNotFound(id)),
            TypeDeletion::InUse { name, integrations } => {
                tracing::warn!("🚫 Refusing to delete integration type '{}' ({} integrations)", name, integrations);
                Err(EngineError::ConnectorTypeInUse { name, integrations })
            }
        }
    }

    /// Insert the built-in connector types that do not exist yet
    ///
    /// Returns how many were inserted.
    pub async fn seed_builtin_connector_types(&self) -> Result<usize, EngineError> {
        let mut inserted = 0;
        for builtin in catalog::builtin_connector_types() {
            if self.connector_types.get_by_name(&builtin.name).await?.is_some() {
                tracing::debug!("⏭️ Integration type '{}' already present", builtin.name);
                continue;
            }
            self.connector_types.create(&builtin).await?;
            inserted += 1;
        }
        tracing::info!("🌱 Seeded {} built-in integration types", inserted);
        Ok(inserted)
    }

    /// Run the connector's `test_connection` task without storing anything
    pub async fn test_integration(&self, test: ConnectionTest) -> Result<TaskResult, EngineError> {
        let Some(connector_type) = self.connector_types.get(test.integration_type_id).await? else {
            return Ok(TaskResult::failed("Integration type not found"));
        };

        let Some(handler) = self.registry.resolve_task(&connector_type.name, TEST_CONNECTION_TASK) else {
            let message = if self.registry.has_connector(&connector_type.name) {
                format!("test_connection not implemented for {}", connector_type.name)
            } else {
                format!("Integration module not found for {}", connector_type.name)
            };
            return Ok(TaskResult::failed(message));
        };

        tracing::info!("🔌 Testing connection for integration type '{}'", connector_type.name);
        let result = match run_isolated(handler, test.credentials, Credentials::new()).await {
            Ok(result) => result,
            Err(e) => TaskResult::failed(format!("Error testing connection: {}", e)),
        };
        if !result.success {
            tracing::warn!("❌ Connection test for '{}' failed: {}", connector_type.name, result.message);
        }
        Ok(result)
    }

    /// Store a new integration with encrypted credentials
    pub async fn create_integration(&self, new_integration: NewIntegration) -> Result<Integration, EngineError> {
        if new_integration.name.trim().is_empty() {
            return Err(EngineError::Validation("Integration name must not be empty".to_string()));
        }
        let type_id = new_integration.integration_type_id;
        if self.connector_types.get(type_id).await?.is_none() {
            return Err(EngineError::ConnectorTypeNotFound(type_id));
        }

        let sealed = self.vault.encrypt_credentials(&new_integration.credentials)?;
        let created = self
            .integrations
            .create(new_integration.name.trim(), type_id, &sealed)
            .await?;
        tracing::info!(
            "💾 Created integration {} '{}' ({})",
            created.id,
            created.name,
            created.integration_type_name
        );
        Ok(created)
    }

    pub async fn list_integrations(&self) -> Result<Vec<Integration>, EngineError> {
        Ok(self.integrations.list().await?)
    }

    pub async fn get_integration(&self, id: i64) -> Result<Integration, EngineError> {
        self.integrations
            .get(id)
            .await?
            .ok_or(EngineError::IntegrationNotFound(id))
    }

    pub async fn delete_integration(&self, id: i64) -> Result<bool, EngineError> {
        let deleted = self.integrations.delete(id).await?;
        if deleted {
            tracing::info!("🗑️ Deleted integration {}", id);
        }
        Ok(deleted)
    }

    pub async fn set_integration_active(&self, id: i64, is_active: bool) -> Result<Integration, EngineError> {
        if !self.integrations.set_active(id, is_active).await? {
            return Err(EngineError::IntegrationNotFound(id));
        }
        self.get_integration(id).await
    }
}
