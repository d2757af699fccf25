/// Workflow management service
///
/// Validates workflow definitions at the API boundary and maps storage
/// results onto [`EngineError`]. The graph payload itself is only checked
/// for being a JSON object here; node-level problems surface when the
/// workflow is executed.

use crate::error::EngineError;
use crate::store::WorkflowStorage;
use crate::workflow::types::{NewWorkflow, Workflow, WorkflowUpdate};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct WorkflowService {
    storage: WorkflowStorage,
}

fn validate_name(name: &str) -> Result<(), EngineError> {
    if name.trim().is_empty() {
        return Err(EngineError::Validation("Workflow name must not be empty".to_string()));
    }
    Ok(())
}

fn validate_workflow_data(workflow_data: &Value) -> Result<(), EngineError> {
    if !workflow_data.is_object() {
        return Err(EngineError::Validation("workflow_data must be a JSON object".to_string()));
    }
    Ok(())
}

impl WorkflowService {
    pub fn new(storage: WorkflowStorage) -> Self {
        Self { storage }
    }

    pub async fn create_workflow(&self, workflow: NewWorkflow) -> Result<Workflow, EngineError> {
        validate_name(&workflow.name)?;
        validate_workflow_data(&workflow.workflow_data)?;

        let created = self.storage.create_workflow(&workflow).await?;
        tracing::info!("💾 Created workflow {} '{}'", created.id, created.name);
        Ok(created)
    }

    pub async fn list_workflows(&self) -> Result<Vec<Workflow>, EngineError> {
        Ok(self.storage.list_workflows().await?)
    }

    pub async fn get_workflow(&self, id: i64) -> Result<Workflow, EngineError> {
        self.storage
            .get_workflow(id)
            .await?
            .ok_or(EngineError::WorkflowNotFound(id))
    }

    pub async fn update_workflow(&self, id: i64, update: WorkflowUpdate) -> Result<Workflow, EngineError> {
        if let Some(name) = &update.name {
            validate_name(name)?;
        }
        if let Some(workflow_data) = &update.workflow_data {
            validate_workflow_data(workflow_data)?;
        }

        let updated = self
            .storage
            .update_workflow(id, &update)
            .await?
            .ok_or(EngineError::WorkflowNotFound(id))?;
        tracing::info!("🔄 Updated workflow {} '{}'", updated.id, updated.name);
        Ok(updated)
    }

    /// Delete a workflow and its execution history
    pub async fn delete_workflow(&self, id: i64) -> Result<bool, EngineError> {
        let deleted = self.storage.delete_workflow(id).await?;
        if deleted {
            tracing::info!("🗑️ Deleted workflow {}", id);
        }
        Ok(deleted)
    }
}
