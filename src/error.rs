/// Engine-level error taxonomy
///
/// Storage code works in `anyhow` like the rest of the infrastructure layer.
/// Anything that crosses the service boundary is folded into `EngineError`
/// so callers can tell a missing record apart from a real fault.

use crate::vault::VaultError;
use thiserror::Error;

/// Errors surfaced by the integration, workflow and execution services
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Workflow not found: {0}")]
    WorkflowNotFound(i64),

    #[error("Integration not found: {0}")]
    IntegrationNotFound(i64),

    #[error("Integration type not found: {0}")]
    ConnectorTypeNotFound(i64),

    #[error("Execution not found: {0}")]
    ExecutionNotFound(i64),

    /// Deleting a connector type that live integrations still reference
    #[error("Integration type '{name}' is still used by {integrations} integration(s)")]
    ConnectorTypeInUse { name: String, integrations: i64 },

    #[error("{0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Credential vault error: {0}")]
    Vault(#[from] VaultError),

    #[error("Storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl EngineError {
    /// True for every "record does not exist" variant
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EngineError::WorkflowNotFound(_)
                | EngineError::IntegrationNotFound(_)
                | EngineError::ConnectorTypeNotFound(_)
                | EngineError::ExecutionNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variants_are_classified() {
        assert!(EngineError::WorkflowNotFound(1).is_not_found());
        assert!(EngineError::ExecutionNotFound(9).is_not_found());
        assert!(!EngineError::Conflict("dup".into()).is_not_found());
        assert!(!EngineError::ConnectorTypeInUse {
            name: "jira".into(),
            integrations: 2
        }
        .is_not_found());
    }

    #[test]
    fn in_use_message_names_the_type() {
        let err = EngineError::ConnectorTypeInUse {
            name: "github".into(),
            integrations: 3,
        };
        assert_eq!(
            err.to_string(),
            "Integration type 'github' is still used by 3 integration(s)"
        );
    }
}
