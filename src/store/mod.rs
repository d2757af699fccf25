/// Persistence layer
///
/// SQLite record stores for connector types, integrations, workflows and
/// execution logs. Each store owns a clone of the shared pool and exposes
/// narrow get/create/update/delete operations.

pub mod connector_types;
pub mod database;
pub mod executions;
pub mod integrations;
pub mod workflows;

pub use connector_types::{ConnectorTypeStore, TypeDeletion};
pub use database::Database;
pub use executions::ExecutionLogStore;
pub use integrations::IntegrationStore;
pub use workflows::WorkflowStorage;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

/// Current time at the precision the stores persist
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub(crate) fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Invalid stored timestamp '{}'", raw))?
        .with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_survive_storage_format() {
        let stamp = now();
        assert_eq!(parse_timestamp(&format_timestamp(stamp)).unwrap(), stamp);
    }

    #[test]
    fn stored_format_sorts_chronologically() {
        let earlier = parse_timestamp("2024-01-01T09:00:00.000001Z").unwrap();
        let later = parse_timestamp("2024-01-01T10:00:00Z").unwrap();
        assert!(format_timestamp(earlier) < format_timestamp(later));
    }
}
