/// Integration Management Layer
///
/// Connector types (what kind of external system, which credentials and
/// tasks it has) and integrations (one credentialed instance of a type).

// Connector type and integration definitions
pub mod types;

// CRUD, seeding and connection tests
pub mod service;

pub use service::IntegrationService;
pub use types::{ConnectionTest, ConnectorType, ConnectorTypeUpdate, Integration, NewConnectorType, NewIntegration};
