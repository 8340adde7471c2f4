//! The remote control-plane client the provider drives.
//!
//! The provider never talks HTTP itself. It calls a [`CloudClient`], built by
//! a [`ClientFactory`] from the provider configuration, and inspects the text
//! of any [`ApiError`] it gets back.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::classify::{classify, ErrorClass};
use crate::config::ProviderConfig;
use crate::session::ApiKeyAuth;

/// An error returned by the control-plane API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    message: String,
}

impl ApiError {
    /// Create an error from the API's message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The raw message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Classify this error by its message.
    pub fn class(&self) -> ErrorClass {
        classify(&self.message)
    }
}

/// Result alias for client calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// The logged-in user, as reported by `me`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Organization the user belongs to.
    pub organization_id: i64,
}

/// An environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    /// Environment id, e.g. `env-abc123`.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// A managed connector. Connectors are addressed by name within a cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connector {
    /// Connector name.
    pub name: String,
    /// Configuration as reported by the API. Sensitive values come back masked.
    pub config: BTreeMap<String, String>,
}

/// Parameters for creating a Kafka cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSpec {
    /// Display name.
    pub name: String,
    /// Owning environment.
    pub environment_id: String,
    /// Cloud service provider, e.g. `aws`.
    pub service_provider: String,
    /// Cloud region, e.g. `us-east-1`.
    pub region: String,
    /// `LOW` (single zone) or `HIGH` (multi zone).
    pub availability: String,
}

/// A Kafka cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KafkaCluster {
    /// Cluster id, e.g. `lkc-abc123`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Owning environment.
    pub environment_id: String,
    /// Cloud service provider.
    pub service_provider: String,
    /// Cloud region.
    pub region: String,
    /// Availability zone policy.
    pub availability: String,
    /// Bootstrap endpoint; empty until provisioned.
    pub bootstrap_servers: String,
}

/// Parameters for creating an API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeySpec {
    /// Cluster the key grants access to.
    pub cluster_id: String,
    /// Environment of that cluster.
    pub environment_id: String,
    /// Owning user or service account, if not the caller.
    pub user_id: Option<String>,
    /// Free-form description.
    pub description: String,
}

/// An API key. The secret is only returned by create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey {
    /// Internal id.
    pub id: String,
    /// The public key.
    pub key: String,
    /// The secret, present only in the create response.
    pub secret: Option<String>,
    /// Free-form description.
    pub description: String,
    /// Cluster the key grants access to.
    pub cluster_id: String,
    /// Owning user, if any.
    pub user_id: Option<String>,
}

/// A schema registry. Each environment has at most one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRegistry {
    /// Registry id, e.g. `lsrc-abc123`.
    pub id: String,
    /// Owning environment.
    pub environment_id: String,
    /// Cloud service provider.
    pub service_provider: String,
    /// Cloud region.
    pub region: String,
    /// HTTP endpoint.
    pub endpoint: String,
}

/// A service account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAccount {
    /// Numeric id, as a string.
    pub id: String,
    /// Unique name.
    pub name: String,
    /// Free-form description.
    pub description: String,
}

/// Operations of the control-plane API the provider depends on.
///
/// Implementations must be safe for concurrent use: one client is shared by
/// every reconciliation running against the same provider configuration.
#[async_trait::async_trait]
pub trait CloudClient: Send + Sync + 'static {
    /// Authenticate with the configured username and password.
    async fn login(&self) -> ApiResult<()>;

    /// Describe the logged-in user.
    async fn me(&self) -> ApiResult<Account>;

    // Environments

    /// List all environments visible to the user.
    async fn list_environments(&self) -> ApiResult<Vec<Environment>>;
    /// Fetch one environment.
    async fn get_environment(&self, id: &str) -> ApiResult<Environment>;
    /// Create an environment in an organization.
    async fn create_environment(&self, name: &str, organization_id: i64)
        -> ApiResult<Environment>;
    /// Rename an environment.
    async fn update_environment(
        &self,
        id: &str,
        name: &str,
        organization_id: i64,
    ) -> ApiResult<Environment>;
    /// Delete an environment.
    async fn delete_environment(&self, id: &str) -> ApiResult<()>;

    // Connectors

    /// Create a connector with the given flat configuration.
    async fn create_connector(
        &self,
        environment_id: &str,
        cluster_id: &str,
        name: &str,
        config: &BTreeMap<String, String>,
    ) -> ApiResult<Connector>;
    /// Fetch a connector's current configuration.
    async fn get_connector(
        &self,
        environment_id: &str,
        cluster_id: &str,
        name: &str,
    ) -> ApiResult<Connector>;
    /// Replace a connector's configuration.
    async fn update_connector_config(
        &self,
        environment_id: &str,
        cluster_id: &str,
        name: &str,
        config: &BTreeMap<String, String>,
    ) -> ApiResult<Connector>;
    /// Delete a connector.
    async fn delete_connector(
        &self,
        environment_id: &str,
        cluster_id: &str,
        name: &str,
    ) -> ApiResult<()>;

    // Kafka clusters

    /// Create a Kafka cluster.
    async fn create_kafka_cluster(&self, spec: &ClusterSpec) -> ApiResult<KafkaCluster>;
    /// Fetch a Kafka cluster.
    async fn get_kafka_cluster(&self, environment_id: &str, id: &str) -> ApiResult<KafkaCluster>;
    /// Rename a Kafka cluster.
    async fn update_kafka_cluster(
        &self,
        environment_id: &str,
        id: &str,
        name: &str,
    ) -> ApiResult<KafkaCluster>;
    /// Delete a Kafka cluster.
    async fn delete_kafka_cluster(&self, environment_id: &str, id: &str) -> ApiResult<()>;

    // API keys, served by the key/secret authenticated sub-API

    /// Create an API key.
    async fn create_api_key(&self, auth: &ApiKeyAuth, spec: &ApiKeySpec) -> ApiResult<ApiKey>;
    /// Fetch an API key. The secret is never returned.
    async fn get_api_key(&self, auth: &ApiKeyAuth, id: &str) -> ApiResult<ApiKey>;
    /// Change an API key's description.
    async fn update_api_key(
        &self,
        auth: &ApiKeyAuth,
        id: &str,
        description: &str,
    ) -> ApiResult<ApiKey>;
    /// Delete an API key.
    async fn delete_api_key(&self, auth: &ApiKeyAuth, id: &str) -> ApiResult<()>;

    // Schema registries

    /// Enable the schema registry of an environment.
    async fn create_schema_registry(
        &self,
        environment_id: &str,
        service_provider: &str,
        region: &str,
    ) -> ApiResult<SchemaRegistry>;
    /// Fetch an environment's schema registry.
    async fn get_schema_registry(&self, environment_id: &str, id: &str)
        -> ApiResult<SchemaRegistry>;
    /// Remove an environment's schema registry.
    async fn delete_schema_registry(&self, environment_id: &str, id: &str) -> ApiResult<()>;

    // Service accounts

    /// List all service accounts.
    async fn list_service_accounts(&self) -> ApiResult<Vec<ServiceAccount>>;
    /// Create a service account.
    async fn create_service_account(
        &self,
        name: &str,
        description: &str,
    ) -> ApiResult<ServiceAccount>;
    /// Change a service account's description.
    async fn update_service_account(
        &self,
        id: &str,
        description: &str,
    ) -> ApiResult<ServiceAccount>;
    /// Delete a service account.
    async fn delete_service_account(&self, id: &str) -> ApiResult<()>;
}

/// Builds a fresh client for a provider configuration.
pub trait ClientFactory: Send + Sync + 'static {
    /// Construct an unauthenticated client from the configured credentials.
    fn build(&self, config: &ProviderConfig) -> Arc<dyn CloudClient>;
}

impl<F> ClientFactory for F
where
    F: Fn(&ProviderConfig) -> Arc<dyn CloudClient> + Send + Sync + 'static,
{
    fn build(&self, config: &ProviderConfig) -> Arc<dyn CloudClient> {
        self(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_classification() {
        let err = ApiError::new("Exceeded rate limit");
        assert_eq!(err.class(), ErrorClass::RateLimited);
        assert_eq!(err.to_string(), "Exceeded rate limit");

        let err = ApiError::new("connector not found");
        assert_eq!(err.class(), ErrorClass::NotFound);
        assert_eq!(err.message(), "connector not found");
    }
}
