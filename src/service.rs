//! The host-facing provider contract.
//!
//! The host drives the provider through [`ProviderService`]: it asks for the
//! schema, configures the provider once, then issues plan and CRUD calls,
//! possibly concurrently, until it calls `stop`.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::ProviderError;
use crate::schema::{Diagnostic, ProviderSchema};
use crate::types::{ImportedResource, PlanResult, ProviderMetadata};

/// Operations a provider exposes to the host.
///
/// # Example
///
/// ```ignore
/// use ccloud_provider::{CcloudProvider, ProviderService};
///
/// let provider = CcloudProvider::new(my_client_factory);
/// let diagnostics = provider.configure(json!({"username": "ops", "password": "..."})).await?;
/// let state = provider.create("confluentcloud_environment", json!({"name": "prod"})).await?;
/// ```
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    /// Schema of the provider block, every resource and every data source.
    fn schema(&self) -> ProviderSchema;

    /// Resource and data source type names, derived from the schema.
    fn metadata(&self) -> ProviderMetadata {
        let schema = self.schema();
        ProviderMetadata {
            resources: schema.resources.keys().cloned().collect(),
            data_sources: schema.data_sources.keys().cloned().collect(),
        }
    }

    /// Check the provider configuration without acting on it.
    async fn validate_provider_config(
        &self,
        config: serde_json::Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(vec![])
    }

    /// Accept credentials and establish the session.
    async fn configure(&self, config: serde_json::Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Stop the provider. In-flight retry waits end early.
    async fn stop(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Check a resource's declared configuration.
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: serde_json::Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (resource_type, config);
        Ok(vec![])
    }

    /// Compute the attribute-level changes between prior and proposed state.
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<serde_json::Value>,
        proposed_state: serde_json::Value,
        config: serde_json::Value,
    ) -> Result<PlanResult, ProviderError>;

    /// Create a resource.
    ///
    /// When the remote object was created but a later step failed, the error
    /// is [`ProviderError::PartialState`] and its state must be kept.
    async fn create(
        &self,
        resource_type: &str,
        planned_state: serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError>;

    /// Refresh a resource. [`ProviderError::NotFound`] means it is gone.
    async fn read(
        &self,
        resource_type: &str,
        current_state: serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError>;

    /// Update a resource in place.
    async fn update(
        &self,
        resource_type: &str,
        prior_state: serde_json::Value,
        planned_state: serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError>;

    /// Delete a resource.
    async fn delete(
        &self,
        resource_type: &str,
        current_state: serde_json::Value,
    ) -> Result<(), ProviderError>;

    /// Bring an existing remote object under management.
    async fn import_resource(
        &self,
        resource_type: &str,
        _id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        Err(ProviderError::Validation(format!(
            "import is not supported for {}",
            resource_type
        )))
    }

    /// Check a data source's arguments.
    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: serde_json::Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (data_source_type, config);
        Ok(vec![])
    }

    /// Resolve a data source.
    async fn read_data_source(
        &self,
        data_source_type: &str,
        _config: serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError> {
        Err(ProviderError::UnknownResource(format!(
            "Unknown data source type: {}",
            data_source_type
        )))
    }
}

/// Wait for SIGTERM or SIGINT, then stop `provider`.
///
/// Spawn this next to whatever transport serves the provider so that pending
/// retry loops end promptly on shutdown.
pub async fn stop_on_signal<P: ProviderService>(provider: Arc<P>) {
    wait_for_shutdown_signal().await;
    if let Err(err) = provider.stop().await {
        warn!(error = %err, "Provider stop failed");
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(err), _) | (_, Err(err)) => {
            warn!(error = %err, "Failed to install signal handlers; waiting for ctrl-c");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM, stopping provider"),
        _ = sigint.recv() => info!("Received SIGINT, stopping provider"),
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received CTRL+C, stopping provider");
    }
}
