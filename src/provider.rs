//! The Confluent Cloud provider: dispatch from host calls to reconcilers.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{watch, RwLock};
use tracing::{info, instrument, warn};

use crate::client::ClientFactory;
use crate::config::{ProviderConfig, ProviderOptions};
use crate::error::ProviderError;
use crate::plan;
use crate::resource::{DataSource, ReconcileContext, Resource, ResourceData};
use crate::resources::{all_data_sources, all_resources};
use crate::retry::CancelSignal;
use crate::schema::{Diagnostic, ProviderSchema};
use crate::service::ProviderService;
use crate::session::Session;
use crate::types::{ImportedResource, PlanResult};
use crate::validation;

/// Serves every `confluentcloud_*` resource and data source.
///
/// One session is established by `configure` and shared by all subsequent
/// calls, which may run concurrently.
pub struct CcloudProvider {
    factory: Box<dyn ClientFactory>,
    options: ProviderOptions,
    resources: BTreeMap<&'static str, Box<dyn Resource>>,
    data_sources: BTreeMap<&'static str, Box<dyn DataSource>>,
    session: RwLock<Option<Arc<Session>>>,
    stop: watch::Sender<bool>,
}

impl CcloudProvider {
    /// Create an unconfigured provider that builds its client with `factory`.
    pub fn new(factory: impl ClientFactory) -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            factory: Box::new(factory),
            options: ProviderOptions::default(),
            resources: all_resources()
                .into_iter()
                .map(|r| (r.type_name(), r))
                .collect(),
            data_sources: all_data_sources()
                .into_iter()
                .map(|d| (d.type_name(), d))
                .collect(),
            session: RwLock::new(None),
            stop,
        }
    }

    /// Override the retry windows.
    pub fn with_options(mut self, options: ProviderOptions) -> Self {
        self.options = options;
        self
    }

    fn resource(&self, resource_type: &str) -> Result<&dyn Resource, ProviderError> {
        self.resources
            .get(resource_type)
            .map(|r| r.as_ref())
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    fn data_source(&self, data_source_type: &str) -> Result<&dyn DataSource, ProviderError> {
        self.data_sources
            .get(data_source_type)
            .map(|d| d.as_ref())
            .ok_or_else(|| ProviderError::UnknownResource(data_source_type.to_string()))
    }

    fn cancel_signal(&self) -> CancelSignal {
        CancelSignal::new(self.stop.subscribe())
    }

    async fn context(&self) -> Result<ReconcileContext, ProviderError> {
        let session = self.session.read().await.clone().ok_or_else(|| {
            ProviderError::Configuration("provider has not been configured".to_string())
        })?;
        Ok(ReconcileContext::new(
            session,
            self.cancel_signal(),
            self.options.clone(),
        ))
    }
}

fn credential_diagnostics(config: &ProviderConfig) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    if !config.has_login() {
        diagnostics.push(
            Diagnostic::error("Missing login credentials").with_detail(
                "username and password must be set in the provider block or via \
                 CONFLUENT_CLOUD_USERNAME and CONFLUENT_CLOUD_PASSWORD",
            ),
        );
    }
    if !config.has_api_key() {
        diagnostics.push(
            Diagnostic::warning("Missing cloud API key").with_detail(
                "confluentcloud_api_key resources cannot be managed without \
                 cloud_api_key and cloud_api_secret",
            ),
        );
    }
    diagnostics
}

#[async_trait::async_trait]
impl ProviderService for CcloudProvider {
    fn schema(&self) -> ProviderSchema {
        let schema = ProviderSchema::new().with_provider_config(ProviderConfig::schema());
        let schema = self
            .resources
            .iter()
            .fold(schema, |s, (name, r)| s.with_resource(*name, r.schema()));
        self.data_sources
            .iter()
            .fold(schema, |s, (name, d)| s.with_data_source(*name, d.schema()))
    }

    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let config = ProviderConfig::from_value(config)?;
        Ok(credential_diagnostics(&config))
    }

    #[instrument(skip(self, config))]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let config = ProviderConfig::from_value(config)?;
        let mut diagnostics = credential_diagnostics(&config);
        if diagnostics.iter().any(Diagnostic::is_error) {
            return Ok(diagnostics);
        }

        let client = self.factory.build(&config);
        match Session::establish(client, &config, &self.options.login, self.cancel_signal()).await {
            Ok(session) => {
                *self.session.write().await = Some(Arc::new(session));
                info!("Provider configured");
            }
            Err(err) => {
                warn!(error = %err, "Failed to create session");
                diagnostics.push(
                    Diagnostic::error("Failed to create Confluent Cloud session")
                        .with_detail(err.to_string()),
                );
            }
        }
        Ok(diagnostics)
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        info!("Stopping provider");
        self.stop.send_replace(true);
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let resource = self.resource(resource_type)?;
        Ok(validation::validate(&resource.schema(), &config))
    }

    #[instrument(skip(self, prior_state, proposed_state, _config))]
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let resource = self.resource(resource_type)?;
        let suppress = |path: &str, old: &str, new: &str| resource.suppress_diff(path, old, new);
        Ok(plan::diff(
            &resource.schema(),
            prior_state.as_ref(),
            &proposed_state,
            &suppress,
        ))
    }

    #[instrument(skip(self, planned_state))]
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let ctx = self.context().await?;
        let mut data = ResourceData::from_state(planned_state)?;

        match resource.create(&ctx, &mut data).await {
            Ok(()) => Ok(data.into_state()),
            Err(err) if data.id().is_some() => {
                warn!(id = ?data.id(), error = %err, "Created, but could not complete");
                Err(ProviderError::PartialState {
                    state: Box::new(data.into_state()),
                    source: Box::new(err),
                })
            }
            Err(err) => Err(err),
        }
    }

    #[instrument(skip(self, current_state))]
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let ctx = self.context().await?;
        let mut data = ResourceData::from_state(current_state)?;

        resource.read(&ctx, &mut data).await?;
        Ok(data.into_state())
    }

    #[instrument(skip(self, prior_state, planned_state))]
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let ctx = self.context().await?;
        let prior = ResourceData::from_state(prior_state)?;
        let mut data = ResourceData::from_state(planned_state)?;
        if data.id().is_none() {
            data.set_id(prior.require_id()?);
        }

        resource.update(&ctx, &mut data).await?;
        Ok(data.into_state())
    }

    #[instrument(skip(self, current_state))]
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let resource = self.resource(resource_type)?;
        let ctx = self.context().await?;
        let data = ResourceData::from_state(current_state)?;

        resource.delete(&ctx, &data).await
    }

    #[instrument(skip(self))]
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let resource = self.resource(resource_type)?;
        if !resource.importable() {
            return Err(ProviderError::Validation(format!(
                "import is not supported for {}",
                resource_type
            )));
        }
        let mut data = ResourceData::with_id(id);
        resource.import(&mut data)?;

        let ctx = self.context().await?;
        resource.read(&ctx, &mut data).await?;
        Ok(vec![ImportedResource::new(resource_type, data.into_state())])
    }

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let data_source = self.data_source(data_source_type)?;
        Ok(validation::validate(&data_source.schema(), &config))
    }

    #[instrument(skip(self, config))]
    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let data_source = self.data_source(data_source_type)?;
        let ctx = self.context().await?;
        let mut data = ResourceData::from_state(config)?;

        data_source.read(&ctx, &mut data).await?;
        Ok(data.into_state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        assert_error_contains, assert_plan_creates, assert_plan_no_changes, assert_plan_replaces,
        factory, FakeCloud, ProviderTester, TestError,
    };
    use serde_json::json;
    use std::time::Duration;

    fn credentials() -> Value {
        json!({
            "username": "ops@example.com",
            "password": "pw",
            "cloud_api_key": "KEY",
            "cloud_api_secret": "SECRET"
        })
    }

    async fn configured(fake: &Arc<FakeCloud>) -> ProviderTester<CcloudProvider> {
        let tester = ProviderTester::new(CcloudProvider::new(factory(fake)));
        tester.configure(credentials()).await.unwrap();
        tester
    }

    fn connector_config() -> Value {
        json!({
            "name": "s3-sink",
            "environment_id": "env-1",
            "cluster_id": "lkc-1",
            "config": {"connector.class": "S3_SINK", "topics": "orders"}
        })
    }

    #[test]
    fn test_metadata_lists_every_kind() {
        let provider = CcloudProvider::new(factory(&Arc::new(FakeCloud::new())));
        let metadata = provider.metadata();
        assert_eq!(metadata.resources.len(), 6);
        assert!(metadata
            .data_sources
            .contains(&"confluentcloud_environment".to_string()));
        assert!(provider.schema().provider.attribute("cloud_api_secret").is_some());
    }

    #[test]
    fn test_credential_diagnostics() {
        let mut config = ProviderConfig {
            username: "ops@example.com".to_string(),
            ..Default::default()
        };
        let diagnostics = credential_diagnostics(&config);
        assert_error_contains(&diagnostics, "Missing login credentials");
        assert_eq!(diagnostics.len(), 2);

        config.password = "pw".to_string();
        let diagnostics = credential_diagnostics(&config);
        assert_eq!(diagnostics.len(), 1);
        assert!(!diagnostics[0].is_error());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_login_is_reported() {
        let fake = Arc::new(FakeCloud::new());
        fake.fail_logins_with("invalid username or password");
        let tester = ProviderTester::new(CcloudProvider::new(factory(&fake)));

        let err = tester.configure(credentials()).await.unwrap_err();
        assert!(matches!(err, TestError::Diagnostics(_)));

        let err = tester
            .create("confluentcloud_environment", json!({"name": "prod"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_unknown_type() {
        let fake = Arc::new(FakeCloud::new());
        let tester = configured(&fake).await;
        let err = tester.read("confluentcloud_topic", json!({"id": "x"})).await.unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_environment_crud_lifecycle() {
        let fake = Arc::new(FakeCloud::new());
        let tester = configured(&fake).await;

        let state = tester
            .lifecycle_crud(
                "confluentcloud_environment",
                json!({"name": "prod"}),
                json!({"name": "production"}),
            )
            .await
            .unwrap();
        assert_eq!(state["name"], "production");
        let id = state["id"].as_str().unwrap();
        assert!(fake.environment(id).is_none());
    }

    #[tokio::test]
    async fn test_read_after_create_has_no_changes() {
        let fake = Arc::new(FakeCloud::new());
        fake.generate_connector_keys(true);
        let tester = configured(&fake).await;

        let plan = tester
            .plan_create("confluentcloud_connector", connector_config())
            .await
            .unwrap();
        assert_plan_creates(&plan);

        let state = tester
            .lifecycle_create("confluentcloud_connector", connector_config())
            .await
            .unwrap();
        assert_eq!(state["id"], "s3-sink");

        let plan = tester
            .plan_update("confluentcloud_connector", state, connector_config())
            .await
            .unwrap();
        assert_plan_no_changes(&plan);
    }

    #[tokio::test]
    async fn test_unchanged_config_plans_nothing_for_every_kind() {
        let fake = Arc::new(FakeCloud::new());
        let tester = configured(&fake).await;
        let cases = [
            ("confluentcloud_environment", json!({"name": "prod"})),
            (
                "confluentcloud_kafka_cluster",
                json!({
                    "name": "orders",
                    "environment_id": "env-1",
                    "service_provider": "aws",
                    "region": "us-east-1"
                }),
            ),
            (
                "confluentcloud_api_key",
                json!({"cluster_id": "lkc-1", "environment_id": "env-1"}),
            ),
            (
                "confluentcloud_schema_registry",
                json!({"environment_id": "env-1", "service_provider": "aws", "region": "US"}),
            ),
            ("confluentcloud_service_account", json!({"name": "ci"})),
        ];

        for (kind, config) in cases {
            let state = tester.lifecycle_create(kind, config.clone()).await.unwrap();
            let plan = tester.plan_update(kind, state, config).await.unwrap();
            assert!(plan.changes.is_empty(), "{}: {:?}", kind, plan.changes);
            assert!(!plan.requires_replace, "{}", kind);
        }
    }

    #[tokio::test]
    async fn test_force_new_attribute_replaces() {
        let fake = Arc::new(FakeCloud::new());
        let tester = configured(&fake).await;
        let state = tester
            .lifecycle_create("confluentcloud_connector", connector_config())
            .await
            .unwrap();

        let mut moved = connector_config();
        moved["cluster_id"] = json!("lkc-2");
        let plan = tester
            .plan_update("confluentcloud_connector", state, moved)
            .await
            .unwrap();
        assert_plan_replaces(&plan);
    }

    #[tokio::test]
    async fn test_create_keeps_identifier_when_refresh_fails() {
        let fake = Arc::new(FakeCloud::new());
        fake.fail("get_environment", "internal server error");
        let tester = configured(&fake).await;

        let err = tester
            .create("confluentcloud_environment", json!({"name": "prod"}))
            .await
            .unwrap_err();
        let state = err.partial_state().expect("identifier must survive");
        assert!(state["id"].as_str().unwrap().starts_with("env-"));
        assert_eq!(err.message(), "environment env-1: internal server error");
    }

    #[tokio::test]
    async fn test_missing_resource_reads_as_not_found() {
        let fake = Arc::new(FakeCloud::new());
        let tester = configured(&fake).await;
        let err = tester
            .read("confluentcloud_environment", json!({"id": "env-404", "name": "gone"}))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_import_connector() {
        let fake = Arc::new(FakeCloud::new());
        let tester = configured(&fake).await;
        tester
            .lifecycle_create("confluentcloud_connector", connector_config())
            .await
            .unwrap();

        let imported = tester
            .import_resource("confluentcloud_connector", "env-1/lkc-1/s3-sink")
            .await
            .unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].state["id"], "s3-sink");
        assert_eq!(imported[0].state["cluster_id"], "lkc-1");
        assert_eq!(imported[0].state["config"]["topics"], "orders");

        let err = tester
            .import_resource("confluentcloud_connector", "s3-sink")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::ImportFormat(_)));

        let err = tester
            .import_resource("confluentcloud_api_key", "1")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
    }

    #[tokio::test]
    async fn test_data_source() {
        let fake = Arc::new(FakeCloud::new());
        let tester = configured(&fake).await;
        let created = tester
            .create("confluentcloud_environment", json!({"name": "prod"}))
            .await
            .unwrap();

        let found = tester
            .read_data_source("confluentcloud_environment", json!({"name": "prod"}))
            .await
            .unwrap();
        assert_eq!(found["id"], created["id"]);
    }

    #[tokio::test]
    async fn test_validate_resource_config() {
        let fake = Arc::new(FakeCloud::new());
        let tester = configured(&fake).await;
        assert!(tester
            .validate_resource_config("confluentcloud_connector", connector_config())
            .await
            .is_ok());
        let err = tester
            .validate_resource_config("confluentcloud_connector", json!({"name": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, TestError::Diagnostics(ref d) if d.len() == 3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_creates_share_one_session() {
        let fake = Arc::new(FakeCloud::new());
        fake.fail_times("create_connector", 2, "cluster is provisioning");
        let tester = configured(&fake).await;

        let mut other = connector_config();
        other["name"] = json!("gcs-sink");
        let (a, b, c) = tokio::join!(
            tester.create("confluentcloud_connector", connector_config()),
            tester.create("confluentcloud_connector", other),
            tester.create("confluentcloud_environment", json!({"name": "prod"})),
        );
        assert_eq!(a.unwrap()["id"], "s3-sink");
        assert_eq!(b.unwrap()["id"], "gcs-sink");
        assert!(c.is_ok());
        assert_eq!(fake.login_attempts().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_provisioning_wait() {
        let fake = Arc::new(FakeCloud::new());
        fake.fail_times("create_connector", u32::MAX, "cluster is provisioning");
        let provider = Arc::new(CcloudProvider::new(factory(&fake)));
        provider.configure(credentials()).await.unwrap();

        let task = {
            let provider = Arc::clone(&provider);
            tokio::spawn(async move {
                provider
                    .create("confluentcloud_connector", connector_config())
                    .await
            })
        };
        tokio::time::sleep(Duration::from_secs(5)).await;
        provider.stop().await.unwrap();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, ProviderError::Cancelled(_)));
        assert!(err.partial_state().is_none());
    }
}
