//! Test harness for the provider.
//!
//! [`ProviderTester`] drives a [`ProviderService`] the way the host would,
//! and [`FakeCloud`] is an in-memory [`CloudClient`] with scriptable
//! failures, so reconcilers can be exercised without a network.
//!
//! # Example
//!
//! ```ignore
//! use ccloud_provider::testing::{factory, FakeCloud, ProviderTester};
//! use ccloud_provider::CcloudProvider;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::test]
//! async fn test_create_environment() {
//!     let fake = Arc::new(FakeCloud::new());
//!     let tester = ProviderTester::new(CcloudProvider::new(factory(&fake)));
//!     tester.configure(json!({"username": "ops", "password": "pw"})).await.unwrap();
//!
//!     let state = tester
//!         .create("confluentcloud_environment", json!({"name": "prod"}))
//!         .await
//!         .unwrap();
//!     assert_eq!(state["name"], "prod");
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use thiserror::Error;
use tokio::time::Instant;

use crate::client::{
    Account, ApiError, ApiKey, ApiKeySpec, ApiResult, ClientFactory, CloudClient, ClusterSpec,
    Connector, Environment, KafkaCluster, SchemaRegistry, ServiceAccount,
};
use crate::config::{ProviderConfig, ProviderOptions};
use crate::error::ProviderError;
use crate::resource::ReconcileContext;
use crate::retry::CancelSignal;
use crate::schema::{Diagnostic, ProviderSchema};
use crate::service::ProviderService;
use crate::session::{ApiKeyAuth, Session};
use crate::types::{ImportedResource, PlanResult};

/// Drives a [`ProviderService`] with host-shaped calls.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Wrap a provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The provider's schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Resource type names.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    /// Configure the provider; error diagnostics become [`TestError::Diagnostics`].
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Stop the provider.
    pub async fn stop(&self) -> Result<(), ProviderError> {
        self.provider.stop().await
    }

    /// Validate a resource's declared configuration.
    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_resource_config(resource_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Plan a create.
    pub async fn plan_create(
        &self,
        resource_type: &str,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, None, proposed_state.clone(), proposed_state)
            .await
    }

    /// Plan an update of `prior_state` towards `proposed_state`.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(
                resource_type,
                Some(prior_state),
                proposed_state.clone(),
                proposed_state,
            )
            .await
    }

    /// Create a resource.
    pub async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, planned_state).await
    }

    /// Refresh a resource.
    pub async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        self.provider.read(resource_type, current_state).await
    }

    /// Update a resource.
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .update(resource_type, prior_state, planned_state)
            .await
    }

    /// Delete a resource.
    pub async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, current_state).await
    }

    /// Import a resource by id.
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    /// Resolve a data source.
    pub async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.read_data_source(data_source_type, config).await
    }

    /// Plan, create, then read back. Returns the read state.
    pub async fn lifecycle_create(&self, resource_type: &str, config: Value) -> Result<Value, ProviderError> {
        let plan = self.plan_create(resource_type, config).await?;
        let created = self.create(resource_type, plan.planned_state).await?;
        self.read(resource_type, created).await
    }

    /// Plan, update, then read back. Returns the read state.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<Value, ProviderError> {
        let plan = self
            .plan_update(resource_type, prior_state.clone(), proposed_state)
            .await?;
        let updated = self
            .update(resource_type, prior_state, plan.planned_state)
            .await?;
        self.read(resource_type, updated).await
    }

    /// Create, update, then delete. Returns the state after the update.
    pub async fn lifecycle_crud(
        &self,
        resource_type: &str,
        initial_config: Value,
        updated_config: Value,
    ) -> Result<Value, ProviderError> {
        let created = self.lifecycle_create(resource_type, initial_config).await?;
        let updated = self
            .lifecycle_update(resource_type, created, updated_config)
            .await?;
        self.delete(resource_type, updated.clone()).await?;
        Ok(updated)
    }
}

/// Failure of a [`ProviderTester`] call that reports diagnostics.
#[derive(Debug, Error)]
pub enum TestError {
    /// The call returned error diagnostics.
    #[error("{}", render(.0))]
    Diagnostics(Vec<Diagnostic>),
    /// The call itself failed.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

fn render(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| match &d.detail {
            Some(detail) => format!("[{:?}] {}: {}", d.severity, d.summary, detail),
            None => format!("[{:?}] {}", d.severity, d.summary),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics.into_iter().filter(Diagnostic::is_error).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

/// Assert that a create plan lists at least one attribute.
pub fn assert_plan_creates(plan: &PlanResult) {
    assert!(plan.has_changes(), "expected a create plan, got no changes");
    assert!(!plan.requires_replace, "expected a create plan, got a replace");
}

/// Assert that a plan has nothing to do.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        !plan.has_changes(),
        "expected no changes, got {:?}",
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that a plan forces replacement.
pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(plan.requires_replace, "expected the plan to require replacement");
}

/// Assert that a plan changes the attribute at `path`.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    assert!(
        plan.changes.iter().any(|c| c.path == path),
        "expected a change at '{}', changed: {:?}",
        path,
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that some error diagnostic's summary contains `substring`.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    assert!(
        diagnostics
            .iter()
            .any(|d| d.is_error() && d.summary.contains(substring)),
        "expected an error containing '{}', got {:?}",
        substring,
        diagnostics.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// Organization reported by [`FakeCloud`]'s `me`.
pub const FAKE_ORGANIZATION_ID: i64 = 4242;

const RATE_LIMIT_MESSAGE: &str = "Exceeded rate limit";
const MASK: &str = "****";

struct Failure {
    remaining: u32,
    message: String,
}

#[derive(Default)]
struct State {
    next_id: u64,
    calls: HashMap<String, u32>,
    failures: HashMap<String, Failure>,
    login_attempts: Vec<Instant>,
    rate_limited_logins: u32,
    login_error: Option<String>,
    generate_connector_keys: bool,
    environments: BTreeMap<String, Environment>,
    connectors: BTreeMap<(String, String, String), Connector>,
    clusters: BTreeMap<String, KafkaCluster>,
    api_keys: BTreeMap<String, ApiKey>,
    registries: BTreeMap<String, SchemaRegistry>,
    service_accounts: BTreeMap<String, ServiceAccount>,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

fn not_found(kind: &str, id: &str) -> ApiError {
    ApiError::new(format!("{} {} not found", kind, id))
}

/// In-memory control plane.
///
/// Every call is counted under its method name, and any method can be told to
/// fail with a given message for a number of calls.
#[derive(Default)]
pub struct FakeCloud {
    state: Mutex<State>,
}

impl FakeCloud {
    /// An empty control plane that accepts every login.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // Count the call and apply any scripted failure.
    fn enter(&self, op: &str) -> ApiResult<MutexGuard<'_, State>> {
        let mut state = self.lock();
        *state.calls.entry(op.to_string()).or_default() += 1;
        if let Some(failure) = state.failures.get_mut(op) {
            if failure.remaining > 0 {
                if failure.remaining != u32::MAX {
                    failure.remaining -= 1;
                }
                return Err(ApiError::new(failure.message.clone()));
            }
        }
        Ok(state)
    }

    /// Fail the next `times` calls to `op` with `message`; `u32::MAX` means forever.
    pub fn fail_times(&self, op: &str, times: u32, message: &str) {
        self.lock().failures.insert(
            op.to_string(),
            Failure {
                remaining: times,
                message: message.to_string(),
            },
        );
    }

    /// Fail every call to `op` with `message`.
    pub fn fail(&self, op: &str, message: &str) {
        self.fail_times(op, u32::MAX, message);
    }

    /// Answer the next `times` logins with the rate-limit error.
    pub fn rate_limit_logins(&self, times: u32) {
        self.lock().rate_limited_logins = times;
    }

    /// Reject logins (after any rate limiting) with `message`.
    pub fn fail_logins_with(&self, message: &str) {
        self.lock().login_error = Some(message.to_string());
    }

    /// Decorate connector reads with keys the real API derives itself.
    pub fn generate_connector_keys(&self, enabled: bool) {
        self.lock().generate_connector_keys = enabled;
    }

    /// When each login attempt happened.
    pub fn login_attempts(&self) -> Vec<Instant> {
        self.lock().login_attempts.clone()
    }

    /// How many times `op` was called.
    pub fn calls(&self, op: &str) -> u32 {
        self.lock().calls.get(op).copied().unwrap_or(0)
    }

    /// A stored environment.
    pub fn environment(&self, id: &str) -> Option<Environment> {
        self.lock().environments.get(id).cloned()
    }

    /// A stored connector, with its configuration exactly as it was sent.
    pub fn connector(&self, environment_id: &str, cluster_id: &str, name: &str) -> Option<Connector> {
        let key = (
            environment_id.to_string(),
            cluster_id.to_string(),
            name.to_string(),
        );
        self.lock().connectors.get(&key).cloned()
    }
}

fn connector_key(environment_id: &str, cluster_id: &str, name: &str) -> (String, String, String) {
    (
        environment_id.to_string(),
        cluster_id.to_string(),
        name.to_string(),
    )
}

// What the API returns for a connector: secrets masked, derived keys added.
fn reported(connector: &Connector, generate_keys: bool) -> Connector {
    let mut config: BTreeMap<String, String> = connector
        .config
        .iter()
        .map(|(key, value)| {
            let sensitive = key.contains("secret") || key.contains("password");
            let value = if sensitive { MASK.to_string() } else { value.clone() };
            (key.clone(), value)
        })
        .collect();
    if generate_keys {
        config.insert("kafka.endpoint".to_string(), "SASL_SSL://pkc-fake:9092".to_string());
        config.insert("cloud.provider".to_string(), "aws".to_string());
        config.insert("internal.cluster.id".to_string(), "lkc-internal".to_string());
    }
    Connector {
        name: connector.name.clone(),
        config,
    }
}

fn require_auth(auth: &ApiKeyAuth) -> ApiResult<()> {
    if auth.is_configured() {
        Ok(())
    } else {
        Err(ApiError::new("401 Unauthorized: missing API key"))
    }
}

#[async_trait::async_trait]
impl CloudClient for FakeCloud {
    async fn login(&self) -> ApiResult<()> {
        let mut state = self.lock();
        *state.calls.entry("login".to_string()).or_default() += 1;
        state.login_attempts.push(Instant::now());
        if state.rate_limited_logins > 0 {
            state.rate_limited_logins -= 1;
            return Err(ApiError::new(RATE_LIMIT_MESSAGE));
        }
        match &state.login_error {
            Some(message) => Err(ApiError::new(message.clone())),
            None => Ok(()),
        }
    }

    async fn me(&self) -> ApiResult<Account> {
        self.enter("me")?;
        Ok(Account {
            organization_id: FAKE_ORGANIZATION_ID,
        })
    }

    async fn list_environments(&self) -> ApiResult<Vec<Environment>> {
        let state = self.enter("list_environments")?;
        Ok(state.environments.values().cloned().collect())
    }

    async fn get_environment(&self, id: &str) -> ApiResult<Environment> {
        let state = self.enter("get_environment")?;
        state
            .environments
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("environment", id))
    }

    async fn create_environment(&self, name: &str, organization_id: i64) -> ApiResult<Environment> {
        let mut state = self.enter("create_environment")?;
        if organization_id != FAKE_ORGANIZATION_ID {
            return Err(ApiError::new(format!("unknown organization {}", organization_id)));
        }
        let env = Environment {
            id: format!("env-{}", state.next_id()),
            name: name.to_string(),
        };
        state.environments.insert(env.id.clone(), env.clone());
        Ok(env)
    }

    async fn update_environment(
        &self,
        id: &str,
        name: &str,
        organization_id: i64,
    ) -> ApiResult<Environment> {
        let mut state = self.enter("update_environment")?;
        if organization_id != FAKE_ORGANIZATION_ID {
            return Err(ApiError::new(format!("unknown organization {}", organization_id)));
        }
        let env = state
            .environments
            .get_mut(id)
            .ok_or_else(|| not_found("environment", id))?;
        env.name = name.to_string();
        Ok(env.clone())
    }

    async fn delete_environment(&self, id: &str) -> ApiResult<()> {
        let mut state = self.enter("delete_environment")?;
        state
            .environments
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found("environment", id))
    }

    async fn create_connector(
        &self,
        environment_id: &str,
        cluster_id: &str,
        name: &str,
        config: &BTreeMap<String, String>,
    ) -> ApiResult<Connector> {
        let mut state = self.enter("create_connector")?;
        let key = connector_key(environment_id, cluster_id, name);
        if state.connectors.contains_key(&key) {
            return Err(ApiError::new(format!("connector {} already exists", name)));
        }
        let connector = Connector {
            name: name.to_string(),
            config: config.clone(),
        };
        state.connectors.insert(key, connector.clone());
        Ok(reported(&connector, state.generate_connector_keys))
    }

    async fn get_connector(
        &self,
        environment_id: &str,
        cluster_id: &str,
        name: &str,
    ) -> ApiResult<Connector> {
        let state = self.enter("get_connector")?;
        state
            .connectors
            .get(&connector_key(environment_id, cluster_id, name))
            .map(|c| reported(c, state.generate_connector_keys))
            .ok_or_else(|| not_found("connector", name))
    }

    async fn update_connector_config(
        &self,
        environment_id: &str,
        cluster_id: &str,
        name: &str,
        config: &BTreeMap<String, String>,
    ) -> ApiResult<Connector> {
        let mut state = self.enter("update_connector_config")?;
        let generate_keys = state.generate_connector_keys;
        let connector = state
            .connectors
            .get_mut(&connector_key(environment_id, cluster_id, name))
            .ok_or_else(|| not_found("connector", name))?;
        connector.config = config.clone();
        Ok(reported(connector, generate_keys))
    }

    async fn delete_connector(
        &self,
        environment_id: &str,
        cluster_id: &str,
        name: &str,
    ) -> ApiResult<()> {
        let mut state = self.enter("delete_connector")?;
        state
            .connectors
            .remove(&connector_key(environment_id, cluster_id, name))
            .map(|_| ())
            .ok_or_else(|| not_found("connector", name))
    }

    async fn create_kafka_cluster(&self, spec: &ClusterSpec) -> ApiResult<KafkaCluster> {
        let mut state = self.enter("create_kafka_cluster")?;
        let n = state.next_id();
        let cluster = KafkaCluster {
            id: format!("lkc-{}", n),
            name: spec.name.clone(),
            environment_id: spec.environment_id.clone(),
            service_provider: spec.service_provider.clone(),
            region: spec.region.clone(),
            availability: spec.availability.clone(),
            bootstrap_servers: format!(
                "SASL_SSL://pkc-{}.{}.{}.confluent.cloud:9092",
                n, spec.region, spec.service_provider
            ),
        };
        state.clusters.insert(cluster.id.clone(), cluster.clone());
        Ok(cluster)
    }

    async fn get_kafka_cluster(&self, environment_id: &str, id: &str) -> ApiResult<KafkaCluster> {
        let state = self.enter("get_kafka_cluster")?;
        state
            .clusters
            .get(id)
            .filter(|c| c.environment_id == environment_id)
            .cloned()
            .ok_or_else(|| not_found("kafka cluster", id))
    }

    async fn update_kafka_cluster(
        &self,
        environment_id: &str,
        id: &str,
        name: &str,
    ) -> ApiResult<KafkaCluster> {
        let mut state = self.enter("update_kafka_cluster")?;
        let cluster = state
            .clusters
            .get_mut(id)
            .filter(|c| c.environment_id == environment_id)
            .ok_or_else(|| not_found("kafka cluster", id))?;
        cluster.name = name.to_string();
        Ok(cluster.clone())
    }

    async fn delete_kafka_cluster(&self, environment_id: &str, id: &str) -> ApiResult<()> {
        let mut state = self.enter("delete_kafka_cluster")?;
        match state.clusters.get(id) {
            Some(c) if c.environment_id == environment_id => {
                state.clusters.remove(id);
                Ok(())
            }
            _ => Err(not_found("kafka cluster", id)),
        }
    }

    async fn create_api_key(&self, auth: &ApiKeyAuth, spec: &ApiKeySpec) -> ApiResult<ApiKey> {
        let mut state = self.enter("create_api_key")?;
        require_auth(auth)?;
        let n = state.next_id();
        let key = ApiKey {
            id: n.to_string(),
            key: format!("KEY{:012}", n),
            secret: None,
            description: spec.description.clone(),
            cluster_id: spec.cluster_id.clone(),
            user_id: spec.user_id.clone(),
        };
        state.api_keys.insert(key.id.clone(), key.clone());
        Ok(ApiKey {
            secret: Some(format!("SECRET{:032}", n)),
            ..key
        })
    }

    async fn get_api_key(&self, auth: &ApiKeyAuth, id: &str) -> ApiResult<ApiKey> {
        let state = self.enter("get_api_key")?;
        require_auth(auth)?;
        state
            .api_keys
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("api key", id))
    }

    async fn update_api_key(&self, auth: &ApiKeyAuth, id: &str, description: &str) -> ApiResult<ApiKey> {
        let mut state = self.enter("update_api_key")?;
        require_auth(auth)?;
        let key = state
            .api_keys
            .get_mut(id)
            .ok_or_else(|| not_found("api key", id))?;
        key.description = description.to_string();
        Ok(key.clone())
    }

    async fn delete_api_key(&self, auth: &ApiKeyAuth, id: &str) -> ApiResult<()> {
        let mut state = self.enter("delete_api_key")?;
        require_auth(auth)?;
        state
            .api_keys
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found("api key", id))
    }

    async fn create_schema_registry(
        &self,
        environment_id: &str,
        service_provider: &str,
        region: &str,
    ) -> ApiResult<SchemaRegistry> {
        let mut state = self.enter("create_schema_registry")?;
        if state
            .registries
            .values()
            .any(|r| r.environment_id == environment_id)
        {
            return Err(ApiError::new(format!(
                "schema registry already enabled for {}",
                environment_id
            )));
        }
        let n = state.next_id();
        let registry = SchemaRegistry {
            id: format!("lsrc-{}", n),
            environment_id: environment_id.to_string(),
            service_provider: service_provider.to_string(),
            region: region.to_string(),
            endpoint: format!(
                "https://psrc-{}.{}.{}.confluent.cloud",
                n,
                region.to_lowercase(),
                service_provider
            ),
        };
        state.registries.insert(registry.id.clone(), registry.clone());
        Ok(registry)
    }

    async fn get_schema_registry(&self, environment_id: &str, id: &str) -> ApiResult<SchemaRegistry> {
        let state = self.enter("get_schema_registry")?;
        state
            .registries
            .get(id)
            .filter(|r| r.environment_id == environment_id)
            .cloned()
            .ok_or_else(|| not_found("schema registry", id))
    }

    async fn delete_schema_registry(&self, environment_id: &str, id: &str) -> ApiResult<()> {
        let mut state = self.enter("delete_schema_registry")?;
        match state.registries.get(id) {
            Some(r) if r.environment_id == environment_id => {
                state.registries.remove(id);
                Ok(())
            }
            _ => Err(not_found("schema registry", id)),
        }
    }

    async fn list_service_accounts(&self) -> ApiResult<Vec<ServiceAccount>> {
        let state = self.enter("list_service_accounts")?;
        Ok(state.service_accounts.values().cloned().collect())
    }

    async fn create_service_account(&self, name: &str, description: &str) -> ApiResult<ServiceAccount> {
        let mut state = self.enter("create_service_account")?;
        if state.service_accounts.values().any(|a| a.name == name) {
            return Err(ApiError::new(format!(
                "service account name '{}' is already in use",
                name
            )));
        }
        let account = ServiceAccount {
            id: state.next_id().to_string(),
            name: name.to_string(),
            description: description.to_string(),
        };
        state
            .service_accounts
            .insert(account.id.clone(), account.clone());
        Ok(account)
    }

    async fn update_service_account(&self, id: &str, description: &str) -> ApiResult<ServiceAccount> {
        let mut state = self.enter("update_service_account")?;
        let account = state
            .service_accounts
            .get_mut(id)
            .ok_or_else(|| not_found("service account", id))?;
        account.description = description.to_string();
        Ok(account.clone())
    }

    async fn delete_service_account(&self, id: &str) -> ApiResult<()> {
        let mut state = self.enter("delete_service_account")?;
        state
            .service_accounts
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found("service account", id))
    }
}

/// A [`ClientFactory`] that always hands out `fake`.
pub fn factory(fake: &Arc<FakeCloud>) -> impl ClientFactory {
    let fake = Arc::clone(fake);
    move |_: &ProviderConfig| -> Arc<dyn CloudClient> { fake.clone() }
}

/// A reconcile context logged in to `fake` with API-key credentials.
pub fn context(fake: &Arc<FakeCloud>) -> ReconcileContext {
    context_with_options(fake, ProviderOptions::default())
}

/// Like [`context`], with custom retry windows.
pub fn context_with_options(fake: &Arc<FakeCloud>, options: ProviderOptions) -> ReconcileContext {
    let session = Session::from_parts(fake.clone(), ApiKeyAuth::new("KEY", "SECRET"));
    ReconcileContext::new(Arc::new(session), CancelSignal::never(), options)
}

/// A reconcile context around an explicit session.
pub fn context_with_session(session: Session) -> ReconcileContext {
    ReconcileContext::new(
        Arc::new(session),
        CancelSignal::never(),
        ProviderOptions::default(),
    )
}
