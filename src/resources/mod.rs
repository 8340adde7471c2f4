//! Resource kinds and data sources served by the provider.

mod api_key;
mod connector;
mod environment;
mod kafka_cluster;
mod schema_registry;
mod service_account;

use std::future::Future;

use crate::classify::ErrorClass;
use crate::client::ApiError;
use crate::error::ProviderError;
use crate::resource::{DataSource, ReconcileContext, Resource};
use crate::retry::{retry, Attempt, RetryFailure};

pub use api_key::ApiKeyResource;
pub use connector::{ConnectorResource, CONNECTOR_IMPORT};
pub use environment::{EnvironmentDataSource, EnvironmentResource};
pub use kafka_cluster::{KafkaClusterResource, KAFKA_CLUSTER_IMPORT};
pub use schema_registry::SchemaRegistryResource;
pub use service_account::{ServiceAccountDataSource, ServiceAccountResource};

/// Every resource kind the provider manages.
pub fn all_resources() -> Vec<Box<dyn Resource>> {
    vec![
        Box::new(EnvironmentResource),
        Box::new(ConnectorResource),
        Box::new(KafkaClusterResource),
        Box::new(ApiKeyResource),
        Box::new(SchemaRegistryResource),
        Box::new(ServiceAccountResource),
    ]
}

/// Every data source the provider serves.
pub fn all_data_sources() -> Vec<Box<dyn DataSource>> {
    vec![
        Box::new(EnvironmentDataSource),
        Box::new(ServiceAccountDataSource),
    ]
}

/// Map a failed read, singling out absence so the host can prune state.
pub(crate) fn read_error(what: &str, err: ApiError) -> ProviderError {
    match err.class() {
        ErrorClass::NotFound => ProviderError::NotFound(format!("{}: {}", what, err)),
        _ => ProviderError::Read(format!("{}: {}", what, err)),
    }
}

/// Run a create call, retrying for as long as the API reports that something
/// upstream is still being provisioned.
pub(crate) async fn create_while_provisioning<T, F, Fut>(
    ctx: &ReconcileContext,
    what: &str,
    mut op: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let policy = &ctx.options.provisioning;
    let result = retry(policy, ctx.cancel.clone(), || {
        let call = op();
        async move {
            call.await.map_err(|err| match err.class() {
                ErrorClass::Provisioning => Attempt::Retry(err),
                _ => Attempt::Abort(err),
            })
        }
    })
    .await;

    result.map_err(|failure| match failure {
        RetryFailure::Aborted(err) => ProviderError::Create(format!("{}: {}", what, err)),
        RetryFailure::TimedOut {
            attempts,
            elapsed,
            last,
        } => ProviderError::Create(format!(
            "{}: still provisioning after {} attempts over {:?}: {}",
            what, attempts, elapsed, last
        )),
        RetryFailure::Cancelled { attempts, last } => ProviderError::Cancelled(format!(
            "{}: stopped after {} attempts: {}",
            what, attempts, last
        )),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_type_names_are_unique() {
        let names: BTreeSet<_> = all_resources().iter().map(|r| r.type_name()).collect();
        assert_eq!(names.len(), 6);
        assert!(names.contains("confluentcloud_connector"));

        let names: BTreeSet<_> = all_data_sources().iter().map(|d| d.type_name()).collect();
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_read_error_distinguishes_absence() {
        let err = read_error("environment env-1", ApiError::new("environment not found"));
        assert!(err.is_not_found());

        let err = read_error("environment env-1", ApiError::new("internal error"));
        assert!(matches!(err, ProviderError::Read(ref m) if m == "environment env-1: internal error"));
    }
}
