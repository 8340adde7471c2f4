use serde_json::json;
use tracing::{debug, info};

use super::read_error;
use crate::client::{ClusterSpec, KafkaCluster};
use crate::error::ProviderError;
use crate::import::ImportKeyShape;
use crate::resource::{ReconcileContext, Resource, ResourceData};
use crate::schema::{Attribute, Schema};

/// Import ids for clusters: `<environment_id>/<cluster_id>`.
pub const KAFKA_CLUSTER_IMPORT: ImportKeyShape =
    ImportKeyShape::new("kafka_cluster", &["environment_id", "cluster_id"]);

/// `confluentcloud_kafka_cluster`
pub struct KafkaClusterResource;

fn store(data: &mut ResourceData, cluster: KafkaCluster) {
    data.set("name", cluster.name);
    data.set("environment_id", cluster.environment_id);
    data.set("service_provider", cluster.service_provider);
    data.set("region", cluster.region);
    data.set("availability", cluster.availability);
    data.set("bootstrap_servers", cluster.bootstrap_servers);
}

#[async_trait::async_trait]
impl Resource for KafkaClusterResource {
    fn type_name(&self) -> &'static str {
        "confluentcloud_kafka_cluster"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute(
                "name",
                Attribute::required_string().with_description("The name of the cluster"),
            )
            .with_attribute(
                "environment_id",
                Attribute::required_string()
                    .with_description("ID of containing environment, e.g. env-abc123")
                    .with_force_new(),
            )
            .with_attribute(
                "service_provider",
                Attribute::required_string()
                    .with_description("Cloud provider, e.g. aws")
                    .with_force_new(),
            )
            .with_attribute(
                "region",
                Attribute::required_string()
                    .with_description("Cloud region, e.g. us-east-1")
                    .with_force_new(),
            )
            .with_attribute(
                "availability",
                Attribute::optional_string()
                    .with_description("LOW (single zone) or HIGH (multi zone)")
                    .with_default(json!("LOW"))
                    .with_force_new(),
            )
            .with_attribute("bootstrap_servers", Attribute::computed_string())
    }

    async fn create(
        &self,
        ctx: &ReconcileContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let spec = ClusterSpec {
            name: data.require_str("name")?.to_string(),
            environment_id: data.require_str("environment_id")?.to_string(),
            service_provider: data.require_str("service_provider")?.to_string(),
            region: data.require_str("region")?.to_string(),
            availability: data
                .get_optional_str("availability")?
                .unwrap_or("LOW")
                .to_string(),
        };
        info!(name = %spec.name, environment_id = %spec.environment_id, "Creating Kafka cluster");

        let cluster = ctx
            .session
            .client()
            .create_kafka_cluster(&spec)
            .await
            .map_err(|err| ProviderError::Create(format!("kafka cluster {}: {}", spec.name, err)))?;

        data.set_id(cluster.id);
        self.read(ctx, data).await
    }

    async fn read(
        &self,
        ctx: &ReconcileContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let id = data.require_id()?.to_string();
        let environment_id = data.require_str("environment_id")?.to_string();
        debug!(id = %id, "Reading Kafka cluster");

        let cluster = ctx
            .session
            .client()
            .get_kafka_cluster(&environment_id, &id)
            .await
            .map_err(|err| read_error(&format!("kafka cluster {}", id), err))?;
        store(data, cluster);
        Ok(())
    }

    async fn update(
        &self,
        ctx: &ReconcileContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let id = data.require_id()?.to_string();
        let environment_id = data.require_str("environment_id")?.to_string();
        let name = data.require_str("name")?.to_string();
        info!(id = %id, name = %name, "Updating Kafka cluster");

        let cluster = ctx
            .session
            .client()
            .update_kafka_cluster(&environment_id, &id, &name)
            .await
            .map_err(|err| ProviderError::Update(format!("kafka cluster {}: {}", id, err)))?;
        store(data, cluster);
        Ok(())
    }

    async fn delete(&self, ctx: &ReconcileContext, data: &ResourceData) -> Result<(), ProviderError> {
        let id = data.require_id()?;
        let environment_id = data.require_str("environment_id")?;
        info!(id = %id, "Deleting Kafka cluster");

        ctx.session
            .client()
            .delete_kafka_cluster(environment_id, id)
            .await
            .map_err(|err| ProviderError::Delete(format!("kafka cluster {}: {}", id, err)))
    }

    fn import(&self, data: &mut ResourceData) -> Result<(), ProviderError> {
        let id = data.require_id()?.to_string();
        let key = KAFKA_CLUSTER_IMPORT.parse(&id)?;
        if let Some(environment_id) = key.get("environment_id") {
            data.set("environment_id", environment_id);
        }
        data.set_id(key.last());
        Ok(())
    }
}
