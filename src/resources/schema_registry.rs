use tracing::info;

use super::read_error;
use crate::error::ProviderError;
use crate::resource::{ReconcileContext, Resource, ResourceData};
use crate::schema::{Attribute, Schema};

/// `confluentcloud_schema_registry`
///
/// Every declared attribute forces replacement, so update only refreshes.
pub struct SchemaRegistryResource;

#[async_trait::async_trait]
impl Resource for SchemaRegistryResource {
    fn type_name(&self) -> &'static str {
        "confluentcloud_schema_registry"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute(
                "environment_id",
                Attribute::required_string()
                    .with_description("Environment to enable schema registry for")
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
                    .with_description("Geographic region, e.g. US or EU")
                    .with_force_new(),
            )
            .with_attribute("endpoint", Attribute::computed_string())
    }

    async fn create(
        &self,
        ctx: &ReconcileContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let environment_id = data.require_str("environment_id")?.to_string();
        let service_provider = data.require_str("service_provider")?.to_string();
        let region = data.require_str("region")?.to_string();
        info!(environment_id = %environment_id, "Enabling schema registry");

        let registry = ctx
            .session
            .client()
            .create_schema_registry(&environment_id, &service_provider, &region)
            .await
            .map_err(|err| {
                ProviderError::Create(format!("schema registry in {}: {}", environment_id, err))
            })?;

        data.set_id(registry.id);
        self.read(ctx, data).await
    }

    async fn read(
        &self,
        ctx: &ReconcileContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let id = data.require_id()?.to_string();
        let environment_id = data.require_str("environment_id")?.to_string();

        let registry = ctx
            .session
            .client()
            .get_schema_registry(&environment_id, &id)
            .await
            .map_err(|err| read_error(&format!("schema registry {}", id), err))?;
        data.set("service_provider", registry.service_provider);
        data.set("region", registry.region);
        data.set("endpoint", registry.endpoint);
        Ok(())
    }

    async fn update(
        &self,
        ctx: &ReconcileContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        self.read(ctx, data).await
    }

    async fn delete(&self, ctx: &ReconcileContext, data: &ResourceData) -> Result<(), ProviderError> {
        let id = data.require_id()?;
        let environment_id = data.require_str("environment_id")?;
        info!(id = %id, "Disabling schema registry");

        ctx.session
            .client()
            .delete_schema_registry(environment_id, id)
            .await
            .map_err(|err| ProviderError::Delete(format!("schema registry {}: {}", id, err)))
    }

    fn importable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, FakeCloud};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_lifecycle() {
        let fake = Arc::new(FakeCloud::new());
        let ctx = context(&fake);
        let mut data = ResourceData::from_state(json!({
            "environment_id": "env-1",
            "service_provider": "aws",
            "region": "EU"
        }))
        .unwrap();

        SchemaRegistryResource.create(&ctx, &mut data).await.unwrap();
        assert!(data.id().unwrap().starts_with("lsrc-"));
        assert!(data.get_str("endpoint").unwrap().starts_with("https://"));

        SchemaRegistryResource.delete(&ctx, &data).await.unwrap();
        let err = SchemaRegistryResource.read(&ctx, &mut data).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
