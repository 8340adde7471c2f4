use tracing::{debug, info};

use super::read_error;
use crate::error::ProviderError;
use crate::resource::{DataSource, ReconcileContext, Resource, ResourceData};
use crate::schema::{Attribute, Schema};

/// `confluentcloud_environment`
pub struct EnvironmentResource;

const TYPE_NAME: &str = "confluentcloud_environment";

fn name_attribute() -> Attribute {
    Attribute::required_string().with_description("The name of the environment")
}

#[async_trait::async_trait]
impl Resource for EnvironmentResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0().with_attribute("name", name_attribute())
    }

    async fn create(
        &self,
        ctx: &ReconcileContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let name = data.require_str("name")?.to_string();
        info!(name = %name, "Creating environment");

        let org_id = ctx.session.organization_id().await.map_err(|err| {
            ProviderError::Create(format!("environment {}: resolving organization: {}", name, err))
        })?;
        let env = ctx
            .session
            .client()
            .create_environment(&name, org_id)
            .await
            .map_err(|err| ProviderError::Create(format!("environment {}: {}", name, err)))?;

        data.set_id(env.id);
        self.read(ctx, data).await
    }

    async fn read(
        &self,
        ctx: &ReconcileContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let id = data.require_id()?.to_string();
        debug!(id = %id, "Reading environment");

        let env = ctx
            .session
            .client()
            .get_environment(&id)
            .await
            .map_err(|err| read_error(&format!("environment {}", id), err))?;
        data.set("name", env.name);
        Ok(())
    }

    async fn update(
        &self,
        ctx: &ReconcileContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let id = data.require_id()?.to_string();
        let name = data.require_str("name")?.to_string();
        info!(id = %id, name = %name, "Updating environment");

        let org_id = ctx.session.organization_id().await.map_err(|err| {
            ProviderError::Update(format!("environment {}: resolving organization: {}", id, err))
        })?;
        let env = ctx
            .session
            .client()
            .update_environment(&id, &name, org_id)
            .await
            .map_err(|err| ProviderError::Update(format!("environment {}: {}", id, err)))?;

        data.set_id(env.id);
        data.set("name", env.name);
        Ok(())
    }

    async fn delete(&self, ctx: &ReconcileContext, data: &ResourceData) -> Result<(), ProviderError> {
        let id = data.require_id()?;
        info!(id = %id, "Deleting environment");

        ctx.session
            .client()
            .delete_environment(id)
            .await
            .map_err(|err| ProviderError::Delete(format!("environment {}: {}", id, err)))
    }
}

/// `confluentcloud_environment` data source: look an environment up by name.
pub struct EnvironmentDataSource;

#[async_trait::async_trait]
impl DataSource for EnvironmentDataSource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0().with_attribute("name", name_attribute())
    }

    async fn read(
        &self,
        ctx: &ReconcileContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let name = data.require_str("name")?.to_string();
        info!(name = %name, "Looking up environment");

        let environments = ctx
            .session
            .client()
            .list_environments()
            .await
            .map_err(|err| ProviderError::Read(format!("listing environments: {}", err)))?;

        let env = environments
            .into_iter()
            .find(|env| env.name == name)
            .ok_or_else(|| ProviderError::NotFound(format!("environment named '{}'", name)))?;
        data.set_id(env.id);
        data.set("name", env.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, FakeCloud};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_create_then_read_round_trips() {
        let fake = Arc::new(FakeCloud::new());
        let ctx = context(&fake);
        let mut data = ResourceData::from_state(json!({"name": "prod"})).unwrap();

        EnvironmentResource.create(&ctx, &mut data).await.unwrap();
        let id = data.id().unwrap().to_string();
        assert!(id.starts_with("env-"));

        let mut refreshed = ResourceData::with_id(&id);
        EnvironmentResource.read(&ctx, &mut refreshed).await.unwrap();
        assert_eq!(refreshed, data);
    }

    #[tokio::test]
    async fn test_update_requires_organization() {
        let fake = Arc::new(FakeCloud::new());
        let ctx = context(&fake);
        let mut data = ResourceData::from_state(json!({"name": "prod"})).unwrap();
        EnvironmentResource.create(&ctx, &mut data).await.unwrap();

        fake.fail("me", "session expired");
        data.set("name", "production");
        let err = EnvironmentResource.update(&ctx, &mut data).await.unwrap_err();

        assert!(matches!(err, ProviderError::Update(ref m) if m.contains("resolving organization")));
        assert_eq!(fake.calls("update_environment"), 0);
    }

    #[tokio::test]
    async fn test_update_renames() {
        let fake = Arc::new(FakeCloud::new());
        let ctx = context(&fake);
        let mut data = ResourceData::from_state(json!({"name": "prod"})).unwrap();
        EnvironmentResource.create(&ctx, &mut data).await.unwrap();
        let id = data.id().unwrap().to_string();

        data.set("name", "production");
        EnvironmentResource.update(&ctx, &mut data).await.unwrap();
        assert_eq!(data.id(), Some(id.as_str()));
        assert_eq!(fake.environment(&id).unwrap().name, "production");
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let fake = Arc::new(FakeCloud::new());
        let ctx = context(&fake);
        let mut data = ResourceData::with_id("env-gone");
        let err = EnvironmentResource.read(&ctx, &mut data).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_error_is_surfaced() {
        let fake = Arc::new(FakeCloud::new());
        let ctx = context(&fake);
        let mut data = ResourceData::from_state(json!({"name": "prod"})).unwrap();
        EnvironmentResource.create(&ctx, &mut data).await.unwrap();

        fake.fail("delete_environment", "environment has clusters");
        let err = EnvironmentResource.delete(&ctx, &data).await.unwrap_err();
        assert!(matches!(err, ProviderError::Delete(ref m) if m.contains("has clusters")));
        assert_eq!(fake.calls("delete_environment"), 1);
    }

    #[tokio::test]
    async fn test_data_source_by_name() {
        let fake = Arc::new(FakeCloud::new());
        let ctx = context(&fake);
        let mut created = ResourceData::from_state(json!({"name": "staging"})).unwrap();
        EnvironmentResource.create(&ctx, &mut created).await.unwrap();

        let mut data = ResourceData::from_state(json!({"name": "staging"})).unwrap();
        EnvironmentDataSource.read(&ctx, &mut data).await.unwrap();
        assert_eq!(data.id(), created.id());

        let mut missing = ResourceData::from_state(json!({"name": "nope"})).unwrap();
        let err = EnvironmentDataSource.read(&ctx, &mut missing).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
