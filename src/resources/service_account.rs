use tracing::info;

use crate::client::ServiceAccount;
use crate::error::ProviderError;
use crate::resource::{DataSource, ReconcileContext, Resource, ResourceData};
use crate::schema::{Attribute, Schema};

const TYPE_NAME: &str = "confluentcloud_service_account";

/// `confluentcloud_service_account`
pub struct ServiceAccountResource;

// The API has no single-account lookup; everything goes through the list.
async fn find(
    ctx: &ReconcileContext,
    matches: impl Fn(&ServiceAccount) -> bool + Send,
) -> Result<Option<ServiceAccount>, ProviderError> {
    let accounts = ctx
        .session
        .client()
        .list_service_accounts()
        .await
        .map_err(|err| ProviderError::Read(format!("listing service accounts: {}", err)))?;
    Ok(accounts.into_iter().find(|account| matches(account)))
}

fn store(data: &mut ResourceData, account: ServiceAccount) {
    data.set("name", account.name);
    data.set("description", account.description);
}

#[async_trait::async_trait]
impl Resource for ServiceAccountResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute(
                "name",
                Attribute::required_string()
                    .with_description("Service account name")
                    .with_force_new(),
            )
            .with_attribute("description", Attribute::optional_string())
    }

    async fn create(
        &self,
        ctx: &ReconcileContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let name = data.require_str("name")?.to_string();
        let description = data.get_str("description")?.to_string();
        info!(name = %name, "Creating service account");

        let account = ctx
            .session
            .client()
            .create_service_account(&name, &description)
            .await
            .map_err(|err| ProviderError::Create(format!("service account {}: {}", name, err)))?;

        data.set_id(account.id);
        self.read(ctx, data).await
    }

    async fn read(
        &self,
        ctx: &ReconcileContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let id = data.require_id()?.to_string();
        let account = find(ctx, |account| account.id == id)
            .await?
            .ok_or_else(|| ProviderError::NotFound(format!("service account {}", id)))?;
        store(data, account);
        Ok(())
    }

    async fn update(
        &self,
        ctx: &ReconcileContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let id = data.require_id()?.to_string();
        let description = data.get_str("description")?.to_string();
        info!(id = %id, "Updating service account");

        let account = ctx
            .session
            .client()
            .update_service_account(&id, &description)
            .await
            .map_err(|err| ProviderError::Update(format!("service account {}: {}", id, err)))?;
        store(data, account);
        Ok(())
    }

    async fn delete(&self, ctx: &ReconcileContext, data: &ResourceData) -> Result<(), ProviderError> {
        let id = data.require_id()?;
        info!(id = %id, "Deleting service account");

        ctx.session
            .client()
            .delete_service_account(id)
            .await
            .map_err(|err| ProviderError::Delete(format!("service account {}: {}", id, err)))
    }
}

/// `confluentcloud_service_account` data source: look an account up by name.
pub struct ServiceAccountDataSource;

#[async_trait::async_trait]
impl DataSource for ServiceAccountDataSource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("name", Attribute::required_string())
            .with_attribute("description", Attribute::computed_string())
    }

    async fn read(
        &self,
        ctx: &ReconcileContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let name = data.require_str("name")?.to_string();
        let account = find(ctx, |account| account.name == name)
            .await?
            .ok_or_else(|| ProviderError::NotFound(format!("service account named '{}'", name)))?;
        data.set_id(account.id.clone());
        store(data, account);
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
    async fn test_create_read_delete() {
        let fake = Arc::new(FakeCloud::new());
        let ctx = context(&fake);
        let mut data =
            ResourceData::from_state(json!({"name": "ci-bot", "description": "pipelines"})).unwrap();

        ServiceAccountResource.create(&ctx, &mut data).await.unwrap();
        let id = data.id().unwrap().to_string();

        let mut refreshed = ResourceData::with_id(&id);
        ServiceAccountResource.read(&ctx, &mut refreshed).await.unwrap();
        assert_eq!(refreshed, data);

        ServiceAccountResource.delete(&ctx, &data).await.unwrap();
        let err = ServiceAccountResource.read(&ctx, &mut refreshed).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_data_source_by_name() {
        let fake = Arc::new(FakeCloud::new());
        let ctx = context(&fake);
        let mut created = ResourceData::from_state(json!({"name": "ci-bot"})).unwrap();
        ServiceAccountResource.create(&ctx, &mut created).await.unwrap();

        let mut data = ResourceData::from_state(json!({"name": "ci-bot"})).unwrap();
        ServiceAccountDataSource.read(&ctx, &mut data).await.unwrap();
        assert_eq!(data.id(), created.id());

        let mut missing = ResourceData::from_state(json!({"name": "ghost"})).unwrap();
        assert!(ServiceAccountDataSource.read(&ctx, &mut missing).await.unwrap_err().is_not_found());
    }
}
