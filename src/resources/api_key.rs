use tracing::{debug, info};

use super::{create_while_provisioning, read_error};
use crate::client::{ApiKey, ApiKeySpec};
use crate::error::ProviderError;
use crate::resource::{ReconcileContext, Resource, ResourceData};
use crate::schema::{Attribute, Schema};
use crate::session::ApiKeyAuth;

/// `confluentcloud_api_key`
///
/// Managed through the key/secret authenticated sub-API. The secret is only
/// known from the create response; later reads leave it untouched.
pub struct ApiKeyResource;

fn auth(ctx: &ReconcileContext) -> Result<&ApiKeyAuth, ProviderError> {
    let auth = ctx.session.api_keys();
    if !auth.is_configured() {
        return Err(ProviderError::Configuration(
            "cloud_api_key and cloud_api_secret must be set to manage API keys".to_string(),
        ));
    }
    Ok(auth)
}

fn store(data: &mut ResourceData, key: ApiKey) {
    data.set("key", key.key);
    data.set("description", key.description);
    data.set("cluster_id", key.cluster_id);
    if let Some(user_id) = key.user_id {
        data.set("user_id", user_id);
    }
    if let Some(secret) = key.secret {
        data.set("secret", secret);
    }
}

#[async_trait::async_trait]
impl Resource for ApiKeyResource {
    fn type_name(&self) -> &'static str {
        "confluentcloud_api_key"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute(
                "cluster_id",
                Attribute::required_string()
                    .with_description("Cluster the key grants access to")
                    .with_force_new(),
            )
            .with_attribute(
                "environment_id",
                Attribute::required_string()
                    .with_description("Environment of the cluster")
                    .with_force_new(),
            )
            .with_attribute(
                "user_id",
                Attribute::optional_string()
                    .with_description("Owning user or service account")
                    .with_force_new(),
            )
            .with_attribute("description", Attribute::optional_string())
            .with_attribute("key", Attribute::computed_string())
            .with_attribute("secret", Attribute::computed_string().sensitive())
    }

    async fn create(
        &self,
        ctx: &ReconcileContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let auth = auth(ctx)?;
        let spec = ApiKeySpec {
            cluster_id: data.require_str("cluster_id")?.to_string(),
            environment_id: data.require_str("environment_id")?.to_string(),
            user_id: data.get_optional_str("user_id")?.map(str::to_string),
            description: data.get_str("description")?.to_string(),
        };
        info!(cluster_id = %spec.cluster_id, "Creating API key");

        let what = format!("api key for cluster {}", spec.cluster_id);
        let client = ctx.session.client();
        let key =
            create_while_provisioning(ctx, &what, || client.create_api_key(auth, &spec)).await?;

        data.set_id(key.id.clone());
        store(data, key);
        self.read(ctx, data).await
    }

    async fn read(
        &self,
        ctx: &ReconcileContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let auth = auth(ctx)?;
        let id = data.require_id()?.to_string();
        debug!(id = %id, "Reading API key");

        let key = ctx
            .session
            .client()
            .get_api_key(auth, &id)
            .await
            .map_err(|err| read_error(&format!("api key {}", id), err))?;
        store(data, key);
        Ok(())
    }

    async fn update(
        &self,
        ctx: &ReconcileContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let auth = auth(ctx)?;
        let id = data.require_id()?.to_string();
        let description = data.get_str("description")?.to_string();
        info!(id = %id, "Updating API key");

        let key = ctx
            .session
            .client()
            .update_api_key(auth, &id, &description)
            .await
            .map_err(|err| ProviderError::Update(format!("api key {}: {}", id, err)))?;
        store(data, key);
        Ok(())
    }

    async fn delete(&self, ctx: &ReconcileContext, data: &ResourceData) -> Result<(), ProviderError> {
        let auth = auth(ctx)?;
        let id = data.require_id()?;
        info!(id = %id, "Deleting API key");

        ctx.session
            .client()
            .delete_api_key(auth, id)
            .await
            .map_err(|err| ProviderError::Delete(format!("api key {}: {}", id, err)))
    }

    fn importable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::testing::{context, context_with_session, FakeCloud};
    use serde_json::json;
    use std::sync::Arc;

    fn declared() -> ResourceData {
        ResourceData::from_state(json!({
            "cluster_id": "lkc-1",
            "environment_id": "env-1",
            "description": "ci"
        }))
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_secret_survives_refresh() {
        let fake = Arc::new(FakeCloud::new());
        fake.fail_times("create_api_key", 2, "cluster lkc-1 is provisioning");
        let ctx = context(&fake);
        let mut data = declared();

        ApiKeyResource.create(&ctx, &mut data).await.unwrap();
        assert_eq!(fake.calls("create_api_key"), 3);
        let secret = data.get_str("secret").unwrap().to_string();
        assert!(!secret.is_empty());

        ApiKeyResource.read(&ctx, &mut data).await.unwrap();
        assert_eq!(data.get_str("secret").unwrap(), secret);
        assert!(!data.get_str("key").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_requires_api_key_credentials() {
        let fake = Arc::new(FakeCloud::new());
        let session = Session::from_parts(fake.clone(), ApiKeyAuth::new("", ""));
        let ctx = context_with_session(session);
        let mut data = declared();

        let err = ApiKeyResource.create(&ctx, &mut data).await.unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
        assert_eq!(fake.calls("create_api_key"), 0);
    }

    #[tokio::test]
    async fn test_update_description() {
        let fake = Arc::new(FakeCloud::new());
        let ctx = context(&fake);
        let mut data = declared();
        ApiKeyResource.create(&ctx, &mut data).await.unwrap();

        data.set("description", "deploys");
        ApiKeyResource.update(&ctx, &mut data).await.unwrap();
        assert_eq!(data.get_str("description").unwrap(), "deploys");
    }

    #[test]
    fn test_not_importable() {
        assert!(!ApiKeyResource.importable());
    }
}
