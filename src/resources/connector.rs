use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use super::{create_while_provisioning, read_error};
use crate::diff::suppress_connector_config_diff;
use crate::error::ProviderError;
use crate::import::ImportKeyShape;
use crate::resource::{ReconcileContext, Resource, ResourceData};
use crate::schema::{Attribute, Schema};

/// Import ids for connectors: `<environment_id>/<cluster_id>/<name>`.
pub const CONNECTOR_IMPORT: ImportKeyShape =
    ImportKeyShape::new("connector", &["environment_id", "cluster_id", "name"]);

const CONFIG_MAPS: &[&str] = &["config", "config_sensitive"];

/// `confluentcloud_connector`
///
/// A connector is addressed by its name inside a cluster, so the name is also
/// its identifier.
pub struct ConnectorResource;

struct Location {
    environment_id: String,
    cluster_id: String,
    name: String,
}

impl Location {
    fn of(data: &ResourceData) -> Result<Self, ProviderError> {
        let name = match data.get_optional_str("name")? {
            Some(name) => name.to_string(),
            None => data.require_id()?.to_string(),
        };
        Ok(Self {
            environment_id: data.require_str("environment_id")?.to_string(),
            cluster_id: data.require_str("cluster_id")?.to_string(),
            name,
        })
    }
}

#[async_trait::async_trait]
impl Resource for ConnectorResource {
    fn type_name(&self) -> &'static str {
        "confluentcloud_connector"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("A managed Kafka Connect connector")
            .with_attribute(
                "name",
                Attribute::required_string()
                    .with_description("The name of the connector")
                    .with_force_new(),
            )
            .with_attribute(
                "environment_id",
                Attribute::required_string()
                    .with_description("ID of containing environment, e.g. env-abc123")
                    .with_force_new(),
            )
            .with_attribute(
                "cluster_id",
                Attribute::required_string()
                    .with_description("ID of containing cluster, e.g. lkc-abc123")
                    .with_force_new(),
            )
            .with_attribute(
                "config",
                Attribute::required_string_map().with_description("Type-specific configuration"),
            )
            .with_attribute(
                "config_sensitive",
                Attribute::optional_string_map()
                    .with_description("Sensitive configuration, merged over config on write")
                    .sensitive(),
            )
    }

    async fn create(
        &self,
        ctx: &ReconcileContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let loc = Location::of(data)?;
        let declared = data.get_string_map("config")?;
        let config = data.merged_string_maps(CONFIG_MAPS)?;
        info!(
            name = %loc.name,
            environment_id = %loc.environment_id,
            cluster_id = %loc.cluster_id,
            "Creating connector"
        );

        let what = format!("connector {} with config {:?}", loc.name, declared);
        let client = ctx.session.client();
        let connector = create_while_provisioning(ctx, &what, || {
            client.create_connector(&loc.environment_id, &loc.cluster_id, &loc.name, &config)
        })
        .await
        .inspect_err(|err| warn!(name = %loc.name, error = %err, "Connector create failed"))?;

        data.set_id(connector.name);
        self.read(ctx, data).await
    }

    async fn read(
        &self,
        ctx: &ReconcileContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let loc = Location::of(data)?;
        debug!(name = %loc.name, "Reading connector");

        let connector = ctx
            .session
            .client()
            .get_connector(&loc.environment_id, &loc.cluster_id, &loc.name)
            .await
            .map_err(|err| read_error(&format!("connector {}", loc.name), err))?;

        let config = visible(connector.config, data)?;
        data.set("name", connector.name);
        data.set_string_map("config", &config);
        Ok(())
    }

    async fn update(
        &self,
        ctx: &ReconcileContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let loc = Location::of(data)?;
        let config = data.merged_string_maps(CONFIG_MAPS)?;
        info!(name = %loc.name, "Updating connector");

        let result = ctx
            .session
            .client()
            .update_connector_config(&loc.environment_id, &loc.cluster_id, &loc.name, &config)
            .await;
        data.set_id(loc.name.clone());

        let connector =
            result.map_err(|err| ProviderError::Update(format!("connector {}: {}", loc.name, err)))?;
        let config = visible(connector.config, data)?;
        data.set_string_map("config", &config);
        Ok(())
    }

    async fn delete(&self, ctx: &ReconcileContext, data: &ResourceData) -> Result<(), ProviderError> {
        let loc = Location::of(data)?;
        info!(name = %loc.name, "Deleting connector");

        ctx.session
            .client()
            .delete_connector(&loc.environment_id, &loc.cluster_id, &loc.name)
            .await
            .map_err(|err| ProviderError::Delete(format!("connector {}: {}", loc.name, err)))
    }

    fn import(&self, data: &mut ResourceData) -> Result<(), ProviderError> {
        let id = data.require_id()?.to_string();
        let key = CONNECTOR_IMPORT.parse(&id)?;
        for (field, value) in key.fields() {
            data.set(field, value);
        }
        data.set_id(key.last());
        Ok(())
    }

    fn suppress_diff(&self, path: &str, old: &str, new: &str) -> bool {
        path.starts_with("config.") && suppress_connector_config_diff(path, old, new)
    }
}

// Keys that were only supplied through config_sensitive stay out of config.
fn visible(
    reported: BTreeMap<String, String>,
    data: &ResourceData,
) -> Result<BTreeMap<String, String>, ProviderError> {
    let declared = data.get_string_map("config")?;
    let sensitive = data.get_string_map("config_sensitive")?;
    Ok(reported
        .into_iter()
        .filter(|(key, _)| declared.contains_key(key) || !sensitive.contains_key(key))
        .collect())
}
