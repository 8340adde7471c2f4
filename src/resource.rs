//! The per-kind reconciler contract and the resource descriptor it operates on.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::ProviderOptions;
use crate::error::ProviderError;
use crate::retry::CancelSignal;
use crate::schema::Schema;
use crate::session::Session;

/// Key under which the identifier is stored in host state.
pub const ID_KEY: &str = "id";

/// Identifier plus attributes of one managed object.
///
/// The host exchanges this as a JSON object with an `"id"` key; an empty or
/// missing id means the object does not exist (yet).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceData {
    id: Option<String>,
    attributes: Map<String, Value>,
}

impl ResourceData {
    /// Build a descriptor from host state.
    pub fn from_state(state: Value) -> Result<Self, ProviderError> {
        let mut attributes = match state {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(ProviderError::Validation(format!(
                    "resource state must be an object, got {}",
                    other
                )))
            }
        };
        let id = match attributes.remove(ID_KEY) {
            Some(Value::String(id)) if !id.is_empty() => Some(id),
            _ => None,
        };
        Ok(Self { id, attributes })
    }

    /// A descriptor that only knows its identifier, as at the start of an import.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            attributes: Map::new(),
        }
    }

    /// Convert back into host state.
    pub fn into_state(self) -> Value {
        let mut attributes = self.attributes;
        if let Some(id) = self.id {
            attributes.insert(ID_KEY.to_string(), Value::String(id));
        }
        Value::Object(attributes)
    }

    /// The identifier, if assigned.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The identifier, or a validation error naming the operation.
    pub fn require_id(&self) -> Result<&str, ProviderError> {
        self.id()
            .ok_or_else(|| ProviderError::Validation("resource has no id".to_string()))
    }

    /// Assign the identifier.
    pub fn set_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.id = if id.is_empty() { None } else { Some(id) };
    }

    /// Raw attribute value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// A string attribute; absent or null reads as empty.
    pub fn get_str(&self, name: &str) -> Result<&str, ProviderError> {
        match self.attributes.get(name) {
            None | Some(Value::Null) => Ok(""),
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(ProviderError::Validation(format!(
                "attribute '{}' must be a string, got {}",
                name, other
            ))),
        }
    }

    /// A string attribute that must be non-empty.
    pub fn require_str(&self, name: &str) -> Result<&str, ProviderError> {
        let value = self.get_str(name)?;
        if value.is_empty() {
            return Err(ProviderError::Validation(format!(
                "missing required attribute '{}'",
                name
            )));
        }
        Ok(value)
    }

    /// An optional string attribute; empty reads as `None`.
    pub fn get_optional_str(&self, name: &str) -> Result<Option<&str>, ProviderError> {
        let value = self.get_str(name)?;
        Ok((!value.is_empty()).then_some(value))
    }

    /// A map-of-strings attribute; absent or null reads as empty.
    pub fn get_string_map(&self, name: &str) -> Result<BTreeMap<String, String>, ProviderError> {
        match self.attributes.get(name) {
            None | Some(Value::Null) => Ok(BTreeMap::new()),
            Some(Value::Object(entries)) => entries
                .iter()
                .map(|(key, value)| match value {
                    Value::String(s) => Ok((key.clone(), s.clone())),
                    other => Err(ProviderError::Validation(format!(
                        "attribute '{}.{}' must be a string, got {}",
                        name, key, other
                    ))),
                })
                .collect(),
            Some(other) => Err(ProviderError::Validation(format!(
                "attribute '{}' must be a map, got {}",
                name, other
            ))),
        }
    }

    /// Merge several map attributes into one flat map. Later maps win on
    /// key collisions.
    pub fn merged_string_maps(
        &self,
        names: &[&str],
    ) -> Result<BTreeMap<String, String>, ProviderError> {
        let mut merged = BTreeMap::new();
        for name in names {
            merged.extend(self.get_string_map(name)?);
        }
        Ok(merged)
    }

    /// Set an attribute.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    /// Set a map-of-strings attribute.
    pub fn set_string_map(&mut self, name: &str, map: &BTreeMap<String, String>) {
        let object = map
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        self.attributes.insert(name.to_string(), Value::Object(object));
    }
}

/// What every reconciler call gets from the provider.
#[derive(Debug, Clone)]
pub struct ReconcileContext {
    /// The shared, authenticated session.
    pub session: Arc<Session>,
    /// Fires when the provider is stopped.
    pub cancel: CancelSignal,
    /// Retry windows.
    pub options: ProviderOptions,
}

impl ReconcileContext {
    /// Bundle the pieces.
    pub fn new(session: Arc<Session>, cancel: CancelSignal, options: ProviderOptions) -> Self {
        Self {
            session,
            cancel,
            options,
        }
    }
}

/// Create/read/update/delete/import for one resource kind.
#[async_trait::async_trait]
pub trait Resource: Send + Sync + 'static {
    /// Host-visible type name, e.g. `confluentcloud_connector`.
    fn type_name(&self) -> &'static str;

    /// Declared and computed attributes.
    fn schema(&self) -> Schema;

    /// Create the remote object and assign the identifier to `data`.
    ///
    /// Once the remote create succeeds the identifier must be set before any
    /// later step of the call can fail.
    async fn create(
        &self,
        ctx: &ReconcileContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError>;

    /// Refresh `data` from the remote object. A missing object is reported as
    /// [`ProviderError::NotFound`].
    async fn read(&self, ctx: &ReconcileContext, data: &mut ResourceData)
        -> Result<(), ProviderError>;

    /// Apply in-place changes. The identifier does not change.
    async fn update(
        &self,
        ctx: &ReconcileContext,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError>;

    /// Remove the remote object. Never retried.
    async fn delete(&self, ctx: &ReconcileContext, data: &ResourceData)
        -> Result<(), ProviderError>;

    /// Populate `data` from an import id. The default accepts the id as-is.
    fn import(&self, data: &mut ResourceData) -> Result<(), ProviderError> {
        data.require_id()?;
        Ok(())
    }

    /// Whether import is supported at all.
    fn importable(&self) -> bool {
        true
    }

    /// Whether an observed difference at `path` is noise rather than drift.
    fn suppress_diff(&self, path: &str, old: &str, new: &str) -> bool {
        let _ = (path, old, new);
        false
    }
}

/// Read-only lookup for one data source type.
#[async_trait::async_trait]
pub trait DataSource: Send + Sync + 'static {
    /// Host-visible type name.
    fn type_name(&self) -> &'static str;

    /// Arguments and results.
    fn schema(&self) -> Schema;

    /// Resolve `data` from its arguments, setting the identifier.
    async fn read(&self, ctx: &ReconcileContext, data: &mut ResourceData)
        -> Result<(), ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_round_trip_keeps_id_separate() {
        let data = ResourceData::from_state(json!({"id": "env-1", "name": "prod"})).unwrap();
        assert_eq!(data.id(), Some("env-1"));
        assert!(data.get(ID_KEY).is_none());
        assert_eq!(data.into_state(), json!({"id": "env-1", "name": "prod"}));
    }

    #[test]
    fn test_empty_id_means_absent() {
        let mut data = ResourceData::from_state(json!({"id": "", "name": "prod"})).unwrap();
        assert_eq!(data.id(), None);
        assert!(data.require_id().is_err());
        data.set_id("");
        assert_eq!(data.into_state(), json!({"name": "prod"}));
    }

    #[test]
    fn test_non_object_state_rejected() {
        assert!(ResourceData::from_state(json!([1])).is_err());
        assert!(ResourceData::from_state(Value::Null).unwrap().id().is_none());
    }

    #[test]
    fn test_string_accessors() {
        let data = ResourceData::from_state(json!({"name": "prod", "user_id": "", "n": 3})).unwrap();
        assert_eq!(data.require_str("name").unwrap(), "prod");
        assert_eq!(data.get_str("missing").unwrap(), "");
        assert!(data.require_str("missing").is_err());
        assert_eq!(data.get_optional_str("user_id").unwrap(), None);
        assert!(data.get_str("n").is_err());
    }

    #[test]
    fn test_sensitive_map_wins_on_merge() {
        let data = ResourceData::from_state(json!({
            "config": {"connector.class": "S3_SINK", "aws.secret": "placeholder"},
            "config_sensitive": {"aws.secret": "real"}
        }))
        .unwrap();
        let merged = data
            .merged_string_maps(&["config", "config_sensitive"])
            .unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged["aws.secret"], "real");
        assert_eq!(merged["connector.class"], "S3_SINK");
    }

    #[test]
    fn test_map_with_non_string_value_rejected() {
        let data = ResourceData::from_state(json!({"config": {"tasks.max": 1}})).unwrap();
        assert!(data.get_string_map("config").is_err());
    }

    #[test]
    fn test_set_string_map() {
        let mut data = ResourceData::default();
        let mut map = BTreeMap::new();
        map.insert("topics".to_string(), "orders".to_string());
        data.set_string_map("config", &map);
        assert_eq!(data.get_string_map("config").unwrap(), map);
    }
}
