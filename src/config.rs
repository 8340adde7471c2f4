//! Provider configuration.
//!
//! The host passes the provider block as JSON. Every option is optional at the
//! type level; an empty value falls back to a fixed environment variable.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::backoff::Backoff;
use crate::error::ProviderError;
use crate::retry::RetryPolicy;
use crate::schema::{Attribute, Schema};

/// Environment variable backing `username`.
pub const ENV_USERNAME: &str = "CONFLUENT_CLOUD_USERNAME";
/// Environment variable backing `password`.
pub const ENV_PASSWORD: &str = "CONFLUENT_CLOUD_PASSWORD";
/// Environment variable backing `cloud_api_key`.
pub const ENV_API_KEY: &str = "CONFLUENT_CLOUD_API_KEY";
/// Environment variable backing `cloud_api_secret`.
pub const ENV_API_SECRET: &str = "CONFLUENT_CLOUD_API_SECRET";

/// Credentials for the control plane and the API-keys sub-API.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Login user.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Cloud API key, used as the basic-auth user of the API-keys sub-API.
    pub cloud_api_key: String,
    /// Cloud API secret, used as the basic-auth password of the API-keys sub-API.
    pub cloud_api_secret: String,
}

impl ProviderConfig {
    /// Decode the host's configuration and fill blanks from the process
    /// environment.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ProviderError> {
        Self::from_value_with_env(value, |name| std::env::var(name).ok())
    }

    /// Like [`ProviderConfig::from_value`], with an explicit variable lookup.
    pub fn from_value_with_env<F>(value: serde_json::Value, lookup: F) -> Result<Self, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: Self = if value.is_null() {
            Self::default()
        } else {
            serde_json::from_value(value)?
        };
        config.fill_from_env(lookup);
        Ok(config)
    }

    fn fill_from_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for (field, var) in [
            (&mut self.username, ENV_USERNAME),
            (&mut self.password, ENV_PASSWORD),
            (&mut self.cloud_api_key, ENV_API_KEY),
            (&mut self.cloud_api_secret, ENV_API_SECRET),
        ] {
            if field.is_empty() {
                if let Some(value) = lookup(var) {
                    *field = value;
                }
            }
        }
    }

    /// Whether login credentials are present.
    pub fn has_login(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    /// Whether API-key credentials are present.
    pub fn has_api_key(&self) -> bool {
        !self.cloud_api_key.is_empty() && !self.cloud_api_secret.is_empty()
    }

    /// Schema of the provider block.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_attribute(
                "username",
                Attribute::optional_string()
                    .with_description(format!("Login user. Defaults to ${}", ENV_USERNAME)),
            )
            .with_attribute(
                "password",
                Attribute::optional_string()
                    .sensitive()
                    .with_description(format!("Login password. Defaults to ${}", ENV_PASSWORD)),
            )
            .with_attribute(
                "cloud_api_key",
                Attribute::optional_string()
                    .sensitive()
                    .with_description(format!("Cloud API key. Defaults to ${}", ENV_API_KEY)),
            )
            .with_attribute(
                "cloud_api_secret",
                Attribute::optional_string()
                    .sensitive()
                    .with_description(format!("Cloud API secret. Defaults to ${}", ENV_API_SECRET)),
            )
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("username", &self.username)
            .field("password", &redacted(&self.password))
            .field("cloud_api_key", &redacted(&self.cloud_api_key))
            .field("cloud_api_secret", &redacted(&self.cloud_api_secret))
            .finish()
    }
}

fn redacted(value: &str) -> &'static str {
    if value.is_empty() {
        ""
    } else {
        "<redacted>"
    }
}

/// Retry windows applied by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOptions {
    /// Policy for rate-limited logins.
    pub login: RetryPolicy,
    /// Policy for creates that wait on upstream provisioning.
    pub provisioning: RetryPolicy,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            login: RetryPolicy::new("login", Duration::from_secs(30 * 60), Backoff::login()),
            provisioning: RetryPolicy::new(
                "create",
                Duration::from_secs(20 * 60),
                Backoff::provisioning(),
            ),
        }
    }
}

impl ProviderOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the login retry policy.
    pub fn with_login(mut self, policy: RetryPolicy) -> Self {
        self.login = policy;
        self
    }

    /// Set the provisioning retry policy.
    pub fn with_provisioning(mut self, policy: RetryPolicy) -> Self {
        self.provisioning = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_decode_explicit_values() {
        let config = ProviderConfig::from_value_with_env(
            json!({"username": "ops@example.com", "password": "pw"}),
            no_env,
        )
        .unwrap();
        assert_eq!(config.username, "ops@example.com");
        assert!(config.has_login());
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_blank_values_fall_back_to_env() {
        let env = |name: &str| match name {
            ENV_USERNAME => Some("env-user".to_string()),
            ENV_API_KEY => Some("KEY".to_string()),
            ENV_API_SECRET => Some("SECRET".to_string()),
            _ => None,
        };
        let config =
            ProviderConfig::from_value_with_env(json!({"username": "", "password": "pw"}), env)
                .unwrap();
        assert_eq!(config.username, "env-user");
        assert_eq!(config.password, "pw");
        assert!(config.has_api_key());
    }

    #[test]
    fn test_explicit_value_wins_over_env() {
        let env = |_: &str| Some("from-env".to_string());
        let config =
            ProviderConfig::from_value_with_env(json!({"username": "explicit"}), env).unwrap();
        assert_eq!(config.username, "explicit");
        assert_eq!(config.password, "from-env");
    }

    #[test]
    fn test_null_config() {
        let config = ProviderConfig::from_value_with_env(serde_json::Value::Null, no_env).unwrap();
        assert_eq!(config, ProviderConfig::default());
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let result = ProviderConfig::from_value_with_env(json!({"username": 42}), no_env);
        assert!(matches!(result, Err(ProviderError::Serialization(_))));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ProviderConfig {
            username: "u".to_string(),
            password: "hunter2".to_string(),
            cloud_api_key: "K".to_string(),
            cloud_api_secret: "S".to_string(),
        };
        let shown = format!("{:?}", config);
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("<redacted>"));
    }

    #[test]
    fn test_default_options() {
        let options = ProviderOptions::default();
        assert_eq!(options.login.timeout, Duration::from_secs(1800));
        assert_eq!(options.provisioning.timeout, Duration::from_secs(1200));
    }
}
