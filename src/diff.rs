//! Diff suppression for connector configuration.
//!
//! The API decorates connector configuration with keys it derives from the
//! environment and masks sensitive values on read. Neither reflects drift.

use std::sync::LazyLock;

use regex::Regex;

/// Configuration keys the API fills in itself.
pub const IGNORED_CONNECTOR_CONFIGS: &[&str] = &[
    "config.kafka.endpoint",
    "config.kafka.region",
    "config.kafka.dedicated",
    "config.cloud.provider",
    "config.cloud.environment",
    "config.valid.kafka.api.key",
    "config.schema.registry.url",
];

/// Prefix of the API's internal configuration namespace.
pub const INTERNAL_CONFIG_PREFIX: &str = "config.internal.";

// The API never returns real sensitive values; it substitutes asterisks.
static RE_MASKED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*+").unwrap());

/// Whether a value is a masked placeholder.
pub fn is_masked(value: &str) -> bool {
    RE_MASKED.is_match(value)
}

/// Decide whether a difference in connector configuration at `key` (a
/// `config.`-prefixed path) between `old` and `new` should be ignored.
pub fn suppress_connector_config_diff(key: &str, old: &str, _new: &str) -> bool {
    if IGNORED_CONNECTOR_CONFIGS.contains(&key) {
        return true;
    }
    if key.starts_with(INTERNAL_CONFIG_PREFIX) {
        return true;
    }
    is_masked(old)
}
