//! Confluent Cloud provider
//!
//! Reconciles declared Confluent Cloud objects (environments, Kafka clusters,
//! API keys, connectors, schema registries and service accounts) against the
//! control-plane API, on behalf of an infrastructure-as-code host.
//!
//! # Overview
//!
//! - **Session**: one authenticated client per configuration, with login
//!   retried under exponential backoff while the API rate-limits it
//! - **Reconcilers**: a [`Resource`] per kind; creates that hit an upstream
//!   object which is still provisioning are retried until a deadline
//! - **Diff suppression**: connector configuration keys the API derives or
//!   masks never show up as drift
//! - **Import**: composite ids such as `<environment_id>/<cluster_id>/<name>`
//! - **Host contract**: [`ProviderService`], implemented by [`CcloudProvider`]
//!
//! The HTTP client itself is not part of this crate. Supply one through a
//! [`ClientFactory`]; [`testing::FakeCloud`] is an in-memory implementation.
//!
//! # Quick Start
//!
//! ```ignore
//! use ccloud_provider::{init_logging, CcloudProvider, ProviderConfig, ProviderService};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging();
//!     let provider = CcloudProvider::new(|config: &ProviderConfig| my_http_client(config));
//!     provider.configure(json!({})).await?; // credentials from CONFLUENT_CLOUD_*
//!     let env = provider
//!         .create("confluentcloud_environment", json!({"name": "prod"}))
//!         .await?;
//!     println!("{}", env["id"]);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backoff;
pub mod classify;
pub mod client;
pub mod config;
pub mod diff;
pub mod error;
pub mod import;
pub mod logging;
pub mod plan;
pub mod provider;
pub mod resource;
pub mod resources;
pub mod retry;
pub mod schema;
pub mod service;
pub mod session;
pub mod testing;
pub mod types;
pub mod validation;

pub use client::{ApiError, ClientFactory, CloudClient};
pub use config::{ProviderConfig, ProviderOptions};
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::CcloudProvider;
pub use resource::{DataSource, ReconcileContext, Resource, ResourceData};
pub use schema::ProviderSchema;
pub use service::{stop_on_signal, ProviderService};
pub use session::{ApiKeyAuth, Session};
pub use types::{AttributeChange, ImportedResource, PlanResult, ProviderMetadata};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for implementors of CloudClient
pub use async_trait::async_trait;

pub use serde_json;
pub use tracing;
