//! Structured logging setup.
//!
//! Everything is written to **stderr**; stdout belongs to whatever transport
//! the host uses to talk to the provider. Filtering follows `RUST_LOG`, e.g.
//!
//! ```bash
//! RUST_LOG=ccloud_provider=debug ./terraform-provider-confluentcloud
//! ```
//!
//! Retry loops log every transient failure at `info`, so the default level
//! shows login backoff and provisioning waits as they happen.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn subscriber(default_level: &str) -> impl tracing::Subscriber + Send + Sync + 'static {
    tracing_subscriber::registry().with(filter(default_level)).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false),
    )
}

/// Install the global subscriber at `info` unless `RUST_LOG` says otherwise.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default("info");
}

/// Like [`init_logging`] with a different default level.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging_with_default(default_level: &str) {
    subscriber(default_level).init();
}

/// Install the global subscriber unless one is already set. Returns whether
/// this call installed it.
pub fn try_init_logging() -> bool {
    subscriber("info").try_init().is_ok()
}
