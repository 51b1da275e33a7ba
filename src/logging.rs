//! # Structured Logging
//!
//! Environment-aware console logging for binaries and tests embedding the
//! executor. Library code only emits `tracing` events and never installs a
//! subscriber on its own; call [`init`] from the process entry point.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize console logging once. `RUST_LOG` overrides the default level;
/// an already-installed global subscriber is left in place.
pub fn init() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level()));

        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_filter(filter),
        );

        // try_init so embedding applications that already set a global
        // subscriber keep theirs.
        if subscriber.try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized");
        }
    });
}

/// Default log level based on the deployment environment.
fn default_level() -> String {
    match get_environment().as_str() {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Current environment from environment variables.
fn get_environment() -> String {
    std::env::var("EXECUTOR_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}
