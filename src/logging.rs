//! Log subscriber construction.
//!
//! The subscriber is returned to the caller instead of being installed as
//! the process-wide default, so the binary scopes it with
//! `tracing::subscriber::with_default` and tests stay free of global state.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
fn default_filter(debug: bool) -> EnvFilter {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    EnvFilter::new(level.as_str().to_lowercase())
}

/// Builds a stderr subscriber at INFO, or DEBUG when `debug` is set.
///
/// `RUST_LOG`, when present and valid, takes precedence.
pub fn subscriber(debug: bool) -> impl tracing::Subscriber + Send + Sync + 'static {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(debug));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish()
}
