//! Tracing bootstrap for the marketplace binary.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global `fmt` subscriber filtered by `filter`.
///
/// A malformed filter falls back to [`crate::config::DEFAULT_LOG_FILTER`].
/// Calling this twice is harmless: the second install is ignored.
pub fn init_tracing(filter: &str) {
    let env_filter = EnvFilter::try_new(filter)
        .unwrap_or_else(|_| EnvFilter::new(crate::config::DEFAULT_LOG_FILTER));

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
