//! Structured logging setup via `tracing-subscriber`.

use tracing_subscriber::EnvFilter;

/// Installs a `tracing` subscriber filtered by `level` (or `RUST_LOG` if set).
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
