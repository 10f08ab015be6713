//! Tracing setup for binaries and tests.

use std::sync::Once;

use tracing_subscriber::{
    EnvFilter, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError,
};

static INIT: Once = Once::new();

/// Installs a fmt subscriber filtered by `RUST_LOG`, or by `default_filter`.
///
/// Only the first call has an effect. A subscriber already installed by the
/// host program is kept.
pub fn init_tracing(default_filter: &str) {
    INIT.call_once(|| {
        if let Err(e) = install(default_filter) {
            tracing::debug!(error = %e, "tracing subscriber already installed");
        }
    });
}

fn install(default_filter: &str) -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice() {
        init_tracing("debug");
        init_tracing("warn");
        tracing::debug!("tracing initialized");
    }

    #[test]
    fn test_install_over_existing_subscriber_fails() {
        init_tracing("debug");
        assert!(install("warn").is_err());
    }
}
