//! Console tracing setup for binaries and examples.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize console-only tracing.
///
/// Respects `RUST_LOG`; falls back to `info,anx=debug` when unset, or
/// `debug` for everything when `verbose` is true.
///
/// # Errors
///
/// Returns error if a global subscriber is already installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let default_filter = if verbose { "debug" } else { "info,anx=debug" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()?;

    Ok(())
}
