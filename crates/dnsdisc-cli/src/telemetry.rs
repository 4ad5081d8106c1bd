//! Process-wide tracing setup.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber once, at startup.
///
/// `RUST_LOG` takes precedence over the `--log-level` flag when set.
pub fn init(log_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    Ok(())
}
