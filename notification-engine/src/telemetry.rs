use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the tracing stack for binaries embedding the engine.
/// Honors `RUST_LOG`, defaulting to `info`.
pub fn init() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;
    Ok(())
}
