use anyhow::Result;
use tracing::Level;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging for the CLI
///
/// `RUST_LOG` wins over `log_level` when set. Output goes to stderr so
/// command output on stdout stays machine readable.
pub fn init_logging(log_level: Level) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(log_level).into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()?;

    Ok(())
}

fn default_filter(level: Level) -> String {
    let level_str = level.as_str().to_lowercase();
    format!("portal_cli={level_str},portal_client={level_str}")
}
