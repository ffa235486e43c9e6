//! Logging setup for processes embedding the core.
//!
//! Both the interactive front end and the headless scheduler install the
//! subscriber once at startup from their shared core configuration.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;

/// Install the global tracing subscriber for this process.
///
/// `RUST_LOG` wins when set; otherwise the configured directive applies,
/// falling back to `info` when it does not parse.
pub fn init(config: &LogConfig) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| filter_from(&config.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}

fn filter_from(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"))
}
