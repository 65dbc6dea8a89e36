use std::fs::OpenOptions;
use std::io;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::LogConfig;
use crate::error::{FoodtruckError, Result};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `log.filter`. When `log.file` is set, every line goes to both
/// stdout and the file.
pub fn init_tracing(config: &LogConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|e| FoodtruckError::InvalidConfig(format!("bad log filter: {e}")))?;

    let writer = if config.file.is_empty() {
        BoxMakeWriter::new(io::stdout)
    } else {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.file)
            .map_err(|e| FoodtruckError::InvalidConfig(format!("failed to open log file: {e}")))?;
        BoxMakeWriter::new(io::stdout.and(Arc::new(file)))
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_level(true);

    Registry::default()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| FoodtruckError::InvalidConfig(format!("failed to set global subscriber: {e}")))?;

    info!(filter = %config.filter, file = %config.file, "[log] tracing initialized");
    Ok(())
}
