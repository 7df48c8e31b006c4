use crate::models::config::LoggingConfig;
use anyhow::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber. The returned guard flushes the file writer
/// on drop, so keep it alive for the life of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout = fmt::layer().with_writer(std::io::stdout).with_ansi(true);

    if !config.json_file {
        tracing_subscriber::registry().with(filter).with(stdout).try_init()?;
        info!("Logging initialized");
        return Ok(None);
    }

    std::fs::create_dir_all(&config.directory)?;
    let appender = tracing_appender::rolling::daily(&config.directory, &config.file_prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout)
        .with(fmt::layer().with_writer(writer).with_ansi(false).json())
        .try_init()?;

    info!(directory = %config.directory, "Logging initialized");
    Ok(Some(guard))
}
