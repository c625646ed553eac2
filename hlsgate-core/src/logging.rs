use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LoggingConfig;

/// Initialize structured logging based on configuration
///
/// `RUST_LOG` takes precedence over the configured level. Supports JSON
/// (production) and pretty (development) output, optionally appended to a file.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = env_filter(config)?;
    let writer = log_writer(config)?;
    let registry = tracing_subscriber::registry().with(env_filter);

    if config.format.as_str() == "json" {
        let json_layer = fmt::layer()
            .json()
            .with_writer(writer)
            .with_span_events(FmtSpan::CLOSE)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_line_number(true)
            .with_file(true);
        registry.with(json_layer).try_init()?;
    } else {
        let pretty_layer = fmt::layer()
            .pretty()
            .with_writer(writer)
            .with_ansi(config.file_path.is_none())
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_line_number(true)
            .with_file(false);
        registry.with(pretty_layer).try_init()?;
    }

    Ok(())
}

fn env_filter(config: &LoggingConfig) -> anyhow::Result<EnvFilter> {
    let log_level = parse_log_level(&config.level)?;

    Ok(EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string())))
}

/// Stdout, or the configured file opened for append
fn log_writer(config: &LoggingConfig) -> anyhow::Result<BoxMakeWriter> {
    let Some(file_path) = &config.file_path else {
        return Ok(BoxMakeWriter::new(std::io::stdout));
    };

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(file_path)
        .map_err(|e| anyhow::anyhow!("Failed to open log file {file_path}: {e}"))?;

    Ok(BoxMakeWriter::new(Arc::new(file)))
}

/// Parse log level string to tracing Level
pub fn parse_log_level(level: &str) -> anyhow::Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(anyhow::anyhow!("Invalid log level: {level}")),
    }
}
