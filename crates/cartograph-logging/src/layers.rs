// ABOUTME: Output layer construction for console, JSON and rolling file sinks
// ABOUTME: Layers are generic over the subscriber so they stack on reloadable filters

use anyhow::{Context, Result};
use std::fs;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::Directive,
    fmt::{self, format::FmtSpan},
    registry::LookupSpan,
};

use crate::config::{FileConfig, LoggingConfig, OutputConfig, Rotation};

pub type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Human-readable stdout layer, `None` when console output is off or JSON replaces it
pub fn create_console_layer<S>(config: &OutputConfig) -> Option<BoxedLayer<S>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    if !config.console || config.json {
        return None;
    }

    let layer = if config.pretty_console {
        fmt::layer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .pretty()
            .boxed()
    } else {
        fmt::layer().with_target(true).compact().boxed()
    };

    Some(layer)
}

/// JSON lines on stdout for machine consumption
pub fn create_json_layer<S>(config: &OutputConfig) -> Option<BoxedLayer<S>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    if !config.json {
        return None;
    }

    Some(
        fmt::layer()
            .json()
            .with_target(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
    )
}

fn rolling_appender(config: &FileConfig) -> Result<RollingFileAppender> {
    let directory = config
        .path
        .parent()
        .context("Log file path has no parent directory")?;
    fs::create_dir_all(directory)
        .with_context(|| format!("Failed to create log directory: {}", directory.display()))?;

    let file_name = config
        .path
        .file_name()
        .and_then(|n| n.to_str())
        .context("Invalid log file path")?;

    let rotation = match config.rotation {
        Rotation::Hourly => rolling::Rotation::HOURLY,
        Rotation::Daily => rolling::Rotation::DAILY,
        Rotation::Never => rolling::Rotation::NEVER,
    };

    RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(file_name)
        .max_log_files(config.max_files.max(1))
        .build(directory)
        .context("Failed to create rolling log file appender")
}

/// Rolling file layer plus the guard that flushes it when dropped
pub fn create_file_layer<S>(config: &FileConfig) -> Result<(BoxedLayer<S>, WorkerGuard)>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let (writer, guard) = tracing_appender::non_blocking(rolling_appender(config)?);

    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .boxed();

    Ok((layer, guard))
}

/// Every enabled output layer for `config`, with the file guard if any
pub fn create_output_layers<S>(
    config: &LoggingConfig,
) -> Result<(Vec<BoxedLayer<S>>, Option<WorkerGuard>)>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let mut layers = Vec::new();
    layers.extend(create_console_layer(&config.output));
    layers.extend(create_json_layer(&config.output));

    let mut guard = None;
    if config.output.file {
        let (layer, file_guard) = create_file_layer(&config.file)?;
        layers.push(layer);
        guard = Some(file_guard);
    }

    Ok((layers, guard))
}

/// Build the level filter; an explicit `RUST_LOG` wins over the config
pub fn create_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(directives) = std::env::var("RUST_LOG") {
        return Ok(EnvFilter::new(directives));
    }

    let mut filter = EnvFilter::new(config.level.0.as_str().to_ascii_lowercase());
    for (module, level) in &config.module_levels {
        let directive = format!("{module}={}", level.0.as_str().to_ascii_lowercase())
            .parse::<Directive>()
            .with_context(|| format!("Invalid filter directive for module '{module}'"))?;
        filter = filter.add_directive(directive);
    }

    Ok(filter)
}
