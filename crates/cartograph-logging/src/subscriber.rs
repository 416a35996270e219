// ABOUTME: Global tracing subscriber initialization
// ABOUTME: Stacks the level filter under the configured output layers

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{prelude::*, reload, util::SubscriberInitExt};

use crate::config::LoggingConfig;
use crate::layers::{create_env_filter, create_output_layers};
use crate::reload::LoggingReloadHandle;

/// Keeps the non-blocking file writer alive; dropping it flushes pending lines
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber with a reloadable level filter
pub(crate) fn init_subscriber_with_reload(
    config: LoggingConfig,
) -> Result<(LoggingReloadHandle, LoggingGuard)> {
    let env_filter = create_env_filter(&config).context("Failed to create environment filter")?;
    let (filter_layer, filter_handle) = reload::Layer::new(env_filter);
    let registry = tracing_subscriber::registry().with(filter_layer);

    let (layers, file_guard) = create_output_layers(&config)?;
    registry
        .with(layers)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    tracing::info!(
        log_level = %config.level.0,
        console_output = config.output.console,
        file_output = config.output.file,
        json_output = config.output.json,
        file_path = %config.file.path.display(),
        "Cartograph logging initialized"
    );
    Ok((
        LoggingReloadHandle::new(filter_handle, config),
        LoggingGuard { _file: file_guard },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputConfig;
    use tempfile::tempdir;

    #[test]
    fn test_second_global_install_fails_cleanly() {
        let temp_dir = tempdir().unwrap();
        let mut config = LoggingConfig::default();
        config.output = OutputConfig {
            console: false,
            file: true,
            json: false,
            pretty_console: false,
        };
        config.file.path = temp_dir.path().join("carto.log");

        // The first install may already have happened in another test of this binary
        let _ = init_subscriber_with_reload(config.clone());
        let second = init_subscriber_with_reload(config);
        assert!(second.is_err());
    }
}
