// ABOUTME: Runtime log level reloading without restarting the application
// ABOUTME: Wraps the tracing-subscriber reload handle together with the active config

use anyhow::{Context, Result};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{EnvFilter, Registry, reload};

use crate::config::LoggingConfig;
use crate::layers::create_env_filter;

/// Cloneable handle for changing log filters at runtime
#[derive(Clone)]
pub struct LoggingReloadHandle {
    filter_handle: reload::Handle<EnvFilter, Registry>,
    current_config: Arc<RwLock<LoggingConfig>>,
}

impl LoggingReloadHandle {
    pub fn new(filter_handle: reload::Handle<EnvFilter, Registry>, config: LoggingConfig) -> Self {
        Self {
            filter_handle,
            current_config: Arc::new(RwLock::new(config)),
        }
    }

    fn apply(&self, config: &LoggingConfig) -> Result<()> {
        let filter = create_env_filter(config).context("Failed to create new environment filter")?;
        self.filter_handle
            .reload(filter)
            .context("Failed to reload log filter")
    }

    pub fn update_log_level(&self, level: Level) -> Result<()> {
        let mut config = self.current_config.write();
        config.level = level.into();
        self.apply(&config)?;

        tracing::info!(new_level = %level, "Log level updated at runtime");
        Ok(())
    }

    pub fn current_config(&self) -> LoggingConfig {
        self.current_config.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::prelude::*;

    #[test]
    fn test_update_level_on_local_subscriber() {
        let config = LoggingConfig::default();
        let (filter, handle) = reload::Layer::new(create_env_filter(&config).unwrap());
        let subscriber = tracing_subscriber::registry().with(filter);
        let reload_handle = LoggingReloadHandle::new(handle, config);

        tracing::subscriber::with_default(subscriber, || {
            reload_handle.update_log_level(Level::TRACE).unwrap();
            assert_eq!(reload_handle.current_config().level.0, Level::TRACE);
            reload_handle.update_log_level(Level::ERROR).unwrap();
        });

        assert_eq!(reload_handle.current_config().level.0, Level::ERROR);
    }
}
