// ABOUTME: Runtime configuration for the cartograph binary
// ABOUTME: Loaded from an optional TOML file, every field has a default

use cartograph_logging::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

/// Name shown in window titles and log lines
pub const DEFAULT_APP_NAME: &str = "Cartograph";

const DEFAULT_SLOW_TASK_MS: u64 = 250;
const MAX_SLOW_TASK_MS: u64 = 60_000;

fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_string()
}

fn default_slow_task_ms() -> u64 {
    DEFAULT_SLOW_TASK_MS
}

fn default_true() -> bool {
    true
}

/// Location of the persisted application settings
pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("cartograph")
        .join("settings.toml")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Application settings file (color scheme, recent projects)
    #[serde(default = "default_settings_path")]
    pub settings_path: PathBuf,

    /// Tasks slower than this log a warning
    #[serde(default = "default_slow_task_ms")]
    pub slow_task_threshold_ms: u64,

    /// Hold start-up messages until the license is checked
    #[serde(default = "default_true")]
    pub license_check: bool,

    /// Extra `-v` levels applied on top of the command line
    #[serde(default)]
    pub verbosity: u8,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            settings_path: default_settings_path(),
            slow_task_threshold_ms: DEFAULT_SLOW_TASK_MS,
            license_check: true,
            verbosity: 0,
        }
    }
}

impl AppConfig {
    /// Load from `path`; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config.sanitized())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.app_name.trim().is_empty() {
            return Err("Application name must not be empty".to_string());
        }

        if self.slow_task_threshold_ms == 0 {
            return Err("Slow task threshold must be greater than 0".to_string());
        }

        if self.slow_task_threshold_ms > MAX_SLOW_TASK_MS {
            return Err("Slow task threshold should not exceed 60 seconds".to_string());
        }

        Ok(())
    }

    /// Replace invalid values with defaults, logging what changed
    pub fn sanitized(mut self) -> Self {
        if let Err(reason) = self.validate() {
            warn!(reason = %reason, "Invalid configuration, falling back to defaults where needed");

            if self.app_name.trim().is_empty() {
                self.app_name = default_app_name();
            }
            if self.slow_task_threshold_ms == 0 || self.slow_task_threshold_ms > MAX_SLOW_TASK_MS
            {
                self.slow_task_threshold_ms = DEFAULT_SLOW_TASK_MS;
            }
        }
        self
    }

    pub fn slow_task_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_task_threshold_ms)
    }
}
