// ABOUTME: Logging configuration and environment variable overrides
// ABOUTME: Covers levels, per-module directives, output targets and log file rotation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use tracing::Level;

/// Serde-friendly wrapper around `tracing::Level`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLevel(pub Level);

impl Serialize for LogLevel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.as_str().to_ascii_lowercase())
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D>(deserializer: D) -> Result<LogLevel, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_log_level(&raw)
            .map(LogLevel)
            .map_err(serde::de::Error::custom)
    }
}

impl From<Level> for LogLevel {
    fn from(level: Level) -> Self {
        LogLevel(level)
    }
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        level.0
    }
}

/// Top-level logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Global log level
    pub level: LogLevel,

    /// Per-module level overrides, e.g. `cartograph_core = "trace"`
    pub module_levels: HashMap<String, LogLevel>,

    pub output: OutputConfig,

    pub file: FileConfig,
}

/// Which sinks receive log output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub console: bool,
    pub file: bool,
    /// Emit JSON lines on stdout instead of human-readable console output
    pub json: bool,
    pub pretty_console: bool,
}

/// How often the log file rolls over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    Hourly,
    #[default]
    Daily,
    Never,
}

/// Log file location and retention
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Defaults to `<config dir>/cartograph/cartograph.log`
    pub path: PathBuf,
    pub rotation: Rotation,
    /// Number of rotated files kept on disk
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel(Level::INFO),
            module_levels: HashMap::new(),
            output: OutputConfig::default(),
            file: FileConfig::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            console: true,
            file: true,
            json: false,
            pretty_console: false,
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            path: default_log_file_path(),
            rotation: Rotation::default(),
            max_files: 5,
        }
    }
}

impl LoggingConfig {
    /// Default configuration with environment overrides applied
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply `CARTOGRAPH_LOG*` and `RUST_LOG` overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(level) = env::var("CARTOGRAPH_LOG") {
            self.level = LogLevel(parse_log_level(&level).context("Invalid CARTOGRAPH_LOG level")?);
        } else if let Ok(directives) = env::var("RUST_LOG") {
            self.parse_rust_log(&directives)?;
        }

        if env::var("CARTOGRAPH_LOG_JSON").is_ok() {
            self.output.json = true;
        }
        if env::var("CARTOGRAPH_LOG_NO_CONSOLE").is_ok() {
            self.output.console = false;
        }
        if env::var("CARTOGRAPH_LOG_NO_FILE").is_ok() {
            self.output.file = false;
        }

        Ok(())
    }

    /// Parse `RUST_LOG` style directives ("info,cartograph_core=debug")
    fn parse_rust_log(&mut self, directives: &str) -> Result<()> {
        for directive in directives.split(',').map(str::trim) {
            if directive.is_empty() {
                continue;
            }

            match directive.split_once('=') {
                Some((module, level)) => {
                    let level = parse_log_level(level).with_context(|| {
                        format!("Invalid log level '{level}' for module '{module}'")
                    })?;
                    self.module_levels
                        .insert(module.to_string(), LogLevel(level));
                }
                None => {
                    self.level = LogLevel(
                        parse_log_level(directive)
                            .with_context(|| format!("Invalid global log level '{directive}'"))?,
                    );
                }
            }
        }
        Ok(())
    }

    /// Map a `-v` count onto a global level
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.level = LogLevel(level_for_verbosity(verbosity));
        self
    }
}

/// Level selected by a `-v` count
pub fn level_for_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn default_log_file_path() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join("cartograph").join("cartograph.log"),
        None => PathBuf::from("cartograph.log"),
    }
}

/// Parse a case-insensitive level name
pub fn parse_log_level(raw: &str) -> Result<Level> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "Invalid log level: {raw}. Must be one of: trace, debug, info, warn, error"
        ),
    }
}
