// ABOUTME: Public API for cartograph logging built on tokio-tracing
// ABOUTME: Centralized configuration and initialization for structured logging

pub mod config;
pub mod layers;
pub mod performance;
pub mod reload;
pub mod subscriber;

#[cfg(test)]
mod structured_tests;

// Re-export tracing macros so every crate logs through one path
pub use tracing::{Level, Span, debug, error, info, instrument, span, trace, warn};

pub use config::{LogLevel, LoggingConfig, level_for_verbosity};
pub use performance::{OperationStats, PerfStats, PerfTimer};
pub use reload::LoggingReloadHandle;
pub use subscriber::LoggingGuard;

use subscriber::init_subscriber_with_reload;

use anyhow::Result;

/// Initialize logging and return the handle used to change levels later
pub fn init_logging_with_reload(config: LoggingConfig) -> Result<(LoggingReloadHandle, LoggingGuard)> {
    init_subscriber_with_reload(config)
}
