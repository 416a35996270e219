// ABOUTME: Error types for the scheduler and the tasks it runs
// ABOUTME: Spawn failures are fatal, task failures are logged and swallowed

use cartograph_events::HandlerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Failed to spawn the task scheduler worker thread: {source}")]
    Spawn {
        #[source]
        source: std::io::Error,
    },
}

/// Failure reported by a task body
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{message}")]
    Failed { message: String },

    #[error(transparent)]
    Handler(#[from] HandlerError),
}

impl TaskError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}
