// ABOUTME: Single-threaded task scheduling and typed message delivery
// ABOUTME: Everything that mutates shared application state funnels through here

pub mod bus;
pub mod error;
pub mod license;
pub mod scheduler;

pub use bus::MessageBus;
pub use error::{SchedulerError, TaskError};
pub use license::LicenseGate;
pub use scheduler::{DEFAULT_SLOW_TASK_THRESHOLD, Task, TaskScheduler, WORKER_THREAD_NAME};

// Re-export the message vocabulary so consumers need a single import path
pub use cartograph_events::{
    HandlerError, Listener, ListenerHandle, ListenerId, Message, MessageDispatch, MessageKind,
    RefreshRequest, StatusMessage,
};
