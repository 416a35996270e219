// ABOUTME: Cross-crate message definitions for decoupled communication
// ABOUTME: Closed message enum plus the listener and dispatch traits built on it

pub mod event_bus;
pub mod handler;
pub mod message;

pub use event_bus::MessageDispatch;
pub use handler::{HandlerError, Listener, ListenerHandle, ListenerId};
pub use message::{Message, MessageKind, RefreshRequest, StatusMessage};
