// ABOUTME: Listener trait and shareable listener handles for the message bus
// ABOUTME: Handles give listeners a stable identity for subscribe and unsubscribe

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::message::{Message, MessageKind};

/// Receives messages of the kinds it is subscribed to
pub trait Listener: Send {
    /// Name used in logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn handle(&mut self, message: &Message) -> Result<(), HandlerError>;
}

/// Listener failures, logged by the bus and never propagated to publishers
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("Listener does not handle {kind} messages")]
    Unsupported { kind: MessageKind },

    #[error("Listener failed to process {kind} message: {message}")]
    ProcessingFailed { kind: MessageKind, message: String },

    #[error("Listener internal error: {source}")]
    Internal {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl HandlerError {
    pub fn unsupported(message: &Message) -> Self {
        Self::Unsupported {
            kind: message.kind(),
        }
    }

    pub fn processing_failed(kind: MessageKind, message: impl Into<String>) -> Self {
        Self::ProcessingFailed {
            kind,
            message: message.into(),
        }
    }

    pub fn internal<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Internal {
            source: Box::new(error),
        }
    }
}

/// Process-unique identity of a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Cloneable reference to a listener; clones share identity and state
#[derive(Clone)]
pub struct ListenerHandle {
    id: ListenerId,
    name: Arc<str>,
    listener: Arc<Mutex<dyn Listener>>,
}

impl ListenerHandle {
    pub fn new<L: Listener + 'static>(listener: L) -> Self {
        Self::from_shared(Arc::new(Mutex::new(listener)))
    }

    /// Wrap a listener the caller keeps its own typed reference to
    pub fn from_shared<L: Listener + 'static>(listener: Arc<Mutex<L>>) -> Self {
        let name: Arc<str> = Arc::from(listener.lock().name());
        let listener: Arc<Mutex<dyn Listener>> = listener;
        Self {
            id: ListenerId::next(),
            name,
            listener,
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the listener on `message`, holding its lock for the duration
    pub fn deliver(&self, message: &Message) -> Result<(), HandlerError> {
        self.listener.lock().handle(message)
    }
}

impl PartialEq for ListenerHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ListenerHandle {}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::StatusMessage;

    struct Recorder {
        seen: Vec<MessageKind>,
    }

    impl Listener for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn handle(&mut self, message: &Message) -> Result<(), HandlerError> {
            match message {
                Message::ActivateWindow | Message::Status(_) => {
                    self.seen.push(message.kind());
                    Ok(())
                }
                other => Err(HandlerError::unsupported(other)),
            }
        }
    }

    #[test]
    fn test_deliver_reaches_shared_state() {
        let shared = Arc::new(Mutex::new(Recorder { seen: Vec::new() }));
        let handle = ListenerHandle::from_shared(shared.clone());

        handle.deliver(&Message::ActivateWindow).unwrap();
        handle
            .deliver(&Message::status(StatusMessage::info("ready")))
            .unwrap();

        assert_eq!(
            shared.lock().seen,
            vec![MessageKind::ActivateWindow, MessageKind::Status]
        );
        assert_eq!(handle.name(), "recorder");
    }

    #[test]
    fn test_unsupported_message_is_an_error() {
        let handle = ListenerHandle::new(Recorder { seen: Vec::new() });
        let err = handle.deliver(&Message::finished_parsing("/p/a.toml")).unwrap_err();
        assert!(matches!(
            err,
            HandlerError::Unsupported {
                kind: MessageKind::FinishedParsing
            }
        ));
    }

    #[test]
    fn test_clones_share_identity() {
        let first = ListenerHandle::new(Recorder { seen: Vec::new() });
        let second = ListenerHandle::new(Recorder { seen: Vec::new() });

        assert_eq!(first.clone(), first);
        assert_ne!(first, second);
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn test_default_name_is_type_name() {
        struct Anonymous;
        impl Listener for Anonymous {
            fn handle(&mut self, _message: &Message) -> Result<(), HandlerError> {
                Ok(())
            }
        }

        let handle = ListenerHandle::new(Anonymous);
        assert!(handle.name().ends_with("Anonymous"));
    }
}
