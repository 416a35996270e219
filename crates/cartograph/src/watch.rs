// ABOUTME: Waits for a project load to finish indexing or fail
// ABOUTME: Used by the headless CLI to know when to shut down

use cartograph_core::{HandlerError, Listener, ListenerHandle, Message, MessageBus, MessageKind};
use std::sync::mpsc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Finished,
    Failed(String),
    TimedOut,
}

struct OutcomeListener {
    sender: mpsc::Sender<LoadOutcome>,
}

impl Listener for OutcomeListener {
    fn name(&self) -> &str {
        "load-watcher"
    }

    fn handle(&mut self, message: &Message) -> Result<(), HandlerError> {
        let outcome = match message {
            Message::FinishedParsing { .. } => LoadOutcome::Finished,
            Message::Status(status) if status.is_error => LoadOutcome::Failed(status.text.clone()),
            Message::Status(_) => return Ok(()),
            other => return Err(HandlerError::unsupported(other)),
        };
        // The watcher may already have given up
        let _ = self.sender.send(outcome);
        Ok(())
    }
}

/// Subscribes to completion and error messages until dropped
pub struct ProjectLoadWatcher {
    bus: MessageBus,
    listener: ListenerHandle,
    outcomes: mpsc::Receiver<LoadOutcome>,
}

impl ProjectLoadWatcher {
    pub fn subscribe(bus: &MessageBus) -> Self {
        let (sender, outcomes) = mpsc::channel();
        let listener = ListenerHandle::new(OutcomeListener { sender });
        bus.subscribe_all(&[MessageKind::FinishedParsing, MessageKind::Status], &listener);
        Self {
            bus: bus.clone(),
            listener,
            outcomes,
        }
    }

    /// First outcome observed, or `TimedOut`
    pub fn wait(&self, timeout: Duration) -> LoadOutcome {
        self.outcomes
            .recv_timeout(timeout)
            .unwrap_or(LoadOutcome::TimedOut)
    }
}

impl Drop for ProjectLoadWatcher {
    fn drop(&mut self) {
        self.bus.unsubscribe_all(&self.listener);
    }
}
