// ABOUTME: Holds messages back until the license check has a verdict
// ABOUTME: Valid releases them in order, invalid discards them

use cartograph_events::{HandlerError, Listener, ListenerHandle, Message, MessageKind};
use cartograph_logging::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::bus::MessageBus;

/// A message waiting on the license verdict
struct DeferredEntry {
    message: Message,
    sequence: u64,
}

#[derive(Default)]
struct GateState {
    validity: Option<bool>,
    pending: Vec<DeferredEntry>,
    next_sequence: u64,
}

struct GateInner {
    bus: MessageBus,
    state: Mutex<GateState>,
}

/// Defers messages until the license is known to be valid.
///
/// Before a verdict arrives every message is held. A valid verdict publishes
/// the held messages in the order they arrived and lets later ones straight
/// through; an invalid verdict discards them, and later ones keep being held
/// until a valid verdict arrives.
#[derive(Clone)]
pub struct LicenseGate {
    inner: Arc<GateInner>,
}

impl LicenseGate {
    pub fn new(bus: MessageBus) -> Self {
        Self {
            inner: Arc::new(GateInner {
                bus,
                state: Mutex::new(GateState::default()),
            }),
        }
    }

    pub fn dispatch_when_license_valid(&self, message: Message) {
        let mut state = self.inner.state.lock();
        if state.validity == Some(true) {
            drop(state);
            self.inner.bus.publish_as_task(message);
            return;
        }

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        debug!(kind = %message.kind(), sequence, "Holding message until license is valid");
        state.pending.push(DeferredEntry { message, sequence });
    }

    /// Record the verdict and release or discard whatever is held
    pub fn resolve(&self, valid: bool) {
        let released = {
            let mut state = self.inner.state.lock();
            state.validity = Some(valid);
            std::mem::take(&mut state.pending)
        };

        if valid {
            info!(released = released.len(), "License valid, releasing held messages");
            for entry in released {
                self.inner.bus.publish_as_task(entry.message);
            }
        } else {
            warn!(discarded = released.len(), "License invalid, discarding held messages");
            for entry in &released {
                debug!(kind = %entry.message.kind(), sequence = entry.sequence, "Discarded held message");
            }
        }
    }

    pub fn validity(&self) -> Option<bool> {
        self.inner.state.lock().validity
    }

    pub fn pending_len(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    /// Subscribe a clone of this gate to the license message kinds
    pub fn subscribe(&self, bus: &MessageBus) -> ListenerHandle {
        let handle = ListenerHandle::new(self.clone());
        bus.subscribe_all(
            &[
                MessageKind::DispatchWhenLicenseValid,
                MessageKind::LicenseValidity,
            ],
            &handle,
        );
        handle
    }
}

impl Listener for LicenseGate {
    fn name(&self) -> &str {
        "license-gate"
    }

    fn handle(&mut self, message: &Message) -> Result<(), HandlerError> {
        match message {
            Message::DispatchWhenLicenseValid(held) => {
                self.dispatch_when_license_valid((**held).clone());
                Ok(())
            }
            Message::LicenseValidity { valid } => {
                self.resolve(*valid);
                Ok(())
            }
            other => Err(HandlerError::unsupported(other)),
        }
    }
}
