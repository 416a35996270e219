// ABOUTME: Kind-keyed publish/subscribe registry on top of the task scheduler
// ABOUTME: Delivers synchronously or as scheduler tasks depending on delivery mode

use cartograph_events::{ListenerHandle, Message, MessageDispatch, MessageKind};
use cartograph_logging::{debug, info, trace, warn};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, ThreadId};

use crate::scheduler::{Task, TaskScheduler};

struct BusInner {
    registry: RwLock<HashMap<MessageKind, Vec<ListenerHandle>>>,
    scheduler: Arc<TaskScheduler>,
    deliver_as_tasks: AtomicBool,
    shut_down: AtomicBool,
    // Messages published while the same thread is already delivering
    nested: Mutex<HashMap<ThreadId, VecDeque<Message>>>,
}

/// Removes the thread's nested-delivery queue even if a listener panics
struct DeliveryScope<'a> {
    inner: &'a BusInner,
    thread: ThreadId,
}

impl Drop for DeliveryScope<'_> {
    fn drop(&mut self) {
        if let Some(dropped) = self.inner.nested.lock().remove(&self.thread)
            && !dropped.is_empty()
        {
            warn!(
                dropped = dropped.len(),
                "Delivery aborted with nested messages still queued"
            );
        }
    }
}

impl BusInner {
    /// Deliver `message` and anything its listeners publish on this thread.
    ///
    /// A listener that publishes while being delivered to gets its message
    /// queued until the current fan-out completes, so fan-outs never interleave
    /// and a listener never re-enters itself.
    fn publish_now(&self, message: Message) {
        let thread = thread::current().id();
        {
            let mut nested = self.nested.lock();
            if let Some(queue) = nested.get_mut(&thread) {
                trace!(kind = %message.kind(), "Deferring nested publish until current delivery completes");
                queue.push_back(message);
                return;
            }
            nested.insert(thread, VecDeque::new());
        }

        let _scope = DeliveryScope {
            inner: self,
            thread,
        };

        let mut next = Some(message);
        while let Some(message) = next {
            self.deliver(&message);
            next = self
                .nested
                .lock()
                .get_mut(&thread)
                .and_then(VecDeque::pop_front);
        }
    }

    fn deliver(&self, message: &Message) {
        let kind = message.kind();
        let listeners = self.registry.read().get(&kind).cloned().unwrap_or_default();

        if listeners.is_empty() {
            trace!(kind = %kind, "No listeners subscribed");
            return;
        }

        for listener in &listeners {
            if let Err(err) = listener.deliver(message) {
                warn!(
                    listener = listener.name(),
                    kind = %kind,
                    error = %err,
                    "Listener failed to handle message"
                );
            }
        }
    }
}

/// Shared handle to the message registry. Clones refer to the same bus.
#[derive(Clone)]
pub struct MessageBus {
    inner: Arc<BusInner>,
}

impl MessageBus {
    pub fn new(scheduler: Arc<TaskScheduler>) -> Self {
        Self {
            inner: Arc::new(BusInner {
                registry: RwLock::new(HashMap::new()),
                scheduler,
                deliver_as_tasks: AtomicBool::new(false),
                shut_down: AtomicBool::new(false),
                nested: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn scheduler(&self) -> &Arc<TaskScheduler> {
        &self.inner.scheduler
    }

    /// Register `listener` for `kind`. Registering twice is a no-op.
    pub fn subscribe(&self, kind: MessageKind, listener: &ListenerHandle) {
        let mut registry = self.inner.registry.write();
        let listeners = registry.entry(kind).or_default();
        if listeners.contains(listener) {
            debug!(listener = listener.name(), kind = %kind, "Listener already subscribed");
            return;
        }
        listeners.push(listener.clone());
        trace!(listener = listener.name(), kind = %kind, "Listener subscribed");
    }

    pub fn subscribe_all(&self, kinds: &[MessageKind], listener: &ListenerHandle) {
        for kind in kinds {
            self.subscribe(*kind, listener);
        }
    }

    /// Returns whether the listener was subscribed to `kind`
    pub fn unsubscribe(&self, kind: MessageKind, listener: &ListenerHandle) -> bool {
        let mut registry = self.inner.registry.write();
        let Some(listeners) = registry.get_mut(&kind) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|existing| existing != listener);
        let removed = listeners.len() != before;
        if listeners.is_empty() {
            registry.remove(&kind);
        }
        removed
    }

    /// Remove `listener` from every kind; returns how many subscriptions went away
    pub fn unsubscribe_all(&self, listener: &ListenerHandle) -> usize {
        let mut registry = self.inner.registry.write();
        let mut removed = 0;
        registry.retain(|_, listeners| {
            let before = listeners.len();
            listeners.retain(|existing| existing != listener);
            removed += before - listeners.len();
            !listeners.is_empty()
        });
        debug!(listener = listener.name(), removed, "Listener unsubscribed");
        removed
    }

    /// Drop every subscription at once
    pub fn clear_subscriptions(&self) {
        self.inner.registry.write().clear();
    }

    pub fn subscriber_count(&self, kind: MessageKind) -> usize {
        self.inner
            .registry
            .read()
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Deliver on the calling thread before returning
    pub fn publish(&self, message: Message) {
        if self.reject_if_shut_down(&message) {
            return;
        }
        self.inner.publish_now(message);
    }

    /// Deliver through the scheduler when task delivery is on, otherwise synchronously
    pub fn publish_as_task(&self, message: Message) {
        if self.reject_if_shut_down(&message) {
            return;
        }

        if !self.delivers_as_tasks() {
            self.inner.publish_now(message);
            return;
        }

        let kind = message.kind();
        let inner = Arc::clone(&self.inner);
        self.inner
            .scheduler
            .push_task(Task::new(format!("deliver:{kind}"), move || {
                inner.publish_now(message);
            }));
    }

    pub fn set_delivery_mode(&self, deliver_as_tasks: bool) {
        let previous = self
            .inner
            .deliver_as_tasks
            .swap(deliver_as_tasks, Ordering::AcqRel);
        if previous != deliver_as_tasks {
            info!(deliver_as_tasks, "Message delivery mode changed");
        }
    }

    pub fn delivers_as_tasks(&self) -> bool {
        self.inner.deliver_as_tasks.load(Ordering::Acquire)
    }

    /// Stop accepting publications. Tasks already queued still deliver.
    pub fn shutdown(&self) {
        if !self.inner.shut_down.swap(true, Ordering::AcqRel) {
            info!("Message bus shut down");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::Acquire)
    }

    fn reject_if_shut_down(&self, message: &Message) -> bool {
        if self.is_shut_down() {
            warn!(kind = %message.kind(), "Message published after shutdown was dropped");
            return true;
        }
        false
    }
}

impl MessageDispatch for MessageBus {
    fn dispatch(&self, message: Message) {
        self.publish_as_task(message);
    }
}

impl fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageBus")
            .field("delivers_as_tasks", &self.delivers_as_tasks())
            .field("shut_down", &self.is_shut_down())
            .finish_non_exhaustive()
    }
}
