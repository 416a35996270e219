// ABOUTME: Dispatch trait that producers use to send messages
// ABOUTME: Lets collaborators publish without depending on the concrete bus

use crate::message::Message;
use std::sync::Arc;

/// Anything that accepts messages for delivery
pub trait MessageDispatch: Send + Sync {
    /// Queue `message` on the default delivery route
    fn dispatch(&self, message: Message);
}

impl<T: MessageDispatch + ?Sized> MessageDispatch for Arc<T> {
    fn dispatch(&self, message: Message) {
        (**self).dispatch(message);
    }
}
