//! Event delivery to subscriber callbacks.

use std::{
    any::Any,
    fmt,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use parking_lot::RwLock;

use crate::message::Message;

/// Notifications raised by a [`crate::TetherClient`].
///
/// Frames completed during one poll iteration are delivered in arrival order
/// and always before that iteration's [`ClientEvent::Burst`].
#[derive(Clone, Debug)]
pub enum ClientEvent {
    /// A connection was opened.
    Connected,
    /// The connection was closed by [`crate::TetherClient::disconnect`] or
    /// the liveness monitor.
    Disconnected,
    /// A delimiter-terminated frame, without the delimiter.
    Frame(Message),
    /// Every byte drained during one poll iteration, whether or not it
    /// contained delimiters.
    Burst(Message),
}

impl ClientEvent {
    /// Short name of the event, used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Frame(_) => "frame",
            Self::Burst(_) => "burst",
        }
    }
}

/// Callback receiving client events.
///
/// Handlers run on the client's background tasks and must not block. Use
/// `tokio::spawn` for follow-up I/O such as [`Message::reply`].
pub type EventHandler = Arc<dyn Fn(&ClientEvent) + Send + Sync>;

/// Identifies a registered [`EventHandler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub(crate) struct EventHub {
    next_id: AtomicU64,
    handlers: RwLock<Vec<(SubscriptionId, EventHandler)>>,
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("handlers", &self.handlers.read().len())
            .finish()
    }
}

impl EventHub {
    pub(crate) fn subscribe(&self, handler: EventHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.write().push((id, handler));
        id
    }

    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        handlers.len() != before
    }

    /// Invoke every handler registered when the call starts.
    ///
    /// Handlers may subscribe or unsubscribe from inside the callback. A
    /// panicking handler is logged and the remaining handlers still run.
    pub(crate) fn emit(&self, event: &ClientEvent) {
        let handlers: Vec<EventHandler> = self
            .handlers
            .read()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in handlers {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| handler(event))) {
                tracing::error!(
                    event = event.kind(),
                    panic = panic_text(&*payload),
                    "event handler panicked"
                );
            }
        }
    }
}

fn panic_text(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
