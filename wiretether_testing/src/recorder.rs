//! Capture client events for assertions.

use std::time::Duration;

use tokio::{sync::mpsc, time::timeout};
use wiretether::ClientEvent;

use crate::device::WAIT_LIMIT;

/// Comparable snapshot of a [`ClientEvent`], with message text decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Recorded {
    /// [`ClientEvent::Connected`].
    Connected,
    /// [`ClientEvent::Disconnected`].
    Disconnected,
    /// Text of a [`ClientEvent::Frame`].
    Frame(String),
    /// Text of a [`ClientEvent::Burst`].
    Burst(String),
}

impl From<&ClientEvent> for Recorded {
    fn from(event: &ClientEvent) -> Self {
        match event {
            ClientEvent::Connected => Self::Connected,
            ClientEvent::Disconnected => Self::Disconnected,
            ClientEvent::Frame(message) => Self::Frame(message.text()),
            ClientEvent::Burst(message) => Self::Burst(message.text()),
        }
    }
}

/// Create an event handler and the log it records into.
///
/// ```
/// use wiretether::ClientEvent;
/// use wiretether_testing::{Recorded, recorder};
///
/// let (handler, mut log) = recorder();
/// handler(&ClientEvent::Connected);
/// assert_eq!(log.drain(), vec![Recorded::Connected]);
/// ```
#[must_use]
pub fn recorder() -> (impl Fn(&ClientEvent) + Send + Sync + 'static, EventLog) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handler = move |event: &ClientEvent| {
        let _ = tx.send(Recorded::from(event));
    };
    (handler, EventLog { rx })
}

/// Events recorded by a [`recorder`] handler, in delivery order.
#[derive(Debug)]
pub struct EventLog {
    rx: mpsc::UnboundedReceiver<Recorded>,
}

impl EventLog {
    /// Wait for the next event.
    ///
    /// # Panics
    ///
    /// Panics if nothing arrives within [`WAIT_LIMIT`].
    pub async fn next(&mut self) -> Recorded {
        timeout(WAIT_LIMIT, self.rx.recv())
            .await
            .expect("timed out waiting for a client event")
            .expect("recorder dropped")
    }

    /// Wait for the next event satisfying `pred`, discarding the rest.
    ///
    /// # Panics
    ///
    /// Panics if no such event arrives within [`WAIT_LIMIT`].
    pub async fn next_matching(&mut self, pred: impl Fn(&Recorded) -> bool) -> Recorded {
        let find = async {
            loop {
                match self.rx.recv().await {
                    Some(event) if pred(&event) => return event,
                    Some(_) => {}
                    None => panic!("recorder dropped"),
                }
            }
        };
        timeout(WAIT_LIMIT, find)
            .await
            .expect("timed out waiting for a matching client event")
    }

    /// Text of the next frame, skipping other events.
    pub async fn next_frame(&mut self) -> String {
        match self
            .next_matching(|event| matches!(event, Recorded::Frame(_)))
            .await
        {
            Recorded::Frame(text) => text,
            other => unreachable!("matched a non-frame event: {other:?}"),
        }
    }

    /// Concatenated burst text, read until it is at least `len` bytes long.
    pub async fn bursts_totalling(&mut self, len: usize) -> String {
        let mut text = String::new();
        while text.len() < len {
            if let Recorded::Burst(burst) = self
                .next_matching(|event| matches!(event, Recorded::Burst(_)))
                .await
            {
                text.push_str(&burst);
            }
        }
        text
    }

    /// Events recorded so far, without waiting.
    pub fn drain(&mut self) -> Vec<Recorded> {
        std::iter::from_fn(|| self.rx.try_recv().ok()).collect()
    }

    /// Whether no event arrives for `quiet`.
    pub async fn stays_quiet(&mut self, quiet: Duration) -> bool {
        timeout(quiet, self.rx.recv()).await.is_err()
    }
}
