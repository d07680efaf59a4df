//! Builder for configuring a tether client.

use std::sync::Arc;

use tracing::Span;

use super::{
    ClientConfig,
    ClientEvent,
    EventHandler,
    PingProbe,
    ReachabilityProbe,
    TetherClient,
    TracingConfig,
    events::EventHub,
    runtime::Shared,
};
use crate::message::Message;

/// Builder for [`TetherClient`].
///
/// Handlers registered here are installed before the client can connect, so
/// they observe the first [`ClientEvent::Connected`].
///
/// # Examples
///
/// ```
/// use wiretether::{ClientConfig, TetherClient};
///
/// # fn main() -> Result<(), wiretether::ConfigError> {
/// let config = ClientConfig::builder().conn_data("127.0.0.1", 9000)?.build()?;
/// let client = TetherClient::builder(config)
///     .on_connected(|| println!("Connected"))
///     .on_disconnected(|| println!("Disconnected"))
///     .on_frame(|message| println!("Received: {}", message.text()))
///     .on_burst(|message| println!("Received undelimited: {}", message.text()))
///     .build();
/// assert!(!client.is_connected());
/// # Ok(())
/// # }
/// ```
pub struct TetherClientBuilder {
    config: ClientConfig,
    tracing: TracingConfig,
    span: Option<Span>,
    probe: Option<Arc<dyn ReachabilityProbe>>,
    handlers: Vec<EventHandler>,
}

impl TetherClientBuilder {
    /// Create a builder for `config`.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            tracing: TracingConfig::default(),
            span: None,
            probe: None,
            handlers: Vec::new(),
        }
    }

    /// Configure span levels and timing for client operations.
    #[must_use]
    pub fn tracing_config(mut self, tracing: TracingConfig) -> Self {
        self.tracing = tracing;
        self
    }

    /// Use `span` as the parent of every span and event the client emits.
    ///
    /// Defaults to an `INFO` span named `tether` carrying the peer host and
    /// port.
    #[must_use]
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Replace the probe used by the liveness monitor.
    ///
    /// Defaults to [`PingProbe`].
    #[must_use]
    pub fn probe(mut self, probe: impl ReachabilityProbe) -> Self {
        self.probe = Some(Arc::new(probe));
        self
    }

    /// Register a callback for every event.
    #[must_use]
    pub fn on_event(mut self, handler: impl Fn(&ClientEvent) + Send + Sync + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Register a callback for [`ClientEvent::Connected`].
    #[must_use]
    pub fn on_connected(self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_event(move |event| {
            if matches!(event, ClientEvent::Connected) {
                handler();
            }
        })
    }

    /// Register a callback for [`ClientEvent::Disconnected`].
    #[must_use]
    pub fn on_disconnected(self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_event(move |event| {
            if matches!(event, ClientEvent::Disconnected) {
                handler();
            }
        })
    }

    /// Register a callback for delimiter-terminated frames.
    #[must_use]
    pub fn on_frame(self, handler: impl Fn(&Message) + Send + Sync + 'static) -> Self {
        self.on_event(move |event| {
            if let ClientEvent::Frame(message) = event {
                handler(message);
            }
        })
    }

    /// Register a callback for the unframed burst raised after every poll
    /// iteration that read data.
    #[must_use]
    pub fn on_burst(self, handler: impl Fn(&Message) + Send + Sync + 'static) -> Self {
        self.on_event(move |event| {
            if let ClientEvent::Burst(message) = event {
                handler(message);
            }
        })
    }

    /// Create the client. No connection is opened until
    /// [`TetherClient::connect`] is called.
    #[must_use]
    pub fn build(self) -> TetherClient {
        let span = self.span.unwrap_or_else(|| {
            tracing::info_span!(
                "tether",
                peer.host = %self.config.host(),
                peer.port = self.config.port()
            )
        });
        let probe = self
            .probe
            .unwrap_or_else(|| Arc::new(PingProbe::default()));
        let events = EventHub::default();
        for handler in self.handlers {
            events.subscribe(handler);
        }
        TetherClient {
            shared: Arc::new(Shared::new(
                self.config,
                self.tracing,
                span,
                probe,
                events,
            )),
        }
    }
}
