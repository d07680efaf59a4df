//! Tether client runtime implementation.

use std::{
    fmt,
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use tokio::{
    net::{TcpSocket, TcpStream, lookup_host},
    task::JoinHandle,
    time::sleep,
};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span};

use super::{
    ClientConfig,
    ClientError,
    ClientEvent,
    EventHandler,
    Link,
    LivenessOutcome,
    ReachabilityProbe,
    SubscriptionId,
    TetherClientBuilder,
    TracingConfig,
    events::EventHub,
    liveness,
    receive,
    tracing_helpers::{connect_span, disconnect_span, emit_timing_event, write_span},
};
use crate::frame::framed_payload;

/// How often [`TetherClient::write_framed_and_await_reply`] checks for a
/// reply.
const REPLY_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Whether the client currently holds an open connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection is open.
    Disconnected,
    /// A connection is open.
    Connected,
}

/// State shared by the client handle and its background tasks.
pub(crate) struct Shared {
    pub(crate) config: ClientConfig,
    pub(crate) tracing: TracingConfig,
    pub(crate) span: Span,
    pub(crate) probe: Arc<dyn ReachabilityProbe>,
    pub(crate) events: EventHub,
    pub(crate) liveness_guard: tokio::sync::Mutex<()>,
    link: Mutex<Option<Arc<Link>>>,
    connected: AtomicBool,
    skip_first_burst: AtomicBool,
    stop: CancellationToken,
    receive_task: Mutex<Option<JoinHandle<()>>>,
    liveness_timer: Mutex<Option<CancellationToken>>,
    shut_down: AtomicBool,
}

impl Shared {
    pub(crate) fn new(
        config: ClientConfig,
        tracing: TracingConfig,
        span: Span,
        probe: Arc<dyn ReachabilityProbe>,
        events: EventHub,
    ) -> Self {
        let skip_first_burst = config.skip_first_burst();
        Self {
            config,
            tracing,
            span,
            probe,
            events,
            liveness_guard: tokio::sync::Mutex::new(()),
            link: Mutex::new(None),
            connected: AtomicBool::new(false),
            skip_first_burst: AtomicBool::new(skip_first_burst),
            stop: CancellationToken::new(),
            receive_task: Mutex::new(None),
            liveness_timer: Mutex::new(None),
            shut_down: AtomicBool::new(false),
        }
    }

    pub(crate) fn current_link(&self) -> Option<Arc<Link>> { self.link.lock().clone() }

    pub(crate) fn is_connected(&self) -> bool { self.connected.load(Ordering::Acquire) }

    pub(crate) fn skip_first_burst_armed(&self) -> bool {
        self.skip_first_burst.load(Ordering::Acquire)
    }

    pub(crate) fn clear_skip_first_burst(&self) {
        if self.skip_first_burst.swap(false, Ordering::AcqRel) {
            tracing::debug!("first burst handled, frames are now delivered");
        }
    }

    pub(crate) async fn connect(self: &Arc<Self>) -> Result<(), ClientError> {
        if self.stop.is_cancelled() {
            return Err(ClientError::Shutdown);
        }
        let addr = self.config.addr();
        let span = connect_span(&self.tracing, &addr);
        let start = self.tracing.connect_timing.then(Instant::now);
        let result = self.open_stream().instrument(span.clone()).await;

        let _entered = span.enter();
        emit_timing_event(start);
        match result {
            Ok(_) if self.stop.is_cancelled() => Err(ClientError::Shutdown),
            Ok(stream) => {
                self.install(stream);
                tracing::info!("connected");
                Ok(())
            }
            Err(source) => {
                tracing::error!(error = %source, "connect failed");
                Err(ClientError::Connect { addr, source })
            }
        }
    }

    async fn open_stream(&self) -> io::Result<TcpStream> {
        let mut last_error = None;
        for addr in lookup_host((self.config.host(), self.config.port())).await? {
            let socket = if addr.is_ipv4() {
                TcpSocket::new_v4()?
            } else {
                TcpSocket::new_v6()?
            };
            self.config.socket_options().apply(&socket)?;
            match socket.connect(addr).await {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    tracing::debug!(%addr, error = %e, "address refused connection");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "host resolved to no addresses")
        }))
    }

    fn install(self: &Arc<Self>, stream: TcpStream) {
        let previous = self.link.lock().replace(Arc::new(Link::new(stream)));
        if let Some(previous) = previous
            && let Err(error) = previous.close()
        {
            tracing::debug!(%error, "failed to close replaced connection");
        }
        self.start_receive_loop();
        self.restart_liveness_timer();
        self.connected.store(true, Ordering::Release);
        self.events.emit(&ClientEvent::Connected);
    }

    fn start_receive_loop(self: &Arc<Self>) {
        let mut task = self.receive_task.lock();
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        *task = Some(tokio::spawn(
            receive::run(
                Arc::downgrade(self),
                self.stop.clone(),
                self.config.poll_interval(),
            )
            .instrument(self.span.clone()),
        ));
    }

    fn restart_liveness_timer(self: &Arc<Self>) {
        let token = self.stop.child_token();
        if let Some(previous) = self.liveness_timer.lock().replace(token.clone()) {
            previous.cancel();
        }
        liveness::spawn_timer(
            Arc::downgrade(self),
            token,
            self.config.liveness_interval(),
            self.span.clone(),
        );
    }

    pub(crate) fn disconnect(&self) -> Result<(), ClientError> {
        let span = disconnect_span(&self.tracing);
        let _entered = span.enter();
        let start = self.tracing.disconnect_timing.then(Instant::now);

        let link = self.link.lock().take();
        let closed = link.map_or(Ok(()), |link| link.close());
        if self.connected.swap(false, Ordering::AcqRel) {
            tracing::info!("disconnected");
            self.events.emit(&ClientEvent::Disconnected);
        }
        emit_timing_event(start);
        closed.map_err(|error| {
            tracing::error!(%error, "failed to close connection");
            ClientError::Close(error)
        })
    }

    pub(crate) async fn write(&self, data: &[u8]) -> Result<(), ClientError> {
        let link = self.current_link().ok_or(ClientError::NotConnected)?;
        let span = write_span(&self.tracing, data.len());
        let start = self.tracing.write_timing.then(Instant::now);
        let result = link.write_all(data).instrument(span.clone()).await;
        span.in_scope(|| {
            emit_timing_event(start);
            if let Err(error) = &result {
                tracing::warn!(%error, "write failed");
            }
        });
        result.map_err(ClientError::from)
    }

    pub(crate) fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        self.stop.cancel();
        if let Some(link) = self.link.lock().take()
            && let Err(error) = link.close()
        {
            tracing::debug!(%error, "failed to close connection during shutdown");
        }
        self.connected.store(false, Ordering::Release);
        tracing::debug!("client shut down");
    }
}

/// Persistent TCP client with delimiter framing and automatic reconnection.
///
/// Dropping the client shuts it down: the background tasks stop and the
/// socket is closed.
///
/// # Examples
///
/// ```no_run
/// use wiretether::{ClientConfig, ClientEvent, TetherClient};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ClientConfig::builder()
///     .conn_data("10.0.0.7", 10002)?
///     .delimiter(&b"\r\n"[..])?
///     .build()?;
/// let client = TetherClient::builder(config)
///     .on_frame(|message| println!("Received: {}", message.text()))
///     .build();
/// client.connect().await?;
/// client.write_framed("STATUS").await?;
/// # Ok(())
/// # }
/// ```
pub struct TetherClient {
    pub(crate) shared: Arc<Shared>,
}

impl fmt::Debug for TetherClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TetherClient")
            .field("config", &self.shared.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl TetherClient {
    /// Start building a client for `config`.
    #[must_use]
    pub fn builder(config: ClientConfig) -> TetherClientBuilder { TetherClientBuilder::new(config) }

    /// Create a client with default probe, tracing and no subscribers.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self { Self::builder(config).build() }

    /// Open the connection and start the background tasks.
    ///
    /// The receive loop is started once and keeps running across
    /// reconnects; the liveness timer restarts on every successful connect.
    ///
    /// # Errors
    /// Returns [`ClientError::Connect`] if the socket cannot be opened, in
    /// which case the state is unchanged, and [`ClientError::Shutdown`] after
    /// [`shutdown`](Self::shutdown).
    pub async fn connect(&self) -> Result<(), ClientError> { self.shared.connect().await }

    /// Close the connection.
    ///
    /// Calling this while disconnected does nothing.
    ///
    /// # Errors
    /// Returns [`ClientError::Close`] if closing the socket fails. The client
    /// is disconnected regardless.
    pub fn disconnect(&self) -> Result<(), ClientError> { self.shared.disconnect() }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        if self.shared.is_connected() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    /// Whether a connection is open.
    #[must_use]
    pub fn is_connected(&self) -> bool { self.shared.is_connected() }

    /// Configuration the client was built with.
    #[must_use]
    pub fn config(&self) -> &ClientConfig { &self.shared.config }

    /// Send raw bytes.
    ///
    /// # Errors
    /// Returns [`ClientError::NotConnected`] without an open connection and
    /// [`ClientError::Io`] if the write fails.
    pub async fn write(&self, data: &[u8]) -> Result<(), ClientError> {
        self.shared.write(data).await
    }

    /// Send `text` encoded with the configured encoding.
    ///
    /// # Errors
    /// Fails as [`write`](Self::write) does.
    pub async fn write_text(&self, text: &str) -> Result<(), ClientError> {
        self.write(&self.shared.config.encoding().encode(text))
            .await
    }

    /// Send `text` terminated by the delimiter, unless it already ends with
    /// it. Empty text is ignored.
    ///
    /// # Errors
    /// Fails as [`write`](Self::write) does.
    pub async fn write_framed(&self, text: &str) -> Result<(), ClientError> {
        if text.is_empty() {
            return Ok(());
        }
        let config = &self.shared.config;
        self.write(&framed_payload(text, config.delimiter(), config.encoding()))
            .await
    }

    /// Send `text` framed and wait up to `timeout` for the next burst.
    ///
    /// Returns the burst's text, or `None` if nothing arrived in time. The
    /// wait polls and is accurate to roughly ten milliseconds.
    ///
    /// # Errors
    /// Fails as [`write_framed`](Self::write_framed) does.
    pub async fn write_framed_and_await_reply(
        &self,
        text: &str,
        timeout: Duration,
    ) -> Result<Option<String>, ClientError> {
        let reply = Arc::new(Mutex::new(None::<String>));
        let slot = Arc::clone(&reply);
        let _subscription = SubscriptionGuard {
            shared: &self.shared,
            id: self.subscribe(move |event| {
                if let ClientEvent::Burst(message) = event {
                    slot.lock().get_or_insert_with(|| message.text());
                }
            }),
        };

        self.write_framed(text).await?;
        let deadline = Instant::now() + timeout;
        loop {
            let received = reply.lock().take();
            if received.is_some() {
                return Ok(received);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            sleep(REPLY_POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    /// Register a callback for every subsequent event.
    pub fn subscribe(
        &self,
        handler: impl Fn(&ClientEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.shared.events.subscribe(Arc::new(handler) as EventHandler)
    }

    /// Remove a callback. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool { self.shared.events.unsubscribe(id) }

    /// Re-arm or clear discarding of the first burst's frames.
    ///
    /// The flag is otherwise cleared by the first poll that finds no data
    /// and is not re-armed by reconnects.
    pub fn set_skip_first_burst(&self, enabled: bool) {
        self.shared
            .skip_first_burst
            .store(enabled, Ordering::Release);
    }

    /// Run one liveness check now, as the liveness timer would.
    pub async fn check_liveness(&self) -> LivenessOutcome { self.shared.check_liveness().await }

    /// Stop the background tasks and close the connection.
    ///
    /// Further calls do nothing. A shut down client cannot reconnect.
    pub fn shutdown(&self) { self.shared.shutdown(); }
}

impl Drop for TetherClient {
    fn drop(&mut self) { self.shared.shutdown(); }
}

struct SubscriptionGuard<'a> {
    shared: &'a Shared,
    id: SubscriptionId,
}

impl Drop for SubscriptionGuard<'_> {
    fn drop(&mut self) { self.shared.events.unsubscribe(self.id); }
}
