//! Shared fixtures for client unit tests.

use std::{
    io,
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::{
    net::{TcpListener, TcpStream},
    sync::Notify,
    task::JoinHandle,
};

use crate::client::{ClientConfig, ReachabilityProbe};

/// Liveness interval long enough that the timer never fires during a test.
pub(super) const QUIET_LIVENESS: Duration = Duration::from_secs(600);

/// Build a CRLF-delimited configuration for `addr`.
pub(super) fn crlf_config(addr: SocketAddr) -> ClientConfig {
    ClientConfig::builder()
        .conn_data(addr.ip().to_string(), addr.port())
        .and_then(|b| b.delimiter(&b"\r\n"[..]))
        .and_then(|b| b.liveness_interval(QUIET_LIVENESS))
        .and_then(|b| b.build())
        .expect("valid test configuration")
}

/// Listener that accepts connections and keeps them open until aborted.
pub(super) async fn spawn_listener() -> (SocketAddr, JoinHandle<Vec<TcpStream>>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("listener addr");
    let handle = tokio::spawn(async move {
        let mut streams = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            streams.push(stream);
        }
        streams
    });
    (addr, handle)
}

/// An address nothing listens on.
pub(super) async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    listener.local_addr().expect("listener addr")
}

/// Probe answering with a switchable result, counting invocations.
#[derive(Clone, Default)]
pub(super) struct StubProbe {
    pub(super) reachable: Arc<AtomicBool>,
    pub(super) calls: Arc<AtomicUsize>,
}

impl StubProbe {
    pub(super) fn answering(reachable: bool) -> Self {
        let probe = Self::default();
        probe.reachable.store(reachable, Ordering::SeqCst);
        probe
    }
}

#[async_trait]
impl ReachabilityProbe for StubProbe {
    async fn probe(&self, _host: &str) -> io::Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reachable.load(Ordering::SeqCst))
    }
}

/// Probe that blocks until released, announcing when it starts.
#[derive(Clone, Default)]
pub(super) struct GatedProbe {
    pub(super) entered: Arc<Notify>,
    pub(super) release: Arc<Notify>,
    pub(super) reachable: bool,
}

#[async_trait]
impl ReachabilityProbe for GatedProbe {
    async fn probe(&self, _host: &str) -> io::Result<bool> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(self.reachable)
    }
}

/// Probe that always fails.
pub(super) struct FailingProbe;

#[async_trait]
impl ReachabilityProbe for FailingProbe {
    async fn probe(&self, _host: &str) -> io::Result<bool> {
        Err(io::Error::other("probe unavailable"))
    }
}
