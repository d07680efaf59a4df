//! Tests for connecting, disconnecting and shutting down.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use rstest::rstest;

use super::helpers::{StubProbe, crlf_config, spawn_listener, unused_addr};
use crate::client::{ClientError, ClientEvent, ConnectionState, TetherClient};

fn counting_client(
    addr: std::net::SocketAddr,
) -> (TetherClient, Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let connected = Arc::new(AtomicUsize::new(0));
    let disconnected = Arc::new(AtomicUsize::new(0));
    let (c, d) = (Arc::clone(&connected), Arc::clone(&disconnected));
    let client = TetherClient::builder(crlf_config(addr))
        .probe(StubProbe::answering(true))
        .on_connected(move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .on_disconnected(move || {
            d.fetch_add(1, Ordering::SeqCst);
        })
        .build();
    (client, connected, disconnected)
}

#[rstest]
#[tokio::test]
async fn connect_raises_connected_once() {
    let (addr, server) = spawn_listener().await;
    let (client, connected, _) = counting_client(addr);

    assert_eq!(client.state(), ConnectionState::Disconnected);
    client.connect().await.expect("connect");
    assert_eq!(client.state(), ConnectionState::Connected);
    assert_eq!(connected.load(Ordering::SeqCst), 1);
    server.abort();
}

#[rstest]
#[tokio::test]
async fn disconnect_is_idempotent() {
    let (addr, server) = spawn_listener().await;
    let (client, _, disconnected) = counting_client(addr);

    client.disconnect().expect("disconnect while idle");
    assert_eq!(disconnected.load(Ordering::SeqCst), 0);

    client.connect().await.expect("connect");
    client.disconnect().expect("first disconnect");
    client.disconnect().expect("second disconnect");
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert_eq!(disconnected.load(Ordering::SeqCst), 1);
    server.abort();
}

#[rstest]
#[tokio::test]
async fn writes_require_a_connection() {
    let (client, _, _) = counting_client(unused_addr().await);
    assert!(matches!(
        client.write(b"X").await,
        Err(ClientError::NotConnected)
    ));
    assert!(matches!(
        client.write_framed("PING").await,
        Err(ClientError::NotConnected)
    ));
    client.write_framed("").await.expect("empty text is ignored");
}

#[rstest]
#[tokio::test]
async fn failed_connect_leaves_client_disconnected() {
    let addr = unused_addr().await;
    let (client, connected, _) = counting_client(addr);

    let err = client.connect().await.expect_err("nothing listens");
    match err {
        ClientError::Connect { addr: target, .. } => assert_eq!(target, addr.to_string()),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert_eq!(connected.load(Ordering::SeqCst), 0);
}

#[rstest]
#[tokio::test]
async fn reconnect_replaces_previous_connection() {
    let (addr, server) = spawn_listener().await;
    let (client, connected, disconnected) = counting_client(addr);

    client.connect().await.expect("first connect");
    let first = client.shared.current_link().expect("first link");
    client.connect().await.expect("second connect");

    assert!(!first.is_active(), "replaced link must be closed");
    assert_eq!(connected.load(Ordering::SeqCst), 2);
    assert_eq!(disconnected.load(Ordering::SeqCst), 0);
    server.abort();
}

#[rstest]
#[tokio::test]
async fn shutdown_prevents_reconnecting() {
    let (addr, server) = spawn_listener().await;
    let (client, _, disconnected) = counting_client(addr);

    client.connect().await.expect("connect");
    client.shutdown();
    client.shutdown();

    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert_eq!(disconnected.load(Ordering::SeqCst), 0);
    assert!(matches!(client.connect().await, Err(ClientError::Shutdown)));
    server.abort();
}

#[rstest]
#[tokio::test]
async fn subscribers_can_be_removed() {
    let (addr, server) = spawn_listener().await;
    let (client, _, _) = counting_client(addr);
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    let id = client.subscribe(move |event| {
        if matches!(event, ClientEvent::Connected) {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });

    client.connect().await.expect("connect");
    assert!(client.unsubscribe(id));
    client.connect().await.expect("reconnect");
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    server.abort();
}
