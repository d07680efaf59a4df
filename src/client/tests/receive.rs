//! Tests for turning received bursts into events.

use std::sync::Weak;

use bytes::Bytes;
use rstest::{fixture, rstest};

use super::helpers::crlf_config;
use crate::{
    client::{ClientConfig, ClientEvent, receive::ReceiveState},
    message::Message,
};

#[fixture]
fn config() -> ClientConfig { crlf_config("127.0.0.1:9".parse().expect("socket addr")) }

fn process(
    state: &mut ReceiveState,
    config: &ClientConfig,
    burst: &'static [u8],
    suppress: bool,
) -> Vec<String> {
    state
        .process_burst(Bytes::from_static(burst), suppress, |data| {
            Message::new(data, config, Weak::new())
        })
        .iter()
        .map(|event| match event {
            ClientEvent::Frame(message) => format!("frame:{}", message.text()),
            ClientEvent::Burst(message) => format!("burst:{}", message.text()),
            other => other.kind().to_owned(),
        })
        .collect()
}

#[rstest]
fn frames_precede_the_burst(config: ClientConfig) {
    let mut state = ReceiveState::new(config.delimiter().clone());
    let events = process(&mut state, &config, b"HELLO\r\nWORLD\r\n", false);
    assert_eq!(
        events,
        ["frame:HELLO", "frame:WORLD", "burst:HELLO\r\nWORLD\r\n"]
    );
}

#[rstest]
fn burst_without_delimiter_raises_only_burst(config: ClientConfig) {
    let mut state = ReceiveState::new(config.delimiter().clone());
    assert_eq!(process(&mut state, &config, b"PART", false), ["burst:PART"]);
    assert_eq!(
        process(&mut state, &config, b"IAL\r\n", false),
        ["frame:PARTIAL", "burst:IAL\r\n"]
    );
}

#[rstest]
fn suppressed_burst_consumes_its_frames(config: ClientConfig) {
    let mut state = ReceiveState::new(config.delimiter().clone());
    assert_eq!(
        process(&mut state, &config, b"OLD\r\n", true),
        ["burst:OLD\r\n"]
    );
    assert_eq!(
        process(&mut state, &config, b"NEW\r\n", false),
        ["frame:NEW", "burst:NEW\r\n"]
    );
}

#[rstest]
fn suppression_keeps_trailing_bytes_pending(config: ClientConfig) {
    let mut state = ReceiveState::new(config.delimiter().clone());
    process(&mut state, &config, b"OLD\r\nHAL", true);
    assert_eq!(
        process(&mut state, &config, b"F\r\n", false),
        ["frame:HALF", "burst:F\r\n"]
    );
}

#[test]
fn auto_trim_applies_to_frames_and_bursts() {
    let config = ClientConfig::builder()
        .conn_data("127.0.0.1", 9)
        .and_then(|b| b.delimiter(&b"\r\n"[..]))
        .map(|b| b.auto_trim(true))
        .and_then(|b| b.build())
        .expect("valid configuration");
    let mut state = ReceiveState::new(config.delimiter().clone());
    assert_eq!(
        process(&mut state, &config, b"  HELLO \r\n", false),
        ["frame:HELLO", "burst:HELLO"]
    );
}

#[rstest]
fn detached_message_cannot_reply(config: ClientConfig) {
    let message = Message::new(Bytes::from_static(b"X"), &config, Weak::new());
    assert!(!message.can_reply());
}

#[rstest]
#[tokio::test]
async fn detached_message_reply_reports_not_connected(config: ClientConfig) {
    let message = Message::new(Bytes::from_static(b"X"), &config, Weak::new());
    let err = message.reply_framed("ACK").await.expect_err("no connection");
    assert!(matches!(err, crate::ClientError::NotConnected));
    message.reply_framed("").await.expect("empty reply is a no-op");
}
