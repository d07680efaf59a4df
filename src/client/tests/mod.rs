//! Unit tests for the tether client runtime.

mod events;
mod helpers;
mod lifecycle;
mod receive;

use std::time::Duration;

use bytes::Bytes;
use rstest::rstest;

use super::*;
use crate::encoding::TextEncoding;

#[test]
fn builder_applies_defaults() {
    let config = ClientConfig::builder()
        .conn_data("10.0.0.7", 10002)
        .expect("valid endpoint")
        .build()
        .expect("build config");
    assert_eq!(config.delimiter().as_ref(), DEFAULT_DELIMITER);
    assert_eq!(config.encoding(), TextEncoding::Ascii);
    assert_eq!(config.poll_interval(), DEFAULT_POLL_INTERVAL);
    assert_eq!(config.liveness_interval(), DEFAULT_LIVENESS_INTERVAL);
    assert!(!config.skip_first_burst());
    assert!(!config.auto_trim());
    assert_eq!(config.addr(), "10.0.0.7:10002");
}

#[rstest]
#[case("", ConfigError::EmptyHost)]
#[case("   ", ConfigError::EmptyHost)]
fn rejects_empty_host(#[case] host: &str, #[case] expected: ConfigError) {
    let err = ClientConfig::builder()
        .host(host)
        .expect_err("empty host must be rejected");
    assert_eq!(err, expected);
}

#[rstest]
#[case("-c")]
#[case("-oProxyCommand=x")]
fn rejects_host_that_reads_as_an_option(#[case] host: &str) {
    let err = ClientConfig::builder()
        .host(host)
        .expect_err("option-like host must be rejected");
    assert_eq!(err, ConfigError::InvalidHost(host.to_owned()));
}

#[test]
fn rejects_zero_port() {
    let err = ClientConfig::builder()
        .conn_data("localhost", 0)
        .expect_err("port zero must be rejected");
    assert_eq!(err, ConfigError::InvalidPort);
}

#[test]
fn build_requires_host() {
    let err = ClientConfig::builder()
        .port(80)
        .expect("valid port")
        .build()
        .expect_err("missing host");
    assert_eq!(err, ConfigError::MissingHost);
}

#[test]
fn build_requires_port() {
    let err = ClientConfig::builder()
        .host("localhost")
        .expect("valid host")
        .build()
        .expect_err("missing port");
    assert_eq!(err, ConfigError::InvalidPort);
}

#[test]
fn rejects_empty_delimiter() {
    assert_eq!(
        ClientConfig::builder().delimiter(Bytes::new()).expect_err("empty"),
        ConfigError::EmptyDelimiter
    );
    assert_eq!(
        ClientConfig::builder().delimiter_str("").expect_err("empty"),
        ConfigError::EmptyDelimiter
    );
}

#[rstest]
#[case("0d0a", &b"\r\n"[..])]
#[case("0x13", &b"\x13"[..])]
#[case("AA AA BB", &b"\xaa\xaa\xbb"[..])]
fn parses_hex_delimiters(#[case] hex: &str, #[case] expected: &[u8]) {
    let config = ClientConfig::builder()
        .conn_data("localhost", 1)
        .and_then(|b| b.delimiter_hex(hex))
        .and_then(ClientConfigBuilder::build)
        .expect("valid hex delimiter");
    assert_eq!(config.delimiter().as_ref(), expected);
}

#[rstest]
#[case("0d0")]
#[case("zz")]
fn rejects_malformed_hex_delimiter(#[case] hex: &str) {
    let err = ClientConfig::builder()
        .delimiter_hex(hex)
        .expect_err("malformed hex");
    assert_eq!(err, ConfigError::InvalidHexDelimiter(hex.to_owned()));
}

#[test]
fn text_delimiter_follows_later_encoding_change() {
    let config = ClientConfig::builder()
        .conn_data("localhost", 1)
        .and_then(|b| b.delimiter_str("\u{e9}"))
        .map(|b| b.encoding(TextEncoding::Utf8))
        .and_then(ClientConfigBuilder::build)
        .expect("build config");
    assert_eq!(config.delimiter().as_ref(), &[0xc3, 0xa9]);
}

#[test]
fn byte_delimiter_ignores_encoding() {
    let config = ClientConfig::builder()
        .conn_data("localhost", 1)
        .and_then(|b| b.delimiter(&b"\xe9"[..]))
        .map(|b| b.encoding(TextEncoding::Utf8))
        .and_then(ClientConfigBuilder::build)
        .expect("build config");
    assert_eq!(config.delimiter().as_ref(), &[0xe9]);
}

#[test]
fn rejects_zero_poll_interval() {
    let err = ClientConfig::builder()
        .poll_interval(Duration::ZERO)
        .expect_err("zero poll interval");
    assert_eq!(err, ConfigError::InvalidPollInterval);
}

#[rstest]
#[case(Duration::ZERO)]
#[case(Duration::from_millis(999))]
fn rejects_short_liveness_interval(#[case] interval: Duration) {
    let err = ClientConfig::builder()
        .liveness_interval(interval)
        .expect_err("interval below minimum");
    assert_eq!(
        err,
        ConfigError::LivenessIntervalTooShort {
            min_ms: 1000,
            actual_ms: interval.as_millis(),
        }
    );
}

#[test]
fn accepts_minimum_liveness_interval() {
    let config = ClientConfig::builder()
        .conn_data("localhost", 1)
        .and_then(|b| b.liveness_interval(MIN_LIVENESS_INTERVAL))
        .and_then(ClientConfigBuilder::build)
        .expect("minimum interval is valid");
    assert_eq!(config.liveness_interval(), MIN_LIVENESS_INTERVAL);
}

#[test]
fn config_error_converts_into_client_error() {
    let err: ClientError = ConfigError::InvalidPort.into();
    assert!(matches!(err, ClientError::Config(ConfigError::InvalidPort)));
    assert_eq!(err.to_string(), "port must be greater than zero");
}
