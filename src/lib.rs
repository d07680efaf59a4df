#![doc(html_root_url = "https://docs.rs/wiretether/latest")]
//! Public API for the `wiretether` library.
//!
//! This crate provides a persistent TCP client that splits the inbound byte
//! stream into delimiter-terminated frames and keeps the connection alive by
//! probing the remote host and reconnecting when it becomes reachable again.

pub mod client;
pub mod encoding;
pub mod frame;
pub mod message;

pub use client::{
    ClientConfig,
    ClientConfigBuilder,
    ClientError,
    ClientEvent,
    ConfigError,
    ConnectionState,
    LivenessOutcome,
    ReachabilityProbe,
    TetherClient,
    TetherClientBuilder,
};
pub use encoding::TextEncoding;
pub use frame::{DelimiterMatcher, FrameAssembler};
pub use message::Message;
