//! Error types for tether client configuration and operations.

use std::io;

/// Errors raised while building a [`crate::ClientConfig`].
///
/// Configuration is validated as each value is set, so these surface before
/// any connection attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The remote host was empty.
    #[error("host cannot be empty")]
    EmptyHost,
    /// The remote host started with `-` and would read as a command option.
    #[error("host cannot start with '-': {0}")]
    InvalidHost(String),
    /// No remote host was configured.
    #[error("host must be configured before building the client")]
    MissingHost,
    /// The remote port was zero.
    #[error("port must be greater than zero")]
    InvalidPort,
    /// The frame delimiter was empty.
    #[error("delimiter cannot be empty")]
    EmptyDelimiter,
    /// The poll interval was zero.
    #[error("poll interval must be greater than zero")]
    InvalidPollInterval,
    /// The liveness interval was shorter than the supported minimum.
    #[error("liveness interval must be at least {min_ms} ms, got {actual_ms} ms")]
    LivenessIntervalTooShort {
        /// Smallest accepted interval in milliseconds.
        min_ms: u128,
        /// Rejected interval in milliseconds.
        actual_ms: u128,
    },
    /// The text encoding label was not recognised.
    #[error("unknown text encoding: {0}")]
    UnknownEncoding(String),
    /// A hexadecimal delimiter could not be parsed.
    #[error("invalid hex delimiter: {0}")]
    InvalidHexDelimiter(String),
}

/// Errors emitted by [`crate::TetherClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Opening the socket failed.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        /// Target in `host:port` form.
        addr: String,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// Closing the socket failed. The client is disconnected regardless.
    #[error("failed to close connection: {0}")]
    Close(#[source] io::Error),
    /// Writing to the socket failed.
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
    /// A write was attempted without an open connection.
    #[error("cannot send data without an open connection")]
    NotConnected,
    /// The client has been shut down and cannot be used again.
    #[error("client has been shut down")]
    Shutdown,
    /// The client configuration was invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
