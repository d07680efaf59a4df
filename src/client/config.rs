//! Connection configuration for tether clients.

use std::{io, time::Duration};

use bytes::Bytes;
use socket2::{SockRef, TcpKeepalive};
use tokio::net::TcpSocket;

use super::ConfigError;
use crate::encoding::TextEncoding;

/// Delimiter used when none is configured (`DC3`).
pub const DEFAULT_DELIMITER: &[u8] = &[0x13];
/// Pause between receive loop iterations when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);
/// Period of the liveness check when none is configured.
pub const DEFAULT_LIVENESS_INTERVAL: Duration = Duration::from_secs(5);
/// Shortest accepted liveness check period.
pub const MIN_LIVENESS_INTERVAL: Duration = Duration::from_secs(1);

/// Validated settings for a [`crate::TetherClient`].
///
/// Construct one with [`ClientConfig::builder`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use wiretether::ClientConfig;
///
/// # fn main() -> Result<(), wiretether::ConfigError> {
/// let config = ClientConfig::builder()
///     .conn_data("10.0.0.7", 10002)?
///     .delimiter(&b"\r\n"[..])?
///     .poll_interval(Duration::from_millis(50))?
///     .auto_trim(true)
///     .build()?;
/// assert_eq!(config.addr(), "10.0.0.7:10002");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    host: String,
    port: u16,
    delimiter: Bytes,
    encoding: TextEncoding,
    poll_interval: Duration,
    liveness_interval: Duration,
    skip_first_burst: bool,
    auto_trim: bool,
    socket_options: SocketOptions,
}

impl ClientConfig {
    /// Start building a configuration with default framing and timing.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder { ClientConfigBuilder::default() }

    /// Remote host name or address.
    #[must_use]
    pub fn host(&self) -> &str { &self.host }

    /// Remote port.
    #[must_use]
    pub const fn port(&self) -> u16 { self.port }

    /// Remote endpoint in `host:port` form.
    #[must_use]
    pub fn addr(&self) -> String { format!("{}:{}", self.host, self.port) }

    /// Byte sequence terminating each frame.
    #[must_use]
    pub fn delimiter(&self) -> &Bytes { &self.delimiter }

    /// Encoding used for frame text and outbound strings.
    #[must_use]
    pub const fn encoding(&self) -> TextEncoding { self.encoding }

    /// Pause between receive loop iterations.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration { self.poll_interval }

    /// Period of the liveness check.
    #[must_use]
    pub const fn liveness_interval(&self) -> Duration { self.liveness_interval }

    /// Whether frames buffered before the first idle poll are discarded.
    #[must_use]
    pub const fn skip_first_burst(&self) -> bool { self.skip_first_burst }

    /// Whether decoded text is trimmed of surrounding whitespace.
    #[must_use]
    pub const fn auto_trim(&self) -> bool { self.auto_trim }

    /// Socket options applied before connecting.
    #[must_use]
    pub const fn socket_options(&self) -> &SocketOptions { &self.socket_options }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum DelimiterSource {
    Bytes(Bytes),
    Text(String),
}

/// Builder for [`ClientConfig`].
///
/// Setters taking values that can be invalid return `Result` and reject the
/// value immediately.
#[derive(Clone, Debug)]
pub struct ClientConfigBuilder {
    host: Option<String>,
    port: Option<u16>,
    delimiter: DelimiterSource,
    encoding: TextEncoding,
    poll_interval: Duration,
    liveness_interval: Duration,
    skip_first_burst: bool,
    auto_trim: bool,
    socket_options: SocketOptions,
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            delimiter: DelimiterSource::Bytes(Bytes::from_static(DEFAULT_DELIMITER)),
            encoding: TextEncoding::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            liveness_interval: DEFAULT_LIVENESS_INTERVAL,
            skip_first_burst: false,
            auto_trim: false,
            socket_options: SocketOptions::default(),
        }
    }
}

impl ClientConfigBuilder {
    /// Set the remote host.
    ///
    /// # Errors
    /// Returns [`ConfigError::EmptyHost`] if `host` is empty and
    /// [`ConfigError::InvalidHost`] if it starts with `-`.
    pub fn host(mut self, host: impl Into<String>) -> Result<Self, ConfigError> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if host.starts_with('-') {
            return Err(ConfigError::InvalidHost(host));
        }
        self.host = Some(host);
        Ok(self)
    }

    /// Set the remote port.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidPort`] if `port` is zero.
    pub fn port(mut self, port: u16) -> Result<Self, ConfigError> {
        if port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        self.port = Some(port);
        Ok(self)
    }

    /// Set the remote host and port together.
    ///
    /// # Errors
    /// Fails as [`host`](Self::host) and [`port`](Self::port) do.
    pub fn conn_data(self, host: impl Into<String>, port: u16) -> Result<Self, ConfigError> {
        self.host(host)?.port(port)
    }

    /// Terminate frames with the given byte sequence.
    ///
    /// # Errors
    /// Returns [`ConfigError::EmptyDelimiter`] if `delimiter` is empty.
    pub fn delimiter(mut self, delimiter: impl Into<Bytes>) -> Result<Self, ConfigError> {
        let delimiter = delimiter.into();
        if delimiter.is_empty() {
            return Err(ConfigError::EmptyDelimiter);
        }
        self.delimiter = DelimiterSource::Bytes(delimiter);
        Ok(self)
    }

    /// Terminate frames with `delimiter` encoded through the configured
    /// encoding.
    ///
    /// The text is re-encoded if the encoding changes afterwards.
    ///
    /// # Errors
    /// Returns [`ConfigError::EmptyDelimiter`] if `delimiter` is empty.
    pub fn delimiter_str(mut self, delimiter: &str) -> Result<Self, ConfigError> {
        if delimiter.is_empty() {
            return Err(ConfigError::EmptyDelimiter);
        }
        self.delimiter = DelimiterSource::Text(delimiter.to_owned());
        Ok(self)
    }

    /// Terminate frames with the bytes spelled by a hexadecimal string such
    /// as `0d0a`.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidHexDelimiter`] for malformed input and
    /// [`ConfigError::EmptyDelimiter`] if no bytes remain.
    pub fn delimiter_hex(self, hex: &str) -> Result<Self, ConfigError> {
        let digits: String = hex
            .trim()
            .trim_start_matches("0x")
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let bytes =
            hex::decode(&digits).map_err(|_| ConfigError::InvalidHexDelimiter(hex.to_owned()))?;
        self.delimiter(bytes)
    }

    /// Set the text encoding.
    #[must_use]
    pub fn encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the pause between receive loop iterations.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidPollInterval`] if `interval` is zero.
    pub fn poll_interval(mut self, interval: Duration) -> Result<Self, ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::InvalidPollInterval);
        }
        self.poll_interval = interval;
        Ok(self)
    }

    /// Set how often the remote host is probed.
    ///
    /// # Errors
    /// Returns [`ConfigError::LivenessIntervalTooShort`] below one second.
    pub fn liveness_interval(mut self, interval: Duration) -> Result<Self, ConfigError> {
        if interval < MIN_LIVENESS_INTERVAL {
            return Err(ConfigError::LivenessIntervalTooShort {
                min_ms: MIN_LIVENESS_INTERVAL.as_millis(),
                actual_ms: interval.as_millis(),
            });
        }
        self.liveness_interval = interval;
        Ok(self)
    }

    /// Discard frames already buffered by the peer when the connection
    /// starts.
    #[must_use]
    pub fn skip_first_burst(mut self, enabled: bool) -> Self {
        self.skip_first_burst = enabled;
        self
    }

    /// Trim surrounding whitespace from decoded text.
    #[must_use]
    pub fn auto_trim(mut self, enabled: bool) -> Self {
        self.auto_trim = enabled;
        self
    }

    /// Replace the socket options applied before connecting.
    #[must_use]
    pub fn socket_options(mut self, socket_options: SocketOptions) -> Self {
        self.socket_options = socket_options;
        self
    }

    /// Finish the configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingHost`] or [`ConfigError::InvalidPort`]
    /// when the endpoint was not configured.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let host = self.host.ok_or(ConfigError::MissingHost)?;
        let port = self.port.ok_or(ConfigError::InvalidPort)?;
        let delimiter = match self.delimiter {
            DelimiterSource::Bytes(bytes) => bytes,
            DelimiterSource::Text(text) => Bytes::from(self.encoding.encode(&text)),
        };
        if delimiter.is_empty() {
            return Err(ConfigError::EmptyDelimiter);
        }
        Ok(ClientConfig {
            host,
            port,
            delimiter,
            encoding: self.encoding,
            poll_interval: self.poll_interval,
            liveness_interval: self.liveness_interval,
            skip_first_burst: self.skip_first_burst,
            auto_trim: self.auto_trim,
            socket_options: self.socket_options,
        })
    }
}

/// Socket options applied before connecting.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use wiretether::client::SocketOptions;
///
/// let options = SocketOptions::default()
///     .nodelay(true)
///     .keepalive(Some(Duration::from_secs(30)));
/// assert_ne!(options, SocketOptions::default());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SocketOptions {
    nodelay: Option<bool>,
    keepalive: Option<Option<Duration>>,
    linger: Option<Option<Duration>>,
}

impl SocketOptions {
    /// Configure `TCP_NODELAY`.
    #[must_use]
    pub fn nodelay(mut self, enabled: bool) -> Self {
        self.nodelay = Some(enabled);
        self
    }

    /// Configure `SO_KEEPALIVE`; `None` disables it.
    #[must_use]
    pub fn keepalive(mut self, idle: Option<Duration>) -> Self {
        self.keepalive = Some(idle);
        self
    }

    /// Configure `SO_LINGER`; `None` disables it.
    #[must_use]
    pub fn linger(mut self, duration: Option<Duration>) -> Self {
        self.linger = Some(duration);
        self
    }

    pub(crate) fn apply(&self, socket: &TcpSocket) -> io::Result<()> {
        if let Some(enabled) = self.nodelay {
            socket.set_nodelay(enabled)?;
        }
        match self.keepalive {
            Some(Some(idle)) => {
                socket.set_keepalive(true)?;
                SockRef::from(socket).set_tcp_keepalive(&TcpKeepalive::new().with_time(idle))?;
            }
            Some(None) => socket.set_keepalive(false)?,
            None => {}
        }
        if let Some(linger) = self.linger {
            socket.set_linger(linger)?;
        }
        Ok(())
    }
}
