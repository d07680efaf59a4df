//! Tracing configuration for tether client operations.
//!
//! [`TracingConfig`] controls the level of the span each client operation
//! opens and whether an elapsed-time event is recorded when it completes.

use tracing::Level;

/// Controls tracing span levels and per-operation timing.
///
/// By default, lifecycle operations (`connect`, `disconnect`) emit spans at
/// `INFO` level. High-frequency operations (`write`, `receive`, `liveness`)
/// emit spans at `DEBUG` level. Timing is disabled for all operations by
/// default.
///
/// When no `tracing` subscriber is installed, span creation is a no-op. When
/// timing is enabled for an operation, a `DEBUG` event recording
/// `elapsed_us` is emitted inside the operation's span once it completes.
///
/// # Examples
///
/// ```
/// use tracing::Level;
/// use wiretether::client::TracingConfig;
///
/// let config = TracingConfig::default()
///     .with_connect_timing(true)
///     .with_liveness_level(Level::TRACE);
/// let _ = config;
///
/// let verbose = TracingConfig::default()
///     .with_all_levels(Level::TRACE)
///     .with_all_timing(true);
/// let _ = verbose;
/// ```
#[expect(
    clippy::struct_excessive_bools,
    reason = "five independent on/off timing flags, one per operation"
)]
#[derive(Clone, Debug)]
pub struct TracingConfig {
    pub(crate) connect_level: Level,
    pub(crate) disconnect_level: Level,
    pub(crate) write_level: Level,
    pub(crate) receive_level: Level,
    pub(crate) liveness_level: Level,
    pub(crate) connect_timing: bool,
    pub(crate) disconnect_timing: bool,
    pub(crate) write_timing: bool,
    pub(crate) receive_timing: bool,
    pub(crate) liveness_timing: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            connect_level: Level::INFO,
            disconnect_level: Level::INFO,
            write_level: Level::DEBUG,
            receive_level: Level::DEBUG,
            liveness_level: Level::DEBUG,
            connect_timing: false,
            disconnect_timing: false,
            write_timing: false,
            receive_timing: false,
            liveness_timing: false,
        }
    }
}

impl TracingConfig {
    /// Set the span level for `connect`, including reconnects made by the
    /// liveness monitor.
    #[must_use]
    pub fn with_connect_level(mut self, level: Level) -> Self {
        self.connect_level = level;
        self
    }

    /// Enable or disable timing for `connect`.
    #[must_use]
    pub fn with_connect_timing(mut self, enabled: bool) -> Self {
        self.connect_timing = enabled;
        self
    }

    /// Set the span level for `disconnect`.
    #[must_use]
    pub fn with_disconnect_level(mut self, level: Level) -> Self {
        self.disconnect_level = level;
        self
    }

    /// Enable or disable timing for `disconnect`.
    #[must_use]
    pub fn with_disconnect_timing(mut self, enabled: bool) -> Self {
        self.disconnect_timing = enabled;
        self
    }

    /// Set the span level for outbound writes.
    #[must_use]
    pub fn with_write_level(mut self, level: Level) -> Self {
        self.write_level = level;
        self
    }

    /// Enable or disable timing for outbound writes.
    #[must_use]
    pub fn with_write_timing(mut self, enabled: bool) -> Self {
        self.write_timing = enabled;
        self
    }

    /// Set the span level for processing a received burst.
    #[must_use]
    pub fn with_receive_level(mut self, level: Level) -> Self {
        self.receive_level = level;
        self
    }

    /// Enable or disable timing for processing a received burst.
    #[must_use]
    pub fn with_receive_timing(mut self, enabled: bool) -> Self {
        self.receive_timing = enabled;
        self
    }

    /// Set the span level for liveness checks.
    #[must_use]
    pub fn with_liveness_level(mut self, level: Level) -> Self {
        self.liveness_level = level;
        self
    }

    /// Enable or disable timing for liveness checks.
    #[must_use]
    pub fn with_liveness_timing(mut self, enabled: bool) -> Self {
        self.liveness_timing = enabled;
        self
    }

    /// Set the span level for all operations at once.
    #[must_use]
    pub fn with_all_levels(mut self, level: Level) -> Self {
        self.connect_level = level;
        self.disconnect_level = level;
        self.write_level = level;
        self.receive_level = level;
        self.liveness_level = level;
        self
    }

    /// Enable or disable timing for all operations at once.
    #[must_use]
    pub fn with_all_timing(mut self, enabled: bool) -> Self {
        self.connect_timing = enabled;
        self.disconnect_timing = enabled;
        self.write_timing = enabled;
        self.receive_timing = enabled;
        self.liveness_timing = enabled;
        self
    }
}
