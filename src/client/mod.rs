//! Persistent TCP client runtime.
//!
//! A [`TetherClient`] owns one outbound connection. Once connected it runs
//! two background tasks on the current tokio runtime:
//!
//! - a receive loop that drains the socket every poll interval, splits the
//!   bytes into delimiter-terminated frames and raises [`ClientEvent`]s;
//! - a liveness monitor that probes the remote host every liveness interval,
//!   disconnecting when the host stops answering and reconnecting when it
//!   answers again.
//!
//! The two tasks share only the connection slot and the connected flag. A
//! disconnect issued by the monitor while the receive loop is reading is
//! tolerated by the loop, which logs the failed iteration and carries on.

mod builder;
mod config;
mod error;
mod events;
mod link;
mod liveness;
mod probe;
mod receive;
mod runtime;
mod tracing_config;
mod tracing_helpers;

pub use builder::TetherClientBuilder;
pub use config::{
    ClientConfig,
    ClientConfigBuilder,
    DEFAULT_DELIMITER,
    DEFAULT_LIVENESS_INTERVAL,
    DEFAULT_POLL_INTERVAL,
    MIN_LIVENESS_INTERVAL,
    SocketOptions,
};
pub use error::{ClientError, ConfigError};
pub use events::{ClientEvent, EventHandler, SubscriptionId};
pub(crate) use link::Link;
pub use liveness::LivenessOutcome;
pub use probe::{PingProbe, ReachabilityProbe, TcpConnectProbe};
pub use runtime::{ConnectionState, TetherClient};
pub use tracing_config::TracingConfig;

#[cfg(test)]
mod tests;
