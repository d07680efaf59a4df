//! Span and timing helpers for client operations.
//!
//! Keeps dynamic level selection out of the operation bodies.

use std::time::Instant;

use tracing::{Level, Span};

use super::tracing_config::TracingConfig;

/// Create a tracing span at a dynamically selected level.
///
/// Each branch calls the matching `tracing::<level>_span!` macro so the span
/// metadata stays static while the level is chosen at runtime.
macro_rules! dynamic_span {
    ($level:expr, $name:expr $(, $($field:tt)*)?) => {
        match $level {
            Level::ERROR => tracing::error_span!($name $(, $($field)*)?),
            Level::WARN  => tracing::warn_span!($name $(, $($field)*)?),
            Level::INFO  => tracing::info_span!($name $(, $($field)*)?),
            Level::DEBUG => tracing::debug_span!($name $(, $($field)*)?),
            Level::TRACE => tracing::trace_span!($name $(, $($field)*)?),
        }
    };
}

#[expect(
    clippy::cognitive_complexity,
    reason = "complexity from dynamic_span! macro expansion"
)]
pub(crate) fn connect_span(config: &TracingConfig, peer_addr: &str) -> Span {
    dynamic_span!(
        config.connect_level,
        "tether.connect",
        peer.addr = peer_addr
    )
}

#[expect(
    clippy::cognitive_complexity,
    reason = "complexity from dynamic_span! macro expansion"
)]
pub(crate) fn disconnect_span(config: &TracingConfig) -> Span {
    dynamic_span!(config.disconnect_level, "tether.disconnect")
}

#[expect(
    clippy::cognitive_complexity,
    reason = "complexity from dynamic_span! macro expansion"
)]
pub(crate) fn write_span(config: &TracingConfig, bytes: usize) -> Span {
    dynamic_span!(config.write_level, "tether.write", payload.bytes = bytes)
}

#[expect(
    clippy::cognitive_complexity,
    reason = "complexity from dynamic_span! macro expansion"
)]
pub(crate) fn receive_span(config: &TracingConfig, bytes: usize) -> Span {
    dynamic_span!(config.receive_level, "tether.receive", burst.bytes = bytes)
}

/// The `outcome` field is recorded once the check completes.
#[expect(
    clippy::cognitive_complexity,
    reason = "complexity from dynamic_span! macro expansion"
)]
pub(crate) fn liveness_span(config: &TracingConfig, host: &str) -> Span {
    dynamic_span!(
        config.liveness_level,
        "tether.liveness",
        peer.host = host,
        outcome = tracing::field::Empty
    )
}

/// Emit an `elapsed_us` event at `DEBUG` if timing was enabled.
pub(crate) fn emit_timing_event(start: Option<Instant>) {
    if let Some(start) = start {
        let elapsed_us = start.elapsed().as_micros();
        tracing::debug!(elapsed_us = elapsed_us, "operation.timing");
    }
}
