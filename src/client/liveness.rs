//! Periodic liveness checks driving reconnects and disconnects.

use std::{
    sync::{Arc, Weak},
    time::{Duration, Instant},
};

use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span};

use super::{
    runtime::Shared,
    tracing_helpers::{emit_timing_event, liveness_span},
};

/// Result of one liveness check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LivenessOutcome {
    /// Another check was still running, so this one did nothing.
    Skipped,
    /// The host answered and the client is connected.
    Healthy,
    /// The host did not answer and the client was disconnected.
    Disconnected,
    /// The client was disconnected and a new connection was opened.
    Reconnected,
    /// The client was disconnected and reconnecting failed.
    ReconnectFailed,
}

impl LivenessOutcome {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Healthy => "healthy",
            Self::Disconnected => "disconnected",
            Self::Reconnected => "reconnected",
            Self::ReconnectFailed => "reconnect_failed",
        }
    }
}

/// Start the timer that schedules a check every `period`.
///
/// The first check fires one full period after the timer starts. Every tick
/// runs its check on a separate task, so a slow probe never delays the
/// timer; overlapping checks are rejected by the check itself.
pub(crate) fn spawn_timer(
    shared: Weak<Shared>,
    token: CancellationToken,
    period: Duration,
    span: Span,
) {
    tokio::spawn(
        async move {
            let mut ticker = time::interval_at(time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(client) = shared.upgrade() else {
                            break;
                        };
                        tokio::spawn(
                            async move {
                                client.check_liveness().await;
                            }
                            .in_current_span(),
                        );
                    }
                }
            }
            tracing::trace!("liveness timer stopped");
        }
        .instrument(span),
    );
}

impl Shared {
    /// Probe the host once and reconcile the connection with the result.
    pub(crate) async fn check_liveness(self: &Arc<Self>) -> LivenessOutcome {
        let Ok(_guard) = self.liveness_guard.try_lock() else {
            tracing::trace!("liveness check already in progress");
            return LivenessOutcome::Skipped;
        };
        let span = liveness_span(&self.tracing, self.config.host());
        let start = self.tracing.liveness_timing.then(Instant::now);
        let outcome = self.reconcile().instrument(span.clone()).await;
        span.record("outcome", outcome.as_str());
        span.in_scope(|| emit_timing_event(start));
        outcome
    }

    async fn reconcile(self: &Arc<Self>) -> LivenessOutcome {
        let reachable = match self.probe.probe(self.config.host()).await {
            Ok(reachable) => reachable,
            Err(error) => {
                tracing::trace!(%error, "probe failed");
                false
            }
        };
        let connected = self.is_connected();
        tracing::trace!(reachable, connected, "probe finished");

        if !reachable && connected {
            tracing::debug!("host unreachable, disconnecting");
            // Close failures are logged by disconnect; the state still moves.
            let _ = self.disconnect();
            LivenessOutcome::Disconnected
        } else if !connected {
            tracing::debug!("reconnecting");
            match self.connect().await {
                Ok(()) => LivenessOutcome::Reconnected,
                Err(_) => LivenessOutcome::ReconnectFailed,
            }
        } else {
            LivenessOutcome::Healthy
        }
    }
}
