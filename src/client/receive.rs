//! Background receive loop.
//!
//! Each iteration drains whatever the socket has buffered, runs it through
//! the [`FrameAssembler`] and raises frame and burst events. Failures are
//! logged and never end the loop; only the stop token does.

use std::{
    io,
    sync::{Arc, Weak},
    time::{Duration, Instant},
};

use bytes::{Bytes, BytesMut};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use super::{
    ClientEvent,
    runtime::Shared,
    tracing_helpers::{emit_timing_event, receive_span},
};
use crate::{frame::FrameAssembler, message::Message};

/// Wait applied once when a poll finds nothing to read, before concluding
/// that the peer has gone quiet.
pub(crate) const IDLE_GRACE_PERIOD: Duration = Duration::from_millis(25);

/// State owned exclusively by the receive task.
#[derive(Debug)]
pub(crate) struct ReceiveState {
    assembler: FrameAssembler,
}

impl ReceiveState {
    pub(crate) fn new(delimiter: Bytes) -> Self {
        Self {
            assembler: FrameAssembler::new(delimiter),
        }
    }

    /// Turn one burst into the events it produces, frames first.
    ///
    /// With `suppress_frames` set the frames are still cut from the pending
    /// buffer but only the burst event is returned.
    pub(crate) fn process_burst(
        &mut self,
        burst: Bytes,
        suppress_frames: bool,
        message: impl Fn(Bytes) -> Message,
    ) -> Vec<ClientEvent> {
        let frames = self.assembler.ingest(&burst);
        let mut events = Vec::with_capacity(frames.len() + 1);
        if suppress_frames {
            if !frames.is_empty() {
                tracing::debug!(frames = frames.len(), "discarded frames from first burst");
            }
        } else {
            events.extend(frames.into_iter().map(|f| ClientEvent::Frame(message(f))));
        }
        events.push(ClientEvent::Burst(message(burst)));
        events
    }
}

pub(crate) async fn run(shared: Weak<Shared>, stop: CancellationToken, poll_interval: Duration) {
    let Some(mut state) = shared
        .upgrade()
        .map(|s| ReceiveState::new(s.config.delimiter().clone()))
    else {
        return;
    };
    tracing::debug!("receive loop started");
    while !stop.is_cancelled() {
        let Some(client) = shared.upgrade() else {
            break;
        };
        if let Err(error) = poll_once(&client, &mut state).await {
            tracing::error!(%error, "receive iteration failed");
        }
        drop(client);
        tokio::select! {
            () = stop.cancelled() => break,
            () = sleep(poll_interval) => {}
        }
    }
    tracing::debug!("receive loop stopped");
}

async fn poll_once(shared: &Arc<Shared>, state: &mut ReceiveState) -> io::Result<()> {
    let Some(link) = shared.current_link() else {
        return Ok(());
    };
    if !link.is_active() {
        return Ok(());
    }

    let mut burst = BytesMut::new();
    if link.drain(&mut burst)? == 0 {
        sleep(IDLE_GRACE_PERIOD).await;
        if link.drain(&mut burst)? == 0 {
            shared.clear_skip_first_burst();
            return Ok(());
        }
    }

    let span = receive_span(&shared.tracing, burst.len());
    let _entered = span.enter();
    let start = shared.tracing.receive_timing.then(Instant::now);
    let suppress = shared.skip_first_burst_armed();
    let events = state.process_burst(burst.freeze(), suppress, |data| {
        Message::new(data, &shared.config, Arc::downgrade(&link))
    });
    shared.clear_skip_first_burst();
    for event in &events {
        shared.events.emit(event);
    }
    emit_timing_event(start);
    Ok(())
}
