//! Shared utilities for integration tests.

// Items in this shared module may not be used by all test binaries that import it.
#![allow(
    dead_code,
    reason = "shared test utilities are not used by all test binaries"
)]

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use rstest::fixture;
use wiretether::{ClientConfigBuilder, ReachabilityProbe, TetherClient};
use wiretether_testing::{EventLog, ScriptedDevice, recorder};

/// Probe whose answer the test flips at will.
#[derive(Clone, Debug, Default)]
pub struct SwitchProbe(Arc<AtomicBool>);

impl SwitchProbe {
    pub fn new(reachable: bool) -> Self { Self(Arc::new(AtomicBool::new(reachable))) }

    pub fn set(&self, reachable: bool) { self.0.store(reachable, Ordering::SeqCst); }
}

#[async_trait]
impl ReachabilityProbe for SwitchProbe {
    async fn probe(&self, _host: &str) -> io::Result<bool> { Ok(self.0.load(Ordering::SeqCst)) }
}

#[fixture]
pub fn reachable() -> SwitchProbe { SwitchProbe::new(true) }

/// Build a recorded client for `device` after `customise` adjusts the
/// configuration.
pub fn client_for(
    device: &ScriptedDevice,
    probe: SwitchProbe,
    customise: impl FnOnce(ClientConfigBuilder) -> ClientConfigBuilder,
) -> (TetherClient, EventLog) {
    let config = customise(device.client_config())
        .build()
        .expect("valid client configuration");
    let (handler, log) = recorder();
    let client = TetherClient::builder(config)
        .probe(probe)
        .on_event(handler)
        .build();
    (client, log)
}

/// Connect `client` and wait until the device has accepted `count`
/// connections in total.
pub async fn connect(client: &TetherClient, device: &ScriptedDevice, count: usize) {
    client.connect().await.expect("connect to device");
    device.wait_for_connections(count).await;
}
