//! Utilities for driving a [`TetherClient`](wiretether::TetherClient)
//! against a scripted device during tests.
//!
//! [`ScriptedDevice`] listens on an ephemeral loopback port and plays the
//! remote side: it records what the client writes and pushes bytes back on
//! request. [`recorder`] turns client events into comparable values.
//!
//! ```rust,no_run
//! use wiretether::TetherClient;
//! use wiretether_testing::{Recorded, ScriptedDevice, recorder};
//!
//! # async fn example() -> std::io::Result<()> {
//! let device = ScriptedDevice::start().await?;
//! let (handler, mut log) = recorder();
//! let client = TetherClient::builder(device.client_config().build().unwrap())
//!     .on_event(handler)
//!     .build();
//! client.connect().await.unwrap();
//! device.wait_for_connections(1).await;
//! device.send(&b"HELLO\r\n"[..]);
//! assert_eq!(log.next_frame().await, "HELLO");
//! # Ok(())
//! # }
//! ```

pub mod device;
pub mod recorder;

pub use device::{DeviceScript, ScriptedDevice};
pub use recorder::{EventLog, Recorded, recorder};

/// Result type for tests that propagate errors with `?`.
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;
