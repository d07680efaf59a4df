//! Reachability probes used by the liveness monitor.

use std::{io, process::Stdio, time::Duration};

use async_trait::async_trait;
use tokio::{net::TcpStream, process::Command, time::timeout};

/// Checks whether the remote host is alive, independently of the TCP
/// connection state.
///
/// An `Err` is treated the same as `Ok(false)` by the liveness monitor.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync + 'static {
    /// Return `true` if `host` answered.
    async fn probe(&self, host: &str) -> io::Result<bool>;
}

/// Sends a single ICMP echo request through the system `ping` utility.
///
/// Raw ICMP sockets need elevated privileges on most systems, so the probe
/// delegates to the setuid `ping` binary instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PingProbe {
    timeout: Duration,
}

impl PingProbe {
    /// Create a probe waiting at most `timeout` for the echo reply.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self { Self { timeout } }

    fn command(&self, host: &str) -> Command {
        let mut command = Command::new("ping");
        command
            .args(ping_args(PingFlavor::current(), self.timeout, host))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        command
    }
}

/// Command line dialect of the system `ping` utility.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PingFlavor {
    /// `-n count -w millis`.
    Windows,
    /// macOS and `FreeBSD` family: `-c count -W millis`.
    Bsd,
    /// iputils and busybox: `-c count -W seconds`.
    Linux,
}

impl PingFlavor {
    pub(crate) const fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else if cfg!(any(
            target_os = "macos",
            target_os = "ios",
            target_os = "freebsd",
            target_os = "dragonfly"
        )) {
            Self::Bsd
        } else {
            Self::Linux
        }
    }
}

/// Arguments sending one echo request to `host`, waiting at most `timeout`.
pub(crate) fn ping_args(flavor: PingFlavor, timeout: Duration, host: &str) -> Vec<String> {
    let millis = timeout.as_millis().max(1).to_string();
    let secs = timeout.as_secs().max(1).to_string();
    let mut args: Vec<String> = match flavor {
        PingFlavor::Windows => vec!["-n".into(), "1".into(), "-w".into(), millis],
        PingFlavor::Bsd => vec!["-c".into(), "1".into(), "-W".into(), millis],
        PingFlavor::Linux => vec!["-c".into(), "1".into(), "-W".into(), secs],
    };
    args.push(host.to_owned());
    args
}

impl Default for PingProbe {
    fn default() -> Self { Self::new(Duration::from_secs(5)) }
}

#[async_trait]
impl ReachabilityProbe for PingProbe {
    async fn probe(&self, host: &str) -> io::Result<bool> {
        if host.starts_with('-') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "host must not start with '-'",
            ));
        }
        // The utility enforces its own timeout; this bounds a hung process.
        let limit = self.timeout + Duration::from_secs(1);
        let status = timeout(limit, self.command(host).status())
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "ping did not finish"))??;
        Ok(status.success())
    }
}

/// Treats the host as alive when it accepts a TCP connection on `port`.
///
/// Useful where ICMP is filtered. The probe connection is closed
/// immediately.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TcpConnectProbe {
    port: u16,
    timeout: Duration,
}

impl TcpConnectProbe {
    /// Create a probe connecting to `port` within `timeout`.
    #[must_use]
    pub const fn new(port: u16, timeout: Duration) -> Self { Self { port, timeout } }
}

#[async_trait]
impl ReachabilityProbe for TcpConnectProbe {
    async fn probe(&self, host: &str) -> io::Result<bool> {
        match timeout(self.timeout, TcpStream::connect((host, self.port))).await {
            Ok(Ok(_stream)) => Ok(true),
            Ok(Err(e)) => Err(e),
            Err(_) => Ok(false),
        }
    }
}
