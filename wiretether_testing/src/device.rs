//! A scripted loopback peer standing in for a remote device.

use std::{
    io,
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
    time::Duration,
};

use bytes::{Bytes, BytesMut};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::{broadcast, mpsc, watch},
    task::JoinHandle,
    time::timeout,
};
use wiretether::{ClientConfig, ClientConfigBuilder};

/// How long helpers wait before failing a test.
pub const WAIT_LIMIT: Duration = Duration::from_secs(5);

type Responder = Arc<dyn Fn(&[u8]) -> Option<Vec<u8>> + Send + Sync>;

#[derive(Clone, Debug)]
enum Command {
    Send(Bytes),
    HangUp,
}

/// Behaviour of a [`ScriptedDevice`] for every accepted connection.
#[derive(Clone, Default)]
pub struct DeviceScript {
    greeting: Option<Bytes>,
    responder: Option<Responder>,
}

impl DeviceScript {
    /// Write `greeting` as soon as a connection is accepted.
    #[must_use]
    pub fn greeting(mut self, greeting: impl Into<Bytes>) -> Self {
        self.greeting = Some(greeting.into());
        self
    }

    /// Answer each chunk read from the client with the bytes `respond`
    /// returns, if any.
    #[must_use]
    pub fn responder(
        mut self,
        respond: impl Fn(&[u8]) -> Option<Vec<u8>> + Send + Sync + 'static,
    ) -> Self {
        self.responder = Some(Arc::new(respond));
        self
    }

    /// Bind to an ephemeral loopback port and start accepting.
    ///
    /// # Errors
    ///
    /// Returns any IO error raised while binding.
    pub async fn start(self) -> io::Result<ScriptedDevice> {
        let listener = TcpListener::bind(SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0)).await?;
        let addr = listener.local_addr()?;
        let (commands, _) = broadcast::channel(64);
        let (inbound_tx, inbound) = mpsc::unbounded_channel();
        let (accepted_tx, accepted) = watch::channel(0);
        let (closed_tx, closed) = watch::channel(0);
        let task = tokio::spawn(accept_loop(
            listener,
            Arc::new(self),
            commands.clone(),
            inbound_tx,
            accepted_tx,
            Arc::new(closed_tx),
        ));
        Ok(ScriptedDevice {
            addr,
            commands,
            inbound,
            accepted,
            closed,
            task,
        })
    }
}

/// Loopback peer that records client writes and plays back scripted bytes.
///
/// Dropping the device stops accepting; open connections close once their
/// tasks notice the command channel is gone.
pub struct ScriptedDevice {
    addr: SocketAddr,
    commands: broadcast::Sender<Command>,
    inbound: mpsc::UnboundedReceiver<Bytes>,
    accepted: watch::Receiver<usize>,
    closed: watch::Receiver<usize>,
    task: JoinHandle<()>,
}

impl ScriptedDevice {
    /// Start a device that only records.
    ///
    /// # Errors
    ///
    /// Returns any IO error raised while binding.
    pub async fn start() -> io::Result<Self> { DeviceScript::default().start().await }

    /// Address the device listens on.
    #[must_use]
    pub fn addr(&self) -> SocketAddr { self.addr }

    /// Configuration builder pointed at the device with a CRLF delimiter.
    ///
    /// The liveness interval is long enough never to fire during a test.
    ///
    /// # Panics
    ///
    /// Never in practice; the preset values are all valid.
    #[must_use]
    pub fn client_config(&self) -> ClientConfigBuilder {
        ClientConfig::builder()
            .conn_data(self.addr.ip().to_string(), self.addr.port())
            .and_then(|b| b.delimiter(&b"\r\n"[..]))
            .and_then(|b| b.liveness_interval(Duration::from_secs(600)))
            .expect("preset device configuration is valid")
    }

    /// Write `bytes` to every open connection.
    pub fn send(&self, bytes: impl Into<Bytes>) {
        // No receivers only means no connection is open yet.
        let _ = self.commands.send(Command::Send(bytes.into()));
    }

    /// Close every open connection from the device side.
    pub fn hang_up(&self) { let _ = self.commands.send(Command::HangUp); }

    /// Number of connections accepted so far.
    #[must_use]
    pub fn accepted(&self) -> usize { *self.accepted.borrow() }

    /// Wait until at least `count` connections were accepted.
    ///
    /// # Panics
    ///
    /// Panics if that does not happen within [`WAIT_LIMIT`].
    pub async fn wait_for_connections(&self, count: usize) {
        let mut accepted = self.accepted.clone();
        timeout(WAIT_LIMIT, accepted.wait_for(|n| *n >= count))
            .await
            .expect("timed out waiting for connections")
            .expect("device stopped");
    }

    /// Wait until at least `count` connections were closed by either side.
    ///
    /// # Panics
    ///
    /// Panics if that does not happen within [`WAIT_LIMIT`].
    pub async fn wait_for_disconnections(&self, count: usize) {
        let mut closed = self.closed.clone();
        timeout(WAIT_LIMIT, closed.wait_for(|n| *n >= count))
            .await
            .expect("timed out waiting for disconnections")
            .expect("device stopped");
    }

    /// Read client writes until `len` bytes have arrived.
    ///
    /// # Panics
    ///
    /// Panics if fewer bytes arrive within [`WAIT_LIMIT`].
    pub async fn read_exact(&mut self, len: usize) -> Bytes {
        let mut buf = BytesMut::new();
        let collect = async {
            while buf.len() < len {
                let Some(chunk) = self.inbound.recv().await else {
                    break;
                };
                buf.extend_from_slice(&chunk);
            }
        };
        timeout(WAIT_LIMIT, collect)
            .await
            .expect("timed out waiting for client writes");
        assert!(buf.len() >= len, "device stopped after {} bytes", buf.len());
        buf.freeze()
    }

    /// Whether the client wrote nothing for `quiet`.
    pub async fn stays_silent(&mut self, quiet: Duration) -> bool {
        timeout(quiet, self.inbound.recv()).await.is_err()
    }
}

impl Drop for ScriptedDevice {
    fn drop(&mut self) { self.task.abort(); }
}

async fn accept_loop(
    listener: TcpListener,
    script: Arc<DeviceScript>,
    commands: broadcast::Sender<Command>,
    inbound: mpsc::UnboundedSender<Bytes>,
    accepted: watch::Sender<usize>,
    closed: Arc<watch::Sender<usize>>,
) {
    while let Ok((stream, _)) = listener.accept().await {
        let session = commands.subscribe();
        accepted.send_modify(|n| *n += 1);
        let script = Arc::clone(&script);
        let inbound = inbound.clone();
        let closed = Arc::clone(&closed);
        tokio::spawn(async move {
            serve(stream, &script, session, &inbound).await;
            closed.send_modify(|n| *n += 1);
        });
    }
}

async fn serve(
    stream: TcpStream,
    script: &DeviceScript,
    mut commands: broadcast::Receiver<Command>,
    inbound: &mpsc::UnboundedSender<Bytes>,
) {
    let (mut reader, mut writer) = stream.into_split();
    if let Some(greeting) = &script.greeting
        && writer.write_all(greeting).await.is_err()
    {
        return;
    }
    let mut buf = vec![0u8; 4096];
    loop {
        tokio::select! {
            read = reader.read(&mut buf) => {
                let n = match read {
                    Ok(0) | Err(_) => break,
                    Ok(n) => n,
                };
                let chunk = &buf[..n];
                let _ = inbound.send(Bytes::copy_from_slice(chunk));
                if let Some(reply) = script.responder.as_ref().and_then(|respond| respond(chunk))
                    && writer.write_all(&reply).await.is_err()
                {
                    break;
                }
            }
            command = commands.recv() => match command {
                Ok(Command::Send(bytes)) => {
                    if writer.write_all(&bytes).await.is_err() {
                        break;
                    }
                }
                Ok(Command::HangUp) | Err(broadcast::error::RecvError::Closed) => break,
                Err(broadcast::error::RecvError::Lagged(_)) => {}
            },
        }
    }
    let _ = writer.shutdown().await;
}
