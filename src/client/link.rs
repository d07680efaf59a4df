//! Socket handle shared between the receive loop and writers.

use std::{
    io,
    net::Shutdown,
    sync::atomic::{AtomicBool, Ordering},
};

use bytes::BytesMut;
use socket2::SockRef;
use tokio::{net::TcpStream, sync::Mutex};

const READ_CHUNK: usize = 4096;

/// An open connection.
///
/// Reads never block: the receive loop drains whatever the kernel has
/// buffered. Writes are serialised so concurrent callers cannot interleave
/// partial payloads.
#[derive(Debug)]
pub(crate) struct Link {
    stream: TcpStream,
    closed: AtomicBool,
    write_lock: Mutex<()>,
}

impl Link {
    pub(crate) fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            closed: AtomicBool::new(false),
            write_lock: Mutex::new(()),
        }
    }

    /// `false` once the peer has closed its side or [`close`](Self::close)
    /// ran.
    pub(crate) fn is_active(&self) -> bool { !self.closed.load(Ordering::Acquire) }

    /// Append every byte that can be read without waiting to `buf`.
    ///
    /// Returns the number of bytes appended. A read error after some bytes
    /// were appended is deferred to the next call.
    pub(crate) fn drain(&self, buf: &mut BytesMut) -> io::Result<usize> {
        let mut chunk = [0u8; READ_CHUNK];
        let mut total = 0;
        loop {
            match self.stream.try_read(&mut chunk) {
                Ok(0) => {
                    if !self.closed.swap(true, Ordering::AcqRel) {
                        tracing::debug!("peer closed the connection");
                    }
                    break;
                }
                Ok(n) => {
                    buf.extend_from_slice(&chunk[..n]);
                    total += n;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(_) if total > 0 => break,
                Err(e) => return Err(e),
            }
        }
        Ok(total)
    }

    /// Write the whole of `data`.
    pub(crate) async fn write_all(&self, data: &[u8]) -> io::Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut written = 0;
        while written < data.len() {
            self.stream.writable().await?;
            match self.stream.try_write(&data[written..]) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Shut down both directions of the socket.
    ///
    /// Safe to call repeatedly; a socket the peer already tore down counts
    /// as closed.
    pub(crate) fn close(&self) -> io::Result<()> {
        self.closed.store(true, Ordering::Release);
        match SockRef::from(&self.stream).shutdown(Shutdown::Both) {
            Err(e) if e.kind() != io::ErrorKind::NotConnected => Err(e),
            _ => Ok(()),
        }
    }
}
