//! Blocking byte-stream transports.
//!
//! A transport owns at most one live stream. Every byte-level operation
//! connects first if needed, so callers never have to. `disconnect` is a
//! no-op when already disconnected, and dropping a transport closes whatever
//! it still holds exactly once.
//!
//! `Dialer` actively connects to a peer. `Listener` keeps a bound listening
//! socket for its whole life and accepts one connection at a time; dropping
//! the accepted connection leaves it ready to accept the next.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};

use crate::error::TransportError;

pub trait Transport {
    type Stream: Read + Write;

    /// Establish the connection. Idempotent.
    fn connect(&mut self) -> Result<(), TransportError>;

    /// Close the connection. Idempotent.
    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// The live stream, connecting first if needed.
    fn stream(&mut self) -> Result<&mut Self::Stream, TransportError>;

    /// Write all of `bytes`. The stream may fragment them however it likes.
    fn send_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let stream = self.stream()?;
        stream.write_all(bytes).map_err(TransportError::Send)?;
        stream.flush().map_err(TransportError::Send)
    }

    /// One read of at most `buf.len()` bytes. `Ok(0)` means the peer closed.
    fn recv_bytes(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let stream = self.stream()?;
        loop {
            match stream.read(buf) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => return other.map_err(TransportError::Recv),
            }
        }
    }

    /// Fill `buf` completely. Early close is an error.
    fn recv_exact(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        self.stream()?
            .read_exact(buf)
            .map_err(TransportError::Recv)
    }
}

fn close(stream: TcpStream) {
    // Shutdown fails on a socket the peer already reset; that is still closed.
    if let Err(e) = stream.shutdown(Shutdown::Both) {
        tracing::trace!(error = %e, "shutdown on close failed");
    }
}

// ── Dialer ────────────────────────────────────────────────────────────────────

/// Sender-side transport: dials `addr` on connect.
#[derive(Debug)]
pub struct Dialer {
    addr: SocketAddr,
    stream: Option<TcpStream>,
}

impl Dialer {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr, stream: None }
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Transport for Dialer {
    type Stream = TcpStream;

    fn connect(&mut self) -> Result<(), TransportError> {
        if self.stream.is_some() {
            return Ok(());
        }
        let stream = TcpStream::connect(self.addr).map_err(|source| TransportError::Connect {
            addr: self.addr,
            source,
        })?;
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(error = %e, "failed to set TCP_NODELAY");
        }
        tracing::debug!(peer = %self.addr, "connected");
        self.stream = Some(stream);
        Ok(())
    }

    fn disconnect(&mut self) {
        if let Some(stream) = self.stream.take() {
            close(stream);
            tracing::debug!(peer = %self.addr, "disconnected");
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn stream(&mut self) -> Result<&mut TcpStream, TransportError> {
        self.connect()?;
        self.stream.as_mut().ok_or(TransportError::NotConnected)
    }
}

impl Drop for Dialer {
    fn drop(&mut self) {
        self.disconnect();
    }
}

// ── Listener ──────────────────────────────────────────────────────────────────

/// Receiver-side transport: a persistent listening socket plus the most
/// recently accepted connection.
#[derive(Debug)]
pub struct Listener {
    listener: TcpListener,
    stream: Option<TcpStream>,
    peer: Option<SocketAddr>,
}

impl Listener {
    /// Bind `addr`. Port 0 picks an ephemeral port; see [`Listener::local_addr`].
    pub fn bind(addr: SocketAddr) -> Result<Self, TransportError> {
        let listener =
            TcpListener::bind(addr).map_err(|source| TransportError::Bind { addr, source })?;
        tracing::debug!(%addr, "listening");
        Ok(Self {
            listener,
            stream: None,
            peer: None,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Address of the currently accepted peer, if connected.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }
}

impl Transport for Listener {
    type Stream = TcpStream;

    /// Blocks until a peer connects.
    fn connect(&mut self) -> Result<(), TransportError> {
        if self.stream.is_some() {
            return Ok(());
        }
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(error = %e, "failed to set TCP_NODELAY");
        }
        tracing::debug!(%peer, "accepted connection");
        self.stream = Some(stream);
        self.peer = Some(peer);
        Ok(())
    }

    /// Closes the accepted connection only. The listening socket stays open.
    fn disconnect(&mut self) {
        if let Some(stream) = self.stream.take() {
            close(stream);
            tracing::debug!(peer = ?self.peer.take(), "disconnected");
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn stream(&mut self) -> Result<&mut TcpStream, TransportError> {
        self.connect()?;
        self.stream.as_mut().ok_or(TransportError::NotConnected)
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.disconnect();
    }
}

// ── In-memory pipe for tests ──────────────────────────────────────────────────
