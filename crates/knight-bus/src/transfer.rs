//! Payload transfer on top of the handshake.
//!
//! `send` serializes through the session strategy, runs the header
//! handshake, and writes exactly `size` payload bytes with no framing.
//! `recv` answers the handshake, reads exactly `size` bytes in chunks of at
//! most `buffer_size`, checks the BLAKE3 checksum over the bytes as they
//! arrived, and only then decodes. Nothing is decoded before the checksum
//! passes.
//!
//! `send_raw`/`recv_raw` skip the JSON layer and move opaque bytes through
//! the same strategy and handshake.

use serde::de::DeserializeOwned;
use serde::Serialize;

use knight_core::crypto::{self, Checksum, Hasher};

use crate::error::{Error, ProtocolError, Result};
use crate::session::Session;
use crate::transport::Transport;

impl<T: Transport> Session<T> {
    /// Send one value. Connects first if needed.
    pub fn send<V: Serialize + ?Sized>(&mut self, value: &V) -> Result<()> {
        let payload = self
            .strategy
            .serialize(value)
            .map_err(|e| self.abort(e.into()))?;
        self.send_payload(&payload)
    }

    /// Send opaque bytes.
    pub fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        let payload = self.strategy.seal(bytes).map_err(|e| self.abort(e.into()))?;
        self.send_payload(&payload)
    }

    /// Receive one value. Blocks until a sender delivers it.
    pub fn recv<V: DeserializeOwned>(&mut self) -> Result<V> {
        let payload = self.recv_payload()?;
        self.strategy
            .deserialize(&payload)
            .map_err(|e| self.abort(e.into()))
    }

    /// Receive opaque bytes sent with [`Session::send_raw`].
    pub fn recv_raw(&mut self) -> Result<Vec<u8>> {
        let payload = self.recv_payload()?;
        self.strategy.open(&payload).map_err(|e| self.abort(e.into()))
    }

    fn send_payload(&mut self, payload: &[u8]) -> Result<()> {
        let checksum = crypto::checksum(payload);
        let size = payload.len() as u64;
        self.send_object_header(size, &checksum)?;
        self.transport
            .send_bytes(payload)
            .map_err(|e| self.abort(e.into()))?;
        tracing::info!(size, checksum = %short(&checksum), "payload sent");
        Ok(())
    }

    fn recv_payload(&mut self) -> Result<Vec<u8>> {
        let (size, checksum) = self.recv_object_header()?;
        let payload = self
            .read_body(size, &checksum)
            .map_err(|e| self.abort(e))?;
        tracing::info!(size, checksum = %short(&checksum), "payload received");
        Ok(payload)
    }

    fn read_body(&mut self, size: u64, expected: &Checksum) -> Result<Vec<u8>> {
        let size = usize::try_from(size).map_err(|_| ProtocolError::PayloadTooLarge {
            size,
            limit: self.max_payload_size,
        })?;

        // Grows as bytes arrive: the declared size is untrusted until they do.
        let mut body = Vec::with_capacity(size.min(self.buffer_size));
        let mut buf = vec![0u8; self.buffer_size.min(size).max(1)];
        let mut hasher = Hasher::new();

        while body.len() < size {
            let want = buf.len().min(size - body.len());
            let n = self.transport.recv_bytes(&mut buf[..want])?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
            body.extend_from_slice(&buf[..n]);
            tracing::trace!(read = n, received = body.len(), size, "payload chunk");
        }

        if body.len() < size {
            return Err(ProtocolError::Truncated {
                expected: size,
                actual: body.len(),
            }
            .into());
        }
        if hasher.finalize() != *expected {
            return Err(Error::Protocol(ProtocolError::ChecksumMismatch));
        }
        Ok(body)
    }
}

/// First eight hex digits, for log lines.
fn short(checksum: &Checksum) -> String {
    hex::encode(&checksum[..4])
}
