//! The per-message header/ack handshake.
//!
//! ```text
//!   sender                                   receiver
//!     │  header(size, checksum, salt)  ──▶     │  read_header, check tag
//!     │                                  ◀──   │  ack(size, checksum, salt)
//!     │  verify ack under own salt             │
//! ```
//!
//! One round trip before every payload. The sender picks a new salt each
//! time; the receiver's ack covers it, so an ack captured for one message
//! never verifies for another. Any failure on either side closes the
//! connection and surfaces as `Error::Aborted`.

use knight_core::crypto::Checksum;

use crate::error::{Error, ProtocolError, Result};
use crate::session::Session;
use crate::transport::Transport;

impl<T: Transport> Session<T> {
    /// Initiator half: announce `(size, checksum)` and wait for a valid ack.
    pub fn send_object_header(&mut self, size: u64, checksum: &Checksum) -> Result<()> {
        self.exchange_header(size, checksum)
            .map_err(|e| self.abort(e))
    }

    /// Responder half: accept a header, ack it, and return `(size, checksum)`.
    pub fn recv_object_header(&mut self) -> Result<(u64, Checksum)> {
        self.answer_header().map_err(|e| self.abort(e))
    }

    fn exchange_header(&mut self, size: u64, checksum: &Checksum) -> Result<()> {
        let (header, salt) = self.strategy.build_header(size, checksum)?;
        self.salt = Some(salt);
        self.transport.send_bytes(&header)?;
        tracing::trace!(size, salt = %hex::encode(salt), "sent header");

        let ack = self.recv_record(self.strategy.ack_len())?;
        if !self.strategy.verify_ack(&ack, size, checksum, &salt) {
            return Err(ProtocolError::AckMismatch.into());
        }
        tracing::debug!(size, "handshake acknowledged");
        Ok(())
    }

    fn answer_header(&mut self) -> Result<(u64, Checksum)> {
        let header = self.recv_record(self.strategy.header_len())?;
        let (size, checksum, salt) = self.strategy.read_header(&header)?;
        self.salt = Some(salt);
        tracing::trace!(size, salt = %hex::encode(salt), "received header");

        if size > self.max_payload_size {
            return Err(ProtocolError::PayloadTooLarge {
                size,
                limit: self.max_payload_size,
            }
            .into());
        }

        let ack = self.strategy.build_ack(size, &checksum, &salt)?;
        self.transport.send_bytes(&ack)?;
        tracing::debug!(size, "handshake answered");
        Ok((size, checksum))
    }

    /// Headers and acks carry no length; the strategy fixes it.
    fn recv_record(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut record = vec![0u8; len];
        self.transport.recv_exact(&mut record)?;
        Ok(record)
    }
}
