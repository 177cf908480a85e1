//! knight-bus wire format.
//!
//! A message on the stream is:
//!
//!   [header] ──────────────▶
//!            ◀────────────── [ack]
//!   [payload, exactly `size` bytes] ──▶
//!
//! Nothing on the stream carries a length. Header and ack lengths are fixed
//! per strategy (see `EncryptionStrategy::header_len`/`ack_len`), and the
//! payload length comes from the header. Every header and ack is derived
//! from one 66-byte `HandshakeRecord`.
//!
//! The record is #[repr(C, packed)] with zerocopy derives, so its byte form
//! is fixed and allocation-free. Changing any field is a breaking change.

use static_assertions::assert_eq_size;
use zerocopy::byteorder::{LittleEndian, U64};
use zerocopy::{AsBytes, FromBytes, FromZeroes};

use crate::crypto::{Checksum, Salt};

// ── Direction tags ────────────────────────────────────────────────────────────

/// Length of a direction tag.
pub const TAG_LEN: usize = 10;

/// Tag carried by headers (sender → receiver).
pub const HEADER_TAG: [u8; TAG_LEN] = *b"knight-bus";

/// Tag covered by acks (receiver → sender).
pub const ACK_TAG: [u8; TAG_LEN] = *b"bus-knight";

// ── Handshake record ──────────────────────────────────────────────────────────

/// The logical `(tag, size, checksum, salt)` tuple behind every header and ack.
///
/// Wire size: 66 bytes.
#[derive(Debug, Clone, PartialEq, Eq, AsBytes, FromBytes, FromZeroes)]
#[repr(C, packed)]
pub struct HandshakeRecord {
    /// Direction tag. `HEADER_TAG` or `ACK_TAG`.
    pub tag: [u8; TAG_LEN],

    /// Payload length in bytes, little-endian.
    pub size: U64<LittleEndian>,

    /// BLAKE3 checksum of the exact payload bytes on the wire.
    pub checksum: Checksum,

    /// Per-message salt chosen by the sender.
    pub salt: Salt,
}

assert_eq_size!(HandshakeRecord, [u8; 66]);

/// Wire size of a `HandshakeRecord`.
pub const RECORD_LEN: usize = 66;

impl HandshakeRecord {
    pub fn new(tag: [u8; TAG_LEN], size: u64, checksum: &Checksum, salt: &Salt) -> Self {
        Self {
            tag,
            size: U64::new(size),
            checksum: *checksum,
            salt: *salt,
        }
    }

    /// A sender → receiver header record.
    pub fn header(size: u64, checksum: &Checksum, salt: &Salt) -> Self {
        Self::new(HEADER_TAG, size, checksum, salt)
    }

    /// The record an ack is computed over.
    pub fn ack(size: u64, checksum: &Checksum, salt: &Salt) -> Self {
        Self::new(ACK_TAG, size, checksum, salt)
    }

    /// Parse a record from exactly `RECORD_LEN` bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.len() != RECORD_LEN {
            return Err(WireError::RecordLength(bytes.len()));
        }
        Self::read_from(bytes).ok_or(WireError::RecordLength(bytes.len()))
    }

    pub fn size(&self) -> u64 {
        self.size.get()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

// ── Constants ─────────────────────────────────────────────────────────────────

/// Default receiver port.
pub const DEFAULT_PORT: u16 = 8900;

/// Default upper bound on a single payload read.
pub const DEFAULT_BUFFER_SIZE: usize = 2048;

/// Default upper bound on a declared payload size (1 GiB).
/// Headers announcing more are rejected before any payload is read.
pub const DEFAULT_MAX_PAYLOAD: u64 = 1 << 30;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors that can arise when interpreting wire-format data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("handshake record must be {} bytes, got {0}", RECORD_LEN)]
    RecordLength(usize),
}

// ── Tests ─────────────────────────────────────────────────────────────────────
