//! Encryption strategies.
//!
//! A session picks one strategy at construction and keeps it for its whole
//! life. The strategy decides how payload bytes are produced, and how
//! handshake headers and acks are built and checked:
//!
//! | operation     | `none`                     | `rsa`                                   |
//! |---------------|----------------------------|-----------------------------------------|
//! | serialize     | JSON                       | JSON sealed to the receiver's key        |
//! | build_header  | raw header record          | RSA-OAEP(header record)                  |
//! | build_ack     | BLAKE3(ack record)         | RSA PKCS#1 v1.5 signature(ack record)    |
//!
//! `none` gives integrity only. Its ack proves the salt round-tripped, not
//! that the peer holds any key.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zerocopy::AsBytes;

use crate::config::ConfigError;
use crate::crypto::{self, Checksum, CryptoError, RsaKey, Salt, CHECKSUM_LEN};
use crate::wire::{HandshakeRecord, WireError, HEADER_TAG, RECORD_LEN};

/// Encryption mode name as it appears in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncryptMethod {
    Rsa,
    None,
}

impl FromStr for EncryptMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rsa" => Ok(EncryptMethod::Rsa),
            "none" => Ok(EncryptMethod::None),
            other => Err(ConfigError::UnknownMethod(other.to_string())),
        }
    }
}

impl fmt::Display for EncryptMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncryptMethod::Rsa => f.write_str("rsa"),
            EncryptMethod::None => f.write_str("none"),
        }
    }
}

/// The per-session strategy, holding its key material.
#[derive(Debug, Clone)]
pub enum EncryptionStrategy {
    None,
    Rsa(RsaKey),
}

impl EncryptionStrategy {
    /// Validate a method/key pairing. `none` forbids a key, `rsa` requires one.
    pub fn new(method: EncryptMethod, key: Option<RsaKey>) -> Result<Self, ConfigError> {
        match (method, key) {
            (EncryptMethod::None, None) => Ok(EncryptionStrategy::None),
            (EncryptMethod::None, Some(_)) => Err(ConfigError::UnexpectedKey),
            (EncryptMethod::Rsa, Some(key)) => Ok(EncryptionStrategy::Rsa(key)),
            (EncryptMethod::Rsa, None) => Err(ConfigError::MissingKey),
        }
    }

    /// Like [`EncryptionStrategy::new`], taking the method by name.
    pub fn from_name(method: &str, key: Option<RsaKey>) -> Result<Self, ConfigError> {
        Self::new(method.parse()?, key)
    }

    pub fn method(&self) -> EncryptMethod {
        match self {
            EncryptionStrategy::None => EncryptMethod::None,
            EncryptionStrategy::Rsa(_) => EncryptMethod::Rsa,
        }
    }

    // ── Payload ───────────────────────────────────────────────────────────────

    pub fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, StrategyError> {
        let plain = serde_json::to_vec(value)?;
        self.seal(&plain)
    }

    pub fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, StrategyError> {
        let plain = self.open(bytes)?;
        Ok(serde_json::from_slice(&plain)?)
    }

    /// Protect already-encoded bytes. Identity in `none` mode.
    pub fn seal(&self, plain: &[u8]) -> Result<Vec<u8>, StrategyError> {
        match self {
            EncryptionStrategy::None => Ok(plain.to_vec()),
            EncryptionStrategy::Rsa(key) => Ok(key.seal(plain)?),
        }
    }

    pub fn open(&self, bytes: &[u8]) -> Result<Vec<u8>, StrategyError> {
        match self {
            EncryptionStrategy::None => Ok(bytes.to_vec()),
            EncryptionStrategy::Rsa(key) => Ok(key.open(bytes)?),
        }
    }

    // ── Handshake ─────────────────────────────────────────────────────────────

    /// Exact byte length of every header this strategy builds or reads.
    pub fn header_len(&self) -> usize {
        match self {
            EncryptionStrategy::None => RECORD_LEN,
            EncryptionStrategy::Rsa(key) => key.size(),
        }
    }

    /// Exact byte length of every ack this strategy builds or verifies.
    pub fn ack_len(&self) -> usize {
        match self {
            EncryptionStrategy::None => CHECKSUM_LEN,
            EncryptionStrategy::Rsa(key) => key.size(),
        }
    }

    /// Build a header for `(size, checksum)` under a freshly generated salt.
    /// Returns the header bytes and the salt; the caller must keep the salt
    /// to verify the ack.
    pub fn build_header(
        &self,
        size: u64,
        checksum: &Checksum,
    ) -> Result<(Vec<u8>, Salt), StrategyError> {
        let salt = crypto::generate_salt();
        let record = HandshakeRecord::header(size, checksum, &salt);
        let bytes = match self {
            EncryptionStrategy::None => record.as_bytes().to_vec(),
            EncryptionStrategy::Rsa(key) => key.encrypt(record.as_bytes())?,
        };
        Ok((bytes, salt))
    }

    /// Parse a header into `(size, checksum, salt)`, rejecting any record not
    /// tagged as a sender → receiver header.
    pub fn read_header(&self, bytes: &[u8]) -> Result<(u64, Checksum, Salt), StrategyError> {
        let record = match self {
            EncryptionStrategy::None => HandshakeRecord::parse(bytes)?,
            EncryptionStrategy::Rsa(key) => HandshakeRecord::parse(&key.decrypt(bytes)?)?,
        };
        if record.tag != HEADER_TAG {
            return Err(StrategyError::TagMismatch {
                actual: String::from_utf8_lossy(&record.tag).into_owned(),
            });
        }
        Ok((record.size(), record.checksum, record.salt))
    }

    pub fn build_ack(
        &self,
        size: u64,
        checksum: &Checksum,
        salt: &Salt,
    ) -> Result<Vec<u8>, StrategyError> {
        let record = HandshakeRecord::ack(size, checksum, salt);
        match self {
            EncryptionStrategy::None => Ok(crypto::checksum(record.as_bytes()).to_vec()),
            EncryptionStrategy::Rsa(key) => Ok(key.sign(record.as_bytes())?),
        }
    }

    /// Check an ack against `(size, checksum)` and the salt this side holds.
    /// The salt must come from local state, never from the wire.
    pub fn verify_ack(&self, ack: &[u8], size: u64, checksum: &Checksum, salt: &Salt) -> bool {
        let record = HandshakeRecord::ack(size, checksum, salt);
        match self {
            EncryptionStrategy::None => ack == crypto::checksum(record.as_bytes()).as_slice(),
            EncryptionStrategy::Rsa(key) => key.verify(record.as_bytes(), ack),
        }
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("direction tag mismatch: got {actual:?}")]
    TagMismatch { actual: String },

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("payload encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

// ── Tests ─────────────────────────────────────────────────────────────────────
