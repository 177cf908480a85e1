//! Cryptographic primitives for knight-bus.
//!
//! Provides three things:
//!   1. BLAKE3 checksums: payload integrity and none-mode acks
//!   2. Per-message salts: fresh random bytes bound into every handshake
//!   3. RSA keys: OAEP encryption, PKCS#1 v1.5 signatures, and hybrid
//!      sealing for payloads larger than a single RSA block
//!
//! Sealed payloads use a one-shot ChaCha20-Poly1305 key wrapped with
//! RSA-OAEP under the receiver's public key:
//!
//!   [wrapped key (modulus size)] [nonce (12 bytes)] [ciphertext + 16-byte tag]
//!
//! Private key material is zeroized on drop by the `rsa` crate; the one-shot
//! data keys are held in `Zeroizing` buffers.

use std::fmt;

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::Zeroizing;

// ── Checksums ─────────────────────────────────────────────────────────────────

/// Size of a checksum in bytes.
pub const CHECKSUM_LEN: usize = 32;

/// Size of a handshake salt in bytes.
pub const SALT_LEN: usize = 16;

/// Smallest RSA modulus `RsaKey::generate` will produce.
pub const MIN_KEY_BITS: usize = 2048;

const DATA_KEY_LEN: usize = 32;
const DATA_NONCE_LEN: usize = 12;
const DATA_TAG_LEN: usize = 16;

pub type Checksum = [u8; CHECKSUM_LEN];
pub type Salt = [u8; SALT_LEN];

/// BLAKE3 digest of a byte slice.
pub fn checksum(data: &[u8]) -> Checksum {
    *blake3::hash(data).as_bytes()
}

/// Incremental BLAKE3 hasher for payloads that arrive in pieces.
///
/// # Example
/// ```
/// use knight_core::crypto::Hasher;
/// let mut h = Hasher::new();
/// h.update(b"knight ");
/// h.update(b"bus");
/// assert_eq!(h.finalize(), knight_core::crypto::checksum(b"knight bus"));
/// ```
pub struct Hasher(blake3::Hasher);

impl Hasher {
    pub fn new() -> Self {
        Self(blake3::Hasher::new())
    }

    pub fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    pub fn finalize(self) -> Checksum {
        *self.0.finalize().as_bytes()
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a fresh random salt. Never reused across handshakes.
pub fn generate_salt() -> Salt {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

// ── RSA keys ──────────────────────────────────────────────────────────────────

/// An RSA key as held by one end of a session.
///
/// The sender normally holds only the public half (encrypt, verify); the
/// receiver holds the private half (decrypt, sign). A private key can do
/// everything, so either role may be given one.
#[derive(Clone)]
pub struct RsaKey {
    public: RsaPublicKey,
    private: Option<RsaPrivateKey>,
}

impl RsaKey {
    /// Generate a new private key of `bits` bits.
    pub fn generate(bits: usize) -> Result<Self, CryptoError> {
        if bits < MIN_KEY_BITS {
            return Err(CryptoError::KeyTooSmall(bits));
        }
        let private = RsaPrivateKey::new(&mut OsRng, bits)?;
        Ok(Self::from(private))
    }

    /// Parse a PEM key. Accepts PKCS#8 and PKCS#1 private keys, and SPKI
    /// and PKCS#1 public keys.
    pub fn from_pem(pem: &str) -> Result<Self, CryptoError> {
        if let Ok(private) = RsaPrivateKey::from_pkcs8_pem(pem) {
            return Ok(Self::from(private));
        }
        if let Ok(private) = RsaPrivateKey::from_pkcs1_pem(pem) {
            return Ok(Self::from(private));
        }
        if let Ok(public) = RsaPublicKey::from_public_key_pem(pem) {
            return Ok(Self::from(public));
        }
        RsaPublicKey::from_pkcs1_pem(pem)
            .map(Self::from)
            .map_err(|e| CryptoError::KeyEncoding(e.to_string()))
    }

    /// The public half only. Hand this to senders.
    pub fn public_only(&self) -> Self {
        Self::from(self.public.clone())
    }

    pub fn has_private(&self) -> bool {
        self.private.is_some()
    }

    /// Modulus size in bytes. Every ciphertext and signature is this long.
    pub fn size(&self) -> usize {
        self.public.size()
    }

    pub fn public_pem(&self) -> Result<String, CryptoError> {
        self.public
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::KeyEncoding(e.to_string()))
    }

    /// PKCS#8 PEM of the private half. Store with mode 0600.
    pub fn private_pem(&self) -> Result<Zeroizing<String>, CryptoError> {
        self.private_key()?
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| CryptoError::KeyEncoding(e.to_string()))
    }

    /// RSA-OAEP (SHA-256) encryption of a message that fits in one block.
    pub fn encrypt(&self, msg: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Ok(self.public.encrypt(&mut OsRng, Oaep::new::<Sha256>(), msg)?)
    }

    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Ok(self
            .private_key()?
            .decrypt(Oaep::new::<Sha256>(), ciphertext)?)
    }

    /// PKCS#1 v1.5 signature over SHA-256(msg).
    pub fn sign(&self, msg: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let digest = Sha256::digest(msg);
        Ok(self
            .private_key()?
            .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)?)
    }

    pub fn verify(&self, msg: &[u8], signature: &[u8]) -> bool {
        let digest = Sha256::digest(msg);
        self.public
            .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature)
            .is_ok()
    }

    /// Seal an arbitrary-length message for the holder of the private key.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut data_key = Zeroizing::new([0u8; DATA_KEY_LEN]);
        OsRng.fill_bytes(&mut data_key[..]);
        let mut nonce = [0u8; DATA_NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let cipher = ChaCha20Poly1305::new(Key::from_slice(&data_key[..]));
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| CryptoError::Aead)?;
        let wrapped = self.encrypt(&data_key[..])?;

        let mut out = Vec::with_capacity(wrapped.len() + DATA_NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&wrapped);
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Inverse of [`RsaKey::seal`]. Requires the private half.
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let wrapped_len = self.size();
        if sealed.len() < wrapped_len + DATA_NONCE_LEN + DATA_TAG_LEN {
            return Err(CryptoError::TooShort(sealed.len()));
        }
        let (wrapped, rest) = sealed.split_at(wrapped_len);
        let (nonce, ciphertext) = rest.split_at(DATA_NONCE_LEN);

        let data_key = Zeroizing::new(self.decrypt(wrapped)?);
        if data_key.len() != DATA_KEY_LEN {
            return Err(CryptoError::Aead);
        }
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&data_key[..]));
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::Aead)
    }

    fn private_key(&self) -> Result<&RsaPrivateKey, CryptoError> {
        self.private.as_ref().ok_or(CryptoError::PrivateKeyRequired)
    }
}

impl From<RsaPrivateKey> for RsaKey {
    fn from(private: RsaPrivateKey) -> Self {
        Self {
            public: private.to_public_key(),
            private: Some(private),
        }
    }
}

impl From<RsaPublicKey> for RsaKey {
    fn from(public: RsaPublicKey) -> Self {
        Self {
            public,
            private: None,
        }
    }
}

impl fmt::Debug for RsaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaKey")
            .field("bits", &(self.size() * 8))
            .field("private", &self.has_private())
            .finish()
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("RSA error: {0}")]
    Rsa(#[from] rsa::Error),

    #[error("key encoding error: {0}")]
    KeyEncoding(String),

    #[error("RSA key of {0} bits is below the {} bit minimum", MIN_KEY_BITS)]
    KeyTooSmall(usize),

    #[error("operation requires the private half of the RSA key")]
    PrivateKeyRequired,

    #[error("sealed payload too short ({0} bytes)")]
    TooShort(usize),

    #[error("sealed payload failed authentication")]
    Aead,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
