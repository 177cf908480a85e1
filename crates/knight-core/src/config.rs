//! Session configuration.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $KNIGHT_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/knight-bus/config.toml
//!   3. ~/.config/knight-bus/config.toml

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::crypto::{CryptoError, RsaKey};
use crate::strategy::{EncryptMethod, EncryptionStrategy};
use crate::wire::{DEFAULT_BUFFER_SIZE, DEFAULT_MAX_PAYLOAD, DEFAULT_PORT};

/// Everything needed to build a sender or receiver session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// `"rsa"` or `"none"`.
    pub encrypt_method: EncryptMethod,
    /// PEM key file. Required for rsa, forbidden for none.
    /// Senders hold the public key, receivers the private key.
    pub key_path: Option<PathBuf>,
    /// Receiver address. Senders dial it, receivers bind it.
    pub ip: String,
    pub port: u16,
    /// Connect (or accept) while constructing the session.
    pub auto_connect: bool,
    /// Upper bound on each payload read.
    pub buffer_size: usize,
    /// Largest payload a receiver will accept from a header.
    pub max_payload_size: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            encrypt_method: EncryptMethod::None,
            key_path: None,
            ip: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            auto_connect: true,
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("knight-bus")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown encryption method {0:?} (expected \"rsa\" or \"none\")")]
    UnknownMethod(String),
    #[error("encryption method \"rsa\" requires a key")]
    MissingKey,
    #[error("encryption method \"none\" does not take a key")]
    UnexpectedKey,
    #[error("buffer size must be greater than zero")]
    InvalidBufferSize,
    #[error("cannot resolve address {0}: {1}")]
    BadAddress(String, std::io::Error),
    #[error("failed to read key {0}: {1}")]
    KeyReadFailed(PathBuf, std::io::Error),
    #[error("invalid key {0}: {1}")]
    InvalidKey(PathBuf, CryptoError),
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl SessionConfig {
    /// Defaults for a receiver: bind every interface.
    pub fn receiver() -> Self {
        Self {
            ip: "0.0.0.0".to_string(),
            ..Self::default()
        }
    }

    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            SessionConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("KNIGHT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Resolve `ip:port`. Hostnames are looked up; the first address wins.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let target = format!("{}:{}", self.ip, self.port);
        (self.ip.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| ConfigError::BadAddress(target.clone(), e))?
            .next()
            .ok_or_else(|| {
                ConfigError::BadAddress(
                    target,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses"),
                )
            })
    }

    /// Load the key (if any) and validate it against the method.
    pub fn strategy(&self) -> Result<EncryptionStrategy, ConfigError> {
        if self.buffer_size == 0 {
            return Err(ConfigError::InvalidBufferSize);
        }
        let key = match &self.key_path {
            Some(path) => {
                let pem = std::fs::read_to_string(path)
                    .map_err(|e| ConfigError::KeyReadFailed(path.clone(), e))?;
                Some(RsaKey::from_pem(&pem).map_err(|e| ConfigError::InvalidKey(path.clone(), e))?)
            }
            None => None,
        };
        EncryptionStrategy::new(self.encrypt_method, key)
    }

    /// Apply KNIGHT_* env var overrides. Unparseable values are ignored.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("KNIGHT_ENCRYPT_METHOD") {
            if let Ok(m) = v.parse() {
                self.encrypt_method = m;
            }
        }
        if let Ok(v) = std::env::var("KNIGHT_KEY_PATH") {
            self.key_path = if v.is_empty() { None } else { Some(PathBuf::from(v)) };
        }
        if let Ok(v) = std::env::var("KNIGHT_IP") {
            self.ip = v;
        }
        if let Ok(v) = std::env::var("KNIGHT_PORT") {
            if let Ok(p) = v.parse() {
                self.port = p;
            }
        }
        if let Ok(v) = std::env::var("KNIGHT_BUFFER_SIZE") {
            if let Ok(n) = v.parse() {
                self.buffer_size = n;
            }
        }
        if let Ok(v) = std::env::var("KNIGHT_AUTO_CONNECT") {
            self.auto_connect = v == "true" || v == "1";
        }
        if let Ok(v) = std::env::var("KNIGHT_MAX_PAYLOAD_SIZE") {
            if let Ok(n) = v.parse() {
                self.max_payload_size = n;
            }
        }
    }
}
