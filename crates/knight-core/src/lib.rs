//! knight-core: wire records, cryptographic primitives, encryption strategies,
//! and session configuration. The `knight-bus` session engine depends on this.

pub mod config;
pub mod crypto;
pub mod strategy;
pub mod wire;

pub use config::{ConfigError, SessionConfig};
pub use crypto::{Checksum, RsaKey, Salt};
pub use strategy::{EncryptMethod, EncryptionStrategy, StrategyError};
