//! Sessions and their two roles.
//!
//! A `Session` is one end of a knight-bus connection: a transport, the
//! encryption strategy chosen at setup, and the salt of the most recent
//! handshake. `Sender` dials out; `Receiver` listens and accepts. Both run
//! the same handshake and transfer code (see `handshake` and `transfer`).
//!
//! Sessions are not shared. Run one per thread if you need several.

use std::net::SocketAddr;

use knight_core::config::{ConfigError, SessionConfig};
use knight_core::crypto::Salt;
use knight_core::strategy::EncryptionStrategy;
use knight_core::wire::{DEFAULT_BUFFER_SIZE, DEFAULT_MAX_PAYLOAD};

use crate::error::{Error, Result, TransportError};
use crate::transport::{Dialer, Listener, Transport};

pub type Sender = Session<Dialer>;
pub type Receiver = Session<Listener>;

/// Tunables shared by both roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Upper bound on a single payload read.
    pub buffer_size: usize,
    /// Headers announcing more than this are rejected.
    pub max_payload_size: u64,
    /// Connect (or accept) during construction.
    pub auto_connect: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            auto_connect: true,
        }
    }
}

impl From<&SessionConfig> for SessionOptions {
    fn from(config: &SessionConfig) -> Self {
        Self {
            buffer_size: config.buffer_size,
            max_payload_size: config.max_payload_size,
            auto_connect: config.auto_connect,
        }
    }
}

pub struct Session<T: Transport> {
    pub(crate) transport: T,
    pub(crate) strategy: EncryptionStrategy,
    pub(crate) buffer_size: usize,
    pub(crate) max_payload_size: u64,
    /// Salt of the latest header this side built (sender) or accepted (receiver).
    pub(crate) salt: Option<Salt>,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, strategy: EncryptionStrategy, options: SessionOptions) -> Result<Self> {
        if options.buffer_size == 0 {
            return Err(ConfigError::InvalidBufferSize.into());
        }
        let mut session = Self {
            transport,
            strategy,
            buffer_size: options.buffer_size,
            max_payload_size: options.max_payload_size,
            salt: None,
        };
        if options.auto_connect {
            session.connect()?;
        }
        Ok(session)
    }

    /// Connect (sender) or accept (receiver). Idempotent.
    pub fn connect(&mut self) -> Result<()> {
        Ok(self.transport.connect()?)
    }

    /// Close the current connection. Idempotent.
    pub fn disconnect(&mut self) {
        self.transport.disconnect();
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn strategy(&self) -> &EncryptionStrategy {
        &self.strategy
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Salt of the most recent handshake, if any.
    pub fn salt(&self) -> Option<&Salt> {
        self.salt.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Tear down the connection and wrap `cause` as an abort.
    pub(crate) fn abort(&mut self, cause: Error) -> Error {
        tracing::warn!(error = %cause, "aborting connection");
        self.disconnect();
        Error::aborted(cause)
    }
}

impl Session<Dialer> {
    /// A sender for `addr`. Dials immediately if `options.auto_connect`.
    pub fn dial(
        addr: SocketAddr,
        strategy: EncryptionStrategy,
        options: SessionOptions,
    ) -> Result<Self> {
        Session::new(Dialer::new(addr), strategy, options)
    }

    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        let strategy = config.strategy()?;
        Self::dial(config.socket_addr()?, strategy, config.into())
    }
}

impl Session<Listener> {
    /// A receiver bound to `addr`. Blocks in accept if `options.auto_connect`.
    pub fn bind(
        addr: SocketAddr,
        strategy: EncryptionStrategy,
        options: SessionOptions,
    ) -> Result<Self> {
        Session::new(Listener::bind(addr)?, strategy, options)
    }

    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        let strategy = config.strategy()?;
        Self::bind(config.socket_addr()?, strategy, config.into())
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.transport
            .local_addr()
            .map_err(|e| TransportError::LocalAddr(e).into())
    }
}
