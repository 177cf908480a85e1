//! Error taxonomy for sessions.
//!
//! Lower-level failures are `Config`, `Transport`, or `Protocol`. Any of them
//! raised during a handshake or transfer is wrapped in `Aborted`, and the
//! connection has already been closed by the time the caller sees it.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

use knight_core::config::ConfigError;
use knight_core::strategy::StrategyError;
use knight_core::wire::WireError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Terminal for the connection. Always preceded by a disconnect.
    #[error("connection aborted: {cause}")]
    Aborted {
        #[source]
        cause: Box<Error>,
    },
}

impl Error {
    /// Wrap `cause` as an abort. Already-aborted errors are returned as is.
    pub fn aborted(cause: Error) -> Self {
        match cause {
            Error::Aborted { .. } => cause,
            other => Error::Aborted {
                cause: Box::new(other),
            },
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Error::Aborted { .. })
    }

    /// The error an abort wraps, or `self` if this is not an abort.
    pub fn cause(&self) -> &Error {
        match self {
            Error::Aborted { cause } => cause,
            other => other,
        }
    }
}

impl From<StrategyError> for Error {
    fn from(e: StrategyError) -> Self {
        Error::Protocol(e.into())
    }
}

impl From<WireError> for Error {
    fn from(e: WireError) -> Self {
        Error::Protocol(e.into())
    }
}

/// Connect, accept, or byte-level I/O failures.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to accept connection: {0}")]
    Accept(#[source] io::Error),

    #[error("failed to read local address: {0}")]
    LocalAddr(#[source] io::Error),

    #[error("send failed: {0}")]
    Send(#[source] io::Error),

    #[error("receive failed: {0}")]
    Recv(#[source] io::Error),

    #[error("not connected")]
    NotConnected,
}

/// The peer said something this side cannot accept.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("direction tag mismatch: got {actual:?}")]
    TagMismatch { actual: String },

    #[error("acknowledgment did not verify")]
    AckMismatch,

    #[error("payload checksum mismatch")]
    ChecksumMismatch,

    #[error("payload truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("declared payload of {size} bytes exceeds limit of {limit}")]
    PayloadTooLarge { size: u64, limit: u64 },

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Strategy(StrategyError),
}

impl From<StrategyError> for ProtocolError {
    fn from(e: StrategyError) -> Self {
        match e {
            StrategyError::TagMismatch { actual } => ProtocolError::TagMismatch { actual },
            StrategyError::Wire(w) => ProtocolError::Wire(w),
            other => ProtocolError::Strategy(other),
        }
    }
}
