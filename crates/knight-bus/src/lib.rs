//! knight-bus: move a serializable value from one endpoint to another over a
//! single TCP connection, with a salted header/ack handshake and a checksum
//! in front of every payload.
//!
//! ```no_run
//! use knight_bus::{Receiver, Sender, SessionOptions};
//! use knight_core::EncryptionStrategy;
//!
//! # fn main() -> Result<(), knight_bus::Error> {
//! let mut receiver = Receiver::bind(
//!     "0.0.0.0:8900".parse().unwrap(),
//!     EncryptionStrategy::None,
//!     SessionOptions::default(),
//! )?;
//! let mut sender = Sender::dial(
//!     "127.0.0.1:8900".parse().unwrap(),
//!     EncryptionStrategy::None,
//!     SessionOptions::default(),
//! )?;
//! sender.send(&vec!["hello", "bus"])?;
//! let got: Vec<String> = receiver.recv()?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handshake;
pub mod session;
pub mod transfer;
pub mod transport;

pub use error::{Error, ProtocolError, Result, TransportError};
pub use session::{Receiver, Sender, Session, SessionOptions};
pub use transport::{Dialer, Listener, Transport};
