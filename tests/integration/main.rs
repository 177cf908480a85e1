//! knight-bus integration test harness.
//!
//! Every test runs a real sender and receiver over loopback TCP. Receivers
//! bind port 0 and run on their own thread; the test thread is the sender.
//!
//!   cargo test --test integration

use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::OnceLock;
use std::thread::{self, JoinHandle};

use knight_bus::{Receiver, Sender, SessionOptions};
use knight_core::crypto::{RsaKey, MIN_KEY_BITS};
use knight_core::strategy::EncryptionStrategy;

mod chunking;
mod config;
mod roundtrip;
mod tamper;

// ── Harness ───────────────────────────────────────────────────────────────────

/// One key per test binary. Generation is the slowest thing in the suite.
pub fn test_key() -> &'static RsaKey {
    static KEY: OnceLock<RsaKey> = OnceLock::new();
    KEY.get_or_init(|| RsaKey::generate(MIN_KEY_BITS).expect("generate test key"))
}

pub fn loopback() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

pub fn lazy(buffer_size: usize) -> SessionOptions {
    SessionOptions {
        buffer_size,
        auto_connect: false,
        ..SessionOptions::default()
    }
}

/// Both ends of one mode: `(sender strategy, receiver strategy)`.
/// The sender only ever sees the public half.
pub fn strategies(rsa: bool) -> (EncryptionStrategy, EncryptionStrategy) {
    if rsa {
        let key = test_key();
        (
            EncryptionStrategy::Rsa(key.public_only()),
            EncryptionStrategy::Rsa(key.clone()),
        )
    } else {
        (EncryptionStrategy::None, EncryptionStrategy::None)
    }
}

/// Bind a receiver on an ephemeral port and hand it to `serve` on a new
/// thread. Returns the address to dial and the thread's result.
pub fn spawn_receiver<F, R>(
    strategy: EncryptionStrategy,
    options: SessionOptions,
    serve: F,
) -> (SocketAddr, JoinHandle<R>)
where
    F: FnOnce(&mut Receiver) -> R + Send + 'static,
    R: Send + 'static,
{
    let mut receiver = Receiver::bind(loopback(), strategy, options).expect("bind receiver");
    let addr = receiver.local_addr().expect("receiver address");
    let handle = thread::spawn(move || serve(&mut receiver));
    (addr, handle)
}

pub fn dial(addr: SocketAddr, strategy: EncryptionStrategy, buffer_size: usize) -> Sender {
    Sender::dial(addr, strategy, lazy(buffer_size)).expect("build sender")
}

// ── Tampering proxy ───────────────────────────────────────────────────────────

/// A one-connection TCP relay in front of `upstream` that flips the low bit
/// of one byte in flight. `up_flip` is an offset into the sender → receiver
/// stream, `down_flip` into receiver → sender. Returns the address senders
/// should dial instead of `upstream`.
pub fn flip_proxy(
    upstream: SocketAddr,
    up_flip: Option<usize>,
    down_flip: Option<usize>,
) -> SocketAddr {
    let listener = TcpListener::bind(loopback()).expect("bind proxy");
    let addr = listener.local_addr().expect("proxy address");
    thread::spawn(move || {
        let Ok((client, _)) = listener.accept() else { return };
        let Ok(server) = TcpStream::connect(upstream) else { return };
        let (Ok(client2), Ok(server2)) = (client.try_clone(), server.try_clone()) else {
            return;
        };
        let up = pump(client, server, up_flip);
        let down = pump(server2, client2, down_flip);
        up.join().ok();
        down.join().ok();
    });
    addr
}

fn pump(mut from: TcpStream, mut to: TcpStream, flip_at: Option<usize>) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut buf = [0u8; 4096];
        let mut offset = 0;
        loop {
            let n = match from.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };
            if let Some(at) = flip_at {
                if (offset..offset + n).contains(&at) {
                    buf[at - offset] ^= 0x01;
                }
            }
            offset += n;
            if to.write_all(&buf[..n]).is_err() {
                break;
            }
        }
        // Propagate the close so neither end waits forever.
        let _ = to.shutdown(Shutdown::Write);
        let _ = from.shutdown(Shutdown::Read);
    })
}
