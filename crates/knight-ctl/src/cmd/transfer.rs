//! File send and receive commands.

use std::path::Path;

use anyhow::{Context, Result};
use knight_bus::{Error, Receiver, Sender, TransportError};
use knight_core::config::SessionConfig;
use knight_core::crypto;

pub fn cmd_send(config: &SessionConfig, path: &Path) -> Result<()> {
    let data =
        std::fs::read(path).with_context(|| format!("failed to read file: {}", path.display()))?;

    let addr = config.socket_addr()?;
    let mut sender = Sender::from_config(config)
        .with_context(|| format!("failed to open session to {addr}"))?;
    sender
        .send_raw(&data)
        .with_context(|| format!("failed to send {}", path.display()))?;
    sender.disconnect();

    println!(
        "Sent {} ({} bytes, {}) to {addr} [{}]",
        path.display(),
        data.len(),
        short_hex(&data),
        config.encrypt_method,
    );
    Ok(())
}

/// Receive `count` payloads (forever if `None`) and write each to `out_dir`.
/// A sender that aborts its transfer is logged and the next one accepted.
/// A failing listener ends the loop.
pub fn cmd_recv(config: &SessionConfig, out_dir: &Path, count: Option<usize>) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let mut receiver = Receiver::from_config(&SessionConfig {
        auto_connect: false,
        ..config.clone()
    })
    .context("failed to start receiver")?;
    println!(
        "Listening on {} [{}]",
        receiver.local_addr()?,
        config.encrypt_method
    );

    let mut received = 0usize;
    while count.map_or(true, |n| received < n) {
        let data = match receiver.recv_raw() {
            Ok(data) => data,
            Err(e) if listener_failed(&e) => return Err(e).context("accept failed"),
            Err(e) if e.is_aborted() => {
                tracing::warn!(error = %e, "transfer aborted, waiting for next sender");
                continue;
            }
            Err(e) => return Err(e).context("receive failed"),
        };
        // One file per connection: `send` hangs up after each.
        receiver.disconnect();

        let path = out_dir.join(format!("payload-{received:04}.bin"));
        std::fs::write(&path, &data)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!(
            "Received {} bytes ({}) -> {}",
            data.len(),
            short_hex(&data),
            path.display()
        );
        received += 1;
    }
    Ok(())
}

/// Accept errors come from the listening socket, not from one sender, so
/// waiting for the next sender would fail the same way.
fn listener_failed(e: &Error) -> bool {
    matches!(e.cause(), Error::Transport(TransportError::Accept(_)))
}

fn short_hex(data: &[u8]) -> String {
    hex::encode(&crypto::checksum(data)[..8])
}
