//! Single-bit corruption in flight, through a relay between real sockets.
//! Every case must end in an abort on at least one side and never in a
//! wrong value being returned.

use std::thread::JoinHandle;

use knight_bus::{Error, ProtocolError, Result};
use knight_core::wire::{RECORD_LEN, TAG_LEN};

use crate::*;

/// Run one string send through a flipping relay. Returns the sender's
/// result and the receiver's.
fn send_through(
    rsa: bool,
    up_flip: Option<usize>,
    down_flip: Option<usize>,
) -> (Result<()>, Result<String>) {
    let (send_strategy, recv_strategy) = strategies(rsa);
    let (upstream, rx): (_, JoinHandle<Result<String>>) =
        spawn_receiver(recv_strategy, lazy(2048), |receiver| receiver.recv());

    let proxy = flip_proxy(upstream, up_flip, down_flip);
    let mut sender = dial(proxy, send_strategy, 2048);
    let sent = sender.send("hold the bridge");
    drop(sender);

    (sent, rx.join().unwrap())
}

fn rsa_header_len() -> usize {
    test_key().size()
}

#[test]
fn test_untampered_relay_delivers() {
    let (sent, received) = send_through(true, None, None);
    sent.unwrap();
    assert_eq!(received.unwrap(), "hold the bridge");
}

#[test]
fn test_none_header_tag_flip() {
    let (sent, received) = send_through(false, Some(0), None);
    let err = received.unwrap_err();
    assert!(matches!(
        err.cause(),
        Error::Protocol(ProtocolError::TagMismatch { .. })
    ));
    assert!(sent.unwrap_err().is_aborted());
}

#[test]
fn test_none_header_size_flip() {
    let (sent, received) = send_through(false, Some(TAG_LEN), None);
    let err = sent.unwrap_err();
    assert!(matches!(err.cause(), Error::Protocol(ProtocolError::AckMismatch)));
    assert!(received.unwrap_err().is_aborted());
}

#[test]
fn test_rsa_header_flip() {
    let (sent, received) = send_through(true, Some(17), None);
    let err = received.unwrap_err();
    assert!(err.is_aborted());
    assert!(matches!(err.cause(), Error::Protocol(ProtocolError::Strategy(_))));
    assert!(sent.unwrap_err().is_aborted());
}

#[test]
fn test_ack_flip_both_modes() {
    for rsa in [false, true] {
        let (sent, received) = send_through(rsa, None, Some(9));
        let err = sent.unwrap_err();
        assert!(
            matches!(err.cause(), Error::Protocol(ProtocolError::AckMismatch)),
            "rsa={rsa}: {err}"
        );
        let err = received.unwrap_err();
        assert!(
            matches!(
                err.cause(),
                Error::Protocol(ProtocolError::Truncated { actual: 0, .. })
            ),
            "rsa={rsa}: {err}"
        );
    }
}

#[test]
fn test_payload_flip_both_modes() {
    for (rsa, header_len) in [(false, RECORD_LEN), (true, rsa_header_len())] {
        let (sent, received) = send_through(rsa, Some(header_len + 2), None);
        sent.unwrap();
        let err = received.unwrap_err();
        assert!(
            matches!(err.cause(), Error::Protocol(ProtocolError::ChecksumMismatch)),
            "rsa={rsa}: {err}"
        );
    }
}
