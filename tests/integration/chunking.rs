use crate::*;

const BUF: usize = 64;

/// Raw none-mode payloads land on the wire byte for byte, so these sizes
/// sit exactly on either side of one receive buffer.
#[test]
fn test_payload_sizes_around_buffer_size() {
    for len in [BUF - 1, BUF, BUF + 1, 2 * BUF, 2 * BUF + 1] {
        let data: Vec<u8> = (0..len).map(|i| i as u8).collect();
        let expected = data.clone();

        let (addr, rx) = spawn_receiver(EncryptionStrategy::None, lazy(BUF), |receiver| {
            receiver.recv_raw().unwrap()
        });
        dial(addr, EncryptionStrategy::None, BUF)
            .send_raw(&data)
            .unwrap();

        assert_eq!(rx.join().unwrap(), expected, "payload of {len} bytes");
    }
}

#[test]
fn test_tiny_buffer_rsa_mode() {
    let (send_strategy, recv_strategy) = strategies(true);
    let (addr, rx) = spawn_receiver(recv_strategy, lazy(1), |receiver| {
        receiver.recv::<String>().unwrap()
    });
    dial(addr, send_strategy, 1).send("one byte at a time").unwrap();
    assert_eq!(rx.join().unwrap(), "one byte at a time");
}

#[test]
fn test_mismatched_buffer_sizes_interoperate() {
    let (addr, rx) = spawn_receiver(EncryptionStrategy::None, lazy(3), |receiver| {
        receiver.recv::<Vec<String>>().unwrap()
    });
    let words = vec!["buffer".to_string(), "sizes".into(), "are".into(), "local".into()];
    dial(addr, EncryptionStrategy::None, 4096).send(&words).unwrap();
    assert_eq!(rx.join().unwrap(), words);
}
