use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Dispatch {
    from: String,
    to: String,
    seal: [u8; 4],
    urgent: bool,
}

fn dispatch() -> Dispatch {
    Dispatch {
        from: "Camelot".into(),
        to: "Avalon".into(),
        seal: [0xde, 0xad, 0xbe, 0xef],
        urgent: true,
    }
}

/// Values of several shapes arrive intact and in the order they were sent.
fn round_trip(rsa: bool) {
    let (send_strategy, recv_strategy) = strategies(rsa);
    let blob: Vec<u8> = (0..=255).collect();
    let list = json!(["lance", 3, 2.5, null, {"shield": true}, [1, [2, [3]]]]);

    let (addr, rx) = spawn_receiver(recv_strategy, lazy(2048), |receiver| {
        let blob: Vec<u8> = receiver.recv().unwrap();
        let text: String = receiver.recv().unwrap();
        let list: Value = receiver.recv().unwrap();
        let dispatch: Dispatch = receiver.recv().unwrap();
        (blob, text, list, dispatch)
    });

    let mut sender = dial(addr, send_strategy, 2048);
    sender.send(&blob).unwrap();
    sender.send("the quick brown knight").unwrap();
    sender.send(&list).unwrap();
    sender.send(&dispatch()).unwrap();

    let (got_blob, got_text, got_list, got_dispatch) = rx.join().unwrap();
    assert_eq!(got_blob, blob);
    assert_eq!(got_text, "the quick brown knight");
    assert_eq!(got_list, list);
    assert_eq!(got_dispatch, dispatch());
}

#[test]
fn test_round_trip_none_mode() {
    round_trip(false);
}

#[test]
fn test_round_trip_rsa_mode() {
    round_trip(true);
}

#[test]
fn test_large_raw_payload_rsa_mode() {
    let (send_strategy, recv_strategy) = strategies(true);
    let data: Vec<u8> = (0..1_000_000u32).map(|i| (i % 251) as u8).collect();
    let expected = data.clone();

    let (addr, rx) = spawn_receiver(recv_strategy, lazy(2048), |receiver| {
        receiver.recv_raw().unwrap()
    });
    dial(addr, send_strategy, 2048).send_raw(&data).unwrap();

    assert_eq!(rx.join().unwrap(), expected);
}

#[test]
fn test_salts_differ_between_messages() {
    let (addr, rx) = spawn_receiver(EncryptionStrategy::None, lazy(2048), |receiver| {
        let mut salts = Vec::new();
        for _ in 0..3 {
            let _: u32 = receiver.recv().unwrap();
            salts.push(*receiver.salt().unwrap());
        }
        salts
    });

    let mut sender = dial(addr, EncryptionStrategy::None, 2048);
    let mut sent = Vec::new();
    for n in 0..3u32 {
        sender.send(&n).unwrap();
        sent.push(*sender.salt().unwrap());
    }

    let seen = rx.join().unwrap();
    assert_eq!(seen, sent, "receiver should see the sender's salts");
    assert_ne!(sent[0], sent[1]);
    assert_ne!(sent[1], sent[2]);
    assert_ne!(sent[0], sent[2]);
}
