use std::path::PathBuf;

use anyhow::{Context, Result};
use knight_core::config::{ConfigError, SessionConfig};
use knight_core::strategy::EncryptMethod;

use crate::*;

/// A per-test scratch directory, removed on drop.
struct Scratch(PathBuf);

impl Scratch {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("knight-it-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        Scratch(dir)
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.0.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

/// Sender holds public.pem, receiver holds private.pem, both from TOML.
#[test]
fn test_rsa_sessions_from_config_files() -> Result<()> {
    let scratch = Scratch::new("rsa-config");
    let key = test_key();
    let private = scratch.write("private.pem", &key.private_pem()?);
    let public = scratch.write("public.pem", &key.public_pem()?);

    let receiver_toml = scratch.write(
        "receiver.toml",
        &format!(
            "encrypt_method = \"rsa\"\nkey_path = {:?}\nip = \"127.0.0.1\"\nport = 0\nauto_connect = false\n",
            private.display().to_string()
        ),
    );
    let receiver_config = SessionConfig::from_file(&receiver_toml)?;
    let mut receiver = Receiver::from_config(&receiver_config)?;
    let addr = receiver.local_addr()?;
    let rx = std::thread::spawn(move || receiver.recv::<Vec<String>>());

    let sender_toml = scratch.write(
        "sender.toml",
        &format!(
            "encrypt_method = \"rsa\"\nkey_path = {:?}\nport = {}\nauto_connect = false\nbuffer_size = 128\n",
            public.display().to_string(),
            addr.port()
        ),
    );
    let sender_config = SessionConfig::from_file(&sender_toml)?;
    let mut sender = Sender::from_config(&sender_config)?;
    assert_eq!(sender.strategy().method(), EncryptMethod::Rsa);
    assert_eq!(sender.buffer_size(), 128);

    let words = vec!["from".to_string(), "config".into()];
    sender.send(&words)?;

    let got = rx.join().unwrap().context("receiver failed")?;
    assert_eq!(got, words);
    Ok(())
}

#[test]
fn test_invalid_pairings_fail_before_any_connection() {
    let scratch = Scratch::new("pairings");
    let public = scratch.write("public.pem", &test_key().public_pem().unwrap());

    let none_with_key = SessionConfig {
        key_path: Some(public),
        auto_connect: false,
        ..SessionConfig::default()
    };
    let err = Sender::from_config(&none_with_key).err().unwrap();
    assert!(matches!(
        err,
        knight_bus::Error::Config(ConfigError::UnexpectedKey)
    ));

    let rsa_without_key = SessionConfig {
        encrypt_method: EncryptMethod::Rsa,
        auto_connect: false,
        ..SessionConfig::default()
    };
    let err = Sender::from_config(&rsa_without_key).err().unwrap();
    assert!(matches!(
        err,
        knight_bus::Error::Config(ConfigError::MissingKey)
    ));

    let err = EncryptionStrategy::from_name("rot13", None).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownMethod(ref m) if m == "rot13"));
}

#[test]
fn test_garbage_key_file_is_reported() {
    let scratch = Scratch::new("garbage-key");
    let path = scratch.write("key.pem", "-----BEGIN NONSENSE-----\n");
    let config = SessionConfig {
        encrypt_method: EncryptMethod::Rsa,
        key_path: Some(path),
        ..SessionConfig::default()
    };
    assert!(matches!(config.strategy(), Err(ConfigError::InvalidKey(..))));
}
