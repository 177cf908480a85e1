//! RSA key pair generation.

use std::path::Path;

use anyhow::{Context, Result};
use knight_core::crypto::RsaKey;

pub const PRIVATE_KEY_FILE: &str = "private.pem";
pub const PUBLIC_KEY_FILE: &str = "public.pem";

pub fn cmd_keygen(out_dir: &Path, bits: usize) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    println!("Generating {bits}-bit RSA key pair...");
    let key = RsaKey::generate(bits).context("key generation failed")?;

    let private_path = out_dir.join(PRIVATE_KEY_FILE);
    let public_path = out_dir.join(PUBLIC_KEY_FILE);

    let private_pem = key.private_pem().context("failed to encode private key")?;
    std::fs::write(&private_path, private_pem.as_bytes())
        .with_context(|| format!("failed to write {}", private_path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&private_path, std::fs::Permissions::from_mode(0o600))?;
    }

    let public_pem = key.public_pem().context("failed to encode public key")?;
    std::fs::write(&public_path, public_pem)
        .with_context(|| format!("failed to write {}", public_path.display()))?;

    println!("  private : {}  (receiver)", private_path.display());
    println!("  public  : {}  (sender)", public_path.display());
    Ok(())
}
