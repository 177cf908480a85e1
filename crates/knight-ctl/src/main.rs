//! knight-ctl: command-line front end for knight-bus.

mod cmd;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use knight_core::config::SessionConfig;
use knight_core::crypto::MIN_KEY_BITS;
use knight_core::strategy::EncryptMethod;

use cmd::keygen::cmd_keygen;
use cmd::transfer::{cmd_recv, cmd_send};

// ── Options ───────────────────────────────────────────────────────────────────

/// Flags accepted anywhere on the command line. Unset flags fall back to
/// the config file and KNIGHT_* environment.
#[derive(Default)]
struct Options {
    ip:     Option<String>,
    port:   Option<u16>,
    method: Option<EncryptMethod>,
    key:    Option<PathBuf>,
    bits:   Option<usize>,
    count:  Option<usize>,
}

impl Options {
    fn session_config(&self, receiver: bool) -> Result<SessionConfig> {
        let mut config = SessionConfig::load().context("failed to load configuration")?;
        // Receivers bind every interface unless an address was configured.
        if receiver && config.ip == SessionConfig::default().ip {
            config.ip = SessionConfig::receiver().ip;
        }
        if let Some(ip) = &self.ip {
            config.ip = ip.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(method) = self.method {
            config.encrypt_method = method;
            // A key configured for rsa would be rejected under none.
            if method == EncryptMethod::None && self.key.is_none() {
                config.key_path = None;
            }
        }
        if let Some(key) = &self.key {
            config.key_path = Some(key.clone());
        }
        Ok(config)
    }
}

fn print_usage() {
    println!("Usage: knight-ctl [options] <command>");
    println!();
    println!("Commands:");
    println!("  keygen <out-dir>   Write private.pem (receiver) and public.pem (sender)");
    println!("  send <file>        Send a file's bytes to a receiver");
    println!("  recv <out-dir>     Receive payloads into <out-dir>");
    println!();
    println!("Options:");
    println!("  --ip <addr>        Receiver address (send: dial, recv: bind; default 0.0.0.0)");
    println!("  --port <port>      Receiver port");
    println!("  --method <m>       Encryption method: rsa | none");
    println!("  --key <path>       PEM key (public for send, private for recv)");
    println!("  --bits <n>         Key size for keygen (default: {})", MIN_KEY_BITS);
    println!("  --count <n>        Stop recv after n payloads (default: run forever)");
    println!();
    println!("Defaults come from $KNIGHT_CONFIG or ~/.config/knight-bus/config.toml,");
    println!("then KNIGHT_* environment variables. Set RUST_LOG for diagnostics.");
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str> {
    args.get(i)
        .map(String::as_str)
        .with_context(|| format!("{flag} requires a value"))
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut opts = Options::default();
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--ip" => {
                i += 1;
                opts.ip = Some(value(&args, i, "--ip")?.to_string());
            }
            "--port" => {
                i += 1;
                opts.port = Some(
                    value(&args, i, "--port")?
                        .parse()
                        .context("--port must be a number")?,
                );
            }
            "--method" => {
                i += 1;
                opts.method = Some(value(&args, i, "--method")?.parse()?);
            }
            "--key" => {
                i += 1;
                opts.key = Some(PathBuf::from(value(&args, i, "--key")?));
            }
            "--bits" => {
                i += 1;
                opts.bits = Some(
                    value(&args, i, "--bits")?
                        .parse()
                        .context("--bits must be a number")?,
                );
            }
            "--count" => {
                i += 1;
                opts.count = Some(
                    value(&args, i, "--count")?
                        .parse()
                        .context("--count must be a number")?,
                );
            }
            other => remaining.push(other),
        }
        i += 1;
    }

    match remaining.as_slice() {
        ["keygen", dir]                => cmd_keygen(Path::new(*dir), opts.bits.unwrap_or(MIN_KEY_BITS)),
        ["send", file]                 => cmd_send(&opts.session_config(false)?, Path::new(*file)),
        ["recv", dir]                  => cmd_recv(&opts.session_config(true)?, Path::new(*dir), opts.count),
        ["help"] | ["--help"] | ["-h"] | [] => { print_usage(); Ok(()) }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
