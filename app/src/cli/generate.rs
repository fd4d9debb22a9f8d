//! CLI commands for identifier and key generation
//!
//! - generate uuid: random v4 UUID for vless/vmess clients
//! - generate reality-keypair: X25519 keypair for REALITY
//! - generate short-id: random hex short id for REALITY

use anyhow::{bail, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use clap::{Parser, Subcommand};
use rand::rngs::OsRng;
use rand::RngCore;
use x25519_dalek::{PublicKey, StaticSecret};

#[derive(Parser, Debug)]
pub struct GenerateArgs {
    #[command(subcommand)]
    pub command: GenerateCommands,
}

#[derive(Subcommand, Debug)]
pub enum GenerateCommands {
    /// Generate a random UUID (v4)
    Uuid,
    /// Generate REALITY X25519 keypair
    RealityKeypair,
    /// Generate a REALITY short id (hex)
    ShortId {
        /// Length in hex characters: even, at most 16
        #[arg(long = "len", default_value_t = 8)]
        len: usize,
    },
}

pub fn run(args: GenerateArgs) -> Result<()> {
    match args.command {
        GenerateCommands::Uuid => println!("{}", uuid::Uuid::new_v4()),
        GenerateCommands::RealityKeypair => {
            let (private_key, public_key) = reality_keypair();
            println!("PrivateKey: {private_key}");
            println!("PublicKey: {public_key}");
        }
        GenerateCommands::ShortId { len } => println!("{}", short_id(len)?),
    }
    Ok(())
}

/// (private, public) in the URL-safe un-padded base64 form Xray reads.
pub fn reality_keypair() -> (String, String) {
    let private_key = StaticSecret::random_from_rng(OsRng);
    let public_key = PublicKey::from(&private_key);
    (
        URL_SAFE_NO_PAD.encode(private_key.to_bytes()),
        URL_SAFE_NO_PAD.encode(public_key.as_bytes()),
    )
}

pub fn short_id(len: usize) -> Result<String> {
    if len % 2 != 0 || len > 16 {
        bail!("short id length must be even and at most 16, got {len}");
    }
    let mut bytes = vec![0u8; len / 2];
    OsRng.fill_bytes(&mut bytes);
    Ok(hex::encode(bytes))
}
