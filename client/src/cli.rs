//! # CLI Interface
//!
//! Defines the command-line argument structure for `veilcast` using `clap`
//! derive. The commands mirror the campaign secrecy workflow: seed
//! generation, deterministic password derivation, campaign
//! encryption/decryption, password escrow/recovery, plus an epoch query
//! against a ledger RPC node.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Veilcast survey platform client.
///
/// Command-line access to the campaign secrecy toolchain: derive campaign
/// passwords from seeds, encrypt and decrypt campaign content, escrow and
/// recover passwords, and query the ledger epoch.
#[derive(Parser, Debug)]
#[command(
    name = "veilcast",
    about = "Veilcast survey platform client",
    version,
    propagate_version = true
)]
pub struct VeilcastCli {
    /// Log output format: "pretty" or "json".
    #[arg(long, env = "VEILCAST_LOG_FORMAT", default_value = "pretty", global = true)]
    pub log_format: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the `veilcast` binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a fresh campaign seed (256-bit, hex).
    NewSeed,
    /// Derive a campaign password from a seed and an identity subject.
    DerivePassword(DerivePasswordArgs),
    /// Encrypt campaign content (JSON) field-by-field under a password.
    EncryptCampaign(EncryptArgs),
    /// Decrypt an encrypted campaign (JSON) with its password.
    DecryptCampaign(EncryptArgs),
    /// Escrow a campaign password under an identity for later recovery.
    Escrow(EscrowArgs),
    /// Recover an escrowed campaign password.
    Recover(RecoverArgs),
    /// Query the current epoch from a ledger RPC node.
    Epoch(EpochArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for `derive-password`.
#[derive(Parser, Debug)]
pub struct DerivePasswordArgs {
    /// Hex-encoded 32-byte campaign seed.
    #[arg(long)]
    pub seed: String,

    /// The federated identity subject claim to derive the key from.
    #[arg(long)]
    pub subject: String,
}

/// Arguments for `encrypt-campaign` / `decrypt-campaign`.
#[derive(Parser, Debug)]
pub struct EncryptArgs {
    /// The campaign password.
    #[arg(long, env = "VEILCAST_PASSWORD")]
    pub password: String,

    /// Input JSON file. Reads stdin when omitted or set to "-".
    #[arg(long)]
    pub input: Option<PathBuf>,
}

/// Arguments for `escrow`.
#[derive(Parser, Debug)]
pub struct EscrowArgs {
    /// The campaign password to escrow.
    #[arg(long, env = "VEILCAST_PASSWORD")]
    pub password: String,

    /// The federated identity subject claim to escrow under.
    #[arg(long)]
    pub subject: String,
}

/// Arguments for `recover`.
#[derive(Parser, Debug)]
pub struct RecoverArgs {
    /// The encoded response seed as stored on the ledger.
    #[arg(long)]
    pub response_seed: String,

    /// The federated identity subject claim to recover with.
    #[arg(long)]
    pub subject: String,
}

/// Arguments for `epoch`.
#[derive(Parser, Debug)]
pub struct EpochArgs {
    /// RPC endpoint of a ledger node.
    #[arg(long, env = "VEILCAST_RPC_URL", default_value = "http://127.0.0.1:9650")]
    pub rpc_url: String,
}
