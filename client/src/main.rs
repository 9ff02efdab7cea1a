// Copyright (c) 2026 Veilcast Labs. MIT License.
// See LICENSE for details.

//! # Veilcast Client
//!
//! Entry point for the `veilcast` binary: the campaign secrecy toolchain
//! from the command line. Everything secret-bearing happens locally; the
//! only network command is `epoch`, which asks a ledger RPC node for the
//! current epoch number.
//!
//! Results go to stdout, logs go to stderr, so output composes with pipes:
//!
//! ```text
//! veilcast encrypt-campaign --password "$PW" --input campaign.json > sealed.json
//! ```

mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;

use veilcast_protocol::chain::epoch::{EpochSource, HttpEpochSource};
use veilcast_protocol::content::{
    decrypt_campaign, encrypt_campaign, CampaignContent, EncryptedCampaign,
};
use veilcast_protocol::recovery::{
    escrow_password, generate_password_from_seed, unseal_response_seed, CampaignSeed,
    RecoveryKey, ResponseSeed,
};

use cli::{Commands, VeilcastCli};
use logging::LogFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = VeilcastCli::parse();
    logging::init_logging(
        "veilcast_client=info,veilcast_protocol=info",
        LogFormat::from_str_lossy(&cli.log_format),
    );

    match cli.command {
        Commands::NewSeed => new_seed(),
        Commands::DerivePassword(args) => derive_password(args),
        Commands::EncryptCampaign(args) => encrypt_cmd(args),
        Commands::DecryptCampaign(args) => decrypt_cmd(args),
        Commands::Escrow(args) => escrow_cmd(args),
        Commands::Recover(args) => recover_cmd(args),
        Commands::Epoch(args) => epoch_cmd(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

fn new_seed() -> Result<()> {
    println!("{}", CampaignSeed::generate().to_hex());
    Ok(())
}

fn derive_password(args: cli::DerivePasswordArgs) -> Result<()> {
    let seed = CampaignSeed::from_hex(&args.seed)
        .context("--seed must be 64 hex characters (32 bytes)")?;
    let key = RecoveryKey::from_subject(&args.subject);
    println!("{}", generate_password_from_seed(&seed, &key));
    Ok(())
}

fn encrypt_cmd(args: cli::EncryptArgs) -> Result<()> {
    let input = read_input(args.input.as_ref())?;
    let content: CampaignContent =
        serde_json::from_str(&input).context("input is not valid campaign JSON")?;

    let encrypted =
        encrypt_campaign(&content, &args.password).context("campaign encryption failed")?;
    println!("{}", serde_json::to_string_pretty(&encrypted)?);

    tracing::info!(
        questions = content.questions.len(),
        "campaign encrypted field-by-field"
    );
    Ok(())
}

fn decrypt_cmd(args: cli::EncryptArgs) -> Result<()> {
    let input = read_input(args.input.as_ref())?;
    let encrypted: EncryptedCampaign =
        serde_json::from_str(&input).context("input is not valid encrypted-campaign JSON")?;

    let content = decrypt_campaign(&encrypted, &args.password)
        .context("decryption failed: wrong or missing password")?;
    println!("{}", serde_json::to_string_pretty(&content)?);
    Ok(())
}

fn escrow_cmd(args: cli::EscrowArgs) -> Result<()> {
    let key = RecoveryKey::from_subject(&args.subject);
    let seed = escrow_password(&args.password, &key).context("password escrow failed")?;
    println!("{}", seed.encoded());
    Ok(())
}

fn recover_cmd(args: cli::RecoverArgs) -> Result<()> {
    let seed = ResponseSeed::from_encoded(&args.response_seed)
        .context("--response-seed is not a valid encoded blob")?;

    // The CLI always has "an identity" (the given subject), so recovery is
    // either the password or a hard integrity failure; the soft
    // no-identity outcome can't happen on this path.
    let key = RecoveryKey::from_subject(&args.subject);
    let password = unseal_response_seed(&seed, &key)
        .context("recovery failed: this seed was escrowed under a different identity")?;
    println!("{password}");
    Ok(())
}

async fn epoch_cmd(args: cli::EpochArgs) -> Result<()> {
    let source = HttpEpochSource::new(&args.rpc_url);
    let epoch = source
        .current_epoch()
        .await
        .with_context(|| format!("failed to query epoch from {}", args.rpc_url))?;
    println!("{epoch}");
    Ok(())
}

fn print_version() {
    println!(
        "veilcast {} (protocol {})",
        env!("CARGO_PKG_VERSION"),
        veilcast_protocol::config::PROTOCOL_VERSION,
    );
}

/// Read a command input from a file, or stdin when the path is `-` or
/// absent.
fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(p) if p.as_os_str() != "-" => std::fs::read_to_string(p)
            .with_context(|| format!("failed to read {}", p.display())),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}
