//! Wallet generation command.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use powchain_core::Wallet;
use std::fs;
use std::path::PathBuf;

#[derive(Args)]
pub struct WalletArgs {
    /// Re-derive the wallet from an existing hex private key
    #[arg(long)]
    private_key: Option<String>,

    /// Also write the wallet JSON to this file
    #[arg(short, long)]
    out: Option<PathBuf>,
}

pub fn run(args: WalletArgs) -> Result<()> {
    let wallet = match args.private_key {
        Some(key) => Wallet::from_private_key_hex(&key).context("Invalid private key")?,
        None => Wallet::generate(),
    };
    let json = serde_json::to_string_pretty(&wallet.info())?;
    println!("{}", json);

    if let Some(path) = args.out {
        fs::write(&path, &json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!(
            "{}  Saved to: {}",
            "✓".green().bold(),
            path.display().to_string().bright_black()
        );
        eprintln!("{}", "Keep your private key safe!".yellow().bold());
    }

    Ok(())
}
