//! Transfer command: sign locally, submit to a node.

use crate::gateway::{Gateway, DEFAULT_GATEWAY};
use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use powchain_core::{TransactionRequest, Wallet};

#[derive(Args)]
pub struct SendArgs {
    /// Sender's hex private key
    #[arg(long)]
    private_key: String,

    /// Sender's hex public key (derived from the private key if omitted)
    #[arg(long)]
    public_key: Option<String>,

    /// Sender address (derived from the private key if omitted)
    #[arg(long)]
    sender: Option<String>,

    /// Recipient address
    #[arg(short, long)]
    recipient: String,

    /// Amount to transfer
    #[arg(short, long)]
    value: f32,

    /// Node to submit to
    #[arg(short, long, default_value = DEFAULT_GATEWAY)]
    gateway: String,
}

/// Sign a transfer, checking any explicitly given identity against the key.
fn build_request(
    private_key: &str,
    public_key: Option<&str>,
    sender: Option<&str>,
    recipient: &str,
    value: f32,
) -> Result<TransactionRequest> {
    let wallet = Wallet::from_private_key_hex(private_key).context("Invalid private key")?;

    if let Some(public_key) = public_key {
        if !public_key.eq_ignore_ascii_case(&wallet.keypair().public_key.to_hex()) {
            bail!("public key does not belong to the private key");
        }
    }
    if let Some(sender) = sender {
        if sender != wallet.address() {
            bail!("sender {} does not match the key's address {}", sender, wallet.address());
        }
    }
    if !value.is_finite() || value < 0.0 {
        bail!("value must be a non-negative number");
    }

    Ok(wallet.transfer(recipient, value))
}

pub async fn run(args: SendArgs) -> Result<()> {
    let request = build_request(
        &args.private_key,
        args.public_key.as_deref(),
        args.sender.as_deref(),
        &args.recipient,
        args.value,
    )?;

    let gateway = Gateway::new(&args.gateway)?;
    if gateway.submit(&request).await? {
        println!(
            "{}  Sent {} to {}",
            "✓".green().bold(),
            args.value.to_string().bright_cyan(),
            args.recipient.bright_yellow()
        );
        Ok(())
    } else {
        bail!("transaction rejected by {}", args.gateway)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_derives_identity() {
        let wallet = Wallet::generate();
        let info = wallet.info();

        let request = build_request(&info.private_key, None, None, "bob", 1.5).unwrap();
        let signed = request.validate().unwrap();
        assert_eq!(signed.transaction.sender, wallet.address());
        assert_eq!(signed.transaction.value, 1.5);
        assert!(signed
            .transaction
            .verify(&signed.public_key, &signed.signature)
            .is_ok());
    }

    #[test]
    fn test_build_request_rejects_mismatched_identity() {
        let wallet = Wallet::generate();
        let other = Wallet::generate().info();
        let info = wallet.info();

        assert!(build_request(&info.private_key, Some(&other.public_key), None, "bob", 1.0).is_err());
        assert!(build_request(&info.private_key, None, Some(&other.blockchain_address), "bob", 1.0).is_err());
        assert!(build_request(
            &info.private_key,
            Some(&info.public_key),
            Some(&info.blockchain_address),
            "bob",
            1.0
        )
        .is_ok());
    }

    #[test]
    fn test_build_request_rejects_bad_input() {
        let info = Wallet::generate().info();
        assert!(build_request("zz", None, None, "bob", 1.0).is_err());
        assert!(build_request(&info.private_key, None, None, "bob", -1.0).is_err());
    }
}
