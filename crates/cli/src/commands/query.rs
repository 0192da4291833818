//! Read-only queries and mining requests against a node.

use crate::gateway::{Gateway, DEFAULT_GATEWAY};
use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use powchain_core::Block;

#[derive(Args)]
pub struct GatewayArgs {
    /// Node to talk to
    #[arg(short, long, default_value = DEFAULT_GATEWAY)]
    gateway: String,
}

#[derive(Args)]
pub struct BalanceArgs {
    /// Ledger address
    #[arg(short, long)]
    address: String,

    #[command(flatten)]
    gateway: GatewayArgs,
}

#[derive(Args)]
pub struct ChainArgs {
    /// Number of most recent blocks to show
    #[arg(short, long, default_value = "10")]
    count: usize,

    #[command(flatten)]
    gateway: GatewayArgs,
}

pub async fn balance(args: BalanceArgs) -> Result<()> {
    let gateway = Gateway::new(&args.gateway.gateway)?;
    let amount = gateway.amount(&args.address).await?;

    println!();
    println!("  Address: {}", args.address.bright_yellow());
    println!("  Balance: {}", amount.to_string().bright_cyan());
    println!();

    Ok(())
}

pub async fn mine(args: GatewayArgs) -> Result<()> {
    let gateway = Gateway::new(&args.gateway)?;
    if !gateway.mine().await? {
        bail!("node at {} did not mine a block", args.gateway);
    }
    println!("{}  Block mined", "✓".green().bold());
    Ok(())
}

pub async fn chain(args: ChainArgs) -> Result<()> {
    let gateway = Gateway::new(&args.gateway.gateway)?;
    let blocks = gateway.chain().await?;

    println!();
    println!("{}", "Recent Blocks:".bold().cyan());
    println!();
    for line in summarize(&blocks, args.count) {
        println!("{}", line);
    }
    println!();
    println!("  Length: {}", blocks.len().to_string().bright_cyan());
    println!();

    Ok(())
}

/// One line per block, most recent `count` blocks, oldest first.
fn summarize(blocks: &[Block], count: usize) -> Vec<String> {
    let start = blocks.len().saturating_sub(count);
    blocks[start..]
        .iter()
        .enumerate()
        .map(|(offset, block)| {
            let hash = block.hash().to_hex();
            format!(
                "  #{:<4} {}  nonce {:<8} txs {}",
                start + offset,
                &hash[..16],
                block.nonce,
                block.tx_count()
            )
        })
        .collect()
}
