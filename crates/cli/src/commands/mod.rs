//! CLI commands module.

use anyhow::Result;
use clap::Subcommand;

mod query;
mod tx;
mod wallet;

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a wallet and print it as JSON
    Wallet(wallet::WalletArgs),
    /// Sign a transfer locally and submit it to a node
    Send(tx::SendArgs),
    /// Show the balance of an address
    Balance(query::BalanceArgs),
    /// Ask a node to mine one block
    Mine(query::GatewayArgs),
    /// Print a summary of a node's chain
    Chain(query::ChainArgs),
}

pub async fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Wallet(args) => wallet::run(args),
        Commands::Send(args) => tx::run(args).await,
        Commands::Balance(args) => query::balance(args).await,
        Commands::Mine(args) => query::mine(args).await,
        Commands::Chain(args) => query::chain(args).await,
    }
}
