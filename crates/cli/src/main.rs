//! powchain wallet CLI entry point.

use clap::Parser;

mod commands;
mod gateway;

#[derive(Parser)]
#[command(name = "powchain")]
#[command(about = "Wallet for a powchain proof-of-work ledger", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<commands::Commands>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(cmd) => {
            if let Err(e) = commands::run(cmd).await {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("powchain - wallet for a proof-of-work ledger");
            println!("Run 'powchain --help' for usage information.");
        }
    }
}
