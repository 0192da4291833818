//! powchain node entry point.

use anyhow::{Context, Result};
use clap::Parser;
use powchain_chain::{
    spawn_peer_refresh, ClientConfig, HttpPeerClient, Ledger, LedgerConfig, PeerConfig,
    PeerDirectory,
};
use powchain_core::Wallet;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

mod api;

#[derive(Parser, Debug)]
#[command(name = "powchain-node", about = "Proof-of-work ledger node", version)]
struct Args {
    /// Port to listen on.
    #[arg(long, short = 'p', default_value_t = 5000)]
    port: u16,

    /// Host address this node binds to and derives peers from.
    #[arg(long, default_value_t = Ipv4Addr::LOCALHOST)]
    host: Ipv4Addr,

    /// Leading hex zeros required of a block's proof.
    #[arg(long, default_value_t = 3)]
    difficulty: usize,

    /// Amount credited to this node per mined block.
    #[arg(long, default_value_t = 1.0)]
    reward: f32,

    /// Pause between background mining cycles.
    #[arg(long, default_value_t = 20)]
    mining_interval_secs: u64,

    /// How often the peer directory is rebuilt.
    #[arg(long, default_value_t = 20)]
    peer_refresh_secs: u64,

    /// Timeout for a single request to a peer.
    #[arg(long, default_value_t = 5)]
    request_timeout_secs: u64,

    /// Start background mining immediately.
    #[arg(long)]
    auto_mine: bool,

    /// Reuse an existing wallet instead of generating one (hex private key).
    #[arg(long, value_name = "HEX", env = "POWCHAIN_PRIVATE_KEY")]
    private_key: Option<String>,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).with_target(false).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let wallet = match &args.private_key {
        Some(key) => Wallet::from_private_key_hex(key).context("invalid --private-key")?,
        None => Wallet::generate(),
    };
    info!(address = wallet.address(), "node wallet ready");

    let peer_config = PeerConfig {
        host: args.host,
        port: args.port,
        refresh_interval: Duration::from_secs(args.peer_refresh_secs.max(1)),
        ..Default::default()
    };
    let ledger_config = LedgerConfig {
        difficulty: args.difficulty,
        mining_reward: args.reward,
        mining_interval: Duration::from_secs(args.mining_interval_secs),
        ..Default::default()
    };
    let client_config = ClientConfig {
        request_timeout: Duration::from_secs(args.request_timeout_secs.max(1)),
    };

    let peers = Arc::new(PeerDirectory::new(peer_config));
    let client = Arc::new(HttpPeerClient::new(client_config).context("failed to build HTTP client")?);
    let ledger = Arc::new(
        Ledger::new(ledger_config, wallet.address(), Arc::clone(&peers), client)
            .context("invalid ledger configuration")?,
    );

    let shutdown = CancellationToken::new();
    peers.refresh();
    spawn_peer_refresh(Arc::clone(&peers), shutdown.child_token());

    let replaced = ledger.resolve_conflicts().await;
    info!(replaced, height = ledger.len() - 1, "initial reconciliation finished");

    let state = api::AppState::new(
        Arc::clone(&ledger),
        wallet.keypair().public_key.to_hex(),
        shutdown.clone(),
    );
    if args.auto_mine {
        state.start_mining();
    }

    let addr = SocketAddr::from((args.host, args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, difficulty = args.difficulty, "powchain node listening");

    let token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "failed to wait for shutdown signal");
        } else {
            info!("shutdown signal received (Ctrl+C)");
        }
        token.cancel();
    });

    let server_token = shutdown.clone();
    axum::serve(listener, api::build_router(state))
        .with_graceful_shutdown(async move { server_token.cancelled().await })
        .await
        .context("server error")?;

    shutdown.cancel();
    info!("shutdown complete");
    Ok(())
}
