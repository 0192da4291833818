//! Background loops: peer refresh and periodic mining.
//!
//! Both run until their cancellation token fires.

use crate::blockchain::Ledger;
use crate::peers::PeerDirectory;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Rebuild the peer directory every `refresh_interval`, starting immediately.
pub fn spawn_peer_refresh(peers: Arc<PeerDirectory>, token: CancellationToken) -> JoinHandle<()> {
    let period = peers.config().refresh_interval;
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    peers.refresh();
                }
            }
        }
        debug!("peer refresh stopped");
    })
}

/// Mine one block, then wait `period` before the next cycle.
///
/// The wait starts after a cycle finishes, so cycles never overlap.
/// Cancelling mid-cycle stops the nonce search and withdraws its reward.
pub fn spawn_mining_loop(
    ledger: Arc<Ledger>,
    period: Duration,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_secs = period.as_secs(), "background mining started");
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                mined = ledger.mine() => {
                    debug!(mined, height = ledger.len() - 1, "mining cycle finished");
                }
            }
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(period) => {}
            }
        }
        info!("background mining stopped");
    })
}
