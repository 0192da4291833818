//! The ledger: chain, pending pool, mining and reconciliation.
//!
//! `chain` and the pending pool sit behind one lock. Mining snapshots the
//! pool under that lock, searches for a nonce without it, then re-takes it
//! to append the block. Whole mining cycles are serialized by a separate
//! async guard. Reconciliation fetches peer chains lock-free and swaps the
//! chain in under the lock only if the candidate is still longer.

use crate::client::PeerClient;
use crate::mempool::Mempool;
use crate::peers::PeerDirectory;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use powchain_consensus::{
    ChainValidator, PowError, ProofOfWork, TransactionValidator, ValidationError,
};
use powchain_core::{
    Block, Hash, PublicKey, Signature, Transaction, TransactionError, TransactionRequest,
};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("transaction error: {0}")]
    Transaction(#[from] TransactionError),

    #[error("proof-of-work error: {0}")]
    Pow(#[from] PowError),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Ledger configuration.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Leading hex zeros required of a block's proof.
    pub difficulty: usize,
    /// Amount credited to this node for each mined block.
    pub mining_reward: f32,
    /// Pause between mining cycles of the background miner.
    pub mining_interval: Duration,
    /// Peers contacted at once during fan-out.
    pub max_concurrent_requests: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: 3,
            mining_reward: 1.0,
            mining_interval: Duration::from_secs(20),
            max_concurrent_requests: 8,
        }
    }
}

struct LedgerState {
    chain: Vec<Block>,
    mempool: Mempool,
}

/// A node's ledger.
pub struct Ledger {
    config: LedgerConfig,
    pow: ProofOfWork,
    /// Recipient of mining rewards.
    address: String,
    state: Mutex<LedgerState>,
    /// Held for a whole mining cycle.
    mining: tokio::sync::Mutex<()>,
    peers: Arc<PeerDirectory>,
    client: Arc<dyn PeerClient>,
}

/// Signed sum of every transaction touching `address` across `chain`.
fn balance_in(chain: &[Block], address: &str) -> f32 {
    let mut total = 0.0f32;
    for tx in chain.iter().flat_map(|b| b.transactions.iter()) {
        if tx.recipient == address {
            total += tx.value;
        }
        if tx.sender == address {
            total -= tx.value;
        }
    }
    total
}

/// A mining reward sitting in the pool for an unfinished cycle.
///
/// Dropping it stops the nonce search and, unless the block was sealed,
/// withdraws the reward.
struct PendingReward<'a> {
    ledger: &'a Ledger,
    reward: Transaction,
    stop: Arc<AtomicBool>,
    sealed: bool,
}

impl<'a> PendingReward<'a> {
    fn new(ledger: &'a Ledger, reward: Transaction) -> Self {
        Self {
            ledger,
            reward,
            stop: Arc::new(AtomicBool::new(false)),
            sealed: false,
        }
    }

    fn mark_sealed(mut self) {
        self.sealed = true;
    }
}

impl Drop for PendingReward<'_> {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if !self.sealed {
            self.ledger
                .state
                .lock()
                .mempool
                .remove_sealed(std::slice::from_ref(&self.reward));
            debug!("unsealed mining reward withdrawn");
        }
    }
}

impl Ledger {
    /// Create a ledger seeded with the genesis block.
    pub fn new(
        config: LedgerConfig,
        address: impl Into<String>,
        peers: Arc<PeerDirectory>,
        client: Arc<dyn PeerClient>,
    ) -> Result<Self> {
        let pow = ProofOfWork::new(config.difficulty)?;
        Ok(Self {
            config,
            pow,
            address: address.into(),
            state: Mutex::new(LedgerState {
                chain: vec![Block::genesis()],
                mempool: Mempool::new(),
            }),
            mining: tokio::sync::Mutex::new(()),
            peers,
            client,
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// This node's ledger address.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn peers(&self) -> &PeerDirectory {
        &self.peers
    }

    /// Copy of the chain.
    pub fn chain(&self) -> Vec<Block> {
        self.state.lock().chain.clone()
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> usize {
        self.state.lock().chain.len()
    }

    /// Always false: the genesis block is never removed.
    pub fn is_empty(&self) -> bool {
        self.state.lock().chain.is_empty()
    }

    /// The most recent block.
    pub fn last_block(&self) -> Block {
        let state = self.state.lock();
        state
            .chain
            .last()
            .cloned()
            .unwrap_or_else(Block::genesis)
    }

    /// Copy of the pending transactions, in arrival order.
    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.state.lock().mempool.snapshot()
    }

    /// Drop every pending transaction.
    pub fn clear_pending(&self) {
        self.state.lock().mempool.clear();
        debug!("pending pool cleared");
    }

    /// Balance of `address`, summed over the whole chain.
    pub fn balance_of(&self, address: &str) -> f32 {
        balance_in(&self.state.lock().chain, address)
    }

    /// Admit a transaction into the pending pool.
    ///
    /// Rewards issued by [`MINING_SENDER`](powchain_core::MINING_SENDER) skip
    /// every check. Anything else must carry a finite non-negative value, a
    /// valid signature and a sender balance covering the value; on failure
    /// nothing changes.
    pub fn try_add_transaction(
        &self,
        tx: Transaction,
        credentials: Option<(&PublicKey, &Signature)>,
    ) -> Result<()> {
        if tx.is_reward() {
            info!(recipient = %tx.recipient, value = tx.value, "mining reward admitted");
            self.state.lock().mempool.add(tx);
            return Ok(());
        }

        TransactionValidator::validate_value(&tx)?;
        let (public_key, signature) = credentials.ok_or(TransactionError::MissingCredentials)?;
        TransactionValidator::validate_with_signature(&tx, public_key, signature)?;

        let mut state = self.state.lock();
        let balance = balance_in(&state.chain, &tx.sender);
        TransactionValidator::validate_against_balance(&tx, balance)?;

        info!(sender = %tx.sender, recipient = %tx.recipient, value = tx.value, "transaction admitted");
        state.mempool.add(tx);
        Ok(())
    }

    /// Boolean form of [`try_add_transaction`](Self::try_add_transaction).
    pub fn add_transaction(
        &self,
        sender: &str,
        recipient: &str,
        value: f32,
        public_key: Option<&PublicKey>,
        signature: Option<&Signature>,
    ) -> bool {
        let tx = Transaction::new(sender, recipient, value);
        let credentials = public_key.zip(signature);
        match self.try_add_transaction(tx, credentials) {
            Ok(()) => true,
            Err(e) => {
                warn!(sender, recipient, value, error = %e, "transaction rejected");
                false
            }
        }
    }

    /// Decode a wire request and admit it.
    pub fn add_request(&self, request: &TransactionRequest) -> bool {
        let signed = match request.validate() {
            Ok(signed) => signed,
            Err(e) => {
                warn!(error = %e, "transaction request rejected");
                return false;
            }
        };
        match self.try_add_transaction(
            signed.transaction,
            Some((&signed.public_key, &signed.signature)),
        ) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "transaction rejected");
                false
            }
        }
    }

    /// Admit a request and, if accepted, forward it to every peer.
    pub async fn create_transaction(&self, request: &TransactionRequest) -> bool {
        if !self.add_request(request) {
            return false;
        }

        let request = request.clone();
        self.notify_peers("put_transaction", move |client, peer| {
            let request = request.clone();
            async move { client.put_transaction(&peer, &request).await }
        })
        .await;
        true
    }

    /// Check links and proofs of a candidate chain.
    pub fn is_valid_chain(&self, chain: &[Block]) -> bool {
        ChainValidator::is_valid_chain(&self.pow, chain)
    }

    /// Run one mining cycle.
    ///
    /// Returns false when the chain tip was replaced by reconciliation while
    /// the nonce search ran. The cycle's reward is withdrawn from the pool
    /// whenever its block is not sealed, including when this future is
    /// dropped mid-search; the rest of the pool is left as it was.
    pub async fn mine(&self) -> bool {
        let _cycle = self.mining.lock().await;

        let reward = Transaction::reward(self.address.clone(), self.config.mining_reward);
        let (transactions, previous_hash) = self.begin_cycle(&reward);
        let pending = PendingReward::new(self, reward);

        let pow = self.pow;
        let search = transactions.clone();
        let stop = Arc::clone(&pending.stop);
        let nonce = match tokio::task::spawn_blocking(move || {
            pow.find_nonce_until(previous_hash, &search, &stop)
        })
        .await
        {
            Ok(Some(nonce)) => nonce,
            Ok(None) => {
                debug!("nonce search stopped");
                return false;
            }
            Err(e) => {
                error!(error = %e, "nonce search aborted");
                return false;
            }
        };

        let Some(height) = self.seal_block(nonce, previous_hash, &transactions) else {
            warn!(action = "mining", status = "abandoned", "chain tip moved during nonce search");
            return false;
        };
        pending.mark_sealed();
        info!(
            action = "mining",
            status = "success",
            height,
            nonce,
            difficulty = self.pow.difficulty(),
            txs = transactions.len()
        );

        self.notify_peers("clear_transactions", |client, peer| async move {
            client.clear_transactions(&peer).await
        })
        .await;
        self.notify_peers("consensus", |client, peer| async move {
            client.request_consensus(&peer).await
        })
        .await;

        true
    }

    /// Admit the cycle's reward and snapshot the pool and the tip hash.
    fn begin_cycle(&self, reward: &Transaction) -> (Vec<Transaction>, Hash) {
        let mut state = self.state.lock();
        state.mempool.add(reward.clone());
        let previous_hash = state
            .chain
            .last()
            .map(Block::hash)
            .unwrap_or_else(|| Block::genesis().hash());
        (state.mempool.snapshot(), previous_hash)
    }

    /// Append the mined block unless the tip moved; returns the new height.
    fn seal_block(
        &self,
        nonce: u64,
        previous_hash: Hash,
        transactions: &[Transaction],
    ) -> Option<usize> {
        let mut state = self.state.lock();
        if state.chain.last().map(Block::hash) != Some(previous_hash) {
            return None;
        }
        state
            .chain
            .push(Block::new(nonce, previous_hash, transactions.to_vec()));
        state.mempool.remove_sealed(transactions);
        Some(state.chain.len() - 1)
    }

    /// Replace the chain if `chain` is still longer than the local one.
    fn adopt_chain(&self, chain: Vec<Block>) -> bool {
        let mut state = self.state.lock();
        if chain.len() <= state.chain.len() {
            return false;
        }
        state.chain = chain;
        true
    }

    /// Adopt the longest valid peer chain if it beats the local one.
    pub async fn resolve_conflicts(&self) -> bool {
        let peers = self.peers.peers();
        let mut max_length = self.len();
        let client = &self.client;
        let fetched: Vec<_> = stream::iter(peers)
            .map(|peer| async move {
                let result = client.fetch_chain(&peer).await;
                (peer, result)
            })
            .buffered(self.config.max_concurrent_requests.max(1))
            .collect()
            .await;

        let mut longest: Option<(String, Vec<Block>)> = None;

        for (peer, result) in fetched {
            let chain = match result {
                Ok(chain) => chain,
                Err(e) => {
                    warn!(%peer, error = %e, "failed to fetch peer chain");
                    continue;
                }
            };

            if chain.len() <= max_length {
                debug!(%peer, length = chain.len(), "peer chain not longer");
                continue;
            }
            if let Err(e) = ChainValidator::validate_chain(&self.pow, &chain) {
                warn!(%peer, length = chain.len(), error = %e, "peer chain invalid");
                continue;
            }
            max_length = chain.len();
            longest = Some((peer, chain));
        }

        let Some((peer, chain)) = longest else {
            info!(action = "resolve", status = "fail");
            return false;
        };

        if !self.adopt_chain(chain) {
            info!(action = "resolve", status = "fail", "local chain grew during reconciliation");
            return false;
        }
        info!(action = "resolve", status = "success", %peer, length = max_length);
        true
    }

    /// Call every peer with bounded concurrency, logging failures.
    async fn notify_peers<F, Fut>(&self, action: &'static str, call: F)
    where
        F: Fn(Arc<dyn PeerClient>, String) -> Fut,
        Fut: Future<Output = crate::client::Result<()>>,
    {
        let peers = self.peers.peers();
        if peers.is_empty() {
            return;
        }

        let results: Vec<_> = stream::iter(peers)
            .map(|peer| {
                let fut = call(Arc::clone(&self.client), peer.clone());
                async move { (peer, fut.await) }
            })
            .buffer_unordered(self.config.max_concurrent_requests.max(1))
            .collect()
            .await;

        let mut failed = 0;
        for (peer, result) in &results {
            match result {
                Ok(()) => debug!(%peer, action, "peer notified"),
                Err(e) => {
                    failed += 1;
                    warn!(%peer, action, error = %e, "peer notification failed");
                }
            }
        }
        debug!(action, total = results.len(), failed, "peer fan-out finished");
    }
}
