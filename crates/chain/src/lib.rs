//! Ledger orchestration for powchain.
//!
//! This crate brings the core types and consensus rules together into a
//! running node's state:
//! - **Ledger**: chain, pending pool, admission, mining and reconciliation
//! - **Mempool**: pending transactions in arrival order
//! - **Peers**: directory of candidate peers derived from the topology
//! - **Client**: HTTP calls a node makes against its peers
//! - **Tasks**: background peer refresh and mining loops
//!
//! # Example
//!
//! ```rust,no_run
//! use powchain_chain::{ClientConfig, HttpPeerClient, Ledger, LedgerConfig, PeerConfig, PeerDirectory};
//! use powchain_core::Wallet;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let wallet = Wallet::generate();
//! let peers = Arc::new(PeerDirectory::new(PeerConfig::default()));
//! let client = Arc::new(HttpPeerClient::new(ClientConfig::default())?);
//!
//! let ledger = Ledger::new(LedgerConfig::default(), wallet.address(), peers, client)?;
//! ledger.mine().await;
//! assert_eq!(ledger.balance_of(wallet.address()), 1.0);
//! # Ok(())
//! # }
//! ```

pub mod blockchain;
pub mod client;
pub mod mempool;
pub mod peers;
pub mod tasks;

// Re-export commonly used types
pub use blockchain::{Ledger, LedgerConfig, LedgerError};
pub use client::{ClientConfig, ClientError, HttpPeerClient, PeerClient};
pub use mempool::Mempool;
pub use peers::{PeerConfig, PeerDirectory};
pub use tasks::{spawn_mining_loop, spawn_peer_refresh};
