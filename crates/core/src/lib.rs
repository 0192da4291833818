//! Core ledger primitives for powchain.
//!
//! This crate provides the fundamental types used throughout the ledger:
//! - Hashing (Blake3 block digests)
//! - ECDSA P-256 keys, signatures and address derivation
//! - Transactions and their signed wire form
//! - Blocks and chain snapshots
//! - Wallets

pub mod block;
pub mod crypto;
pub mod hash;
pub mod transaction;
pub mod wallet;

// Re-export commonly used types at the crate root
pub use block::{Block, ChainSnapshot};
pub use crypto::{CryptoError, Keypair, PublicKey, Signature};
pub use hash::{hash, Hash};
pub use transaction::{
    SignedTransaction, Transaction, TransactionError, TransactionRequest, MINING_SENDER,
};
pub use wallet::{Wallet, WalletInfo};
