//! Proof-of-work consensus for powchain.
//!
//! This crate provides the rules every node applies to blocks and transactions:
//! - Proof-of-work nonce search and verification
//! - Transaction validation (signature and balance checks)
//! - Whole-chain validation (hash links and proofs)
//!
//! # Example
//!
//! ```rust
//! use powchain_consensus::{ChainValidator, ProofOfWork};
//! use powchain_core::{Block, Transaction};
//!
//! let pow = ProofOfWork::new(2).unwrap();
//! let genesis = Block::genesis();
//!
//! let txs = vec![Transaction::reward("miner", 1.0)];
//! let nonce = pow.find_nonce(genesis.hash(), &txs);
//! let block = Block::new(nonce, genesis.hash(), txs);
//!
//! assert!(ChainValidator::is_valid_chain(&pow, &[genesis, block]));
//! ```

pub mod pow;
pub mod validator;

// Re-export commonly used types
pub use pow::{PowError, ProofOfWork, MAX_DIFFICULTY};
pub use validator::{ChainValidator, TransactionValidator, ValidationError};
