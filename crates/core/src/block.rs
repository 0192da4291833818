//! Blocks and the chain snapshot exchanged between nodes.

use crate::hash::{hash, Hash};
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};

/// An ordered batch of transactions linked to its predecessor by hash.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Block {
    /// Creation time in nanoseconds since the Unix epoch.
    pub timestamp: i64,
    /// Nonce found by proof-of-work.
    pub nonce: u64,
    /// Hash of the previous block.
    #[serde(rename = "previousHash")]
    pub previous_hash: Hash,
    /// Transactions sealed in this block, in order.
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Create a block stamped with the current time.
    pub fn new(nonce: u64, previous_hash: Hash, transactions: Vec<Transaction>) -> Self {
        Self {
            timestamp: Self::current_timestamp(),
            nonce,
            previous_hash,
            transactions,
        }
    }

    /// The block that proof-of-work hashes: same content, zero timestamp.
    pub fn candidate(nonce: u64, previous_hash: Hash, transactions: Vec<Transaction>) -> Self {
        Self {
            timestamp: 0,
            nonce,
            previous_hash,
            transactions,
        }
    }

    /// The empty block whose hash links the genesis block.
    pub fn sentinel() -> Self {
        Self::default()
    }

    /// Create the genesis block.
    pub fn genesis() -> Self {
        Self::new(0, Self::sentinel().hash(), Vec::new())
    }

    /// Get the current Unix timestamp in nanoseconds.
    pub fn current_timestamp() -> i64 {
        chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_default()
    }

    /// Calculate the hash of this block.
    ///
    /// The preimage is the bincode encoding of the fields in declaration
    /// order, so equal field values always produce the same digest.
    pub fn hash(&self) -> Hash {
        let encoded = bincode::serialize(self).expect("serialization should not fail");
        hash(&encoded)
    }

    /// Get the number of transactions in this block.
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }
}

/// A full chain as served by `GET /chain`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub chain: Vec<Block>,
}

impl From<Vec<Block>> for ChainSnapshot {
    fn from(chain: Vec<Block>) -> Self {
        Self { chain }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_transactions() -> Vec<Transaction> {
        vec![
            Transaction::new("alice", "bob", 1.0),
            Transaction::new("bob", "carol", 2.5),
        ]
    }

    #[test]
    fn test_genesis_block() {
        let genesis = Block::genesis();

        assert!(genesis.transactions.is_empty());
        assert_eq!(genesis.nonce, 0);
        assert_eq!(genesis.previous_hash, Block::sentinel().hash());
    }

    #[test]
    fn test_block_hash_deterministic() {
        let block = Block::new(7, Hash::ZERO, sample_transactions());

        let h1 = block.hash();
        let h2 = block.clone().hash();
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_transaction_order_changes_hash() {
        let mut reversed = sample_transactions();
        reversed.reverse();

        let a = Block::candidate(0, Hash::ZERO, sample_transactions());
        let b = Block::candidate(0, Hash::ZERO, reversed);
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_each_field_affects_hash() {
        let base = Block::candidate(1, Hash::ZERO, sample_transactions());

        let mut other = base.clone();
        other.nonce = 2;
        assert_ne!(base.hash(), other.hash());

        let mut other = base.clone();
        other.timestamp = 99;
        assert_ne!(base.hash(), other.hash());

        let mut other = base.clone();
        other.previous_hash = hash(b"other");
        assert_ne!(base.hash(), other.hash());
    }

    #[test]
    fn test_candidate_has_zero_timestamp() {
        let candidate = Block::candidate(3, Hash::ZERO, vec![]);
        assert_eq!(candidate.timestamp, 0);
        assert!(Block::new(3, Hash::ZERO, vec![]).timestamp > 0);
    }

    #[test]
    fn test_block_wire_format() {
        let block = Block::new(5, hash(b"prev"), sample_transactions());
        let json = serde_json::to_value(&block).unwrap();

        assert_eq!(json["nonce"], 5);
        assert_eq!(json["previousHash"], hash(b"prev").to_hex());
        assert_eq!(
            json["transactions"][0]["sender_blockchain_address"],
            "alice"
        );

        let decoded: Block = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, block);
        assert_eq!(decoded.hash(), block.hash());
    }

    #[test]
    fn test_chain_snapshot_shape() {
        let snapshot = ChainSnapshot::from(vec![Block::genesis()]);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["chain"].as_array().unwrap().len(), 1);
    }
}
