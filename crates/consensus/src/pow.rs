//! Proof-of-work nonce search and verification.
//!
//! A nonce is valid when the hex digest of the candidate block
//! `{timestamp: 0, nonce, previous_hash, transactions}` starts with
//! `difficulty` zero characters. The search is a plain linear scan from 0.

use powchain_core::{Block, Hash, Transaction};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Hex characters in a 32-byte digest; no difficulty above this can be met.
pub const MAX_DIFFICULTY: usize = 64;

/// Errors that can occur when configuring proof-of-work.
#[derive(Debug, Error)]
pub enum PowError {
    #[error("difficulty {0} exceeds the maximum of 64")]
    DifficultyTooHigh(usize),
}

/// Nonces tried between checks of the stop flag.
const STOP_POLL_INTERVAL: u64 = 1024;

pub type Result<T> = std::result::Result<T, PowError>;

/// Proof-of-work parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: usize,
}

impl ProofOfWork {
    /// Create a proof-of-work rule for the given difficulty.
    pub fn new(difficulty: usize) -> Result<Self> {
        if difficulty > MAX_DIFFICULTY {
            return Err(PowError::DifficultyTooHigh(difficulty));
        }
        Ok(Self { difficulty })
    }

    /// Number of leading hex zeros required.
    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Check whether `nonce` solves the puzzle for these inputs.
    pub fn valid_proof(&self, nonce: u64, previous_hash: Hash, transactions: &[Transaction]) -> bool {
        Block::candidate(nonce, previous_hash, transactions.to_vec())
            .hash()
            .meets_difficulty(self.difficulty)
    }

    /// Search for the smallest nonce satisfying [`valid_proof`](Self::valid_proof).
    pub fn find_nonce(&self, previous_hash: Hash, transactions: &[Transaction]) -> u64 {
        let mut candidate = Block::candidate(0, previous_hash, transactions.to_vec());
        while !candidate.hash().meets_difficulty(self.difficulty) {
            candidate.nonce += 1;
        }
        candidate.nonce
    }

    /// Like [`find_nonce`](Self::find_nonce), but gives up once `stop` is set.
    ///
    /// The flag is polled every 1024 attempts.
    pub fn find_nonce_until(
        &self,
        previous_hash: Hash,
        transactions: &[Transaction],
        stop: &AtomicBool,
    ) -> Option<u64> {
        let mut candidate = Block::candidate(0, previous_hash, transactions.to_vec());
        while !candidate.hash().meets_difficulty(self.difficulty) {
            if candidate.nonce % STOP_POLL_INTERVAL == 0 && stop.load(Ordering::Relaxed) {
                return None;
            }
            candidate.nonce += 1;
        }
        Some(candidate.nonce)
    }
}

impl Default for ProofOfWork {
    fn default() -> Self {
        Self { difficulty: 3 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use powchain_core::hash;

    fn sample_transactions() -> Vec<Transaction> {
        vec![
            Transaction::reward("miner", 1.0),
            Transaction::new("alice", "bob", 0.5),
        ]
    }

    #[test]
    fn test_difficulty_zero_succeeds_at_nonce_zero() {
        let pow = ProofOfWork::new(0).unwrap();
        assert_eq!(pow.find_nonce(Hash::ZERO, &sample_transactions()), 0);
        assert!(pow.valid_proof(0, Hash::ZERO, &sample_transactions()));
    }

    #[test]
    fn test_found_nonce_is_valid_for_small_difficulties() {
        let prev = hash(b"previous block");
        let txs = sample_transactions();

        for difficulty in 0..=4 {
            let pow = ProofOfWork::new(difficulty).unwrap();
            let nonce = pow.find_nonce(prev, &txs);
            assert!(pow.valid_proof(nonce, prev, &txs), "difficulty {difficulty}");
        }
    }

    #[test]
    fn test_found_nonce_is_smallest() {
        let pow = ProofOfWork::new(2).unwrap();
        let txs = sample_transactions();
        let nonce = pow.find_nonce(Hash::ZERO, &txs);

        for earlier in 0..nonce {
            assert!(!pow.valid_proof(earlier, Hash::ZERO, &txs));
        }
    }

    #[test]
    fn test_find_nonce_until_matches_find_nonce() {
        let pow = ProofOfWork::new(2).unwrap();
        let txs = sample_transactions();
        let stop = AtomicBool::new(false);

        assert_eq!(
            pow.find_nonce_until(Hash::ZERO, &txs, &stop),
            Some(pow.find_nonce(Hash::ZERO, &txs))
        );
    }

    #[test]
    fn test_find_nonce_until_stops_when_flagged() {
        let pow = ProofOfWork::new(MAX_DIFFICULTY).unwrap();
        let stop = AtomicBool::new(true);

        assert_eq!(pow.find_nonce_until(Hash::ZERO, &sample_transactions(), &stop), None);
    }

    #[test]
    fn test_difficulty_accessor() {
        assert_eq!(ProofOfWork::default().difficulty(), 3);
        assert_eq!(ProofOfWork::new(5).unwrap().difficulty(), 5);
        assert!(ProofOfWork::new(MAX_DIFFICULTY + 1).is_err());
    }

    #[test]
    fn test_empty_transactions() {
        let pow = ProofOfWork::new(2).unwrap();
        let nonce = pow.find_nonce(Hash::ZERO, &[]);
        assert!(pow.valid_proof(nonce, Hash::ZERO, &[]));
    }

    #[test]
    fn test_proof_bound_to_previous_hash() {
        let pow = ProofOfWork::new(3).unwrap();
        let txs = sample_transactions();
        let nonce = pow.find_nonce(Hash::ZERO, &txs);

        // Some nearby previous hash will reject this nonce.
        let rejected = (0u8..32).any(|i| !pow.valid_proof(nonce, hash(&[i]), &txs));
        assert!(rejected);
    }

    #[test]
    fn test_difficulty_bound() {
        assert!(ProofOfWork::new(MAX_DIFFICULTY).is_ok());
        assert!(matches!(
            ProofOfWork::new(MAX_DIFFICULTY + 1),
            Err(PowError::DifficultyTooHigh(65))
        ));
    }
}
