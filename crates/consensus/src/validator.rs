//! Transaction and chain validation rules.

use crate::pow::ProofOfWork;
use powchain_core::{Block, PublicKey, Signature, Transaction};
use thiserror::Error;

/// Errors that can occur during validation.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("transaction signature verification failed")]
    InvalidSignature,

    #[error("invalid transfer value {0}")]
    InvalidValue(f32),

    #[error("insufficient balance (required {required}, available {available})")]
    InsufficientBalance { required: f32, available: f32 },

    #[error("block {index} previous hash does not match its predecessor")]
    InvalidPrevHash { index: usize },

    #[error("block {index} fails proof-of-work")]
    InvalidProof { index: usize },
}

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Transaction validator.
pub struct TransactionValidator;

impl TransactionValidator {
    /// Reject negative and non-finite transfer values.
    pub fn validate_value(tx: &Transaction) -> Result<()> {
        if !tx.value.is_finite() || tx.value < 0.0 {
            return Err(ValidationError::InvalidValue(tx.value));
        }
        Ok(())
    }

    /// Verify the sender's signature over the transaction.
    pub fn validate_with_signature(
        tx: &Transaction,
        public_key: &PublicKey,
        signature: &Signature,
    ) -> Result<()> {
        tx.verify(public_key, signature)
            .map_err(|_| ValidationError::InvalidSignature)
    }

    /// Check that the sender can cover the transferred value.
    pub fn validate_against_balance(tx: &Transaction, sender_balance: f32) -> Result<()> {
        if sender_balance < tx.value {
            return Err(ValidationError::InsufficientBalance {
                required: tx.value,
                available: sender_balance,
            });
        }
        Ok(())
    }
}

/// Whole-chain validator.
pub struct ChainValidator;

impl ChainValidator {
    /// Validate every link and proof from the second block on.
    ///
    /// The first block is taken as given; empty and single-block chains
    /// have no links and are accepted.
    pub fn validate_chain(pow: &ProofOfWork, chain: &[Block]) -> Result<()> {
        for (index, pair) in chain.windows(2).enumerate() {
            let (parent, block) = (&pair[0], &pair[1]);
            let parent_hash = parent.hash();

            if block.previous_hash != parent_hash {
                return Err(ValidationError::InvalidPrevHash { index: index + 1 });
            }

            if !pow.valid_proof(block.nonce, parent_hash, &block.transactions) {
                return Err(ValidationError::InvalidProof { index: index + 1 });
            }
        }
        Ok(())
    }

    /// Boolean form of [`validate_chain`](Self::validate_chain).
    pub fn is_valid_chain(pow: &ProofOfWork, chain: &[Block]) -> bool {
        Self::validate_chain(pow, chain).is_ok()
    }
}
