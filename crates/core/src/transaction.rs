//! Value-transfer transactions and their signing.

use crate::crypto::{CryptoError, Keypair, PublicKey, Signature};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sender identity used by the ledger itself when issuing mining rewards.
pub const MINING_SENDER: &str = "THE BLOCKCHAIN";

/// Errors that can occur during transaction operations.
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("signature verification failed")]
    VerificationFailed,
    #[error("missing sender public key or signature")]
    MissingCredentials,
    #[error("malformed transaction request: {0}")]
    MalformedRequest(&'static str),
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

/// An immutable value transfer between two ledger addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender's ledger address.
    #[serde(rename = "sender_blockchain_address")]
    pub sender: String,
    /// Recipient's ledger address.
    #[serde(rename = "recipient_blockchain_address")]
    pub recipient: String,
    /// Amount transferred.
    pub value: f32,
}

impl Transaction {
    /// Create a new transaction.
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, value: f32) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            value,
        }
    }

    /// Create a mining reward crediting `recipient`.
    pub fn reward(recipient: impl Into<String>, value: f32) -> Self {
        Self::new(MINING_SENDER, recipient, value)
    }

    /// Whether this transaction was issued by the ledger as a mining reward.
    pub fn is_reward(&self) -> bool {
        self.sender == MINING_SENDER
    }

    /// The canonical bytes a sender signs: the JSON wire form.
    pub fn signing_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("serialization should not fail")
    }

    /// Sign the transaction with the given keypair.
    pub fn sign(&self, keypair: &Keypair) -> Signature {
        keypair.sign(&self.signing_bytes())
    }

    /// Verify the transaction signature.
    pub fn verify(&self, public_key: &PublicKey, signature: &Signature) -> Result<(), TransactionError> {
        public_key
            .verify(&self.signing_bytes(), signature)
            .map_err(|_| TransactionError::VerificationFailed)
    }
}

/// Wire form of a signed transaction exchanged between wallets and nodes.
///
/// Every field is optional so that a request with missing pieces decodes
/// and is then rejected by [`TransactionRequest::validate`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionRequest {
    #[serde(rename = "sender_blockchain_address")]
    pub sender: Option<String>,
    #[serde(rename = "recipient_blockchain_address")]
    pub recipient: Option<String>,
    /// Hex `X || Y` public key of the sender.
    pub sender_public_key: Option<String>,
    pub value: Option<f32>,
    /// Hex `R || S` signature.
    pub signature: Option<String>,
}

/// A [`TransactionRequest`] whose fields are all present and parsed.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub transaction: Transaction,
    pub public_key: PublicKey,
    pub signature: Signature,
}

impl TransactionRequest {
    /// Build a request for `transaction`, signed by `keypair`.
    pub fn signed(transaction: &Transaction, keypair: &Keypair) -> Self {
        let signature = transaction.sign(keypair);
        Self::from_parts(transaction, &keypair.public_key, &signature)
    }

    /// Build a request from an already signed transaction.
    pub fn from_parts(transaction: &Transaction, public_key: &PublicKey, signature: &Signature) -> Self {
        Self {
            sender: Some(transaction.sender.clone()),
            recipient: Some(transaction.recipient.clone()),
            sender_public_key: Some(public_key.to_hex()),
            value: Some(transaction.value),
            signature: Some(signature.to_hex()),
        }
    }

    /// Check presence of every field and decode the key and signature.
    pub fn validate(&self) -> Result<SignedTransaction, TransactionError> {
        let sender = self
            .sender
            .as_ref()
            .ok_or(TransactionError::MalformedRequest("sender"))?;
        let recipient = self
            .recipient
            .as_ref()
            .ok_or(TransactionError::MalformedRequest("recipient"))?;
        let value = self
            .value
            .ok_or(TransactionError::MalformedRequest("value"))?;
        if !value.is_finite() || value < 0.0 {
            return Err(TransactionError::MalformedRequest("value"));
        }
        let public_key = self
            .sender_public_key
            .as_deref()
            .ok_or(TransactionError::MissingCredentials)?;
        let signature = self
            .signature
            .as_deref()
            .ok_or(TransactionError::MissingCredentials)?;

        Ok(SignedTransaction {
            transaction: Transaction::new(sender.clone(), recipient.clone(), value),
            public_key: PublicKey::from_hex(public_key)?,
            signature: Signature::from_hex(signature)?,
        })
    }
}
