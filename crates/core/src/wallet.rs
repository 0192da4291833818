//! Wallets: a signing keypair bundled with its derived ledger address.

use crate::crypto::{CryptoError, Keypair};
use crate::transaction::{Transaction, TransactionRequest};
use serde::{Deserialize, Serialize};

/// A keypair plus the ledger address derived from it.
#[derive(Debug)]
pub struct Wallet {
    keypair: Keypair,
    address: String,
}

/// Exported form of a wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletInfo {
    pub private_key: String,
    pub public_key: String,
    pub blockchain_address: String,
}

impl Wallet {
    /// Generate a wallet with a fresh random key.
    pub fn generate() -> Self {
        Self::from_keypair(Keypair::generate())
    }

    /// Wrap an existing keypair.
    pub fn from_keypair(keypair: Keypair) -> Self {
        let address = keypair.address();
        Self { keypair, address }
    }

    /// Restore a wallet from its hex private key.
    pub fn from_private_key_hex(s: &str) -> Result<Self, CryptoError> {
        Ok(Self::from_keypair(Keypair::from_private_key_hex(s)?))
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Sign a transfer from this wallet and package it for a node.
    pub fn transfer(&self, recipient: impl Into<String>, value: f32) -> TransactionRequest {
        let tx = Transaction::new(self.address.clone(), recipient, value);
        TransactionRequest::signed(&tx, &self.keypair)
    }

    pub fn info(&self) -> WalletInfo {
        WalletInfo {
            private_key: self.keypair.private_key_hex(),
            public_key: self.keypair.public_key.to_hex(),
            blockchain_address: self.address.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_roundtrip_through_private_key() {
        let wallet = Wallet::generate();
        let restored = Wallet::from_private_key_hex(&wallet.info().private_key).unwrap();
        assert_eq!(wallet.address(), restored.address());
    }

    #[test]
    fn test_wallet_info_json() {
        let wallet = Wallet::generate();
        let json = serde_json::to_value(wallet.info()).unwrap();
        assert_eq!(json["private_key"].as_str().unwrap().len(), 64);
        assert_eq!(json["public_key"].as_str().unwrap().len(), 128);
        assert_eq!(json["blockchain_address"], wallet.address());
    }

    #[test]
    fn test_transfer_is_verifiable() {
        let wallet = Wallet::generate();
        let request = wallet.transfer("bob", 4.0);
        let signed = request.validate().unwrap();

        assert_eq!(signed.transaction.sender, wallet.address());
        assert!(signed
            .transaction
            .verify(&signed.public_key, &signed.signature)
            .is_ok());
    }

    #[test]
    fn test_invalid_private_key_hex() {
        assert!(Wallet::from_private_key_hex("not-hex").is_err());
        assert!(Wallet::from_private_key_hex("abcd").is_err());
    }
}
