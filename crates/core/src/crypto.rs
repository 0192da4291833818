//! ECDSA (NIST P-256) primitives for signing and verification.
//!
//! Keys and signatures travel as fixed-width hex: a public key is the
//! 64-byte `X || Y` affine encoding, a signature the 64-byte `R || S` pair.

use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature as EcdsaSignature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use ripemd::Ripemd160;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

/// Version byte prepended to the RIPEMD-160 digest of an address.
const ADDRESS_VERSION: u8 = 0x00;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid public key")]
    InvalidPublicKey,
    #[error("invalid private key")]
    InvalidPrivateKey,
    #[error("signature verification failed")]
    VerificationFailed,
}

/// A cryptographic signature (`R || S`).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

impl Signature {
    /// Convert to a hex string (128 chars).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a 128-char hex string.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidSignature)?;
        if bytes.len() != 64 {
            return Err(CryptoError::InvalidSignature);
        }
        let mut arr = [0u8; 64];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", &self.to_hex()[..16])
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Signature::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A public key for signature verification.
#[derive(Clone)]
pub struct PublicKey(pub VerifyingKey);

impl PublicKey {
    /// The uncompressed `X || Y` coordinates, without the SEC1 tag byte.
    pub fn to_xy_bytes(&self) -> [u8; 64] {
        let point = self.0.to_encoded_point(false);
        let mut xy = [0u8; 64];
        xy.copy_from_slice(&point.as_bytes()[1..]);
        xy
    }

    /// Convert to a hex string (128 chars, `X || Y`).
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_xy_bytes())
    }

    /// Parse from the 128-char `X || Y` hex form.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidPublicKey)?;
        if bytes.len() != 64 {
            return Err(CryptoError::InvalidPublicKey);
        }
        let mut sec1 = Vec::with_capacity(65);
        sec1.push(0x04);
        sec1.extend_from_slice(&bytes);
        let key = VerifyingKey::from_sec1_bytes(&sec1).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self(key))
    }

    /// Derive the ledger address for this key.
    ///
    /// SHA-256 then RIPEMD-160 of `X || Y`, prefixed with the version byte
    /// and suffixed with a 4-byte double-SHA-256 checksum, Base58 encoded.
    pub fn to_address(&self) -> String {
        let digest = Sha256::digest(self.to_xy_bytes());
        let ripe = Ripemd160::digest(digest);

        let mut payload = Vec::with_capacity(25);
        payload.push(ADDRESS_VERSION);
        payload.extend_from_slice(&ripe);

        let checksum = Sha256::digest(Sha256::digest(&payload));
        payload.extend_from_slice(&checksum[..4]);

        bs58::encode(payload).into_string()
    }

    /// Verify a signature against this public key.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), CryptoError> {
        let sig = EcdsaSignature::from_slice(&signature.0).map_err(|_| CryptoError::InvalidSignature)?;
        self.0
            .verify(message, &sig)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..16])
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_xy_bytes() == other.to_xy_bytes()
    }
}

impl Eq for PublicKey {}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PublicKey::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A keypair for signing and verification.
pub struct Keypair {
    signing_key: SigningKey,
    pub public_key: PublicKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut OsRng);
        let public_key = PublicKey(VerifyingKey::from(&signing_key));
        Self {
            signing_key,
            public_key,
        }
    }

    /// Create a keypair from a 32-byte private scalar.
    pub fn from_private_key(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_slice(bytes).map_err(|_| CryptoError::InvalidPrivateKey)?;
        let public_key = PublicKey(VerifyingKey::from(&signing_key));
        Ok(Self {
            signing_key,
            public_key,
        })
    }

    /// Create a keypair from the 64-char hex form of the private scalar.
    pub fn from_private_key_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidPrivateKey)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidPrivateKey)?;
        Self::from_private_key(&arr)
    }

    /// Get the private key bytes.
    pub fn private_key(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.signing_key.to_bytes());
        out
    }

    /// Get the private key as hex.
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.private_key())
    }

    /// Get the address derived from the public key.
    pub fn address(&self) -> String {
        self.public_key.to_address()
    }

    /// Sign a message. The message is hashed with SHA-256 before signing.
    pub fn sign(&self, message: &[u8]) -> Signature {
        let sig: EcdsaSignature = self.signing_key.sign(message);
        let mut bytes = [0u8; 64];
        bytes.copy_from_slice(&sig.to_bytes());
        Signature(bytes)
    }

    /// Verify a signature against our public key.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), CryptoError> {
        self.public_key.verify(message, signature)
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let kp = Keypair::generate();
        let message = b"hello world";
        let sig = kp.sign(message);
        assert!(kp.verify(message, &sig).is_ok());
    }

    #[test]
    fn test_wrong_message_fails() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"hello");
        assert!(kp.verify(b"world", &sig).is_err());
    }

    #[test]
    fn test_wrong_key_fails() {
        let kp1 = Keypair::generate();
        let kp2 = Keypair::generate();
        let sig = kp1.sign(b"hello");
        assert!(kp2.verify(b"hello", &sig).is_err());
    }

    #[test]
    fn test_zero_signature_is_invalid() {
        let kp = Keypair::generate();
        let result = kp.verify(b"hello", &Signature([0u8; 64]));
        assert!(matches!(result, Err(CryptoError::InvalidSignature)));
    }

    #[test]
    fn test_public_key_hex_is_fixed_width() {
        let kp = Keypair::generate();
        let hex_str = kp.public_key.to_hex();
        assert_eq!(hex_str.len(), 128);
        let parsed = PublicKey::from_hex(&hex_str).unwrap();
        assert_eq!(parsed, kp.public_key);
    }

    #[test]
    fn test_public_key_rejects_off_curve_point() {
        let bogus = "11".repeat(64);
        assert!(matches!(
            PublicKey::from_hex(&bogus),
            Err(CryptoError::InvalidPublicKey)
        ));
    }

    #[test]
    fn test_signature_hex_is_fixed_width() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"payload");
        assert_eq!(sig.to_hex().len(), 128);
        assert_eq!(Signature::from_hex(&sig.to_hex()).unwrap(), sig);
        assert!(Signature::from_hex("abcd").is_err());
    }

    #[test]
    fn test_keypair_from_private_key() {
        let kp1 = Keypair::generate();
        let kp2 = Keypair::from_private_key_hex(&kp1.private_key_hex()).unwrap();
        assert_eq!(kp1.address(), kp2.address());
        assert_eq!(kp1.public_key, kp2.public_key);
    }

    #[test]
    fn test_zero_private_key_rejected() {
        assert!(Keypair::from_private_key(&[0u8; 32]).is_err());
    }

    #[test]
    fn test_address_format() {
        let kp = Keypair::generate();
        let addr = kp.address();
        let decoded = bs58::decode(&addr).into_vec().unwrap();
        assert_eq!(decoded.len(), 25);
        assert_eq!(decoded[0], ADDRESS_VERSION);

        let checksum = Sha256::digest(Sha256::digest(&decoded[..21]));
        assert_eq!(&decoded[21..], &checksum[..4]);
    }

    #[test]
    fn test_distinct_keys_have_distinct_addresses() {
        let kp1 = Keypair::generate();
        let kp2 = Keypair::generate();
        assert_ne!(kp1.address(), kp2.address());
    }
}
