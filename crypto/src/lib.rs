//! Dumbly Cryptography
//!
//! Account credentials, address derivation and signature verification.
//! Signing authority stays with whoever holds the [`KeyPair`].

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

/// Prefix carried by every account address.
pub const ADDRESS_PREFIX: &str = "DMB1";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid public key")]
    InvalidPublicKey,

    #[error("Invalid private key")]
    InvalidPrivateKey,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;

/// Key pair holding the signing authority of one account
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl KeyPair {
    /// Generate new random keypair
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();

        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Restore a keypair from a hex encoded 32 byte secret
    pub fn from_secret_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str.trim()).map_err(|_| CryptoError::InvalidPrivateKey)?;

        let key_bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidPrivateKey)?;

        let signing_key = SigningKey::from_bytes(&key_bytes);
        let verifying_key = signing_key.verifying_key();

        Ok(Self {
            signing_key,
            verifying_key,
        })
    }

    /// Secret key as hex, the form config files carry
    pub fn secret_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.verifying_key.as_bytes())
    }

    /// Ledger address of this account
    pub fn address(&self) -> String {
        public_key_to_address(&self.public_key_hex())
    }

    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key.sign(message).to_bytes().to_vec()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Verify a signature made by the account behind `address`
pub fn verify(address: &str, message: &[u8], signature_bytes: &[u8]) -> Result<()> {
    let public_key_hex = address_to_public_key(address)?;
    let pub_key_bytes = hex::decode(public_key_hex).map_err(|_| CryptoError::InvalidPublicKey)?;

    let pub_key_array: [u8; 32] = pub_key_bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidPublicKey)?;

    let verifying_key =
        VerifyingKey::from_bytes(&pub_key_array).map_err(|_| CryptoError::InvalidPublicKey)?;

    let sig_array: [u8; 64] = signature_bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidSignature)?;

    let signature = Signature::from_bytes(&sig_array);

    verifying_key
        .verify(message, &signature)
        .map_err(|_| CryptoError::InvalidSignature)
}

/// Hash data with SHA256
pub fn hash_sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

pub fn hash_sha256_hex(data: &[u8]) -> String {
    hex::encode(hash_sha256(data))
}

pub fn public_key_to_address(public_key_hex: &str) -> String {
    format!("{}{}", ADDRESS_PREFIX, public_key_hex)
}

/// Strip the prefix and check the remainder is a 32 byte hex public key
pub fn address_to_public_key(address: &str) -> Result<&str> {
    let key = address
        .strip_prefix(ADDRESS_PREFIX)
        .ok_or_else(|| CryptoError::InvalidAddress(address.to_string()))?;

    if key.len() != 64 || !key.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CryptoError::InvalidAddress(address.to_string()));
    }

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_generation() {
        let keypair = KeyPair::generate();
        assert_eq!(keypair.public_key_hex().len(), 64);
        assert!(keypair.address().starts_with(ADDRESS_PREFIX));
    }

    #[test]
    fn test_sign_and_verify() {
        let keypair = KeyPair::generate();
        let message = b"group 0001";

        let signature = keypair.sign(message);
        assert!(verify(&keypair.address(), message, &signature).is_ok());
    }

    #[test]
    fn test_signature_from_other_account_rejected() {
        let signer = KeyPair::generate();
        let other = KeyPair::generate();
        let message = b"group 0001";

        let signature = signer.sign(message);
        assert_eq!(
            verify(&other.address(), message, &signature),
            Err(CryptoError::InvalidSignature)
        );
    }

    #[test]
    fn test_secret_roundtrip_keeps_address() {
        let keypair = KeyPair::generate();
        let restored = KeyPair::from_secret_hex(&keypair.secret_hex()).unwrap();
        assert_eq!(restored.address(), keypair.address());
    }

    #[test]
    fn test_malformed_secret() {
        assert!(matches!(
            KeyPair::from_secret_hex("abcd"),
            Err(CryptoError::InvalidPrivateKey)
        ));
    }

    #[test]
    fn test_address_validation() {
        assert!(address_to_public_key("TIME1abc").is_err());
        assert!(address_to_public_key(&format!("{}{}", ADDRESS_PREFIX, "zz".repeat(32))).is_err());

        let keypair = KeyPair::generate();
        assert_eq!(
            address_to_public_key(&keypair.address()).unwrap(),
            keypair.public_key_hex()
        );
    }

    #[test]
    fn test_debug_hides_secret() {
        let keypair = KeyPair::generate();
        let rendered = format!("{:?}", keypair);
        assert!(!rendered.contains(&keypair.secret_hex()));
    }
}
