//! # Seed Keyring
//!
//! Ed25519 account key derived from the operator's seed phrase.
//!
//! The signing seed is `SHA-256(phrase)` over the whitespace-normalised
//! phrase, so the same phrase always yields the same account. The phrase
//! itself is not retained.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use probe_core::AccountId;
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::{Zeroize, Zeroizing};

/// Keyring errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyringError {
    #[error("Seed phrase is empty")]
    EmptySeed,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Signature verification failed")]
    SignatureVerificationFailed,
}

/// Account keypair of the probe.
pub struct Keyring {
    signing_key: SigningKey,
}

impl Keyring {
    /// Derive the keypair from a seed phrase.
    pub fn from_seed_phrase(phrase: &str) -> Result<Self, KeyringError> {
        let normalised = Zeroizing::new(phrase.split_whitespace().collect::<Vec<_>>().join(" "));
        if normalised.is_empty() {
            return Err(KeyringError::EmptySeed);
        }
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&Sha256::digest(normalised.as_bytes()));
        let signing_key = SigningKey::from_bytes(&seed);
        seed.zeroize();
        Ok(Self { signing_key })
    }

    /// Account id (the public key).
    pub fn account_id(&self) -> AccountId {
        AccountId(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a message (deterministic - no RNG needed).
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Verify a signature made by `account`.
    pub fn verify(
        account: &AccountId,
        message: &[u8],
        signature: &[u8; 64],
    ) -> Result<(), KeyringError> {
        let key = VerifyingKey::from_bytes(account.as_bytes())
            .map_err(|_| KeyringError::InvalidPublicKey)?;
        key.verify(message, &ed25519_dalek::Signature::from_bytes(signature))
            .map_err(|_| KeyringError::SignatureVerificationFailed)
    }
}

impl std::fmt::Debug for Keyring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keyring")
            .field("account", &self.account_id())
            .finish_non_exhaustive()
    }
}

impl Drop for Keyring {
    fn drop(&mut self) {
        // Zeroize secret key material
        let mut bytes = self.signing_key.to_bytes();
        bytes.zeroize();
    }
}
