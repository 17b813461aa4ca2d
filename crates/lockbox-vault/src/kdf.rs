// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key derivation and master password hashing.
//!
//! Two distinct jobs live here:
//! - [`derive`] turns the *stored* master password hash into a 32-byte
//!   symmetric key with a single SHA-256 digest. It is deterministic, so the
//!   key changes whenever the stored hash changes.
//! - [`hash_passphrase`] / [`verify_passphrase`] produce and check the
//!   salted Argon2id PHC string kept in the master credential record.

use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use lockbox_config::VaultConfig;
use lockbox_core::LockboxError;
use ring::digest::{digest, SHA256};
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

/// Derive the 32-byte key-encryption key from a stored master password hash.
pub fn derive(master_hash: &str) -> Zeroizing<[u8; 32]> {
    let hashed = digest(&SHA256, master_hash.as_bytes());
    let mut key = Zeroizing::new([0u8; 32]);
    key.copy_from_slice(hashed.as_ref());
    key
}

/// Hash a passphrase with Argon2id and a fresh random salt.
///
/// The returned PHC string embeds algorithm, version, cost parameters, and
/// salt, so verification does not depend on the current [`VaultConfig`].
pub fn hash_passphrase(
    passphrase: &SecretString,
    config: &VaultConfig,
) -> Result<String, LockboxError> {
    let params = Params::new(
        config.kdf_memory_cost,
        config.kdf_iterations,
        config.kdf_parallelism,
        None,
    )
    .map_err(|e| LockboxError::Crypto(format!("invalid Argon2id parameters: {e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let salt_bytes = generate_salt()?;
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| LockboxError::Crypto(format!("failed to encode salt: {e}")))?;

    let hash = argon2
        .hash_password(passphrase.expose_secret().as_bytes(), &salt)
        .map_err(|e| LockboxError::Crypto(format!("Argon2id hashing failed: {e}")))?;

    Ok(hash.to_string())
}

/// Check a candidate passphrase against a stored PHC string.
///
/// Returns `Ok(false)` on mismatch; the tag comparison is constant-time.
/// A stored string that does not parse is a corrupt record.
pub fn verify_passphrase(candidate: &SecretString, phc: &str) -> Result<bool, LockboxError> {
    let parsed = PasswordHash::new(phc)
        .map_err(|e| LockboxError::CorruptRecord(format!("unreadable master password hash: {e}")))?;

    match Argon2::default().verify_password(candidate.expose_secret().as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(LockboxError::CorruptRecord(format!(
            "master password hash cannot be verified: {e}"
        ))),
    }
}

/// Generate a random 16-byte salt.
pub fn generate_salt() -> Result<[u8; 16], LockboxError> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; 16];
    rng.fill(&mut salt)
        .map_err(|_| LockboxError::Crypto("failed to generate random salt".to_string()))?;
    Ok(salt)
}
