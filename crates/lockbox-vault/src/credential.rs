// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The singleton master credential.
//!
//! The record holds the Argon2id hash of the master password and the vault's
//! random data key, wrapped under `kdf::derive(password_hash)`. Entry values
//! are encrypted with the data key, so rotating the master password only
//! re-wraps one key and never touches stored entries.

use lockbox_config::VaultConfig;
use lockbox_core::LockboxError;
use lockbox_storage::{map_tr_err, Database};
use rusqlite::{params, OptionalExtension, TransactionBehavior};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::{cipher, kdf};

/// The stored credential row.
pub(crate) struct CredentialRecord {
    pub(crate) password_hash: String,
    pub(crate) wrapped_data_key: String,
}

impl std::fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("password_hash", &"[REDACTED]")
            .field("wrapped_data_key", &"[REDACTED]")
            .finish()
    }
}

impl CredentialRecord {
    /// Unwrap the data key under the key derived from this record's hash.
    pub(crate) fn unwrap_data_key(&self) -> Result<Zeroizing<[u8; 32]>, LockboxError> {
        let kek = kdf::derive(&self.password_hash);
        let raw = cipher::open(&kek, &self.wrapped_data_key).map_err(|e| {
            LockboxError::CorruptRecord(format!("data key does not unwrap: {e}"))
        })?;

        let mut key = Zeroizing::new([0u8; 32]);
        if raw.len() != key.len() {
            return Err(LockboxError::CorruptRecord(format!(
                "data key has {} bytes, expected 32",
                raw.len()
            )));
        }
        key.copy_from_slice(&raw);
        Ok(key)
    }
}

enum WriteOutcome {
    Written,
    /// The row changed between verification and write.
    Conflict,
}

/// Load the singleton record, if any.
pub(crate) async fn load(db: &Database) -> Result<Option<CredentialRecord>, LockboxError> {
    db.connection()
        .call(|conn| -> Result<Option<CredentialRecord>, rusqlite::Error> {
            conn.query_row(
                "SELECT password_hash, wrapped_data_key FROM master_credential WHERE id = 1",
                [],
                |row| {
                    Ok(CredentialRecord {
                        password_hash: row.get(0)?,
                        wrapped_data_key: row.get(1)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Load the record and unwrap the data key, or fail with `NoMasterPasswordSet`.
pub(crate) async fn data_key(db: &Database) -> Result<Zeroizing<[u8; 32]>, LockboxError> {
    load(db)
        .await?
        .ok_or(LockboxError::NoMasterPasswordSet)?
        .unwrap_data_key()
}

/// Set or rotate the master password.
///
/// First-time set generates the vault's data key. Rotation requires the
/// current password and re-wraps the same data key under the new hash.
///
/// Runs under the handle's transition guard; the final compare-and-swap is a
/// `BEGIN IMMEDIATE` transaction so writers in other processes are excluded
/// as well.
pub async fn set(
    db: &Database,
    config: &VaultConfig,
    new_passphrase: &SecretString,
    old_passphrase: Option<&SecretString>,
) -> Result<(), LockboxError> {
    if new_passphrase.expose_secret().is_empty() {
        return Err(LockboxError::EmptyPassphrase);
    }

    let _guard = db.exclusive().await;
    let existing = load(db).await?;
    let data_key = match (&existing, old_passphrase) {
        (None, _) => cipher::generate_random_key()?,
        (Some(_), None) => return Err(LockboxError::MasterPasswordAlreadySet),
        (Some(record), Some(old)) => {
            if !kdf::verify_passphrase(old, &record.password_hash)? {
                return Err(LockboxError::InvalidOldPassword);
            }
            record.unwrap_data_key()?
        }
    };

    let password_hash = kdf::hash_passphrase(new_passphrase, config)?;
    let wrapped_data_key = cipher::seal(&kdf::derive(&password_hash), &data_key[..])?;
    let created_at = chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string();

    let rotating = existing.is_some();
    let expected_hash = existing.map(|record| record.password_hash);

    let outcome = db
        .connection()
        .call(move |conn| -> Result<WriteOutcome, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let current: Option<String> = tx
                .query_row(
                    "SELECT password_hash FROM master_credential WHERE id = 1",
                    [],
                    |row| row.get(0),
                )
                .optional()?;
            if current != expected_hash {
                return Ok(WriteOutcome::Conflict);
            }

            tx.execute(
                "INSERT INTO master_credential (id, password_hash, wrapped_data_key, created_at)
                 VALUES (1, ?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET
                    password_hash = excluded.password_hash,
                    wrapped_data_key = excluded.wrapped_data_key,
                    created_at = excluded.created_at",
                params![password_hash, wrapped_data_key, created_at],
            )?;
            tx.commit()?;
            Ok(WriteOutcome::Written)
        })
        .await
        .map_err(map_tr_err)?;

    match outcome {
        WriteOutcome::Written if rotating => {
            info!("master password rotated");
            Ok(())
        }
        WriteOutcome::Written => {
            info!("master password set");
            Ok(())
        }
        WriteOutcome::Conflict if rotating => {
            debug!("master credential changed during rotation");
            Err(LockboxError::InvalidOldPassword)
        }
        WriteOutcome::Conflict => Err(LockboxError::MasterPasswordAlreadySet),
    }
}

/// Check a candidate against the stored master password.
pub async fn verify(db: &Database, candidate: &SecretString) -> Result<bool, LockboxError> {
    let record = load(db).await?.ok_or(LockboxError::NoMasterPasswordSet)?;
    kdf::verify_passphrase(candidate, &record.password_hash)
}

/// Whether a master password has been set.
pub async fn is_set(db: &Database) -> Result<bool, LockboxError> {
    db.connection()
        .call(|conn| -> Result<bool, rusqlite::Error> {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM master_credential", [], |row| {
                    row.get(0)
                })?;
            Ok(count > 0)
        })
        .await
        .map_err(map_tr_err)
}
