// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted lock state.
//!
//! A single `vault_state` row records whether entry operations are allowed.
//! The row is created locked; a missing row also reads as locked. Both
//! transitions run under the database handle's transition guard.

use lockbox_core::{LockState, LockboxError};
use lockbox_storage::{map_tr_err, Database};
use rusqlite::{OptionalExtension, TransactionBehavior};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::kdf;

/// Create the locked singleton row if it does not exist yet.
pub async fn initialize(db: &Database) -> Result<(), LockboxError> {
    db.connection()
        .call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT OR IGNORE INTO vault_state (id, locked) VALUES (1, 1)",
                [],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Read the current lock state.
pub async fn get(db: &Database) -> Result<LockState, LockboxError> {
    let locked = db
        .connection()
        .call(|conn| -> Result<Option<bool>, rusqlite::Error> {
            conn.query_row("SELECT locked FROM vault_state WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()
        })
        .await
        .map_err(map_tr_err)?;

    Ok(match locked {
        Some(false) => LockState::Unlocked,
        Some(true) | None => LockState::Locked,
    })
}

/// Lock the vault. Idempotent.
pub async fn lock(db: &Database) -> Result<(), LockboxError> {
    let _guard = db.exclusive().await;
    db.connection()
        .call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO vault_state (id, locked) VALUES (1, 1)
                 ON CONFLICT(id) DO UPDATE SET locked = excluded.locked",
                [],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
    info!("vault locked");
    Ok(())
}

/// Unlock the vault after verifying the master password.
///
/// The hash is read, checked, and the state written inside one
/// `BEGIN IMMEDIATE` transaction while the handle's transition guard is
/// held, so neither a rotation nor a `lock` can land between the check and
/// the write. The state is left unchanged when verification fails.
/// Unlocking an already unlocked vault still requires the correct password.
pub async fn unlock(db: &Database, candidate: &SecretString) -> Result<(), LockboxError> {
    let _guard = db.exclusive().await;
    let candidate = SecretString::from(candidate.expose_secret().to_owned());

    db.connection()
        .call(move |conn| -> Result<Result<(), LockboxError>, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let hash: Option<String> = tx
                .query_row(
                    "SELECT password_hash FROM master_credential WHERE id = 1",
                    [],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(hash) = hash else {
                return Ok(Err(LockboxError::NoMasterPasswordSet));
            };

            match kdf::verify_passphrase(&candidate, &hash) {
                Ok(true) => {}
                Ok(false) => return Ok(Err(LockboxError::InvalidMasterPassword)),
                Err(e) => return Ok(Err(e)),
            }

            tx.execute(
                "INSERT INTO vault_state (id, locked) VALUES (1, 0)
                 ON CONFLICT(id) DO UPDATE SET locked = excluded.locked",
                [],
            )?;
            tx.commit()?;
            Ok(Ok(()))
        })
        .await
        .map_err(map_tr_err)?
        .inspect_err(|e| {
            if matches!(e, LockboxError::InvalidMasterPassword) {
                debug!("unlock rejected");
            }
        })?;

    info!("vault unlocked");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential;
    use lockbox_config::VaultConfig;

    fn test_config() -> VaultConfig {
        VaultConfig {
            kdf_memory_cost: 8192,
            kdf_iterations: 1,
            kdf_parallelism: 1,
        }
    }

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[tokio::test]
    async fn missing_row_reads_locked() {
        let db = Database::open_in_memory().await.unwrap();
        assert_eq!(get(&db).await.unwrap(), LockState::Locked);
    }

    #[tokio::test]
    async fn initialize_is_idempotent_and_preserves_state() {
        let db = Database::open_in_memory().await.unwrap();
        initialize(&db).await.unwrap();
        credential::set(&db, &test_config(), &secret("pw"), None)
            .await
            .unwrap();
        unlock(&db, &secret("pw")).await.unwrap();

        initialize(&db).await.unwrap();
        assert_eq!(get(&db).await.unwrap(), LockState::Unlocked);
    }

    #[tokio::test]
    async fn unlock_requires_credential() {
        let db = Database::open_in_memory().await.unwrap();
        initialize(&db).await.unwrap();

        let err = unlock(&db, &secret("pw")).await.unwrap_err();
        assert!(matches!(err, LockboxError::NoMasterPasswordSet));
        assert_eq!(get(&db).await.unwrap(), LockState::Locked);
    }

    #[tokio::test]
    async fn unlock_and_lock_cycle() {
        let db = Database::open_in_memory().await.unwrap();
        initialize(&db).await.unwrap();
        credential::set(&db, &test_config(), &secret("pw"), None)
            .await
            .unwrap();

        unlock(&db, &secret("pw")).await.unwrap();
        assert_eq!(get(&db).await.unwrap(), LockState::Unlocked);

        // Already unlocked: still verifies and succeeds.
        unlock(&db, &secret("pw")).await.unwrap();

        lock(&db).await.unwrap();
        lock(&db).await.unwrap();
        assert_eq!(get(&db).await.unwrap(), LockState::Locked);
    }

    #[tokio::test]
    async fn wrong_password_leaves_state_unchanged() {
        let db = Database::open_in_memory().await.unwrap();
        initialize(&db).await.unwrap();
        credential::set(&db, &test_config(), &secret("pw"), None)
            .await
            .unwrap();

        let err = unlock(&db, &secret("nope")).await.unwrap_err();
        assert!(matches!(err, LockboxError::InvalidMasterPassword));
        assert_eq!(get(&db).await.unwrap(), LockState::Locked);

        unlock(&db, &secret("pw")).await.unwrap();
        let err = unlock(&db, &secret("nope")).await.unwrap_err();
        assert!(matches!(err, LockboxError::InvalidMasterPassword));
        assert_eq!(get(&db).await.unwrap(), LockState::Unlocked);
    }

    #[tokio::test]
    async fn unlock_waits_for_a_held_transition_guard() {
        let db = Database::open_in_memory().await.unwrap();
        initialize(&db).await.unwrap();
        credential::set(&db, &test_config(), &secret("pw"), None)
            .await
            .unwrap();

        let other = db.clone();
        let guard = db.exclusive().await;
        let pending = tokio::time::timeout(
            std::time::Duration::from_millis(100),
            unlock(&other, &secret("pw")),
        )
        .await;
        assert!(pending.is_err());
        assert_eq!(get(&db).await.unwrap(), LockState::Locked);

        drop(guard);
        unlock(&other, &secret("pw")).await.unwrap();
        assert_eq!(get(&db).await.unwrap(), LockState::Unlocked);
    }
}
