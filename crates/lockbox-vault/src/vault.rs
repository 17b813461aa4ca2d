// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vault facade tying the credential, lock state, and entry store to one
//! database handle.

use lockbox_config::VaultConfig;
use lockbox_core::{IdentifierKind, LockState, LockboxError, SensitiveEntry};
use lockbox_storage::Database;
use secrecy::SecretString;

use crate::{credential, entries, lock_state};

/// A credential vault over an injected [`Database`].
///
/// Holds no key material between calls. Debug output never includes secrets.
pub struct Vault {
    db: Database,
    config: VaultConfig,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("db", &self.db)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Vault {
    /// Wrap a database, creating the locked state row if needed.
    pub async fn open(db: Database, config: VaultConfig) -> Result<Self, LockboxError> {
        lock_state::initialize(&db).await?;
        Ok(Self { db, config })
    }

    /// The underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Set the master password, or rotate it when `old` is given.
    pub async fn set_master_password(
        &self,
        new: &SecretString,
        old: Option<&SecretString>,
    ) -> Result<(), LockboxError> {
        credential::set(&self.db, &self.config, new, old).await
    }

    /// Check a candidate against the stored master password.
    ///
    /// Fails with `NoMasterPasswordSet` before the first `set_master_password`.
    pub async fn verify_master_password(&self, candidate: &SecretString) -> Result<bool, LockboxError> {
        credential::verify(&self.db, candidate).await
    }

    /// Whether a master password has been set.
    pub async fn is_master_password_set(&self) -> Result<bool, LockboxError> {
        credential::is_set(&self.db).await
    }

    /// Current lock state. Readable while locked.
    pub async fn state(&self) -> Result<LockState, LockboxError> {
        lock_state::get(&self.db).await
    }

    /// Lock the vault. Locking a locked vault is a no-op.
    pub async fn lock(&self) -> Result<(), LockboxError> {
        lock_state::lock(&self.db).await
    }

    /// Unlock the vault with the master password.
    ///
    /// The check and the state write are atomic with respect to rotation, so
    /// a password replaced concurrently never unlocks the vault.
    pub async fn unlock(&self, candidate: &SecretString) -> Result<(), LockboxError> {
        lock_state::unlock(&self.db, candidate).await
    }

    /// Encrypt and store a new entry. Requires the vault to be unlocked.
    ///
    /// Fails with `DuplicateEntry` when `(service, identifier)` already exists.
    pub async fn add_entry(
        &self,
        service: &str,
        identifier: &str,
        kind: IdentifierKind,
        value: &str,
    ) -> Result<(), LockboxError> {
        entries::add(&self.db, service, identifier, kind, value).await
    }

    /// Fetch and decrypt one entry. Requires the vault to be unlocked.
    pub async fn get_entry(
        &self,
        service: &str,
        identifier: &str,
    ) -> Result<SensitiveEntry, LockboxError> {
        entries::get(&self.db, service, identifier).await
    }

    /// All entries ordered by service then identifier, optionally filtered by
    /// kind. Requires the vault to be unlocked.
    pub async fn list_entries(
        &self,
        kind_filter: Option<IdentifierKind>,
    ) -> Result<Vec<SensitiveEntry>, LockboxError> {
        entries::list(&self.db, kind_filter).await
    }

    /// Replace an entry's value, identifier, or both. `None` keeps the
    /// current field. Requires the vault to be unlocked.
    pub async fn update_entry(
        &self,
        service: &str,
        identifier: &str,
        new_value: Option<&str>,
        new_identifier: Option<&str>,
    ) -> Result<(), LockboxError> {
        entries::update(&self.db, service, identifier, new_value, new_identifier).await
    }

    /// Remove an entry. Requires the vault to be unlocked.
    pub async fn delete_entry(&self, service: &str, identifier: &str) -> Result<(), LockboxError> {
        entries::delete(&self.db, service, identifier).await
    }

    /// Number of stored entries, readable while locked.
    pub async fn entry_count(&self) -> Result<usize, LockboxError> {
        entries::count(&self.db).await
    }
}
