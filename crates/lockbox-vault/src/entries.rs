// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encrypted entry storage.
//!
//! Every operation checks the lock state first, then unwraps the data key
//! from the current master credential. Services and identifiers are stored
//! case-folded; values are stored only as cipher blobs.

use std::str::FromStr;

use lockbox_core::{normalize, IdentifierKind, LockboxError, SensitiveEntry};
use lockbox_storage::{map_tr_err, Database};
use rusqlite::{params, OptionalExtension};
use secrecy::SecretString;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::{cipher, credential, lock_state};

/// A row as stored, value still encrypted.
struct StoredEntry {
    service: String,
    identifier: String,
    identifier_kind: String,
    encrypted_value: String,
}

impl StoredEntry {
    fn from_row(row: &rusqlite::Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            service: row.get(0)?,
            identifier: row.get(1)?,
            identifier_kind: row.get(2)?,
            encrypted_value: row.get(3)?,
        })
    }

    fn decrypt(self, key: &[u8; 32]) -> Result<SensitiveEntry, LockboxError> {
        let identifier_kind = IdentifierKind::from_str(&self.identifier_kind).map_err(|_| {
            LockboxError::CorruptRecord(format!(
                "entry {}/{} has unknown identifier type `{}`",
                self.service, self.identifier, self.identifier_kind
            ))
        })?;
        let value = cipher::decrypt(&self.encrypted_value, key)?;
        Ok(SensitiveEntry {
            service: self.service,
            identifier: self.identifier,
            identifier_kind,
            value: SecretString::from(value),
        })
    }
}

enum UpdateOutcome {
    Updated,
    NotFound,
    Duplicate,
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn now() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

/// Gate an entry operation: locked first, then credential presence.
async fn access_key(db: &Database) -> Result<Zeroizing<[u8; 32]>, LockboxError> {
    if lock_state::get(db).await?.is_locked() {
        return Err(LockboxError::VaultLocked);
    }
    credential::data_key(db).await
}

/// Store a new entry.
pub async fn add(
    db: &Database,
    service: &str,
    identifier: &str,
    kind: IdentifierKind,
    value: &str,
) -> Result<(), LockboxError> {
    let key = access_key(db).await?;

    let service_norm = normalize(service);
    let identifier_norm = normalize(identifier);
    let encrypted = cipher::encrypt(value, &key)?;
    let timestamp = now();

    let (svc, ident) = (service_norm.clone(), identifier_norm.clone());
    let inserted = db
        .connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let result = conn.execute(
                "INSERT INTO sensitive_entries
                    (service, identifier, identifier_kind, encrypted_value, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![svc, ident, kind.as_str(), encrypted, timestamp],
            );
            match result {
                Ok(_) => Ok(true),
                Err(e) if is_unique_violation(&e) => Ok(false),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?;

    if !inserted {
        return Err(LockboxError::DuplicateEntry {
            service: service_norm,
            identifier: identifier_norm,
        });
    }
    info!(service = %service_norm, kind = %kind, "entry added");
    Ok(())
}

/// Fetch and decrypt one entry.
pub async fn get(
    db: &Database,
    service: &str,
    identifier: &str,
) -> Result<SensitiveEntry, LockboxError> {
    let key = access_key(db).await?;

    let (svc, ident) = (normalize(service), normalize(identifier));
    let stored = db
        .connection()
        .call(move |conn| -> Result<Option<StoredEntry>, rusqlite::Error> {
            conn.query_row(
                "SELECT service, identifier, identifier_kind, encrypted_value
                 FROM sensitive_entries WHERE service = ?1 AND identifier = ?2",
                params![svc, ident],
                StoredEntry::from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;

    let stored = stored.ok_or_else(|| LockboxError::EntryNotFound {
        service: service.to_string(),
        identifier: identifier.to_string(),
    })?;
    debug!(service = %stored.service, "entry read");
    stored.decrypt(&key)
}

/// Decrypt all entries, optionally of one kind, ordered by service then identifier.
pub async fn list(
    db: &Database,
    kind_filter: Option<IdentifierKind>,
) -> Result<Vec<SensitiveEntry>, LockboxError> {
    let key = access_key(db).await?;

    let rows = db
        .connection()
        .call(move |conn| -> Result<Vec<StoredEntry>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT service, identifier, identifier_kind, encrypted_value
                 FROM sensitive_entries
                 WHERE ?1 IS NULL OR identifier_kind = ?1
                 ORDER BY service, identifier",
            )?;
            let rows = stmt
                .query_map(params![kind_filter.map(|k| k.as_str())], StoredEntry::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)?;

    debug!(count = rows.len(), "entries listed");
    rows.into_iter().map(|row| row.decrypt(&key)).collect()
}

/// Change an entry's value and/or identifier.
///
/// Empty replacements count as absent. A new identifier is normalized and
/// must not collide with an existing entry of the same service.
pub async fn update(
    db: &Database,
    service: &str,
    identifier: &str,
    new_value: Option<&str>,
    new_identifier: Option<&str>,
) -> Result<(), LockboxError> {
    let key = access_key(db).await?;

    let encrypted = new_value
        .filter(|v| !v.is_empty())
        .map(|v| cipher::encrypt(v, &key))
        .transpose()?;
    let new_identifier = new_identifier.filter(|i| !i.is_empty()).map(normalize);
    let timestamp = now();

    let (svc, ident) = (normalize(service), normalize(identifier));
    let target = new_identifier.clone();
    let outcome = db
        .connection()
        .call(move |conn| -> Result<UpdateOutcome, rusqlite::Error> {
            let updated = conn.execute(
                "UPDATE sensitive_entries SET
                    encrypted_value = COALESCE(?1, encrypted_value),
                    identifier = COALESCE(?2, identifier),
                    updated_at = ?3
                 WHERE service = ?4 AND identifier = ?5",
                params![encrypted, target, timestamp, svc, ident],
            );
            match updated {
                Ok(0) => Ok(UpdateOutcome::NotFound),
                Ok(_) => Ok(UpdateOutcome::Updated),
                Err(e) if is_unique_violation(&e) => Ok(UpdateOutcome::Duplicate),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?;

    match outcome {
        UpdateOutcome::Updated => {
            info!(service = %normalize(service), "entry updated");
            Ok(())
        }
        UpdateOutcome::NotFound => Err(LockboxError::EntryNotFound {
            service: service.to_string(),
            identifier: identifier.to_string(),
        }),
        UpdateOutcome::Duplicate => Err(LockboxError::DuplicateEntry {
            service: normalize(service),
            identifier: new_identifier.unwrap_or_else(|| normalize(identifier)),
        }),
    }
}

/// Permanently remove an entry.
pub async fn delete(db: &Database, service: &str, identifier: &str) -> Result<(), LockboxError> {
    access_key(db).await?;

    let (svc, ident) = (normalize(service), normalize(identifier));
    let removed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "DELETE FROM sensitive_entries WHERE service = ?1 AND identifier = ?2",
                params![svc, ident],
            )
        })
        .await
        .map_err(map_tr_err)?;

    if removed == 0 {
        return Err(LockboxError::EntryNotFound {
            service: service.to_string(),
            identifier: identifier.to_string(),
        });
    }
    info!(service = %normalize(service), "entry deleted");
    Ok(())
}

/// Number of stored rows, regardless of lock state.
pub async fn count(db: &Database) -> Result<usize, LockboxError> {
    let count = db
        .connection()
        .call(|conn| -> Result<i64, rusqlite::Error> {
            conn.query_row("SELECT COUNT(*) FROM sensitive_entries", [], |row| {
                row.get(0)
            })
        })
        .await
        .map_err(map_tr_err)?;
    Ok(usize::try_from(count).unwrap_or_default())
}
