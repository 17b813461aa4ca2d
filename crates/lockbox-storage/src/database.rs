// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and migrations.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread. The [`Database`] is the single writer; clone it to share the handle
//! rather than opening a second connection. Clones also share one transition
//! guard (see [`Database::exclusive`]).

use std::path::Path;
use std::sync::Arc;

use lockbox_config::StorageConfig;
use lockbox_core::LockboxError;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::migrations;

/// Handle to the vault database.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
    transition: Arc<Mutex<()>>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Open the database at `path` with WAL enabled and run migrations.
    pub async fn open(path: &str) -> Result<Self, LockboxError> {
        Self::open_with(path, true).await
    }

    /// Open the database described by a [`StorageConfig`].
    pub async fn open_with_config(config: &StorageConfig) -> Result<Self, LockboxError> {
        Self::open_with(&config.database_path, config.wal_mode).await
    }

    async fn open_with(path: &str, wal_mode: bool) -> Result<Self, LockboxError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| LockboxError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| LockboxError::Storage {
                source: Box::new(e),
            })?;

        let db = Self::from_connection(conn);
        db.prepare(wal_mode).await?;
        debug!(path = %path, wal_mode, "vault database opened");
        Ok(db)
    }

    /// Open a private in-memory database with the schema applied.
    pub async fn open_in_memory() -> Result<Self, LockboxError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| LockboxError::Storage {
                source: Box::new(e),
            })?;

        let db = Self::from_connection(conn);
        db.prepare(false).await?;
        Ok(db)
    }

    async fn prepare(&self, wal_mode: bool) -> Result<(), LockboxError> {
        self.conn
            .call(move |conn| -> Result<Result<(), LockboxError>, rusqlite::Error> {
                if wal_mode {
                    let _mode: String = conn.pragma_update_and_check(
                        None,
                        "journal_mode",
                        "WAL",
                        |row| row.get(0),
                    )?;
                }
                conn.pragma_update(None, "synchronous", "NORMAL")?;
                conn.pragma_update(None, "foreign_keys", "ON")?;
                conn.busy_timeout(std::time::Duration::from_millis(5000))?;
                Ok(migrations::run_migrations(conn))
            })
            .await
            .map_err(map_tr_err)?
    }

    fn from_connection(conn: tokio_rusqlite::Connection) -> Self {
        Self {
            conn,
            transition: Arc::new(Mutex::new(())),
        }
    }

    /// Acquire the guard for a multi-step read-check-write sequence.
    ///
    /// The guard is shared by every clone of this handle, so callers holding
    /// different clones still exclude each other.
    pub async fn exclusive(&self) -> MutexGuard<'_, ()> {
        self.transition.lock().await
    }

    /// Returns the underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL so the database file is self-contained.
    pub async fn close(&self) -> Result<(), LockboxError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Convert tokio-rusqlite errors to LockboxError::Storage.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> LockboxError {
    LockboxError::Storage {
        source: Box::new(e),
    }
}
