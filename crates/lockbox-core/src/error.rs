// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Lockbox credential store.

use thiserror::Error;

/// The error type returned by every Lockbox core operation.
///
/// The core never prints or retries; callers decide how each kind is reported.
#[derive(Debug, Error)]
pub enum LockboxError {
    /// No master password has been configured yet.
    #[error("no master password set -- run `set-master` first")]
    NoMasterPasswordSet,

    /// A master password exists and no old password was supplied to replace it.
    #[error("master password already set -- the old master password is required to change it")]
    MasterPasswordAlreadySet,

    /// The old master password supplied for rotation did not verify.
    #[error("invalid old master password")]
    InvalidOldPassword,

    /// The master password supplied to unlock did not verify.
    #[error("invalid master password")]
    InvalidMasterPassword,

    /// The vault is locked; entry access is refused.
    #[error("vault is locked -- run `unlock` first")]
    VaultLocked,

    /// An identifier kind outside the recognized vocabulary.
    #[error("invalid identifier type `{0}` (expected username, email, api_key or secret_key)")]
    InvalidIdentifierKind(String),

    /// An entry with the same normalized service and identifier already exists.
    #[error("an entry for service `{service}` and identifier `{identifier}` already exists")]
    DuplicateEntry { service: String, identifier: String },

    /// No entry matches the normalized service and identifier.
    #[error("no entry found for service `{service}` and identifier `{identifier}`")]
    EntryNotFound { service: String, identifier: String },

    /// Ciphertext blob is not hex, is truncated, or decrypts to non-UTF-8.
    #[error("malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    /// Authentication tag did not verify (wrong key or tampered data).
    #[error("decryption failed -- wrong key or corrupted data")]
    AuthenticationFailed,

    /// Storage backend errors (database connection, query failure, migrations).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A persisted record exists but cannot be interpreted.
    #[error("corrupt vault record: {0}")]
    CorruptRecord(String),

    /// Empty passphrases are never accepted as a master password.
    #[error("empty master password not allowed")]
    EmptyPassphrase,

    /// Random number generation or key setup failed.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Configuration errors (invalid TOML, failed validation).
    #[error("configuration error: {0}")]
    Config(String),

    /// Import/export file format is neither JSON nor CSV.
    #[error("unsupported file format `{0}` (expected json or csv)")]
    UnsupportedFormat(String),

    /// Parse or I/O failure while importing or exporting.
    #[error("transfer error: {0}")]
    Transfer(String),

    /// Import halted at the given 1-based record.
    #[error("import failed at record {record}: {source}")]
    ImportFailed {
        record: usize,
        source: Box<LockboxError>,
    },

    /// Generated password length must be positive.
    #[error("password length must be a positive integer")]
    InvalidLength,
}
