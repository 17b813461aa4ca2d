// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the vault, storage, and CLI crates.

use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};

use crate::error::LockboxError;

/// What an entry's identifier represents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IdentifierKind {
    Username,
    Email,
    ApiKey,
    SecretKey,
}

impl IdentifierKind {
    /// The persisted token for this kind.
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

impl FromStr for IdentifierKind {
    type Err = LockboxError;

    /// Parses exactly `username`, `email`, `api_key` or `secret_key`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "username" => Ok(Self::Username),
            "email" => Ok(Self::Email),
            "api_key" => Ok(Self::ApiKey),
            "secret_key" => Ok(Self::SecretKey),
            other => Err(LockboxError::InvalidIdentifierKind(other.to_string())),
        }
    }
}

/// Persisted lock state of the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum LockState {
    Locked,
    Unlocked,
}

impl LockState {
    pub fn is_locked(&self) -> bool {
        matches!(self, LockState::Locked)
    }
}

/// A decrypted entry handed to callers.
///
/// The value is only ever held in plaintext for the scope of one read;
/// `Debug` output redacts it.
pub struct SensitiveEntry {
    pub service: String,
    pub identifier: String,
    pub identifier_kind: IdentifierKind,
    pub value: SecretString,
}

impl SensitiveEntry {
    /// Exposes the decrypted value.
    pub fn value(&self) -> &str {
        self.value.expose_secret()
    }
}

impl std::fmt::Debug for SensitiveEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensitiveEntry")
            .field("service", &self.service)
            .field("identifier", &self.identifier)
            .field("identifier_kind", &self.identifier_kind)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Case-folds a service or identifier for storage and lookup.
pub fn normalize(input: &str) -> String {
    input.to_lowercase()
}
