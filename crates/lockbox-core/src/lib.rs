// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Lockbox credential store.
//!
//! Holds the error type every operation returns and the small set of domain
//! types shared by the storage, vault, and CLI crates.

pub mod error;
pub mod types;

pub use error::LockboxError;
pub use types::{normalize, IdentifierKind, LockState, SensitiveEntry};

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use secrecy::SecretString;
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn identifier_kind_tokens_round_trip() {
        for kind in IdentifierKind::iter() {
            let token = kind.to_string();
            assert_eq!(IdentifierKind::from_str(&token).unwrap(), kind);
            assert_eq!(kind.as_str(), token);
        }
        assert_eq!(IdentifierKind::ApiKey.as_str(), "api_key");
        assert_eq!(IdentifierKind::SecretKey.as_str(), "secret_key");
    }

    #[test]
    fn identifier_kind_rejects_unknown_tokens() {
        let err = IdentifierKind::from_str("password").unwrap_err();
        assert!(matches!(err, LockboxError::InvalidIdentifierKind(ref t) if t == "password"));

        // Tokens are exact; no case folding at the boundary.
        assert!(IdentifierKind::from_str("Email").is_err());
        assert!(IdentifierKind::from_str("").is_err());
    }

    #[test]
    fn identifier_kind_serializes_as_snake_case() {
        let json = serde_json::to_string(&IdentifierKind::ApiKey).unwrap();
        assert_eq!(json, "\"api_key\"");
        let parsed: IdentifierKind = serde_json::from_str("\"secret_key\"").unwrap();
        assert_eq!(parsed, IdentifierKind::SecretKey);
    }

    #[test]
    fn lock_state_display() {
        assert_eq!(LockState::Locked.to_string(), "locked");
        assert_eq!(LockState::Unlocked.to_string(), "unlocked");
        assert!(LockState::Locked.is_locked());
        assert!(!LockState::Unlocked.is_locked());
    }

    #[test]
    fn sensitive_entry_debug_redacts_value() {
        let entry = SensitiveEntry {
            service: "example.com".into(),
            identifier: "alice".into(),
            identifier_kind: IdentifierKind::Username,
            value: SecretString::from("hunter2".to_string()),
        };
        let debug = format!("{entry:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
        assert_eq!(entry.value(), "hunter2");
    }

    #[test]
    fn normalize_lowercases_unicode() {
        assert_eq!(normalize("Alice@Example.COM"), "alice@example.com");
        assert_eq!(normalize("ÉCOLE"), "école");
    }

    #[test]
    fn error_messages_are_single_line() {
        let errors = [
            LockboxError::NoMasterPasswordSet,
            LockboxError::VaultLocked,
            LockboxError::EntryNotFound {
                service: "a".into(),
                identifier: "b".into(),
            },
            LockboxError::ImportFailed {
                record: 3,
                source: Box::new(LockboxError::DuplicateEntry {
                    service: "a".into(),
                    identifier: "b".into(),
                }),
            },
        ];
        for err in errors {
            assert!(!err.to_string().contains('\n'));
        }
    }
}
