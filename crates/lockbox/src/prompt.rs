// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master password acquisition via flag, `LOCKBOX_MASTER_PASSWORD`, or TTY prompt.
//!
//! Entry values follow the same rule minus the environment: a flag wins, and
//! an interactive terminal is prompted with echo disabled.

use std::io::{BufRead, IsTerminal};

use lockbox_core::LockboxError;
use secrecy::SecretString;

/// The environment variable name for providing the master password.
pub const MASTER_PASSWORD_ENV_VAR: &str = "LOCKBOX_MASTER_PASSWORD";

fn from_env() -> Option<SecretString> {
    std::env::var(MASTER_PASSWORD_ENV_VAR)
        .ok()
        .filter(|value| !value.is_empty())
        .map(SecretString::from)
}

fn read_failed(label: &str, e: std::io::Error) -> LockboxError {
    LockboxError::Config(format!("failed to read {}: {e}", label.to_lowercase()))
}

fn read_hidden(label: &str) -> Result<String, LockboxError> {
    eprint!("{label}: ");
    rpassword::read_password().map_err(|e| read_failed(label, e))
}

fn read_visible(label: &str) -> Result<String, LockboxError> {
    eprint!("{label}: ");
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| read_failed(label, e))?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn not_provided() -> LockboxError {
    LockboxError::Config(format!(
        "no master password provided; pass --password, set {MASTER_PASSWORD_ENV_VAR}, or run interactively"
    ))
}

/// Resolve the current master password.
///
/// Priority:
/// 1. An explicit `--password` value
/// 2. `LOCKBOX_MASTER_PASSWORD`
/// 3. Interactive TTY prompt
pub fn current_password(flag: Option<String>, label: &str) -> Result<SecretString, LockboxError> {
    if let Some(value) = flag {
        return Ok(SecretString::from(value));
    }
    if let Some(value) = from_env() {
        return Ok(value);
    }
    if std::io::stdin().is_terminal() {
        return Ok(SecretString::from(read_hidden(label)?));
    }
    Err(not_provided())
}

/// Resolve a new master password, prompting twice when interactive.
///
/// `allow_env` is false during rotation, where the environment variable
/// holds the old password.
pub fn new_password(flag: Option<String>, allow_env: bool) -> Result<SecretString, LockboxError> {
    if let Some(value) = flag {
        return Ok(SecretString::from(value));
    }
    if allow_env && let Some(value) = from_env() {
        return Ok(value);
    }
    if std::io::stdin().is_terminal() {
        let first = read_hidden("New master password")?;
        let second = read_hidden("Confirm master password")?;
        if first != second {
            return Err(LockboxError::Config("master passwords do not match".to_string()));
        }
        return Ok(SecretString::from(first));
    }
    Err(not_provided())
}

/// Resolve an entry value: the flag when given, else a hidden prompt on a
/// TTY. `None` means nothing was supplied and no terminal is attached.
pub fn secret_value(flag: Option<String>, label: &str) -> Result<Option<String>, LockboxError> {
    if flag.is_some() {
        return Ok(flag);
    }
    if std::io::stdin().is_terminal() {
        return read_hidden(label).map(Some);
    }
    Ok(None)
}

/// Ask for the fields of an update when neither flag was given.
///
/// Returns `(new_identifier, new_value)`; empty answers keep the current
/// field. Without a terminal nothing is asked.
pub fn update_fields(
    new_identifier: Option<String>,
    new_value: Option<String>,
) -> Result<(Option<String>, Option<String>), LockboxError> {
    if new_identifier.is_some() || new_value.is_some() || !std::io::stdin().is_terminal() {
        return Ok((new_identifier, new_value));
    }
    let identifier = read_visible("New identifier (leave empty to keep)")?;
    let value = read_hidden("New value (leave empty to keep)")?;
    let non_empty = |answer: String| Some(answer).filter(|a| !a.is_empty());
    Ok((non_empty(identifier), non_empty(value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;

    #[test]
    #[serial]
    fn flag_wins_over_env() {
        // SAFETY: serialized with every other env-mutating test.
        unsafe { std::env::set_var(MASTER_PASSWORD_ENV_VAR, "from-env") };
        let pw = current_password(Some("from-flag".to_string()), "Master password").unwrap();
        assert_eq!(pw.expose_secret(), "from-flag");
        unsafe { std::env::remove_var(MASTER_PASSWORD_ENV_VAR) };
    }

    #[test]
    #[serial]
    fn env_used_when_no_flag() {
        unsafe { std::env::set_var(MASTER_PASSWORD_ENV_VAR, "from-env") };
        let pw = current_password(None, "Master password").unwrap();
        assert_eq!(pw.expose_secret(), "from-env");
        unsafe { std::env::remove_var(MASTER_PASSWORD_ENV_VAR) };
    }

    #[test]
    #[serial]
    fn empty_env_is_ignored() {
        unsafe { std::env::set_var(MASTER_PASSWORD_ENV_VAR, "") };
        assert!(from_env().is_none());
        unsafe { std::env::remove_var(MASTER_PASSWORD_ENV_VAR) };
    }

    #[test]
    #[serial]
    fn rotation_does_not_take_new_password_from_env() {
        unsafe { std::env::set_var(MASTER_PASSWORD_ENV_VAR, "old") };
        if !std::io::stdin().is_terminal() {
            assert!(new_password(None, false).is_err());
        }
        let new = new_password(None, true).unwrap();
        assert_eq!(new.expose_secret(), "old");
        unsafe { std::env::remove_var(MASTER_PASSWORD_ENV_VAR) };
    }

    #[test]
    fn value_flag_is_used_verbatim() {
        let value = secret_value(Some("s3cret".to_string()), "Value").unwrap();
        assert_eq!(value.as_deref(), Some("s3cret"));
    }

    #[test]
    fn value_without_flag_or_tty_is_absent() {
        if !std::io::stdin().is_terminal() {
            assert!(secret_value(None, "Value").unwrap().is_none());
        }
    }

    #[test]
    fn update_flags_skip_prompting() {
        let (identifier, value) = update_fields(Some("bob".to_string()), None).unwrap();
        assert_eq!(identifier.as_deref(), Some("bob"));
        assert!(value.is_none());

        if !std::io::stdin().is_terminal() {
            let (identifier, value) = update_fields(None, None).unwrap();
            assert!(identifier.is_none());
            assert!(value.is_none());
        }
    }
}
