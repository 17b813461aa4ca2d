// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Random password generation.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use lockbox_core::LockboxError;
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

/// Length used when a caller does not ask for one.
pub const DEFAULT_PASSWORD_LENGTH: usize = 12;

/// Generate a password of exactly `length` characters from the base64
/// alphabet, drawn from `length` bytes of system randomness.
pub fn generate_password(length: usize) -> Result<String, LockboxError> {
    if length == 0 {
        return Err(LockboxError::InvalidLength);
    }

    let rng = SystemRandom::new();
    let mut bytes = Zeroizing::new(vec![0u8; length]);
    rng.fill(&mut bytes[..])
        .map_err(|_| LockboxError::Crypto("failed to generate random password".to_string()))?;

    let mut encoded = STANDARD_NO_PAD.encode(&bytes[..]);
    encoded.truncate(length);
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_base64_char(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '+' || c == '/'
    }

    #[test]
    fn produces_requested_length() {
        for length in [1, 2, 3, 4, 12, 33, 128] {
            let password = generate_password(length).unwrap();
            assert_eq!(password.chars().count(), length);
            assert!(password.chars().all(is_base64_char), "{password}");
        }
    }

    #[test]
    fn zero_length_is_rejected() {
        assert!(matches!(
            generate_password(0),
            Err(LockboxError::InvalidLength)
        ));
    }

    #[test]
    fn passwords_differ() {
        assert_ne!(
            generate_password(DEFAULT_PASSWORD_LENGTH).unwrap(),
            generate_password(DEFAULT_PASSWORD_LENGTH).unwrap()
        );
    }
}
