// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM encryption of stored values.
//!
//! Blob format: `hex(nonce || ciphertext || tag)` with a 96-bit nonce drawn
//! from the system CSPRNG on every call. Nonce reuse under one key would be
//! catastrophic for GCM, so nonces are never derived or counted.

use lockbox_core::LockboxError;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

/// Length of the authentication tag appended by GCM.
pub const TAG_LEN: usize = 16;

/// Smallest decodable blob: a nonce plus the tag of an empty plaintext.
pub const MIN_BLOB_LEN: usize = NONCE_LEN + TAG_LEN;

fn aead_key(key: &[u8; 32]) -> Result<LessSafeKey, LockboxError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| LockboxError::Crypto("failed to create AES-256-GCM key".to_string()))?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypt raw bytes and return the hex blob.
pub fn seal(key: &[u8; 32], plaintext: &[u8]) -> Result<String, LockboxError> {
    let key = aead_key(key)?;

    let rng = SystemRandom::new();
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill(&mut nonce_bytes)
        .map_err(|_| LockboxError::Crypto("failed to generate random nonce".to_string()))?;
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    // Plaintext buffer is extended with the tag in place.
    let mut in_out = Zeroizing::new(plaintext.to_vec());
    key.seal_in_place_append_tag(nonce, Aad::empty(), &mut *in_out)
        .map_err(|_| LockboxError::Crypto("AES-256-GCM encryption failed".to_string()))?;

    let mut blob = Vec::with_capacity(NONCE_LEN + in_out.len());
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&in_out);
    Ok(hex::encode(blob))
}

/// Decrypt a hex blob produced by [`seal`].
///
/// Fails with `MalformedCiphertext` for non-hex or truncated input and with
/// `AuthenticationFailed` when the tag does not verify.
pub fn open(key: &[u8; 32], blob: &str) -> Result<Zeroizing<Vec<u8>>, LockboxError> {
    let data = hex::decode(blob.trim())
        .map_err(|e| LockboxError::MalformedCiphertext(format!("not valid hex: {e}")))?;
    if data.len() < MIN_BLOB_LEN {
        return Err(LockboxError::MalformedCiphertext(format!(
            "ciphertext too short ({} bytes, need at least {MIN_BLOB_LEN})",
            data.len()
        )));
    }

    let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
    let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
        .map_err(|_| LockboxError::MalformedCiphertext("bad nonce length".to_string()))?;

    let key = aead_key(key)?;
    let mut in_out = Zeroizing::new(ciphertext.to_vec());
    let plaintext = key
        .open_in_place(nonce, Aad::empty(), in_out.as_mut_slice())
        .map_err(|_| LockboxError::AuthenticationFailed)?;

    Ok(Zeroizing::new(plaintext.to_vec()))
}

/// Encrypt a string value.
pub fn encrypt(plaintext: &str, key: &[u8; 32]) -> Result<String, LockboxError> {
    seal(key, plaintext.as_bytes())
}

/// Decrypt a string value.
pub fn decrypt(blob: &str, key: &[u8; 32]) -> Result<String, LockboxError> {
    let bytes = open(key, blob)?;
    String::from_utf8(bytes.to_vec())
        .map_err(|_| LockboxError::MalformedCiphertext("plaintext is not valid UTF-8".to_string()))
}

/// Generate a random 32-byte key suitable for AES-256-GCM.
pub fn generate_random_key() -> Result<Zeroizing<[u8; 32]>, LockboxError> {
    let rng = SystemRandom::new();
    let mut key = Zeroizing::new([0u8; 32]);
    rng.fill(&mut key[..])
        .map_err(|_| LockboxError::Crypto("failed to generate random key".to_string()))?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key() -> Zeroizing<[u8; 32]> {
        generate_random_key().unwrap()
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let key = key();
        let blob = encrypt("s3cr3t", &key).unwrap();
        assert_eq!(decrypt(&blob, &key).unwrap(), "s3cr3t");
    }

    #[test]
    fn empty_nul_and_unicode_survive() {
        let key = key();
        for input in ["", "a\0b\0", "pässwörd 🔐 密码", "\u{feff}\u{200d}"] {
            let blob = encrypt(input, &key).unwrap();
            assert_eq!(decrypt(&blob, &key).unwrap(), input);
        }
    }

    #[test]
    fn same_input_encrypts_differently() {
        let key = key();
        let a = encrypt("same input twice", &key).unwrap();
        let b = encrypt("same input twice", &key).unwrap();

        assert_ne!(a, b);
        assert_ne!(a[..NONCE_LEN * 2], b[..NONCE_LEN * 2], "nonces must differ");
        assert_eq!(decrypt(&a, &key).unwrap(), "same input twice");
        assert_eq!(decrypt(&b, &key).unwrap(), "same input twice");
    }

    #[test]
    fn blob_is_hex_nonce_ciphertext_tag() {
        let key = key();
        let blob = encrypt("hello", &key).unwrap();
        assert!(blob.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(blob.len(), 2 * (NONCE_LEN + "hello".len() + TAG_LEN));
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let blob = encrypt("secret data", &key()).unwrap();
        let err = decrypt(&blob, &key()).unwrap_err();
        assert!(matches!(err, LockboxError::AuthenticationFailed));
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let key = key();
        let mut raw = hex::decode(encrypt("do not tamper", &key).unwrap()).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;

        let err = decrypt(&hex::encode(raw), &key).unwrap_err();
        assert!(matches!(err, LockboxError::AuthenticationFailed));
    }

    #[test]
    fn non_hex_blob_is_malformed() {
        let err = decrypt("zz-not-hex", &key()).unwrap_err();
        assert!(matches!(err, LockboxError::MalformedCiphertext(_)));
    }

    #[test]
    fn short_blob_is_malformed() {
        let err = decrypt(&"ab".repeat(NONCE_LEN), &key()).unwrap_err();
        assert!(matches!(err, LockboxError::MalformedCiphertext(_)));
        let err = decrypt("", &key()).unwrap_err();
        assert!(matches!(err, LockboxError::MalformedCiphertext(_)));
    }

    #[test]
    fn seal_open_bytes() {
        let key = key();
        let payload = [0xffu8, 0x00, 0x80, 0x7f];
        let blob = seal(&key, &payload).unwrap();
        assert_eq!(open(&key, &blob).unwrap().as_slice(), &payload);
    }

    #[test]
    fn non_utf8_plaintext_is_malformed() {
        let key = key();
        let blob = seal(&key, &[0xc3, 0x28]).unwrap();
        let err = decrypt(&blob, &key).unwrap_err();
        assert!(matches!(err, LockboxError::MalformedCiphertext(_)));
    }

    proptest! {
        #[test]
        fn any_string_roundtrips(input in any::<String>(), raw_key in any::<[u8; 32]>()) {
            let blob = encrypt(&input, &raw_key).unwrap();
            prop_assert_eq!(decrypt(&blob, &raw_key).unwrap(), input);
        }
    }
}
