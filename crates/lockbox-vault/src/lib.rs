// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential protection for the Lockbox credential store.
//!
//! A single master password guards a vault of encrypted entries:
//! - The master password is stored only as a salted Argon2id hash.
//! - A random data key encrypts every entry value with AES-256-GCM.
//! - The data key is wrapped under a key derived from the stored hash, so
//!   rotating the master password re-wraps one key and leaves entries intact.
//! - A persisted lock flag gates every entry operation.

pub mod cipher;
pub mod credential;
pub mod entries;
pub mod generate;
pub mod kdf;
pub mod lock_state;
pub mod transfer;
pub mod vault;

pub use generate::{generate_password, DEFAULT_PASSWORD_LENGTH};
pub use transfer::{export_to_writer, import_from_reader, with_extension, TransferFormat};
pub use vault::Vault;
