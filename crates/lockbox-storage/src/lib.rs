// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Lockbox credential store.
//!
//! Provides WAL-mode SQLite storage with embedded migrations and a
//! single-writer concurrency model via `tokio-rusqlite`. The migrations create
//! the three record types the vault needs: the master credential singleton,
//! the lock state singleton, and the sensitive entry table.

pub mod database;
pub mod migrations;

pub use database::{map_tr_err, Database};
