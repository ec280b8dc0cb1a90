// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite audit trail for the Giggle chat relay.
//!
//! WAL-mode SQLite with embedded migrations and a single-writer model via
//! `tokio-rusqlite`. Stores users and message records, and answers the
//! listing and statistics queries used by the CLI.

pub mod adapter;
pub mod database;
mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
