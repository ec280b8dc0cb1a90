// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL files under `migrations/` are compiled into the binary and applied on
//! every [`Database::open`](crate::Database::open).

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
///
/// Refinery records applied versions in `refinery_schema_history`. The
/// error is flattened to a string so it can cross the connection thread.
pub(crate) fn run_migrations(conn: &mut rusqlite::Connection) -> Result<usize, String> {
    embedded::migrations::runner()
        .run(conn)
        .map(|report| report.applied_migrations().len())
        .map_err(|e| e.to_string())
}
