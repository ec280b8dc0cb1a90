// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User upserts.

use giggle_core::SenderProfile;
use rusqlite::{Connection, params};

/// Insert the sender or refresh their display fields; returns the row id.
///
/// Runs on the connection thread so it can share a transaction with the
/// message insert.
pub(crate) fn upsert(
    conn: &Connection,
    sender: &SenderProfile,
    created_at: &str,
) -> Result<i64, rusqlite::Error> {
    conn.query_row(
        "INSERT INTO users (platform_id, username, full_name, created_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(platform_id) DO UPDATE SET
             username = excluded.username,
             full_name = excluded.full_name
         RETURNING id",
        params![sender.id, sender.username, sender.full_name, created_at],
        |row| row.get(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use tempfile::tempdir;

    fn sender(username: Option<&str>, full_name: &str) -> SenderProfile {
        SenderProfile {
            id: "7".to_string(),
            username: username.map(str::to_string),
            full_name: full_name.to_string(),
        }
    }

    #[tokio::test]
    async fn upsert_keeps_one_row_and_refreshes_names() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("u.db").to_str().unwrap())
            .await
            .unwrap();

        let (first, second, row) = db
            .connection()
            .call(|conn| -> Result<_, rusqlite::Error> {
                let first = upsert(conn, &sender(Some("ann"), "Ann"), "2026-01-01T00:00:00.000Z")?;
                let second = upsert(conn, &sender(None, "Ann Lee"), "2026-01-02T00:00:00.000Z")?;
                let row: (Option<String>, String, String, i64) = conn.query_row(
                    "SELECT username, full_name, created_at, (SELECT COUNT(*) FROM users) FROM users",
                    [],
                    |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
                )?;
                Ok((first, second, row))
            })
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(row.0, None);
        assert_eq!(row.1, "Ann Lee");
        assert_eq!(row.2, "2026-01-01T00:00:00.000Z");
        assert_eq!(row.3, 1);
        db.close().await.unwrap();
    }
}
