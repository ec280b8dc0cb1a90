// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregate counters over users and messages.

use chrono::NaiveDate;
use giggle_core::{GiggleError, UsageStats};
use rusqlite::params;

use crate::database::{Database, map_tr_err};

/// Totals, plus distinct users with a message dated `today`.
pub async fn usage(db: &Database, today: NaiveDate) -> Result<UsageStats, GiggleError> {
    let day = today.format("%Y-%m-%d").to_string();
    db.connection()
        .call(move |conn| -> Result<UsageStats, rusqlite::Error> {
            conn.query_row(
                "SELECT
                    (SELECT COUNT(*) FROM users),
                    (SELECT COUNT(DISTINCT user_id) FROM messages
                        WHERE substr(created_at, 1, 10) = ?1),
                    (SELECT COUNT(*) FROM messages),
                    (SELECT COUNT(*) FROM messages WHERE is_funny = 1)",
                params![day],
                |row| {
                    Ok(UsageStats {
                        total_users: row.get(0)?,
                        active_users_today: row.get(1)?,
                        total_messages: row.get(2)?,
                        funny_messages: row.get(3)?,
                    })
                },
            )
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::messages::{insert_inbound, update_outcome};
    use chrono::{TimeZone, Utc};
    use giggle_core::{ConversationKey, InboundRecord, SenderProfile};
    use tempfile::tempdir;

    fn record(user: &str, day: u32) -> InboundRecord {
        InboundRecord {
            conversation: ConversationKey(user.to_string()),
            sender: SenderProfile {
                id: user.to_string(),
                username: None,
                full_name: user.to_string(),
            },
            content: "hi".to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn empty_database_has_zero_counters() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("s.db").to_str().unwrap())
            .await
            .unwrap();
        let stats = usage(&db, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap())
            .await
            .unwrap();
        assert_eq!(stats, UsageStats::default());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn counters_reflect_recorded_messages() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("s.db").to_str().unwrap())
            .await
            .unwrap();

        let a1 = insert_inbound(&db, &record("alice", 1)).await.unwrap();
        insert_inbound(&db, &record("alice", 2)).await.unwrap();
        let b = insert_inbound(&db, &record("bob", 2)).await.unwrap();
        insert_inbound(&db, &record("carol", 1)).await.unwrap();
        update_outcome(&db, a1, "ha", true).await.unwrap();
        update_outcome(&db, b, "ok", false).await.unwrap();

        let stats = usage(&db, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap())
            .await
            .unwrap();
        assert_eq!(stats.total_users, 3);
        assert_eq!(stats.active_users_today, 2);
        assert_eq!(stats.total_messages, 4);
        assert_eq!(stats.funny_messages, 1);
        db.close().await.unwrap();
    }
}
