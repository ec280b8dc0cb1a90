// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message record operations.

use giggle_core::{GiggleError, InboundRecord, MessageRecord, RecordId};
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, map_tr_err};
use crate::queries::{timestamp, users};

const SELECT_RECORD: &str = "SELECT m.id, m.user_id, u.full_name, m.conversation, m.content,
        m.response, m.is_funny, m.created_at
     FROM messages m JOIN users u ON u.id = m.user_id";

fn read_record(row: &Row<'_>) -> Result<MessageRecord, rusqlite::Error> {
    Ok(MessageRecord {
        id: RecordId(row.get(0)?),
        user_id: row.get(1)?,
        user_full_name: row.get(2)?,
        conversation: row.get(3)?,
        content: row.get(4)?,
        response: row.get(5)?,
        is_funny: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Upsert the sender and insert the inbound half of a record.
pub async fn insert_inbound(db: &Database, record: &InboundRecord) -> Result<RecordId, GiggleError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| -> Result<RecordId, rusqlite::Error> {
            let created_at = timestamp(record.created_at);
            let tx = conn.transaction()?;
            let user_id = users::upsert(&tx, &record.sender, &created_at)?;
            tx.execute(
                "INSERT INTO messages (user_id, conversation, content, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![user_id, record.conversation.as_str(), record.content, created_at],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;
            Ok(RecordId(id))
        })
        .await
        .map_err(map_tr_err)
}

/// Set the reply and classification of an existing record.
pub async fn update_outcome(
    db: &Database,
    id: RecordId,
    response: &str,
    is_funny: bool,
) -> Result<(), GiggleError> {
    let response = response.to_string();
    let changed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE messages SET response = ?1, is_funny = ?2 WHERE id = ?3",
                params![response, is_funny, id.0],
            )
        })
        .await
        .map_err(map_tr_err)?;

    if changed == 0 {
        return Err(GiggleError::Storage {
            source: format!("message record {id} not found").into(),
        });
    }
    Ok(())
}

/// Fetch one record with its user's name.
pub async fn get(db: &Database, id: RecordId) -> Result<Option<MessageRecord>, GiggleError> {
    db.connection()
        .call(move |conn| -> Result<Option<MessageRecord>, rusqlite::Error> {
            conn.query_row(
                &format!("{SELECT_RECORD} WHERE m.id = ?1"),
                params![id.0],
                read_record,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Page through records, newest first.
pub async fn list(db: &Database, limit: i64, offset: i64) -> Result<Vec<MessageRecord>, GiggleError> {
    db.connection()
        .call(move |conn| -> Result<Vec<MessageRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_RECORD} ORDER BY m.created_at DESC, m.id DESC LIMIT ?1 OFFSET ?2"
            ))?;
            let records = stmt
                .query_map(params![limit, offset], read_record)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(records)
        })
        .await
        .map_err(map_tr_err)
}
