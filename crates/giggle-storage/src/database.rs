// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread. Do not open a second connection for writes.

use giggle_core::GiggleError;
use tracing::debug;

use crate::migrations;

/// Convert a tokio-rusqlite error into `GiggleError::Storage`.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> GiggleError {
    GiggleError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the single SQLite writer connection.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path` in WAL mode and migrate it.
    pub async fn open(path: &str) -> Result<Self, GiggleError> {
        Self::open_with(path, true).await
    }

    /// Open the database, choosing the journal mode explicitly.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, GiggleError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| GiggleError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| GiggleError::Storage {
                source: Box::new(e),
            })?;

        let applied = conn
            .call(move |conn| -> Result<Result<usize, String>, rusqlite::Error> {
                if wal_mode {
                    conn.pragma_update(None, "journal_mode", "WAL")?;
                }
                conn.pragma_update(None, "foreign_keys", "ON")?;
                conn.pragma_update(None, "busy_timeout", 5000)?;
                conn.pragma_update(None, "synchronous", "NORMAL")?;
                Ok(migrations::run_migrations(conn))
            })
            .await
            .map_err(map_tr_err)?
            .map_err(|e| GiggleError::Storage {
                source: format!("migration failed: {e}").into(),
            })?;

        debug!(path, wal_mode, applied, "database opened");
        Ok(Self { conn })
    }

    /// The underlying connection, for query modules.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    ///
    /// Closing is shared by every clone of this handle; later statements
    /// fail with a storage error.
    pub async fn close(&self) -> Result<(), GiggleError> {
        checkpoint(&self.conn).await?;
        self.conn.clone().close().await.map_err(|e| GiggleError::Storage {
            source: Box::new(e),
        })
    }
}

/// `PRAGMA wal_checkpoint(TRUNCATE)`; a no-op outside WAL mode.
async fn checkpoint(conn: &tokio_rusqlite::Connection) -> Result<(), GiggleError> {
    conn.call(|conn| -> Result<(), rusqlite::Error> {
        conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    })
    .await
    .map_err(map_tr_err)
}
