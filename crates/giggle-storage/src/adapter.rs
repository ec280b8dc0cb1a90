// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::OnceCell;
use tracing::debug;

use giggle_config::model::StorageConfig;
use giggle_core::{
    AdapterType, GiggleError, HealthStatus, InboundRecord, MessageRecord, PluginAdapter,
    RecordId, StorageAdapter, UsageStats,
};

use crate::database::{self, Database};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// The database is opened by [`StorageAdapter::initialize`]; every other
/// operation fails until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage. Nothing is opened yet.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, GiggleError> {
        self.db.get().ok_or_else(|| GiggleError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, GiggleError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), GiggleError> {
        if self.db.initialized() {
            self.close().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), GiggleError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| GiggleError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), GiggleError> {
        self.db()?.close().await?;
        debug!("SQLite storage closed");
        Ok(())
    }

    async fn record_inbound(&self, record: &InboundRecord) -> Result<RecordId, GiggleError> {
        queries::messages::insert_inbound(self.db()?, record).await
    }

    async fn record_outcome(
        &self,
        id: RecordId,
        response: &str,
        is_funny: bool,
    ) -> Result<(), GiggleError> {
        queries::messages::update_outcome(self.db()?, id, response, is_funny).await
    }

    async fn get_message(&self, id: RecordId) -> Result<Option<MessageRecord>, GiggleError> {
        queries::messages::get(self.db()?, id).await
    }

    async fn list_messages(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MessageRecord>, GiggleError> {
        queries::messages::list(self.db()?, limit, offset).await
    }

    async fn stats(&self, today: NaiveDate) -> Result<UsageStats, GiggleError> {
        queries::stats::usage(self.db()?, today).await
    }
}
