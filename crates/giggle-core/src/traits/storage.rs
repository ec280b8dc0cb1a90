// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for the message audit trail.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::GiggleError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{InboundRecord, MessageRecord, RecordId, UsageStats};

/// Adapter for the persistence backend.
///
/// A message record is written in two phases: the inbound half before the
/// completion exchange starts, and the outcome after it succeeds.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), GiggleError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), GiggleError>;

    /// Upserts the sender and inserts a record with no outcome yet.
    async fn record_inbound(&self, record: &InboundRecord) -> Result<RecordId, GiggleError>;

    /// Fills in the reply and classification of an existing record.
    async fn record_outcome(
        &self,
        id: RecordId,
        response: &str,
        is_funny: bool,
    ) -> Result<(), GiggleError>;

    /// Fetches one record by id.
    async fn get_message(&self, id: RecordId) -> Result<Option<MessageRecord>, GiggleError>;

    /// Lists records newest first.
    async fn list_messages(&self, limit: i64, offset: i64)
    -> Result<Vec<MessageRecord>, GiggleError>;

    /// Aggregates counters; "active today" is relative to `today` (UTC).
    async fn stats(&self, today: NaiveDate) -> Result<UsageStats, GiggleError>;
}
