// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory storage adapter for orchestrator tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use giggle_core::traits::adapter::PluginAdapter;
use giggle_core::traits::storage::StorageAdapter;
use giggle_core::types::{
    AdapterType, HealthStatus, InboundRecord, MessageRecord, RecordId, UsageStats,
};
use giggle_core::GiggleError;

#[derive(Default)]
struct State {
    users: HashMap<String, i64>,
    records: Vec<MessageRecord>,
}

/// A storage adapter that keeps records in memory.
///
/// Writes can be switched to fail to exercise the non-fatal persistence path.
#[derive(Default)]
pub struct MockStorage {
    state: Mutex<State>,
    fail_writes: AtomicBool,
    outcome_calls: AtomicUsize,
    closed: AtomicBool,
}

fn mock_failure() -> GiggleError {
    GiggleError::Storage {
        source: Box::new(std::io::Error::other("mock storage failure")),
    }
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// All records, oldest first.
    pub async fn records(&self) -> Vec<MessageRecord> {
        self.state.lock().await.records.clone()
    }

    /// Number of `record_outcome` calls, including failed ones.
    pub fn outcome_calls(&self) -> usize {
        self.outcome_calls.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PluginAdapter for MockStorage {
    fn name(&self) -> &str {
        "mock-storage"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, GiggleError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), GiggleError> {
        self.close().await
    }
}

#[async_trait]
impl StorageAdapter for MockStorage {
    async fn initialize(&self) -> Result<(), GiggleError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), GiggleError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn record_inbound(&self, record: &InboundRecord) -> Result<RecordId, GiggleError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(mock_failure());
        }
        let mut state = self.state.lock().await;
        let next_user = state.users.len() as i64 + 1;
        let user_id = *state
            .users
            .entry(record.sender.id.clone())
            .or_insert(next_user);
        let id = RecordId(state.records.len() as i64 + 1);
        state.records.push(MessageRecord {
            id,
            user_id,
            user_full_name: record.sender.full_name.clone(),
            conversation: record.conversation.to_string(),
            content: record.content.clone(),
            response: None,
            is_funny: None,
            created_at: record.created_at.to_rfc3339(),
        });
        Ok(id)
    }

    async fn record_outcome(
        &self,
        id: RecordId,
        response: &str,
        is_funny: bool,
    ) -> Result<(), GiggleError> {
        self.outcome_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(mock_failure());
        }
        let mut state = self.state.lock().await;
        let record = state
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| GiggleError::Internal(format!("no message record {id}")))?;
        record.response = Some(response.to_string());
        record.is_funny = Some(is_funny);
        Ok(())
    }

    async fn get_message(&self, id: RecordId) -> Result<Option<MessageRecord>, GiggleError> {
        let state = self.state.lock().await;
        Ok(state.records.iter().find(|r| r.id == id).cloned())
    }

    async fn list_messages(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MessageRecord>, GiggleError> {
        let state = self.state.lock().await;
        Ok(state
            .records
            .iter()
            .rev()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn stats(&self, today: NaiveDate) -> Result<UsageStats, GiggleError> {
        let state = self.state.lock().await;
        let day = today.format("%Y-%m-%d").to_string();
        let mut active: Vec<i64> = state
            .records
            .iter()
            .filter(|r| r.created_at.starts_with(&day))
            .map(|r| r.user_id)
            .collect();
        active.sort_unstable();
        active.dedup();
        Ok(UsageStats {
            total_users: state.users.len() as i64,
            active_users_today: active.len() as i64,
            total_messages: state.records.len() as i64,
            funny_messages: state
                .records
                .iter()
                .filter(|r| r.is_funny == Some(true))
                .count() as i64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use giggle_core::types::{ConversationKey, SenderProfile};

    fn record(sender: &str) -> InboundRecord {
        InboundRecord {
            conversation: ConversationKey::from("c1"),
            sender: SenderProfile {
                id: sender.to_string(),
                username: None,
                full_name: format!("User {sender}"),
            },
            content: "hello".to_string(),
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn records_round_trip_through_outcome() {
        let storage = MockStorage::new();
        let id = storage.record_inbound(&record("1")).await.unwrap();
        storage.record_outcome(id, "hi", true).await.unwrap();

        let stored = storage.get_message(id).await.unwrap().unwrap();
        assert_eq!(stored.response.as_deref(), Some("hi"));
        assert_eq!(stored.is_funny, Some(true));
    }

    #[tokio::test]
    async fn stats_count_distinct_users() {
        let storage = MockStorage::new();
        storage.record_inbound(&record("1")).await.unwrap();
        storage.record_inbound(&record("1")).await.unwrap();
        storage.record_inbound(&record("2")).await.unwrap();

        let stats = storage.stats(chrono::Utc::now().date_naive()).await.unwrap();
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.active_users_today, 2);
        assert_eq!(stats.total_messages, 3);
        assert_eq!(stats.funny_messages, 0);
    }

    #[tokio::test]
    async fn failing_writes_leave_no_records() {
        let storage = MockStorage::new();
        storage.fail_writes(true);
        assert!(storage.record_inbound(&record("1")).await.is_err());
        assert!(storage.records().await.is_empty());
    }
}
