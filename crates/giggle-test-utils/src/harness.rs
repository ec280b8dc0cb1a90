// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the full relay with mock channel and completion
//! adapters on top of a real SQLite database in a temp directory. Use
//! `send_text()` to drive one message through the orchestrator.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use giggle_agent::{AgentLoop, Orchestrator, ProcessOutcome};
use giggle_config::model::{AgentConfig, StorageConfig};
use giggle_core::types::{ConversationKey, InboundMessage, SenderProfile};
use giggle_core::{GiggleError, StorageAdapter};
use giggle_storage::SqliteStorage;

use crate::mock_channel::MockChannel;
use crate::mock_completion::MockCompletion;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    agent: AgentConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            agent: AgentConfig {
                busy_notice_ttl_secs: 0,
                ..AgentConfig::default()
            },
        }
    }

    /// Replace the relay settings.
    pub fn with_agent_config(mut self, agent: AgentConfig) -> Self {
        self.agent = agent;
        self
    }

    /// Build the harness, creating and migrating the temp database.
    pub async fn build(self) -> Result<TestHarness, GiggleError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| GiggleError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let storage = SqliteStorage::new(StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        });
        storage.initialize().await?;
        let storage = Arc::new(storage);

        let channel = Arc::new(MockChannel::new());
        let completion = Arc::new(MockCompletion::new());
        let agent = AgentLoop::new(
            channel.clone(),
            completion.clone(),
            storage.clone(),
            &self.agent,
        );

        Ok(TestHarness {
            channel,
            completion,
            storage,
            agent,
            next_id: AtomicU64::new(1),
            _temp_dir: temp_dir,
        })
    }
}

/// A complete relay with mock adapters and temp storage.
pub struct TestHarness {
    /// The mock chat channel.
    pub channel: Arc<MockChannel>,
    /// The mock completion service.
    pub completion: Arc<MockCompletion>,
    /// SQLite storage adapter (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    /// The agent loop wired to the adapters above.
    pub agent: AgentLoop,
    next_id: AtomicU64,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        self.agent.orchestrator()
    }

    /// A text message from a fixed test user, with a fresh message id.
    pub fn inbound(&self, conversation: &str, text: &str) -> InboundMessage {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        InboundMessage {
            id: id.to_string(),
            channel: "mock".to_string(),
            conversation: ConversationKey::from(conversation),
            sender: SenderProfile {
                id: format!("user-{conversation}"),
                username: Some("tester".to_string()),
                full_name: "Test User".to_string(),
            },
            text: text.to_string(),
            timestamp: chrono::Utc::now(),
        }
    }

    /// Run one message through the orchestrator.
    pub async fn send_text(&self, conversation: &str, text: &str) -> ProcessOutcome {
        let inbound = self.inbound(conversation, text);
        self.orchestrator().process(&inbound).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builder_creates_working_environment() {
        let harness = TestHarness::builder().build().await.unwrap();
        let messages = harness.storage.list_messages(10, 0).await.unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn send_text_replies_and_persists() {
        let harness = TestHarness::builder().build().await.unwrap();

        let outcome = harness.send_text("c1", "hello").await;
        assert_eq!(
            outcome,
            ProcessOutcome::Replied {
                reply: "mock response".to_string(),
                is_funny: false
            }
        );

        let messages = harness.storage.list_messages(10, 0).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "hello");
        assert_eq!(messages[0].response.as_deref(), Some("mock response"));
    }

    #[tokio::test]
    async fn temp_db_is_unique_per_harness() {
        let h1 = TestHarness::builder().build().await.unwrap();
        let h2 = TestHarness::builder().build().await.unwrap();

        h1.send_text("c1", "msg1").await;
        assert_eq!(h1.storage.list_messages(10, 0).await.unwrap().len(), 1);
        assert!(h2.storage.list_messages(10, 0).await.unwrap().is_empty());
    }
}
