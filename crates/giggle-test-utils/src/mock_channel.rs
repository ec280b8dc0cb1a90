// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` with injectable inbound messages
//! and captures everything the relay does to the chat: sent messages, typing
//! actions, reactions and deletions.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use giggle_core::traits::adapter::PluginAdapter;
use giggle_core::traits::channel::ChannelAdapter;
use giggle_core::types::{
    AdapterType, ChannelCapabilities, ConversationKey, HealthStatus, InboundMessage, MessageId,
    OutboundMessage,
};
use giggle_core::GiggleError;

/// A reaction change observed by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedReaction {
    pub conversation: ConversationKey,
    pub message_id: String,
    /// `None` means the reaction was removed.
    pub emoji: Option<String>,
}

/// A mock messaging channel for testing.
///
/// Messages injected via `inject_message()` are returned by `receive()`;
/// everything sent is captured for assertions. Sends and reactions can be
/// switched to fail.
pub struct MockChannel {
    inbound: Arc<Mutex<VecDeque<InboundMessage>>>,
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    typing: Mutex<Vec<ConversationKey>>,
    reactions: Mutex<Vec<RecordedReaction>>,
    deleted: Mutex<Vec<MessageId>>,
    notify: Arc<Notify>,
    sent_notify: Notify,
    next_id: AtomicU64,
    fail_sends: AtomicBool,
    fail_reactions: AtomicBool,
}

impl MockChannel {
    /// Create a new mock channel with empty queues.
    pub fn new() -> Self {
        Self {
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            typing: Mutex::new(Vec::new()),
            reactions: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            notify: Arc::new(Notify::new()),
            sent_notify: Notify::new(),
            next_id: AtomicU64::new(1),
            fail_sends: AtomicBool::new(false),
            fail_reactions: AtomicBool::new(false),
        }
    }

    /// Inject an inbound message into the receive queue.
    pub async fn inject_message(&self, msg: InboundMessage) {
        self.inbound.lock().await.push_back(msg);
        self.notify.notify_one();
    }

    /// Get all messages that were sent through `send()`.
    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    /// Get the count of sent messages.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Wait until at least `count` messages have been sent.
    pub async fn wait_for_sent(&self, count: usize) {
        loop {
            let notified = self.sent_notify.notified();
            if self.sent_count().await >= count {
                return;
            }
            notified.await;
        }
    }

    pub async fn typing_count(&self) -> usize {
        self.typing.lock().await.len()
    }

    /// Reaction changes in the order they were made.
    pub async fn reactions(&self) -> Vec<RecordedReaction> {
        self.reactions.lock().await.clone()
    }

    pub async fn deleted_messages(&self) -> Vec<MessageId> {
        self.deleted.lock().await.clone()
    }

    /// Make every subsequent `send()` fail.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `set_reaction()` fail.
    pub fn fail_reactions(&self, fail: bool) {
        self.fail_reactions.store(fail, Ordering::SeqCst);
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, GiggleError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), GiggleError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_typing: true,
            supports_reactions: true,
            supports_delete: true,
            max_message_length: None,
        }
    }

    async fn connect(&mut self) -> Result<(), GiggleError> {
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, GiggleError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(GiggleError::channel("mock send failure"));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().await.push(msg);
        self.sent_notify.notify_waiters();
        Ok(MessageId(format!("mock-msg-{id}")))
    }

    async fn receive(&self) -> Result<InboundMessage, GiggleError> {
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(msg) = queue.pop_front() {
                    return Ok(msg);
                }
            }
            self.notify.notified().await;
        }
    }

    async fn send_typing(&self, conversation: &ConversationKey) -> Result<(), GiggleError> {
        self.typing.lock().await.push(conversation.clone());
        Ok(())
    }

    async fn set_reaction(
        &self,
        conversation: &ConversationKey,
        message_id: &str,
        emoji: Option<&str>,
    ) -> Result<(), GiggleError> {
        if self.fail_reactions.load(Ordering::SeqCst) {
            return Err(GiggleError::channel("mock reaction failure"));
        }
        self.reactions.lock().await.push(RecordedReaction {
            conversation: conversation.clone(),
            message_id: message_id.to_string(),
            emoji: emoji.map(str::to_string),
        });
        Ok(())
    }

    async fn delete_message(
        &self,
        _conversation: &ConversationKey,
        message_id: &MessageId,
    ) -> Result<(), GiggleError> {
        self.deleted.lock().await.push(message_id.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use giggle_core::types::SenderProfile;

    fn make_inbound(text: &str) -> InboundMessage {
        InboundMessage {
            id: format!("test-{}", uuid::Uuid::new_v4()),
            channel: "mock".to_string(),
            conversation: ConversationKey::from("c1"),
            sender: SenderProfile {
                id: "test-user".to_string(),
                username: None,
                full_name: "Test User".to_string(),
            },
            text: text.to_string(),
            timestamp: chrono::Utc::now(),
        }
    }

    fn outbound(content: &str) -> OutboundMessage {
        OutboundMessage {
            conversation: ConversationKey::from("c1"),
            content: content.to_string(),
            reply_to: None,
        }
    }

    #[tokio::test]
    async fn receive_returns_injected_messages() {
        let channel = MockChannel::new();
        channel.inject_message(make_inbound("hello")).await;

        let received = channel.receive().await.unwrap();
        assert_eq!(received.sender.id, "test-user");
        assert_eq!(received.text, "hello");
    }

    #[tokio::test]
    async fn send_captures_outbound_messages() {
        let channel = MockChannel::new();
        let msg_id = channel.send(outbound("response text")).await.unwrap();
        assert!(msg_id.0.starts_with("mock-msg-"));

        let sent = channel.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].content, "response text");
    }

    #[tokio::test]
    async fn failing_sends_are_not_captured() {
        let channel = MockChannel::new();
        channel.fail_sends(true);
        assert!(channel.send(outbound("lost")).await.is_err());
        assert_eq!(channel.sent_count().await, 0);
    }

    #[tokio::test]
    async fn reactions_are_recorded_in_order() {
        let channel = MockChannel::new();
        let key = ConversationKey::from("c1");
        channel.set_reaction(&key, "5", Some("👀")).await.unwrap();
        channel.set_reaction(&key, "5", None).await.unwrap();

        let reactions = channel.reactions().await;
        assert_eq!(reactions[0].emoji.as_deref(), Some("👀"));
        assert_eq!(reactions[1].emoji, None);

        channel.fail_reactions(true);
        assert!(channel.set_reaction(&key, "5", Some("🤣")).await.is_err());
        assert_eq!(channel.reactions().await.len(), 2);
    }

    #[tokio::test]
    async fn wait_for_sent_returns_once_count_reached() {
        let channel = Arc::new(MockChannel::new());
        let sender = Arc::clone(&channel);
        tokio::spawn(async move {
            sender.send(outbound("one")).await.unwrap();
        });
        channel.wait_for_sent(1).await;
        assert_eq!(channel.sent_count().await, 1);
    }

    #[tokio::test]
    async fn connect_succeeds() {
        let mut channel = MockChannel::new();
        assert!(channel.connect().await.is_ok());
    }
}
