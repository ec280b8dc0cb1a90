// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for chat platform integrations.

use async_trait::async_trait;

use crate::error::GiggleError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelCapabilities, ConversationKey, InboundMessage, MessageId, OutboundMessage};

/// Adapter for a bidirectional chat platform.
///
/// Besides plain message exchange, a channel must be able to show the
/// presence signals (typing, reactions) used while a reply is being produced.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Returns the capabilities supported by this channel.
    fn capabilities(&self) -> ChannelCapabilities;

    /// Establishes a connection to the platform and starts receiving.
    async fn connect(&mut self) -> Result<(), GiggleError>;

    /// Sends a plain-text message.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, GiggleError>;

    /// Receives the next inbound message.
    async fn receive(&self) -> Result<InboundMessage, GiggleError>;

    /// Emits one "typing" chat action. Platforms expire it after a few seconds.
    async fn send_typing(&self, conversation: &ConversationKey) -> Result<(), GiggleError>;

    /// Replaces the bot's reaction on a message. `None` removes it.
    async fn set_reaction(
        &self,
        conversation: &ConversationKey,
        message_id: &str,
        emoji: Option<&str>,
    ) -> Result<(), GiggleError>;

    /// Deletes a message previously sent by the bot.
    async fn delete_message(
        &self,
        conversation: &ConversationKey,
        message_id: &MessageId,
    ) -> Result<(), GiggleError>;
}
