// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram channel adapter for Giggle.
//!
//! Implements [`ChannelAdapter`] for the Telegram Bot API via teloxide:
//! long polling for text messages, plain-text replies threaded under the
//! user's message (split at paragraph boundaries when too long), reactions, typing actions, and message deletion.

pub mod chunking;
pub mod handler;

use std::sync::Arc;

use async_trait::async_trait;
use giggle_config::model::TelegramConfig;
use giggle_core::{
    AdapterType, ChannelAdapter, ChannelCapabilities, ConversationKey, GiggleError,
    HealthStatus, InboundMessage, MessageId, OutboundMessage, PluginAdapter,
};
use teloxide::prelude::*;
use teloxide::types::{ChatAction, ChatId, ReactionType, ReplyParameters};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Telegram channel adapter implementing [`ChannelAdapter`].
pub struct TelegramChannel {
    bot: Bot,
    config: TelegramConfig,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundMessage>>,
    inbound_tx: mpsc::Sender<InboundMessage>,
    polling_handle: Option<tokio::task::JoinHandle<()>>,
}

impl TelegramChannel {
    /// Creates a new Telegram channel adapter. Requires `bot_token`.
    pub fn new(config: TelegramConfig) -> Result<Self, GiggleError> {
        let token = config
            .bot_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                GiggleError::Config("telegram.bot_token is required for Telegram adapter".into())
            })?;

        let bot = Bot::new(token);
        let (inbound_tx, inbound_rx) = mpsc::channel(100);

        Ok(Self {
            bot,
            config,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            polling_handle: None,
        })
    }
}

fn channel_err(action: &str, e: teloxide::RequestError) -> GiggleError {
    GiggleError::Channel {
        message: format!("failed to {action}: {e}"),
        source: Some(Box::new(e)),
    }
}

fn chat_id(conversation: &ConversationKey) -> Result<ChatId, GiggleError> {
    conversation
        .as_str()
        .parse::<i64>()
        .map(ChatId)
        .map_err(|e| GiggleError::channel(format!("invalid chat id `{conversation}`: {e}")))
}

fn message_id(id: &str) -> Result<teloxide::types::MessageId, GiggleError> {
    id.parse::<i32>()
        .map(teloxide::types::MessageId)
        .map_err(|e| GiggleError::channel(format!("invalid message id `{id}`: {e}")))
}

#[async_trait]
impl PluginAdapter for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, GiggleError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), GiggleError> {
        if let Some(handle) = &self.polling_handle {
            handle.abort();
        }
        debug!("Telegram channel shut down");
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for TelegramChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_typing: true,
            supports_reactions: true,
            supports_delete: true,
            max_message_length: Some(chunking::MAX_MESSAGE_LENGTH),
        }
    }

    async fn connect(&mut self) -> Result<(), GiggleError> {
        if self.polling_handle.is_some() {
            return Ok(());
        }

        let bot = self.bot.clone();
        let tx = self.inbound_tx.clone();
        let allowed_users: Arc<Vec<String>> = Arc::new(self.config.allowed_users.clone());
        let dm_only = self.config.dm_only;

        info!(dm_only, public = allowed_users.is_empty(), "starting Telegram long polling");

        let handle = tokio::spawn(async move {
            let endpoint = Update::filter_message().endpoint(move |msg: Message| {
                let tx = tx.clone();
                let allowed = allowed_users.clone();
                async move {
                    if dm_only && !handler::is_dm(&msg) {
                        debug!(chat_id = msg.chat.id.0, "ignoring non-DM message");
                        return respond(());
                    }
                    if !handler::is_authorized(&msg, &allowed) {
                        debug!(chat_id = msg.chat.id.0, "ignoring unauthorized user");
                        return respond(());
                    }

                    match handler::to_inbound_message(&msg) {
                        Some(inbound) => {
                            if tx.send(inbound).await.is_err() {
                                warn!("inbound channel closed, dropping message");
                            }
                        }
                        None => debug!(msg_id = msg.id.0, "ignoring non-text message"),
                    }
                    respond(())
                }
            });

            Dispatcher::builder(bot, endpoint)
                .default_handler(|_| async {})
                .build()
                .dispatch()
                .await;
        });

        self.polling_handle = Some(handle);
        Ok(())
    }

    /// Sends `msg`, split into several messages if it exceeds Telegram's
    /// length limit. Only the first part is threaded under `reply_to`; the
    /// returned id is that of the first part.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, GiggleError> {
        let chat = chat_id(&msg.conversation)?;
        let reply_to = msg.reply_to.as_deref().map(message_id).transpose()?;
        let chunks = chunking::split_message(&msg.content, chunking::MAX_MESSAGE_LENGTH);
        if chunks.len() > 1 {
            debug!(chat_id = chat.0, parts = chunks.len(), "splitting long message");
        }

        let mut first_id = None;
        for chunk in chunks {
            let mut request = self.bot.send_message(chat, chunk);
            if first_id.is_none()
                && let Some(reply_to) = reply_to
            {
                request = request
                    .reply_parameters(ReplyParameters::new(reply_to).allow_sending_without_reply());
            }
            let sent = request.await.map_err(|e| channel_err("send message", e))?;
            if first_id.is_none() {
                first_id = Some(sent.id);
            }
        }

        first_id
            .map(|id| MessageId(id.0.to_string()))
            .ok_or_else(|| GiggleError::channel("nothing to send"))
    }

    async fn receive(&self) -> Result<InboundMessage, GiggleError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv()
            .await
            .ok_or_else(|| GiggleError::channel("Telegram inbound channel closed"))
    }

    async fn send_typing(&self, conversation: &ConversationKey) -> Result<(), GiggleError> {
        self.bot
            .send_chat_action(chat_id(conversation)?, ChatAction::Typing)
            .await
            .map_err(|e| channel_err("send typing action", e))?;
        Ok(())
    }

    async fn set_reaction(
        &self,
        conversation: &ConversationKey,
        message: &str,
        emoji: Option<&str>,
    ) -> Result<(), GiggleError> {
        let reaction = emoji
            .map(|emoji| {
                vec![ReactionType::Emoji {
                    emoji: emoji.to_string(),
                }]
            })
            .unwrap_or_default();
        self.bot
            .set_message_reaction(chat_id(conversation)?, message_id(message)?)
            .reaction(reaction)
            .await
            .map_err(|e| channel_err("set reaction", e))?;
        Ok(())
    }

    async fn delete_message(
        &self,
        conversation: &ConversationKey,
        message: &MessageId,
    ) -> Result<(), GiggleError> {
        self.bot
            .delete_message(chat_id(conversation)?, message_id(&message.0)?)
            .await
            .map_err(|e| channel_err("delete message", e))?;
        Ok(())
    }
}
