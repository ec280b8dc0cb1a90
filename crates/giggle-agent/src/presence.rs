// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Presence signals shown while a reply is being produced.
//!
//! A placeholder reaction marks the user's message as seen, and a typing
//! action is refreshed until the reply is delivered. The platform holds a
//! single bot reaction per message, so the affect reaction replaces the
//! placeholder instead of stacking on it.

use std::sync::Arc;
use std::time::Duration;

use giggle_core::{ChannelAdapter, ConversationKey, GiggleError, InboundMessage};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Typing actions expire after roughly five seconds on Telegram.
const TYPING_INTERVAL: Duration = Duration::from_secs(4);

/// Drives the presence signals for one channel.
pub struct PresenceSignaler {
    channel: Arc<dyn ChannelAdapter>,
    placeholder: String,
    affect: String,
    typing_interval: Duration,
}

/// Live presence state of one message.
///
/// Dropping the handle stops the typing loop but leaves reactions as they
/// are; call [`PresenceSignaler::end`] to clean up.
pub struct PresenceHandle {
    conversation: ConversationKey,
    message_id: String,
    typing_cancel: CancellationToken,
    typing_task: JoinHandle<()>,
    placeholder_active: bool,
    affect_shown: bool,
}

impl PresenceHandle {
    pub fn affect_shown(&self) -> bool {
        self.affect_shown
    }
}

impl Drop for PresenceHandle {
    fn drop(&mut self) {
        self.typing_cancel.cancel();
    }
}

impl PresenceSignaler {
    pub fn new(
        channel: Arc<dyn ChannelAdapter>,
        placeholder: impl Into<String>,
        affect: impl Into<String>,
    ) -> Self {
        Self {
            channel,
            placeholder: placeholder.into(),
            affect: affect.into(),
            typing_interval: TYPING_INTERVAL,
        }
    }

    pub fn with_typing_interval(mut self, interval: Duration) -> Self {
        self.typing_interval = interval;
        self
    }

    /// Sets the placeholder reaction and starts the typing loop.
    pub async fn begin(&self, inbound: &InboundMessage) -> Result<PresenceHandle, GiggleError> {
        self.channel
            .set_reaction(&inbound.conversation, &inbound.id, Some(&self.placeholder))
            .await?;

        let typing_cancel = CancellationToken::new();
        let typing_task = spawn_typing_loop(
            Arc::clone(&self.channel),
            inbound.conversation.clone(),
            typing_cancel.clone(),
            self.typing_interval,
        );

        Ok(PresenceHandle {
            conversation: inbound.conversation.clone(),
            message_id: inbound.id.clone(),
            typing_cancel,
            typing_task,
            placeholder_active: true,
            affect_shown: false,
        })
    }

    /// Replaces the placeholder with the affect reaction.
    pub async fn signal_affect(&self, handle: &mut PresenceHandle) -> Result<(), GiggleError> {
        self.channel
            .set_reaction(&handle.conversation, &handle.message_id, Some(&self.affect))
            .await?;
        handle.placeholder_active = false;
        handle.affect_shown = true;
        Ok(())
    }

    /// Stops typing and removes the placeholder if it is still shown.
    pub async fn end(&self, mut handle: PresenceHandle) {
        handle.typing_cancel.cancel();
        if let Err(e) = (&mut handle.typing_task).await
            && !e.is_cancelled()
        {
            warn!(conversation = %handle.conversation, error = %e, "typing loop panicked");
        }

        if handle.placeholder_active {
            if let Err(e) = self
                .channel
                .set_reaction(&handle.conversation, &handle.message_id, None)
                .await
            {
                warn!(
                    conversation = %handle.conversation,
                    failure_kind = "signaling",
                    error = %e,
                    "failed to remove placeholder reaction"
                );
            }
        }
    }
}

fn spawn_typing_loop(
    channel: Arc<dyn ChannelAdapter>,
    conversation: ConversationKey,
    cancel: CancellationToken,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = async {
                    if let Err(e) = channel.send_typing(&conversation).await {
                        debug!(conversation = %conversation, error = %e, "typing action failed");
                    }
                    tokio::time::sleep(interval).await;
                } => {}
            }
        }
    })
}
