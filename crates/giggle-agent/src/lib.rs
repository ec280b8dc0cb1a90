// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message orchestration for the Giggle chat relay.
//!
//! The [`AgentLoop`] receives messages from a channel adapter and runs each
//! one through the [`Orchestrator`] on its own task:
//! - a per-conversation guard rejects overlapping messages
//! - a two-round completion exchange classifies and answers
//! - presence signals show progress on the user's message
//! - the exchange is recorded in storage

pub mod conversation;
pub mod orchestrator;
pub mod presence;
pub mod recording;
pub mod shutdown;

use std::sync::Arc;
use std::time::Duration;

use giggle_config::model::AgentConfig;
use giggle_core::error::GiggleError;
use giggle_core::{ChannelAdapter, CompletionAdapter, StorageAdapter};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info};

pub use conversation::{ConversationPermit, ConversationStore, InMemoryConversationStore};
pub use orchestrator::{
    FailureKind, Orchestrator, OrchestratorSettings, OrchestratorState, ProcessOutcome,
};
pub use presence::{PresenceHandle, PresenceSignaler};

/// The main loop that feeds inbound messages to the orchestrator.
pub struct AgentLoop {
    channel: Arc<dyn ChannelAdapter>,
    storage: Arc<dyn StorageAdapter>,
    orchestrator: Arc<Orchestrator>,
    tracker: TaskTracker,
    drain_timeout: Duration,
}

impl AgentLoop {
    /// Wires the orchestrator from connected adapters and relay settings.
    pub fn new(
        channel: Arc<dyn ChannelAdapter>,
        completion: Arc<dyn CompletionAdapter>,
        storage: Arc<dyn StorageAdapter>,
        config: &AgentConfig,
    ) -> Self {
        let conversations: Arc<dyn ConversationStore> = Arc::new(InMemoryConversationStore::new(
            config.conversation_capacity,
        ));
        let presence = PresenceSignaler::new(
            Arc::clone(&channel),
            config.placeholder_reaction.clone(),
            config.affect_reaction.clone(),
        );
        let tracker = TaskTracker::new();
        let orchestrator = Arc::new(
            Orchestrator::new(
                Arc::clone(&channel),
                completion,
                Arc::clone(&storage),
                conversations,
                presence,
                OrchestratorSettings::from(config),
            )
            .with_task_tracker(tracker.clone()),
        );

        Self {
            channel,
            storage,
            orchestrator,
            tracker,
            drain_timeout: Duration::from_secs(config.drain_timeout_secs),
        }
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    /// Runs until `cancel` fires or the channel closes, then drains in-flight
    /// messages and pending busy-notice deletions and closes storage.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), GiggleError> {
        info!("agent loop running");

        loop {
            tokio::select! {
                msg = self.channel.receive() => {
                    match msg {
                        Ok(inbound) => {
                            let orchestrator = Arc::clone(&self.orchestrator);
                            self.tracker.spawn(async move {
                                orchestrator.process(&inbound).await;
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "channel receive error");
                            break;
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping agent loop");
                    break;
                }
            }
        }

        self.orchestrator.flush_pending_notices();
        shutdown::drain_tasks(&self.tracker, self.drain_timeout).await;
        self.storage.close().await?;

        info!("agent loop stopped");
        Ok(())
    }
}
