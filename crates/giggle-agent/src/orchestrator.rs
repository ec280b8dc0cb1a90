// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-message state machine.
//!
//! One inbound message moves through
//! `Idle -> Guarding -> Persisting -> Negotiating -> Finalizing -> Delivering -> Idle`.
//! A busy conversation diverts to `Rejecting`; any fatal fault diverts to
//! `Failing`, which replies with a fixed apology. The conversation guard is
//! held by a [`ConversationPermit`] and released when the run returns.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use giggle_config::model::AgentConfig;
use giggle_core::{
    ChannelAdapter, Completion, CompletionAdapter, FinalizeRequest, GiggleError,
    HUMOR_TOOL_NAME, InboundMessage, InboundRecord, NegotiateRequest, OutboundMessage,
    RecordId, ResolvedTool, StorageAdapter, ToolInvocation,
};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::conversation::{ConversationPermit, ConversationStore};
use crate::presence::{PresenceHandle, PresenceSignaler};
use crate::recording;

/// Stage of a message run, as shown in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Idle,
    Guarding,
    Rejecting,
    Persisting,
    Negotiating,
    Finalizing,
    Delivering,
    Failing,
}

impl std::fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrchestratorState::Idle => write!(f, "idle"),
            OrchestratorState::Guarding => write!(f, "guarding"),
            OrchestratorState::Rejecting => write!(f, "rejecting"),
            OrchestratorState::Persisting => write!(f, "persisting"),
            OrchestratorState::Negotiating => write!(f, "negotiating"),
            OrchestratorState::Finalizing => write!(f, "finalizing"),
            OrchestratorState::Delivering => write!(f, "delivering"),
            OrchestratorState::Failing => write!(f, "failing"),
        }
    }
}

/// Category of a fault, logged as `failure_kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum FailureKind {
    Completion,
    Persistence,
    Signaling,
    Delivery,
}

/// How a message run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The conversation was busy; only the "please wait" notice was sent.
    Rejected,
    /// The reply was delivered.
    Replied { reply: String, is_funny: bool },
    /// `/start` was answered with the welcome text.
    Welcomed,
    /// A command other than `/start`; nothing was sent.
    Ignored,
    /// The run ended with the apology.
    Failed { kind: FailureKind },
}

impl ProcessOutcome {
    /// Label used for the `outcome` metric dimension.
    pub fn label(&self) -> &'static str {
        match self {
            ProcessOutcome::Rejected => "rejected",
            ProcessOutcome::Replied { .. } => "replied",
            ProcessOutcome::Welcomed => "welcomed",
            ProcessOutcome::Ignored => "ignored",
            ProcessOutcome::Failed { .. } => "failed",
        }
    }
}

/// User-facing texts and limits of the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub welcome_text: String,
    pub busy_text: String,
    /// Zero keeps the busy notice.
    pub busy_notice_ttl: Duration,
    pub apology_text: String,
    /// Upper bound of each completion round.
    pub completion_timeout: Duration,
}

impl From<&AgentConfig> for OrchestratorSettings {
    fn from(config: &AgentConfig) -> Self {
        Self {
            welcome_text: config.welcome_text.clone(),
            busy_text: config.busy_text.clone(),
            busy_notice_ttl: Duration::from_secs(config.busy_notice_ttl_secs),
            apology_text: config.apology_text.clone(),
            completion_timeout: Duration::from_secs(config.completion_timeout_secs),
        }
    }
}

#[derive(Deserialize)]
struct HumorArguments {
    is_funny: bool,
}

/// Checks that the service called the humor tool with a boolean verdict.
pub fn resolve_tool(invocation: ToolInvocation) -> Result<ResolvedTool, GiggleError> {
    if invocation.name != HUMOR_TOOL_NAME {
        return Err(GiggleError::completion(format!(
            "unexpected tool invocation `{}`",
            invocation.name
        )));
    }
    let args: HumorArguments = serde_json::from_str(&invocation.arguments).map_err(|e| {
        GiggleError::Completion {
            message: format!("malformed `{HUMOR_TOOL_NAME}` arguments"),
            source: Some(Box::new(e)),
        }
    })?;
    Ok(ResolvedTool {
        invocation,
        outcome: args.is_funny,
    })
}

/// What a guarded run does once the conversation is acquired.
#[derive(Debug, Clone, Copy)]
enum Route {
    Welcome,
    Exchange,
}

/// Command name of a `/command@bot args` message, if it is one.
///
/// Names are `[A-Za-z0-9_]+`; anything else, like a bare `/`, is ordinary text.
fn command_name(text: &str) -> Option<&str> {
    let first = text.split_whitespace().next()?;
    let command = first.strip_prefix('/')?;
    let name = command.split('@').next().unwrap_or(command);
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then_some(name)
}

/// Runs inbound messages through the guard, the completion exchange and
/// delivery.
pub struct Orchestrator {
    channel: Arc<dyn ChannelAdapter>,
    completion: Arc<dyn CompletionAdapter>,
    storage: Arc<dyn StorageAdapter>,
    conversations: Arc<dyn ConversationStore>,
    presence: PresenceSignaler,
    settings: OrchestratorSettings,
    background: TaskTracker,
    flush_notices: CancellationToken,
}

impl Orchestrator {
    pub fn new(
        channel: Arc<dyn ChannelAdapter>,
        completion: Arc<dyn CompletionAdapter>,
        storage: Arc<dyn StorageAdapter>,
        conversations: Arc<dyn ConversationStore>,
        presence: PresenceSignaler,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            channel,
            completion,
            storage,
            conversations,
            presence,
            settings,
            background: TaskTracker::new(),
            flush_notices: CancellationToken::new(),
        }
    }

    /// Runs delayed busy-notice deletions on `tracker`, so draining it also
    /// waits for them.
    pub fn with_task_tracker(mut self, tracker: TaskTracker) -> Self {
        self.background = tracker;
        self
    }

    /// Deletes pending busy notices now instead of after their TTL.
    pub fn flush_pending_notices(&self) {
        self.flush_notices.cancel();
    }

    pub fn conversations(&self) -> &Arc<dyn ConversationStore> {
        &self.conversations
    }

    /// Handles one inbound message to completion.
    ///
    /// Never returns an error: every fault is logged and mapped to an outcome.
    pub async fn process(&self, inbound: &InboundMessage) -> ProcessOutcome {
        let outcome = match command_name(&inbound.text) {
            Some("start") => self.guarded(inbound, Route::Welcome).await,
            Some(other) => {
                debug!(conversation = %inbound.conversation, command = other, "ignoring command");
                ProcessOutcome::Ignored
            }
            None => self.guarded(inbound, Route::Exchange).await,
        };

        recording::record_outcome(&outcome);
        outcome
    }

    async fn guarded(&self, inbound: &InboundMessage, route: Route) -> ProcessOutcome {
        self.enter(inbound, OrchestratorState::Guarding);
        let Some(_permit) = ConversationPermit::acquire(&self.conversations, &inbound.conversation)
        else {
            self.enter(inbound, OrchestratorState::Rejecting);
            self.reject(inbound).await;
            return ProcessOutcome::Rejected;
        };

        let outcome = match route {
            Route::Welcome => self.welcome(inbound).await,
            Route::Exchange => self.exchange(inbound).await,
        };
        self.enter(inbound, OrchestratorState::Idle);
        outcome
    }

    fn enter(&self, inbound: &InboundMessage, state: OrchestratorState) {
        debug!(
            conversation = %inbound.conversation,
            message_id = %inbound.id,
            state = %state,
            "state transition"
        );
    }

    async fn reject(&self, inbound: &InboundMessage) {
        let notice = OutboundMessage::reply_to(inbound, &self.settings.busy_text);
        let notice_id = match self.channel.send(notice).await {
            Ok(id) => id,
            Err(e) => {
                warn!(
                    conversation = %inbound.conversation,
                    failure_kind = %FailureKind::Delivery,
                    error = %e,
                    "failed to send busy notice"
                );
                return;
            }
        };

        let ttl = self.settings.busy_notice_ttl;
        if ttl.is_zero() {
            return;
        }
        let channel = Arc::clone(&self.channel);
        let conversation = inbound.conversation.clone();
        let flush = self.flush_notices.clone();
        self.background.spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(ttl) => {}
                _ = flush.cancelled() => {}
            }
            if let Err(e) = channel.delete_message(&conversation, &notice_id).await {
                debug!(conversation = %conversation, error = %e, "failed to delete busy notice");
            }
        });
    }

    async fn welcome(&self, inbound: &InboundMessage) -> ProcessOutcome {
        self.conversations
            .clear_continuity_token(&inbound.conversation);
        self.enter(inbound, OrchestratorState::Delivering);
        let reply = OutboundMessage::reply_to(inbound, &self.settings.welcome_text);
        match self.channel.send(reply).await {
            Ok(_) => {
                info!(conversation = %inbound.conversation, "conversation restarted");
                ProcessOutcome::Welcomed
            }
            Err(e) => {
                error!(
                    conversation = %inbound.conversation,
                    failure_kind = %FailureKind::Delivery,
                    error = %e,
                    "failed to send welcome text"
                );
                ProcessOutcome::Failed {
                    kind: FailureKind::Delivery,
                }
            }
        }
    }

    async fn exchange(&self, inbound: &InboundMessage) -> ProcessOutcome {
        self.enter(inbound, OrchestratorState::Persisting);
        let record_id = match self
            .storage
            .record_inbound(&InboundRecord::from_inbound(inbound))
            .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(
                    conversation = %inbound.conversation,
                    failure_kind = %FailureKind::Persistence,
                    error = %e,
                    "failed to record inbound message"
                );
                None
            }
        };

        self.enter(inbound, OrchestratorState::Negotiating);
        let mut presence = match self.presence.begin(inbound).await {
            Ok(handle) => handle,
            Err(e) => return self.fail(inbound, FailureKind::Signaling, &e).await,
        };

        let (completion, is_funny) = match self.complete(inbound, &mut presence).await {
            Ok(result) => result,
            Err(e) => {
                self.presence.end(presence).await;
                return self.fail(inbound, FailureKind::Completion, &e).await;
            }
        };

        self.enter(inbound, OrchestratorState::Delivering);
        self.conversations
            .set_continuity_token(&inbound.conversation, completion.continuity_token.clone());
        if let Some(id) = record_id {
            self.record_outcome(inbound, id, &completion.reply_text, is_funny)
                .await;
        }
        self.presence.end(presence).await;

        let reply = OutboundMessage::reply_to(inbound, &completion.reply_text);
        match self.channel.send(reply).await {
            Ok(_) => {
                info!(
                    conversation = %inbound.conversation,
                    is_funny,
                    "reply delivered"
                );
                ProcessOutcome::Replied {
                    reply: completion.reply_text,
                    is_funny,
                }
            }
            Err(e) => self.fail(inbound, FailureKind::Delivery, &e).await,
        }
    }

    /// Both completion rounds. Returns the final completion and the verdict.
    async fn complete(
        &self,
        inbound: &InboundMessage,
        presence: &mut PresenceHandle,
    ) -> Result<(Completion, bool), GiggleError> {
        let negotiation = self
            .bounded(self.completion.negotiate(NegotiateRequest {
                text: inbound.text.clone(),
            }))
            .await?;
        debug!(
            conversation = %inbound.conversation,
            response_id = %negotiation.response_id,
            tool_called = negotiation.tool_invocation.is_some(),
            "negotiation finished"
        );

        let tool = negotiation.tool_invocation.map(resolve_tool).transpose()?;
        let is_funny = tool.as_ref().is_some_and(|t| t.outcome);

        self.enter(inbound, OrchestratorState::Finalizing);
        if is_funny
            && let Err(e) = self.presence.signal_affect(presence).await
        {
            warn!(
                conversation = %inbound.conversation,
                failure_kind = %FailureKind::Signaling,
                error = %e,
                "failed to show affect reaction"
            );
        }

        let completion = self
            .bounded(self.completion.finalize(FinalizeRequest {
                text: inbound.text.clone(),
                tool,
                continuity_token: self
                    .conversations
                    .continuity_token(&inbound.conversation),
            }))
            .await?;
        Ok((completion, is_funny))
    }

    async fn bounded<T>(
        &self,
        round: impl Future<Output = Result<T, GiggleError>>,
    ) -> Result<T, GiggleError> {
        let duration = self.settings.completion_timeout;
        tokio::time::timeout(duration, round)
            .await
            .map_err(|_| GiggleError::Timeout { duration })?
    }

    async fn record_outcome(
        &self,
        inbound: &InboundMessage,
        id: RecordId,
        reply: &str,
        is_funny: bool,
    ) {
        if let Err(e) = self.storage.record_outcome(id, reply, is_funny).await {
            warn!(
                conversation = %inbound.conversation,
                record_id = %id,
                failure_kind = %FailureKind::Persistence,
                error = %e,
                "failed to record reply"
            );
        }
    }

    async fn fail(
        &self,
        inbound: &InboundMessage,
        kind: FailureKind,
        cause: &GiggleError,
    ) -> ProcessOutcome {
        self.enter(inbound, OrchestratorState::Failing);
        error!(
            conversation = %inbound.conversation,
            failure_kind = %kind,
            error = %cause,
            "message processing failed"
        );

        let apology = OutboundMessage::reply_to(inbound, &self.settings.apology_text);
        if let Err(e) = self.channel.send(apology).await {
            warn!(
                conversation = %inbound.conversation,
                failure_kind = %FailureKind::Delivery,
                error = %e,
                "failed to send apology"
            );
        }
        ProcessOutcome::Failed { kind }
    }
}
