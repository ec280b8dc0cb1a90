// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Giggle relay.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Name of the single tool declared to the completion service.
pub const HUMOR_TOOL_NAME: &str = "is_funny";

/// Reply used when the final completion round carries no text content.
pub const FALLBACK_REPLY: &str = "I'm not sure what to say to that.";

/// Stable identifier of one conversation (one per chat).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationKey(pub String);

impl ConversationKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Platform identifier of a delivered or received message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Identifier of a persisted [`MessageRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the role an adapter plays.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Completion,
    Storage,
}

// --- Channel types ---

/// Who sent an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderProfile {
    /// Platform user id (as string).
    pub id: String,
    /// Platform handle, without a leading `@`.
    pub username: Option<String>,
    /// Display name.
    pub full_name: String,
}

/// An inbound text message received from a channel adapter.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Platform message id, used for reactions and reply threading.
    pub id: String,
    /// Channel adapter name (e.g. "telegram").
    pub channel: String,
    pub conversation: ConversationKey,
    pub sender: SenderProfile,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// An outbound plain-text message to be sent via a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub conversation: ConversationKey,
    pub content: String,
    /// Platform id of the message this one replies to.
    pub reply_to: Option<String>,
}

impl OutboundMessage {
    /// A reply threaded under `inbound`.
    pub fn reply_to(inbound: &InboundMessage, content: impl Into<String>) -> Self {
        Self {
            conversation: inbound.conversation.clone(),
            content: content.into(),
            reply_to: Some(inbound.id.clone()),
        }
    }
}

/// Capabilities reported by a channel adapter.
#[derive(Debug, Clone)]
pub struct ChannelCapabilities {
    pub supports_typing: bool,
    pub supports_reactions: bool,
    pub supports_delete: bool,
    pub max_message_length: Option<usize>,
}

// --- Completion types ---

/// A request from the completion service to evaluate a declared tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Service-assigned id linking the call to its output.
    pub call_id: String,
    pub name: String,
    /// Raw JSON arguments as produced by the service.
    pub arguments: String,
}

/// A tool invocation together with its locally resolved outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTool {
    pub invocation: ToolInvocation,
    pub outcome: bool,
}

/// Round one: classification with tool negotiation.
#[derive(Debug, Clone)]
pub struct NegotiateRequest {
    pub text: String,
}

/// Result of round one.
#[derive(Debug, Clone)]
pub struct Negotiation {
    /// The tool call the service chose to make, if any.
    pub tool_invocation: Option<ToolInvocation>,
    /// Service id of the round-one response (diagnostics only).
    pub response_id: String,
}

/// Round two: final answer.
#[derive(Debug, Clone)]
pub struct FinalizeRequest {
    pub text: String,
    pub tool: Option<ResolvedTool>,
    /// Continuity token of the previous turn in this conversation.
    pub continuity_token: Option<String>,
}

/// Result of round two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub reply_text: String,
    /// Token linking the next turn to this one.
    pub continuity_token: String,
}

// --- Storage types ---

/// Inbound fields of a message record, written before the exchange starts.
#[derive(Debug, Clone)]
pub struct InboundRecord {
    pub conversation: ConversationKey,
    pub sender: SenderProfile,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl InboundRecord {
    pub fn from_inbound(msg: &InboundMessage) -> Self {
        Self {
            conversation: msg.conversation.clone(),
            sender: msg.sender.clone(),
            content: msg.text.clone(),
            created_at: msg.timestamp,
        }
    }
}

/// A persisted message with its (possibly missing) outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageRecord {
    pub id: RecordId,
    pub user_id: i64,
    pub user_full_name: String,
    pub conversation: String,
    pub content: String,
    pub response: Option<String>,
    pub is_funny: Option<bool>,
    /// RFC 3339, UTC.
    pub created_at: String,
}

/// Aggregate counters over the audit trail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UsageStats {
    pub total_users: i64,
    pub active_users_today: i64,
    pub total_messages: i64,
    pub funny_messages: i64,
}
