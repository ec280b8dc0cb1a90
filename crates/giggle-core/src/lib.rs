// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Giggle chat relay.
//!
//! This crate provides the trait definitions, error types, and common types
//! shared by the channel, completion, and storage adapters and by the
//! orchestrator that drives them.

pub mod error;
pub mod traits;
pub mod types;

pub use error::GiggleError;
pub use types::{
    AdapterType, ChannelCapabilities, Completion, ConversationKey, FALLBACK_REPLY,
    FinalizeRequest, HUMOR_TOOL_NAME, HealthStatus, InboundMessage, InboundRecord, MessageId,
    MessageRecord, NegotiateRequest, Negotiation, OutboundMessage, RecordId, ResolvedTool,
    SenderProfile, ToolInvocation, UsageStats,
};

pub use traits::{ChannelAdapter, CompletionAdapter, PluginAdapter, StorageAdapter};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn inbound() -> InboundMessage {
        InboundMessage {
            id: "42".into(),
            channel: "telegram".into(),
            conversation: ConversationKey::from("1001"),
            sender: SenderProfile {
                id: "7".into(),
                username: Some("ann".into()),
                full_name: "Ann Lee".into(),
            },
            text: "tell me a joke".into(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn error_display_messages() {
        let err = GiggleError::completion("bad status 500");
        assert_eq!(err.to_string(), "completion error: bad status 500");

        let err = GiggleError::Storage {
            source: Box::new(std::io::Error::other("disk full")),
        };
        assert_eq!(err.to_string(), "storage error: disk full");

        let err = GiggleError::Timeout {
            duration: std::time::Duration::from_secs(90),
        };
        assert!(err.to_string().contains("90s"));
    }

    #[test]
    fn adapter_type_round_trips_through_strum() {
        use std::str::FromStr;

        for variant in [
            AdapterType::Channel,
            AdapterType::Completion,
            AdapterType::Storage,
        ] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn reply_threads_under_inbound() {
        let msg = inbound();
        let out = OutboundMessage::reply_to(&msg, "Why did...");
        assert_eq!(out.conversation, msg.conversation);
        assert_eq!(out.reply_to.as_deref(), Some("42"));
        assert_eq!(out.content, "Why did...");
    }

    #[test]
    fn inbound_record_copies_sender_and_text() {
        let msg = inbound();
        let record = InboundRecord::from_inbound(&msg);
        assert_eq!(record.sender.full_name, "Ann Lee");
        assert_eq!(record.content, "tell me a joke");
        assert_eq!(record.created_at, msg.timestamp);
    }

    #[test]
    fn conversation_key_displays_raw_value() {
        assert_eq!(ConversationKey::from("-100").to_string(), "-100");
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_channel_adapter<T: ChannelAdapter>() {}
        fn _assert_completion_adapter<T: CompletionAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
    }
}
