// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Giggle chat relay.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Giggle configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GiggleConfig {
    /// Relay behavior and user-facing texts.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Telegram bot integration settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// OpenAI Responses API settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Prometheus metrics settings.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Relay behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the bot, used in logs.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Inline system instructions. Overridden by `system_prompt_file` if both set.
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Path to a file containing the system instructions.
    #[serde(default)]
    pub system_prompt_file: Option<String>,

    /// Reply to `/start`.
    #[serde(default = "default_welcome_text")]
    pub welcome_text: String,

    /// Notice sent when a message arrives while the previous one is in flight.
    #[serde(default = "default_busy_text")]
    pub busy_text: String,

    /// Seconds before the busy notice is deleted. `0` keeps it.
    #[serde(default = "default_busy_notice_ttl_secs")]
    pub busy_notice_ttl_secs: u64,

    /// Reply sent when processing fails.
    #[serde(default = "default_apology_text")]
    pub apology_text: String,

    /// Reaction shown on the user's message while a reply is being produced.
    #[serde(default = "default_placeholder_reaction")]
    pub placeholder_reaction: String,

    /// Reaction set when the message is classified as funny.
    #[serde(default = "default_affect_reaction")]
    pub affect_reaction: String,

    /// Maximum number of conversations tracked in memory.
    #[serde(default = "default_conversation_capacity")]
    pub conversation_capacity: usize,

    /// Upper bound for each completion round.
    #[serde(default = "default_completion_timeout_secs")]
    pub completion_timeout_secs: u64,

    /// How long shutdown waits for in-flight messages.
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            system_prompt: None,
            system_prompt_file: None,
            welcome_text: default_welcome_text(),
            busy_text: default_busy_text(),
            busy_notice_ttl_secs: default_busy_notice_ttl_secs(),
            apology_text: default_apology_text(),
            placeholder_reaction: default_placeholder_reaction(),
            affect_reaction: default_affect_reaction(),
            conversation_capacity: default_conversation_capacity(),
            completion_timeout_secs: default_completion_timeout_secs(),
            drain_timeout_secs: default_drain_timeout_secs(),
        }
    }
}

fn default_agent_name() -> String {
    "giggle".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_welcome_text() -> String {
    "Привет! Я бот на базе OpenAI.".to_string()
}

fn default_busy_text() -> String {
    "Please wait, I'm still answering your previous message.".to_string()
}

fn default_busy_notice_ttl_secs() -> u64 {
    5
}

fn default_apology_text() -> String {
    "Sorry, something went wrong. Please try again.".to_string()
}

fn default_placeholder_reaction() -> String {
    "👀".to_string()
}

fn default_affect_reaction() -> String {
    "🤣".to_string()
}

fn default_conversation_capacity() -> usize {
    10_000
}

fn default_completion_timeout_secs() -> u64 {
    90
}

fn default_drain_timeout_secs() -> u64 {
    30
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. Required by `giggle serve`.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Allowed Telegram user IDs or usernames. Empty admits everyone.
    #[serde(default)]
    pub allowed_users: Vec<String>,

    /// Only answer private chats.
    #[serde(default)]
    pub dm_only: bool,
}

/// OpenAI Responses API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// API key. `None` falls back to the `OPENAI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the API, without the trailing `/responses`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for both completion rounds.
    #[serde(default = "default_model")]
    pub model: String,

    /// Per-request HTTP timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Optional cap on output tokens per round.
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            request_timeout_secs: default_request_timeout_secs(),
            max_output_tokens: None,
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("giggle").join("giggle.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("giggle.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Prometheus metrics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder.
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,

    /// Address of the `/metrics` scrape endpoint, e.g. `127.0.0.1:9464`.
    /// Without it the metrics are only logged at shutdown.
    #[serde(default)]
    pub listen_addr: Option<String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            listen_addr: None,
        }
    }
}

fn default_metrics_enabled() -> bool {
    true
}
