// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::GiggleConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every violation instead of failing on the first one.
pub fn validate_config(config: &GiggleConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        fail(format!(
            "agent.log_level `{}` is not one of {}",
            config.agent.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    for (key, value) in [
        ("agent.welcome_text", &config.agent.welcome_text),
        ("agent.busy_text", &config.agent.busy_text),
        ("agent.apology_text", &config.agent.apology_text),
        ("agent.placeholder_reaction", &config.agent.placeholder_reaction),
        ("agent.affect_reaction", &config.agent.affect_reaction),
        ("openai.model", &config.openai.model),
        ("storage.database_path", &config.storage.database_path),
    ] {
        if value.trim().is_empty() {
            fail(format!("{key} must not be empty"));
        }
    }

    if config.agent.conversation_capacity == 0 {
        fail("agent.conversation_capacity must be at least 1".to_string());
    }

    if config.agent.completion_timeout_secs == 0 {
        fail("agent.completion_timeout_secs must be at least 1".to_string());
    }

    if config.openai.request_timeout_secs == 0 {
        fail("openai.request_timeout_secs must be at least 1".to_string());
    }

    let base_url = config.openai.base_url.trim();
    if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
        fail(format!(
            "openai.base_url `{base_url}` must start with http:// or https://"
        ));
    }

    if let Some(token) = &config.telegram.bot_token
        && !token.contains(':')
    {
        fail("telegram.bot_token does not look like a Bot API token (`<id>:<secret>`)".to_string());
    }

    if let Some(addr) = &config.metrics.listen_addr
        && addr.parse::<std::net::SocketAddr>().is_err()
    {
        fail(format!(
            "metrics.listen_addr `{addr}` is not a socket address (`host:port`)"
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
