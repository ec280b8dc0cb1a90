// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `giggle stats` and `giggle messages` command implementations.
//!
//! Read the audit trail directly from the SQLite database. Output is a
//! colored table on a TTY, plain text with `--plain`, or JSON with `--json`.

use std::io::IsTerminal;

use giggle_config::GiggleConfig;
use giggle_core::error::GiggleError;
use giggle_core::{MessageRecord, StorageAdapter, UsageStats};
use giggle_storage::SqliteStorage;

/// Preview width of message text in the listing.
const PREVIEW_CHARS: usize = 48;

async fn open_storage(config: &GiggleConfig) -> Result<SqliteStorage, GiggleError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    Ok(storage)
}

/// Run the `giggle stats` command.
pub async fn run_stats(config: &GiggleConfig, json: bool, plain: bool) -> Result<(), GiggleError> {
    let storage = open_storage(config).await?;
    let stats = storage.stats(chrono::Utc::now().date_naive()).await?;
    storage.close().await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&stats).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print!("{}", render_stats(&stats, use_color));
    }
    Ok(())
}

/// Run the `giggle messages` command.
pub async fn run_messages(
    config: &GiggleConfig,
    limit: i64,
    offset: i64,
    json: bool,
    plain: bool,
) -> Result<(), GiggleError> {
    if limit < 1 || offset < 0 {
        return Err(GiggleError::Config(
            "--limit must be at least 1 and --offset must not be negative".to_string(),
        ));
    }

    let storage = open_storage(config).await?;
    let records = storage.list_messages(limit, offset).await?;
    storage.close().await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&records).unwrap_or_else(|_| "[]".to_string())
        );
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print!("{}", render_messages(&records, use_color));
    }
    Ok(())
}

fn render_stats(stats: &UsageStats, use_color: bool) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str("  giggle stats\n");
    out.push_str(&format!("  {}\n", "-".repeat(35)));

    let funny_share = if stats.total_messages > 0 {
        format!(
            " ({:.0}%)",
            stats.funny_messages as f64 * 100.0 / stats.total_messages as f64
        )
    } else {
        String::new()
    };

    let rows = [
        ("Users", stats.total_users.to_string()),
        ("Active today", stats.active_users_today.to_string()),
        ("Messages", stats.total_messages.to_string()),
        ("Funny", format!("{}{funny_share}", stats.funny_messages)),
    ];
    for (label, value) in rows {
        let value = if use_color {
            use colored::Colorize;
            value.bold().to_string()
        } else {
            value
        };
        out.push_str(&format!("    {:<13} {value}\n", format!("{label}:")));
    }
    out.push('\n');
    out
}

fn render_messages(records: &[MessageRecord], use_color: bool) -> String {
    if records.is_empty() {
        return "\n  no messages recorded\n\n".to_string();
    }

    let mut out = String::new();
    out.push('\n');
    for record in records {
        let marker = match (record.is_funny, use_color) {
            (Some(true), true) => {
                use colored::Colorize;
                "funny".yellow().to_string()
            }
            (Some(true), false) => "funny".to_string(),
            (Some(false), _) => "-".to_string(),
            (None, true) => {
                use colored::Colorize;
                "no reply".red().to_string()
            }
            (None, false) => "no reply".to_string(),
        };
        out.push_str(&format!(
            "  #{} {} {} [{}]\n",
            record.id, record.created_at, record.user_full_name, marker
        ));
        out.push_str(&format!("    > {}\n", preview(&record.content)));
        if let Some(response) = &record.response {
            out.push_str(&format!("    < {}\n", preview(response)));
        }
    }
    out.push('\n');
    out
}

/// First line of `text`, cut to [`PREVIEW_CHARS`] characters.
fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or("");
    if line.chars().count() > PREVIEW_CHARS || text.lines().nth(1).is_some() {
        let cut: String = line.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}…")
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use giggle_core::RecordId;

    fn record(id: i64, is_funny: Option<bool>, response: Option<&str>) -> MessageRecord {
        MessageRecord {
            id: RecordId(id),
            user_id: 1,
            user_full_name: "Ann Lee".to_string(),
            conversation: "1001".to_string(),
            content: "tell me a joke".to_string(),
            response: response.map(str::to_string),
            is_funny,
            created_at: "2026-10-19T12:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn preview_keeps_short_text() {
        assert_eq!(preview("hello"), "hello");
    }

    #[test]
    fn preview_cuts_long_and_multiline_text() {
        let long = "x".repeat(100);
        assert_eq!(preview(&long).chars().count(), PREVIEW_CHARS + 1);
        assert_eq!(preview("first\nsecond"), "first…");
    }

    #[test]
    fn stats_render_plain() {
        let stats = UsageStats {
            total_users: 2,
            active_users_today: 1,
            total_messages: 4,
            funny_messages: 1,
        };
        let out = render_stats(&stats, false);
        assert!(out.contains("Users:        2"));
        assert!(out.contains("Funny:        1 (25%)"));
    }

    #[test]
    fn stats_render_without_messages() {
        let out = render_stats(&UsageStats::default(), false);
        assert!(out.contains("Funny:        0\n"));
    }

    #[test]
    fn messages_render_plain() {
        let records = vec![
            record(2, Some(true), Some("Why did...")),
            record(1, None, None),
        ];
        let out = render_messages(&records, false);
        assert!(out.contains("#2 2026-10-19T12:00:00.000Z Ann Lee [funny]"));
        assert!(out.contains("    < Why did..."));
        assert!(out.contains("#1 2026-10-19T12:00:00.000Z Ann Lee [no reply]"));
    }

    #[test]
    fn empty_listing_says_so() {
        assert!(render_messages(&[], false).contains("no messages recorded"));
    }

    #[test]
    fn records_serialize_for_json_output() {
        let json = serde_json::to_string(&vec![record(1, Some(false), Some("ok"))]).unwrap();
        assert!(json.contains("\"is_funny\":false"));
        assert!(json.contains("\"response\":\"ok\""));
    }
}
