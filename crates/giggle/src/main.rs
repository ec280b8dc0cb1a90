// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Giggle - a Telegram chat relay with humor detection.
//!
//! This is the binary entry point.

mod report;
mod serve;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

/// Giggle - a Telegram chat relay with humor detection.
#[derive(Parser, Debug)]
#[command(name = "giggle", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the bot and answer messages until interrupted.
    Serve,
    /// Show usage counters from the audit trail.
    Stats {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
    /// List recorded messages, newest first.
    Messages {
        /// Maximum number of messages to show.
        #[arg(long, default_value_t = 20)]
        limit: i64,
        /// Number of newest messages to skip.
        #[arg(long, default_value_t = 0)]
        offset: i64,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
    /// Validate the configuration and exit.
    CheckConfig,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match giggle_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            giggle_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Stats { json, plain }) => report::run_stats(&config, json, plain).await,
        Some(Commands::Messages {
            limit,
            offset,
            json,
            plain,
        }) => report::run_messages(&config, limit, offset, json, plain).await,
        Some(Commands::CheckConfig) => {
            println!(
                "giggle: config OK (agent.name={}, openai.model={})",
                config.agent.name, config.openai.model
            );
            Ok(())
        }
        None => {
            println!("giggle: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
