// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown coordination with signal handling.
//!
//! Installs handlers for SIGTERM and SIGINT (Ctrl+C), triggering a
//! [`CancellationToken`] that the agent loop monitors. In-flight messages
//! are drained before the process exits.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is received.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Closes `tracker` and waits up to `timeout` for its tasks to finish.
///
/// Returns `true` if every task finished in time.
pub async fn drain_tasks(tracker: &TaskTracker, timeout: Duration) -> bool {
    tracker.close();
    if tracker.is_empty() {
        info!("no in-flight messages to drain");
        return true;
    }

    info!(count = tracker.len(), "waiting for in-flight messages to complete");
    match tokio::time::timeout(timeout, tracker.wait()).await {
        Ok(()) => {
            info!("all in-flight messages drained");
            true
        }
        Err(_) => {
            warn!(
                remaining = tracker.len(),
                "timeout reached, some messages interrupted"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn install_signal_handler_returns_token() {
        let token = install_signal_handler();
        assert!(!token.is_cancelled());
        token.cancel();
    }

    #[tokio::test]
    async fn drain_empty_tracker() {
        let tracker = TaskTracker::new();
        assert!(drain_tasks(&tracker, Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn drain_waits_for_running_tasks() {
        let tracker = TaskTracker::new();
        tracker.spawn(tokio::time::sleep(Duration::from_millis(20)));
        assert!(drain_tasks(&tracker, Duration::from_secs(1)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn drain_gives_up_after_timeout() {
        let tracker = TaskTracker::new();
        tracker.spawn(tokio::time::sleep(Duration::from_secs(600)));
        assert!(!drain_tasks(&tracker, Duration::from_secs(1)).await);
    }
}
