// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `giggle serve` command implementation.
//!
//! Opens the SQLite audit trail, builds the OpenAI completion client,
//! connects the Telegram channel and runs the agent loop until a shutdown
//! signal arrives.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use giggle_agent::{AgentLoop, recording, shutdown};
use giggle_config::GiggleConfig;
use giggle_config::model::MetricsConfig;
use giggle_core::error::GiggleError;
use giggle_core::{ChannelAdapter, StorageAdapter};
use giggle_openai::OpenAiCompletion;
use giggle_storage::SqliteStorage;
use giggle_telegram::TelegramChannel;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Runs the `giggle serve` command.
pub async fn run_serve(config: GiggleConfig) -> Result<(), GiggleError> {
    init_tracing(&config.agent.log_level);

    info!(name = %config.agent.name, model = %config.openai.model, "starting giggle serve");

    let metrics_handle = if config.metrics.enabled {
        match install_metrics(&config.metrics) {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "prometheus initialization failed, continuing without metrics");
                None
            }
        }
    } else {
        debug!("prometheus metrics disabled by configuration");
        None
    };

    let storage = {
        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        Arc::new(storage)
    };

    let completion = Arc::new(OpenAiCompletion::new(&config).await?);

    let mut channel = TelegramChannel::new(config.telegram.clone())?;
    channel.connect().await?;
    let channel = Arc::new(channel);

    let cancel = shutdown::install_signal_handler();

    {
        let mem_cancel = cancel.clone();
        tokio::spawn(async move {
            memory_monitor(mem_cancel).await;
        });
    }

    let agent_loop = AgentLoop::new(channel, completion, storage, &config.agent);
    agent_loop.run(cancel).await?;

    if let Some(handle) = metrics_handle {
        info!(metrics = %handle.render(), "final metrics snapshot");
    }
    info!("giggle serve shutdown complete");
    Ok(())
}

/// Publishes allocator statistics as gauges once a minute.
#[cfg(not(target_env = "msvc"))]
async fn memory_monitor(cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let _ = tikv_jemalloc_ctl::epoch::advance();
                let allocated = tikv_jemalloc_ctl::stats::allocated::read().unwrap_or(0);
                let resident = tikv_jemalloc_ctl::stats::resident::read().unwrap_or(0);
                recording::set_memory_usage(allocated, resident);
                tracing::debug!(
                    allocated_mb = allocated / (1024 * 1024),
                    resident_mb = resident / (1024 * 1024),
                    "memory usage"
                );
            }
            _ = cancel.cancelled() => {
                info!("memory monitor shutting down");
                break;
            }
        }
    }
}

/// Stub memory monitor for MSVC (no jemalloc).
#[cfg(target_env = "msvc")]
async fn memory_monitor(cancel: CancellationToken) {
    cancel.cancelled().await;
}

/// Installs the Prometheus recorder globally, with a `/metrics` scrape
/// endpoint when `listen_addr` is set.
fn install_metrics(config: &MetricsConfig) -> Result<PrometheusHandle, GiggleError> {
    let builder = PrometheusBuilder::new();
    let handle = match config.listen_addr.as_deref() {
        Some(addr) => {
            let addr: SocketAddr = addr.parse().map_err(|e| {
                GiggleError::Config(format!("invalid metrics.listen_addr `{addr}`: {e}"))
            })?;
            let (recorder, exporter) = builder.with_http_listener(addr).build().map_err(|e| {
                GiggleError::Internal(format!("failed to build Prometheus exporter: {e}"))
            })?;
            let handle = recorder.handle();
            metrics::set_global_recorder(recorder).map_err(|e| {
                GiggleError::Internal(format!("failed to install Prometheus recorder: {e}"))
            })?;
            tokio::spawn(async move {
                if let Err(e) = exporter.await {
                    warn!(error = ?e, "prometheus exporter stopped");
                }
            });
            info!(%addr, "prometheus metrics endpoint listening");
            handle
        }
        None => builder.install_recorder().map_err(|e| {
            GiggleError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?,
    };

    recording::register_metrics();
    info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("giggle={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
