// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; `giggle serve` installs the Prometheus
//! recorder that collects them.

use metrics::{describe_counter, describe_gauge};

use crate::orchestrator::ProcessOutcome;

/// Register all Giggle metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "giggle_messages_total",
        "Inbound messages processed, by outcome"
    );
    describe_gauge!("giggle_memory_heap_bytes", "Bytes allocated by the heap");
    describe_gauge!(
        "giggle_memory_resident_bytes",
        "Bytes of physical memory mapped by the allocator"
    );
}

/// Record how one inbound message ended.
pub fn record_outcome(outcome: &ProcessOutcome) {
    metrics::counter!("giggle_messages_total", "outcome" => outcome.label()).increment(1);
}

/// Publish allocator statistics.
pub fn set_memory_usage(allocated: usize, resident: usize) {
    metrics::gauge!("giggle_memory_heap_bytes").set(allocated as f64);
    metrics::gauge!("giggle_memory_resident_bytes").set(resident as f64);
}
