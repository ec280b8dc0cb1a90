// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock completion adapter for deterministic testing.
//!
//! `MockCompletion` implements `CompletionAdapter` with scripted results for
//! each round, records every request, and can hold or delay round one so
//! tests can observe a conversation while it is in flight.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use giggle_core::traits::adapter::PluginAdapter;
use giggle_core::traits::completion::CompletionAdapter;
use giggle_core::types::{
    AdapterType, Completion, FinalizeRequest, HealthStatus, NegotiateRequest, Negotiation,
};
use giggle_core::GiggleError;

/// A mock completion service with FIFO-scripted results.
///
/// When a queue is empty, round one returns no tool call and round two
/// returns "mock response" with a fresh `mock-token-N`.
pub struct MockCompletion {
    negotiations: Mutex<VecDeque<Result<Negotiation, GiggleError>>>,
    completions: Mutex<VecDeque<Result<Completion, GiggleError>>>,
    negotiate_requests: Mutex<Vec<NegotiateRequest>>,
    finalize_requests: Mutex<Vec<FinalizeRequest>>,
    negotiate_started: Notify,
    gate: Mutex<Option<Arc<Notify>>>,
    delay: Mutex<Option<Duration>>,
    tokens: AtomicU64,
}

impl MockCompletion {
    pub fn new() -> Self {
        Self {
            negotiations: Mutex::new(VecDeque::new()),
            completions: Mutex::new(VecDeque::new()),
            negotiate_requests: Mutex::new(Vec::new()),
            finalize_requests: Mutex::new(Vec::new()),
            negotiate_started: Notify::new(),
            gate: Mutex::new(None),
            delay: Mutex::new(None),
            tokens: AtomicU64::new(1),
        }
    }

    /// Queue the result of the next round one.
    pub async fn push_negotiation(&self, result: Result<Negotiation, GiggleError>) {
        self.negotiations.lock().await.push_back(result);
    }

    /// Queue the result of the next round two.
    pub async fn push_completion(&self, result: Result<Completion, GiggleError>) {
        self.completions.lock().await.push_back(result);
    }

    /// Make round one wait until the returned gate is notified once.
    pub async fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().await = Some(Arc::clone(&gate));
        gate
    }

    /// Make round one sleep before answering.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.lock().await = Some(delay);
    }

    /// Wait until round one has been entered.
    pub async fn wait_for_negotiate(&self) {
        self.negotiate_started.notified().await;
    }

    pub async fn negotiate_requests(&self) -> Vec<NegotiateRequest> {
        self.negotiate_requests.lock().await.clone()
    }

    pub async fn finalize_requests(&self) -> Vec<FinalizeRequest> {
        self.finalize_requests.lock().await.clone()
    }
}

impl Default for MockCompletion {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockCompletion {
    fn name(&self) -> &str {
        "mock-completion"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Completion
    }

    async fn health_check(&self) -> Result<HealthStatus, GiggleError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), GiggleError> {
        Ok(())
    }
}

#[async_trait]
impl CompletionAdapter for MockCompletion {
    async fn negotiate(&self, request: NegotiateRequest) -> Result<Negotiation, GiggleError> {
        self.negotiate_requests.lock().await.push(request);
        self.negotiate_started.notify_one();

        let gate = self.gate.lock().await.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let delay = *self.delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.negotiations.lock().await.pop_front().unwrap_or_else(|| {
            Ok(Negotiation {
                tool_invocation: None,
                response_id: "mock-resp".to_string(),
            })
        })
    }

    async fn finalize(&self, request: FinalizeRequest) -> Result<Completion, GiggleError> {
        self.finalize_requests.lock().await.push(request);

        self.completions.lock().await.pop_front().unwrap_or_else(|| {
            let n = self.tokens.fetch_add(1, Ordering::SeqCst);
            Ok(Completion {
                reply_text: "mock response".to_string(),
                continuity_token: format!("mock-token-{n}"),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn defaults_when_queue_is_empty() {
        let completion = MockCompletion::new();
        let negotiation = completion
            .negotiate(NegotiateRequest { text: "hi".into() })
            .await
            .unwrap();
        assert!(negotiation.tool_invocation.is_none());

        let first = completion
            .finalize(FinalizeRequest {
                text: "hi".into(),
                tool: None,
                continuity_token: None,
            })
            .await
            .unwrap();
        assert_eq!(first.reply_text, "mock response");
        assert_eq!(first.continuity_token, "mock-token-1");
    }

    #[tokio::test]
    async fn scripted_errors_are_returned_in_order() {
        let completion = MockCompletion::new();
        completion
            .push_negotiation(Err(GiggleError::completion("boom")))
            .await;

        assert!(
            completion
                .negotiate(NegotiateRequest { text: "a".into() })
                .await
                .is_err()
        );
        assert!(
            completion
                .negotiate(NegotiateRequest { text: "b".into() })
                .await
                .is_ok()
        );
        assert_eq!(completion.negotiate_requests().await.len(), 2);
    }

    #[tokio::test]
    async fn hold_blocks_until_released() {
        let completion = Arc::new(MockCompletion::new());
        let gate = completion.hold().await;

        let worker = {
            let completion = Arc::clone(&completion);
            tokio::spawn(async move {
                completion
                    .negotiate(NegotiateRequest { text: "x".into() })
                    .await
            })
        };
        completion.wait_for_negotiate().await;
        assert!(!worker.is_finished());

        gate.notify_one();
        assert!(worker.await.unwrap().is_ok());
    }
}
