// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the OpenAI Responses API.
//!
//! [`OpenAiClient`] handles authentication, request timeouts, and a single
//! retry on transient statuses (429, 500, 502, 503).

use std::time::Duration;

use giggle_core::GiggleError;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, ResponsesRequest, ResponsesResponse};

/// HTTP client for Responses API communication.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
    max_retries: u32,
}

impl OpenAiClient {
    /// Creates a client for `{base_url}/responses`.
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, GiggleError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| GiggleError::Config(format!("invalid API key header value: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| GiggleError::Completion {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/responses", base_url.trim_end_matches('/')),
            timeout,
            max_retries: 1,
        })
    }

    /// Sends one `POST /responses` request and parses the body.
    ///
    /// On a transient status, retries once after a one-second delay.
    pub async fn create_response(
        &self,
        request: &ResponsesRequest,
    ) -> Result<ResponsesResponse, GiggleError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying responses request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .json(request)
                .send()
                .await
                .map_err(|e| self.transport_error(e))?;

            let status = response.status();
            debug!(status = %status, attempt, "responses API replied");

            if status.is_success() {
                let body = response.text().await.map_err(|e| self.transport_error(e))?;
                return serde_json::from_str(&body).map_err(|e| GiggleError::Completion {
                    message: format!("failed to parse API response: {e}"),
                    source: Some(Box::new(e)),
                });
            }

            let body = response.text().await.unwrap_or_default();
            let error = GiggleError::completion(describe_error(status, &body));

            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, "transient error, will retry");
                last_error = Some(error);
                continue;
            }
            return Err(error);
        }

        Err(last_error
            .unwrap_or_else(|| GiggleError::completion("responses request failed after retries")))
    }

    fn transport_error(&self, e: reqwest::Error) -> GiggleError {
        if e.is_timeout() {
            return GiggleError::Timeout {
                duration: self.timeout,
            };
        }
        GiggleError::Completion {
            message: format!("HTTP request failed: {e}"),
            source: Some(Box::new(e)),
        }
    }
}

fn describe_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(api) => format!(
            "OpenAI API error {status} ({}): {}",
            api.error.type_.as_deref().unwrap_or("unknown"),
            api.error.message
        ),
        Err(_) => format!("API returned {status}: {body}"),
    }
}

/// Status codes worth one retry.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503)
}
