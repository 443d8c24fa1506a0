// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the `generateContent` model endpoint.
//!
//! Handles authentication, status classification and transient error retry.

use std::time::Duration;

use mockgen_core::MockgenError;
use mockgen_resilience::RetryPolicy;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, GenerateContentRequest, GenerateContentResponse};

/// Shared HTTP client for every model variant.
///
/// Cloning is cheap; the connection pool is shared.
#[derive(Debug, Clone)]
pub struct ModelClient {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl ModelClient {
    pub fn new(api_key: &str, base_url: &str, retry: RetryPolicy) -> Result<Self, MockgenError> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|e| MockgenError::Config(format!("invalid API key header value: {e}")))?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| MockgenError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }

    /// Call `model` and return its generated text.
    ///
    /// 429 and 503 responses are retried with exponential backoff. The text
    /// is read from `candidates[0].content.parts[0].text`.
    pub async fn generate_content(
        &self,
        model: &str,
        body: &GenerateContentRequest,
    ) -> Result<String, MockgenError> {
        let url = self.endpoint(model);
        let url = url.as_str();
        self.retry
            .run(model, move |attempt| async move {
                self.send_once(model, url, body, attempt).await
            })
            .await
    }

    async fn send_once(
        &self,
        model: &str,
        url: &str,
        body: &GenerateContentRequest,
        attempt: u32,
    ) -> Result<String, MockgenError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| MockgenError::Provider {
                provider: model.to_string(),
                status: None,
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        debug!(provider = model, status = %status, attempt, "generation response received");

        let text = response.text().await.map_err(|e| MockgenError::Provider {
            provider: model.to_string(),
            status: Some(status.as_u16()),
            message: format!("failed to read response body: {e}"),
        })?;

        if status.is_success() {
            let parsed: GenerateContentResponse =
                serde_json::from_str(&text).map_err(|e| MockgenError::Provider {
                    provider: model.to_string(),
                    status: Some(status.as_u16()),
                    message: format!("failed to parse API response: {e}"),
                })?;
            if parsed.hit_token_limit() {
                warn!(provider = model, "model output stopped at the token limit");
            }
            return parsed
                .first_text()
                .map(str::to_string)
                .ok_or_else(|| MockgenError::EmptyResponse {
                    provider: model.to_string(),
                });
        }

        Err(classify_failure(model, status, &text))
    }
}

/// Map a non-success response to the provider error taxonomy.
fn classify_failure(model: &str, status: StatusCode, body: &str) -> MockgenError {
    let message = match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(api_err) => match api_err.error.status {
            Some(kind) => format!("{kind}: {}", api_err.error.message),
            None => api_err.error.message,
        },
        Err(_) => format!("API returned {status}: {body}"),
    };

    if status == StatusCode::TOO_MANY_REQUESTS {
        MockgenError::RateLimited {
            provider: model.to_string(),
            message,
        }
    } else {
        MockgenError::Provider {
            provider: model.to_string(),
            status: Some(status.as_u16()),
            message,
        }
    }
}
