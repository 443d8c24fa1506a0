// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted generation provider for deterministic testing.
//!
//! `MockProvider` implements `GenerationProvider` by replaying a FIFO script
//! of outcomes, so fallback and job tests run without any upstream model.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use mockgen_core::traits::adapter::PluginAdapter;
use mockgen_core::traits::provider::GenerationProvider;
use mockgen_core::types::{AdapterType, GenerationRequest, HealthStatus};
use mockgen_core::MockgenError;

/// One scripted provider outcome.
#[derive(Debug)]
pub enum Step {
    Reply(String),
    Fail(MockgenError),
    /// Sleep, then reply. Drives timeout tests.
    Stall(Duration, String),
    Panic(&'static str),
}

/// A provider that returns pre-configured outcomes in order.
///
/// When the script runs dry every further call fails with a 500-style
/// provider error, so a forgotten step shows up as a fallback rather than a
/// hang.
pub struct MockProvider {
    name: String,
    script: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self::scripted(name, Vec::new())
    }

    /// A provider that replays `steps` in order.
    pub fn scripted(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(VecDeque::from(steps)),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider pre-loaded with successful replies.
    pub fn with_responses(name: impl Into<String>, responses: Vec<String>) -> Self {
        Self::scripted(name, responses.into_iter().map(Step::Reply).collect())
    }

    /// A provider rate limited on its next `times` calls.
    pub fn rate_limited(name: impl Into<String>, times: usize) -> Self {
        let name = name.into();
        let steps = (0..times)
            .map(|_| {
                Step::Fail(MockgenError::RateLimited {
                    provider: name.clone(),
                    message: "resource exhausted".into(),
                })
            })
            .collect();
        Self::scripted(name, steps)
    }

    pub async fn push(&self, step: Step) {
        self.script.lock().await.push_back(step);
    }

    pub async fn push_reply(&self, text: impl Into<String>) {
        self.push(Step::Reply(text.into())).await;
    }

    /// An upstream failure as the HTTP client would report it.
    pub fn server_error(provider: &str, status: u16) -> MockgenError {
        MockgenError::Provider {
            provider: provider.to_string(),
            status: Some(status),
            message: format!("upstream returned {status}"),
        }
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests seen so far, oldest first.
    pub async fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, MockgenError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MockgenError> {
        Ok(())
    }
}

#[async_trait]
impl GenerationProvider for MockProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, MockgenError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request.clone());

        let step = self.script.lock().await.pop_front();
        match step {
            Some(Step::Reply(text)) => Ok(text),
            Some(Step::Fail(err)) => Err(err),
            Some(Step::Stall(delay, text)) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            Some(Step::Panic(message)) => panic!("{message}"),
            None => Err(MockgenError::Provider {
                provider: self.name.clone(),
                status: Some(500),
                message: "mock script exhausted".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_script_in_order() {
        let provider = MockProvider::with_responses("fast", vec!["a".into(), "b".into()]);
        let request = GenerationRequest::new("x", 1);
        assert_eq!(provider.generate(&request).await.unwrap(), "a");
        assert_eq!(provider.generate(&request).await.unwrap(), "b");
        assert!(matches!(
            provider.generate(&request).await.unwrap_err(),
            MockgenError::Provider { status: Some(500), .. }
        ));
        assert_eq!(provider.calls(), 3);
        assert_eq!(provider.requests().await.len(), 3);
    }

    #[tokio::test]
    async fn rate_limited_fails_requested_times() {
        let provider = MockProvider::rate_limited("quality", 2);
        let request = GenerationRequest::new("x", 1);
        for _ in 0..2 {
            assert!(matches!(
                provider.generate(&request).await.unwrap_err(),
                MockgenError::RateLimited { .. }
            ));
        }
    }
}
