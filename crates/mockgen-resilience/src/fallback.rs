// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Priority-ordered provider fallback.

use std::sync::Arc;

use mockgen_core::types::{Generation, GenerationRequest};
use mockgen_core::{GenerationProvider, MockgenError};
use tracing::{debug, info, warn};

use crate::timeout::TimeoutBudget;

/// Tries providers in order (fastest first) and returns the first success.
///
/// Each provider is invoked at most once per [`generate`](Self::generate)
/// call, under the timeout budget for the requested object count. Provider
/// failures (rate limit, upstream error, empty text, timeout) move on to the
/// next provider without delay. Any other error aborts the chain.
pub struct FallbackOrchestrator {
    providers: Vec<Arc<dyn GenerationProvider>>,
    timeout: TimeoutBudget,
}

impl FallbackOrchestrator {
    pub fn new(providers: Vec<Arc<dyn GenerationProvider>>, timeout: TimeoutBudget) -> Self {
        Self { providers, timeout }
    }

    /// Provider names in priority order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<Generation, MockgenError> {
        let mut last_error = None;
        let mut attempts = 0;

        for provider in &self.providers {
            attempts += 1;
            let name = provider.name();
            debug!(provider = name, objects = request.object_count, "invoking provider");

            let outcome = self
                .timeout
                .run(name, request.object_count, provider.generate(request))
                .await;

            match outcome {
                Ok(raw_text) => {
                    info!(provider = name, attempts, "provider succeeded");
                    return Ok(Generation {
                        raw_text,
                        provider: name.to_string(),
                    });
                }
                Err(err) if err.is_provider_failure() => {
                    warn!(provider = name, error = %err, "provider failed, falling back");
                    last_error = Some(err.to_string());
                }
                Err(err) => return Err(err),
            }
        }

        Err(MockgenError::AllProvidersExhausted {
            attempts,
            last_error: last_error.unwrap_or_else(|| "no providers configured".to_string()),
        })
    }
}
