// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation provider variants over HTTP model endpoints.
//!
//! Each configured model becomes one [`HttpModelProvider`] implementing
//! [`GenerationProvider`]. All variants share one [`ModelClient`] but apply
//! their own sampling parameters, output token scaling and local rate window.

pub mod client;
pub mod prompt;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockgen_config::model::{ModelConfig, ProvidersConfig};
use mockgen_core::error::MockgenError;
use mockgen_core::traits::{GenerationProvider, PluginAdapter};
use mockgen_core::types::{AdapterType, GenerationRequest, HealthStatus};
use mockgen_resilience::{FallbackOrchestrator, RetryPolicy, SlidingWindow, TimeoutBudget};
use tracing::{debug, info};

use crate::client::ModelClient;
use crate::types::{GenerateContentRequest, GenerationConfig};

/// Environment variable consulted when `providers.api_key` is unset.
pub const API_KEY_ENV: &str = "MOCKGEN_API_KEY";

/// Output tokens reserved on top of the per-object allowance.
const OUTPUT_TOKEN_OVERHEAD: u32 = 256;

/// One model variant in the fallback chain.
pub struct HttpModelProvider {
    client: ModelClient,
    model: ModelConfig,
    window: Option<SlidingWindow>,
}

impl HttpModelProvider {
    pub fn new(client: ModelClient, model: ModelConfig) -> Self {
        let window = model.requests_per_minute.map(SlidingWindow::per_minute);
        Self {
            client,
            model,
            window,
        }
    }

    /// `min(tokens_per_object * count + overhead, max_output_tokens)`.
    pub fn output_token_limit(&self, object_count: u32) -> u32 {
        self.model
            .tokens_per_object
            .saturating_mul(object_count)
            .saturating_add(OUTPUT_TOKEN_OVERHEAD)
            .min(self.model.max_output_tokens)
    }

    fn generation_config(&self, object_count: u32) -> GenerationConfig {
        GenerationConfig {
            temperature: self.model.temperature,
            top_p: self.model.top_p,
            top_k: self.model.top_k,
            max_output_tokens: self.output_token_limit(object_count),
            response_mime_type: "application/json".to_string(),
        }
    }
}

#[async_trait]
impl PluginAdapter for HttpModelProvider {
    fn name(&self) -> &str {
        &self.model.name
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, MockgenError> {
        // Probing upstream would spend quota.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MockgenError> {
        debug!(provider = %self.model.name, "provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl GenerationProvider for HttpModelProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, MockgenError> {
        if let Some(window) = &self.window
            && let Err(retry_after) = window.try_acquire()
        {
            return Err(MockgenError::RateLimited {
                provider: self.model.name.clone(),
                message: format!(
                    "local request budget exhausted, retry in {}s",
                    retry_after.as_secs().max(1)
                ),
            });
        }

        let body = GenerateContentRequest::from_prompt(
            prompt::build_prompt(request),
            self.generation_config(request.object_count),
        );
        self.client.generate_content(&self.model.name, &body).await
    }
}

/// Resolve the API key: config value first, then the environment.
pub fn resolve_api_key(
    config_key: Option<&str>,
    env_key: Option<String>,
) -> Result<String, MockgenError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.to_string());
    }
    env_key.filter(|k| !k.is_empty()).ok_or_else(|| {
        MockgenError::Config(format!(
            "provider API key not found. Set providers.api_key in config or the {API_KEY_ENV} environment variable."
        ))
    })
}

/// Build every configured model variant in priority order.
pub fn build_providers(
    config: &ProvidersConfig,
) -> Result<Vec<Arc<dyn GenerationProvider>>, MockgenError> {
    let api_key = resolve_api_key(config.api_key.as_deref(), std::env::var(API_KEY_ENV).ok())?;
    let client = ModelClient::new(
        &api_key,
        &config.base_url,
        RetryPolicy::new(
            config.max_retries,
            Duration::from_millis(config.retry_base_delay_ms),
        ),
    )?;

    let providers: Vec<Arc<dyn GenerationProvider>> = config
        .models
        .iter()
        .map(|model| {
            Arc::new(HttpModelProvider::new(client.clone(), model.clone()))
                as Arc<dyn GenerationProvider>
        })
        .collect();

    info!(
        models = ?config.models.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
        "generation providers initialized"
    );
    Ok(providers)
}

/// Timeout budget for provider calls from config.
pub fn timeout_budget(config: &ProvidersConfig) -> TimeoutBudget {
    TimeoutBudget::new(
        Duration::from_millis(config.timeout_base_ms),
        Duration::from_millis(config.timeout_per_object_ms),
        Duration::from_millis(config.timeout_cap_ms),
    )
}

/// Providers plus timeout budget, ready for the job runner.
pub fn build_orchestrator(config: &ProvidersConfig) -> Result<FallbackOrchestrator, MockgenError> {
    Ok(FallbackOrchestrator::new(
        build_providers(config)?,
        timeout_budget(config),
    ))
}
