// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error taxonomy shared by every mockgen crate.

use thiserror::Error;

use crate::types::JobStatus;

/// The primary error type used across all mockgen adapter traits and services.
#[derive(Debug, Error)]
pub enum MockgenError {
    /// Configuration errors (invalid TOML, missing credentials, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Request input rejected before any state was touched.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The user's credit balance is below the generation threshold.
    #[error("insufficient credits: balance {balance}, at least {required} required")]
    InsufficientCredits { balance: i64, required: i64 },

    /// Upstream model signalled throttling (HTTP 429 or a local rate window).
    #[error("provider {provider} rate limited: {message}")]
    RateLimited { provider: String, message: String },

    /// Any other upstream failure: 5xx, malformed request, transport error, timeout.
    #[error("provider {provider} failed: {message}")]
    Provider {
        provider: String,
        status: Option<u16>,
        message: String,
    },

    /// The upstream call succeeded but produced no text.
    #[error("provider {provider} returned an empty response")]
    EmptyResponse { provider: String },

    /// Every provider in the fallback chain failed.
    #[error("all {attempts} providers failed; last error: {last_error}")]
    AllProvidersExhausted { attempts: usize, last_error: String },

    /// Model output could not be repaired into a non-empty array of objects.
    #[error("malformed model output: {0}")]
    MalformedOutput(String),

    /// A job, user or resource does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The resource exists but is not published.
    #[error("resource {resource_id} is not live")]
    NotLive { resource_id: String },

    /// A resource references a user that does not exist.
    #[error("resource {resource_id} references missing owner {user_id}")]
    OwnerMissing { resource_id: String, user_id: String },

    /// The owner's monthly live-data quota is used up.
    #[error("monthly request quota exceeded: {used}/{limit}")]
    QuotaExceeded { limit: u64, used: u64 },

    /// Operation not allowed in the job's current status.
    #[error("job {job_id} is {status}, operation not allowed")]
    InvalidState { job_id: String, status: JobStatus },

    /// A status update would move a job backwards or sideways.
    #[error("job {job_id} cannot move from {from} to {to}")]
    InvalidTransition {
        job_id: String,
        from: JobStatus,
        to: JobStatus,
    },

    /// A job run stopped before reaching a terminal status (shutdown or crash).
    #[error("job run interrupted: {0}")]
    Interrupted(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MockgenError {
    /// Stable machine-readable code, persisted next to the human-readable job error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Storage { .. } => "storage",
            Self::Validation(_) => "validation",
            Self::InsufficientCredits { .. } => "insufficient_credits",
            Self::RateLimited { .. } => "rate_limited",
            Self::Provider { .. } => "provider_error",
            Self::EmptyResponse { .. } => "empty_response",
            Self::AllProvidersExhausted { .. } => "all_providers_exhausted",
            Self::MalformedOutput(_) => "malformed_output",
            Self::NotFound { .. } => "not_found",
            Self::NotLive { .. } => "not_live",
            Self::OwnerMissing { .. } => "owner_missing",
            Self::QuotaExceeded { .. } => "quota_exceeded",
            Self::InvalidState { .. } => "invalid_state",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::Interrupted(_) => "interrupted",
            Self::Internal(_) => "internal",
        }
    }

    /// Failures the fallback orchestrator recovers from by moving to the next provider.
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Provider { .. } | Self::EmptyResponse { .. }
        )
    }

    /// Transient upstream failures a single provider call may retry: 429 and 503.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Provider { status, .. } => *status == Some(503),
            _ => false,
        }
    }

    /// Wraps any storage-layer error.
    pub fn storage(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Storage {
            source: source.into(),
        }
    }
}
