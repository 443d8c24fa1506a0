// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use mockgen_core::QuotaLimits;
use serde::{Deserialize, Serialize};

/// Top-level mockgen configuration.
///
/// Every section is optional and defaults to a working local setup.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MockgenConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Generation providers, in fallback priority order.
    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub credits: CreditsConfig,

    /// Monthly live-data request limits.
    #[serde(default)]
    pub quota: QuotaConfig,

    #[serde(default)]
    pub retention: RetentionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token protecting the job API. `None` rejects every job API call.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Serve the public live-data endpoint with permissive CORS.
    #[serde(default = "default_true")]
    pub cors_allow_any: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_token: None,
            cors_allow_any: true,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_true() -> bool {
    true
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("mockgen").join("mockgen.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("mockgen.db"))
        .to_string_lossy()
        .into_owned()
}

/// Latency/quota class of a model variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProfile {
    Fast,
    Balanced,
    Quality,
}

/// Shared settings for every generation provider plus the model list.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProvidersConfig {
    /// API key. `None` falls back to the `MOCKGEN_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Attempts per provider call, including the first.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "default_timeout_base_ms")]
    pub timeout_base_ms: u64,

    #[serde(default = "default_timeout_per_object_ms")]
    pub timeout_per_object_ms: u64,

    #[serde(default = "default_timeout_cap_ms")]
    pub timeout_cap_ms: u64,

    /// Model variants in priority order (fastest first).
    #[serde(default = "default_models")]
    pub models: Vec<ModelConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            timeout_base_ms: default_timeout_base_ms(),
            timeout_per_object_ms: default_timeout_per_object_ms(),
            timeout_cap_ms: default_timeout_cap_ms(),
            models: default_models(),
        }
    }
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

fn default_timeout_base_ms() -> u64 {
    3000
}

fn default_timeout_per_object_ms() -> u64 {
    100
}

fn default_timeout_cap_ms() -> u64 {
    9500
}

fn default_models() -> Vec<ModelConfig> {
    vec![
        ModelConfig {
            name: "gemini-2.0-flash-lite".to_string(),
            profile: ModelProfile::Fast,
            temperature: 0.7,
            top_p: 0.9,
            top_k: 40,
            tokens_per_object: 60,
            max_output_tokens: 4096,
            requests_per_minute: None,
        },
        ModelConfig {
            name: "gemini-2.0-flash".to_string(),
            profile: ModelProfile::Balanced,
            temperature: 0.8,
            top_p: 0.95,
            top_k: 40,
            tokens_per_object: 80,
            max_output_tokens: 8192,
            requests_per_minute: None,
        },
        ModelConfig {
            name: "gemini-2.5-pro".to_string(),
            profile: ModelProfile::Quality,
            temperature: 0.9,
            top_p: 0.95,
            top_k: 64,
            tokens_per_object: 100,
            max_output_tokens: 8192,
            requests_per_minute: None,
        },
    ]
}

/// One model variant in the fallback chain.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    pub name: String,
    pub profile: ModelProfile,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    /// Output token allowance per requested object.
    pub tokens_per_object: u32,
    /// Hard ceiling on output tokens regardless of object count.
    pub max_output_tokens: u32,
    /// Local request budget. `None` leaves throttling to upstream.
    #[serde(default)]
    pub requests_per_minute: Option<u32>,
}

/// Generation credit policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CreditsConfig {
    /// Balance below which free-tier users are refused.
    #[serde(default = "default_one")]
    pub min_balance: i64,

    #[serde(default = "default_one")]
    pub cost_per_generation: i64,

    /// Balance given to users provisioned without an explicit amount.
    #[serde(default = "default_initial_balance")]
    pub initial_balance: i64,

    #[serde(default = "default_max_objects_per_job")]
    pub max_objects_per_job: u32,
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            min_balance: 1,
            cost_per_generation: 1,
            initial_balance: default_initial_balance(),
            max_objects_per_job: default_max_objects_per_job(),
        }
    }
}

fn default_one() -> i64 {
    1
}

fn default_initial_balance() -> i64 {
    10
}

fn default_max_objects_per_job() -> u32 {
    100
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QuotaConfig {
    #[serde(default = "default_free_monthly_requests")]
    pub free_monthly_requests: u64,

    #[serde(default = "default_pro_monthly_requests")]
    pub pro_monthly_requests: u64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            free_monthly_requests: default_free_monthly_requests(),
            pro_monthly_requests: default_pro_monthly_requests(),
        }
    }
}

impl QuotaConfig {
    pub fn limits(&self) -> QuotaLimits {
        QuotaLimits {
            free: self.free_monthly_requests,
            pro: self.pro_monthly_requests,
        }
    }
}

fn default_free_monthly_requests() -> u64 {
    1000
}

fn default_pro_monthly_requests() -> u64 {
    50_000
}

/// Terminal job retention.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionConfig {
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,

    /// Interval of the in-process sweep. `None` disables it.
    #[serde(default)]
    pub sweep_interval_secs: Option<u64>,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_age_days: default_max_age_days(),
            sweep_interval_secs: None,
        }
    }
}

fn default_max_age_days() -> u32 {
    7
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
