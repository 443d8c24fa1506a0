// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes.
//! All errors are collected; validation never fails fast.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::MockgenConfig;

pub fn validate_config(config: &MockgenConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let host = config.server.host.trim();
    if host.is_empty() {
        fail("server.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let providers = &config.providers;
    if providers.models.is_empty() {
        fail("providers.models must list at least one model".to_string());
    }
    if providers.max_retries < 1 {
        fail(format!(
            "providers.max_retries must be at least 1, got {}",
            providers.max_retries
        ));
    }
    if providers.timeout_cap_ms < providers.timeout_base_ms {
        fail(format!(
            "providers.timeout_cap_ms ({}) must not be below providers.timeout_base_ms ({})",
            providers.timeout_cap_ms, providers.timeout_base_ms
        ));
    }

    let mut seen_names = HashSet::new();
    for (i, model) in providers.models.iter().enumerate() {
        if model.name.trim().is_empty() {
            fail(format!("providers.models[{i}].name must not be empty"));
        } else if !seen_names.insert(model.name.as_str()) {
            fail(format!(
                "duplicate model name `{}` in [[providers.models]]",
                model.name
            ));
        }
        if !(model.temperature > 0.0 && model.temperature <= 2.0) {
            fail(format!(
                "providers.models[{i}].temperature must be within (0, 2], got {}",
                model.temperature
            ));
        }
        if !(model.top_p > 0.0 && model.top_p <= 1.0) {
            fail(format!(
                "providers.models[{i}].top_p must be within (0, 1], got {}",
                model.top_p
            ));
        }
        if model.max_output_tokens == 0 || model.tokens_per_object == 0 {
            fail(format!(
                "providers.models[{i}] token limits must be positive"
            ));
        }
        if model.requests_per_minute == Some(0) {
            fail(format!(
                "providers.models[{i}].requests_per_minute must be positive when set"
            ));
        }
    }

    if config.credits.cost_per_generation < 0 {
        fail(format!(
            "credits.cost_per_generation must be non-negative, got {}",
            config.credits.cost_per_generation
        ));
    }
    if config.credits.max_objects_per_job < 1 {
        fail("credits.max_objects_per_job must be at least 1".to_string());
    }

    if config.quota.free_monthly_requests > config.quota.pro_monthly_requests {
        fail(format!(
            "quota.free_monthly_requests ({}) must not exceed quota.pro_monthly_requests ({})",
            config.quota.free_monthly_requests, config.quota.pro_monthly_requests
        ));
    }

    if config.retention.max_age_days < 1 {
        fail("retention.max_age_days must be at least 1".to_string());
    }
    if config.retention.sweep_interval_secs == Some(0) {
        fail("retention.sweep_interval_secs must be positive when set".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
