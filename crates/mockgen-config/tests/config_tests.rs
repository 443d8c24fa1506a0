// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the configuration system.

use mockgen_config::diagnostic::ConfigError;
use mockgen_config::model::{MockgenConfig, ModelProfile};
use mockgen_config::{load_and_validate_str, load_config_from_str};
use serial_test::serial;

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[server]
host = "0.0.0.0"
port = 9000
api_token = "secret"
cors_allow_any = false

[storage]
database_path = "/tmp/mockgen-test.db"
wal_mode = false

[providers]
api_key = "key-123"
base_url = "http://localhost:1234/v1"
max_retries = 2
retry_base_delay_ms = 50

[[providers.models]]
name = "tiny"
profile = "fast"
temperature = 0.5
top_p = 0.9
top_k = 20
tokens_per_object = 40
max_output_tokens = 1024
requests_per_minute = 15

[[providers.models]]
name = "big"
profile = "quality"
temperature = 1.0
top_p = 1.0
top_k = 64
tokens_per_object = 120
max_output_tokens = 8192

[credits]
min_balance = 2
cost_per_generation = 3

[quota]
free_monthly_requests = 10
pro_monthly_requests = 20

[retention]
max_age_days = 3
sweep_interval_secs = 600

[logging]
level = "debug"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.api_token.as_deref(), Some("secret"));
    assert!(!config.server.cors_allow_any);
    assert!(!config.storage.wal_mode);
    assert_eq!(config.providers.api_key.as_deref(), Some("key-123"));
    assert_eq!(config.providers.max_retries, 2);
    assert_eq!(config.providers.models.len(), 2);
    assert_eq!(config.providers.models[0].requests_per_minute, Some(15));
    assert_eq!(config.providers.models[1].profile, ModelProfile::Quality);
    assert_eq!(config.credits.cost_per_generation, 3);
    assert_eq!(config.credits.initial_balance, 10);
    assert_eq!(config.quota.limits().pro, 20);
    assert_eq!(config.retention.sweep_interval_secs, Some(600));
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn empty_toml_yields_defaults() {
    let config = load_config_from_str("").expect("empty config is valid");
    let defaults = MockgenConfig::default();
    assert_eq!(config.server.port, defaults.server.port);
    assert_eq!(config.providers.models, defaults.providers.models);
    assert_eq!(config.retention.max_age_days, 7);
}

#[test]
fn unknown_key_gets_suggestion() {
    let errors = load_and_validate_str("[server]\nprot = 80\n").unwrap_err();
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "prot");
            assert_eq!(suggestion.as_deref(), Some("port"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn unknown_section_rejected() {
    let err = load_config_from_str("[telemetry]\nenabled = true\n").unwrap_err();
    assert!(err.to_string().contains("telemetry"));
}

#[test]
fn wrong_type_reports_key_path() {
    let errors = load_and_validate_str("[server]\nport = \"eighty\"\n").unwrap_err();
    assert!(matches!(
        &errors[0],
        ConfigError::InvalidType { key, .. } if key == "server.port"
    ));
}

#[test]
fn unknown_profile_rejected() {
    let toml = r#"
[[providers.models]]
name = "x"
profile = "turbo"
temperature = 0.5
top_p = 0.9
top_k = 1
tokens_per_object = 1
max_output_tokens = 1
"#;
    assert!(load_config_from_str(toml).is_err());
}

#[test]
fn validation_errors_surface_through_load() {
    let errors = load_and_validate_str("[retention]\nmax_age_days = 0\n").unwrap_err();
    assert!(matches!(&errors[0], ConfigError::Validation { message } if message.contains("max_age_days")));
}

#[test]
#[serial]
fn env_var_overrides_nested_key() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("custom.toml", "[credits]\nmin_balance = 5\n")?;
        jail.set_env("MOCKGEN_CREDITS_MIN_BALANCE", "7");
        jail.set_env("MOCKGEN_PROVIDERS_MAX_RETRIES", "5");
        let config = mockgen_config::load_config_from_path(std::path::Path::new("custom.toml"))?;
        assert_eq!(config.credits.min_balance, 7);
        assert_eq!(config.providers.max_retries, 5);
        Ok(())
    });
}
