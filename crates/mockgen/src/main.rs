// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! mockgen - AI mock-data generation service.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod admin;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mockgen_core::types::Tier;

/// mockgen - AI mock-data generation service.
#[derive(Parser, Debug)]
#[command(name = "mockgen", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the default search path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway (job API and live-data endpoint).
    Serve,
    /// Delete terminal jobs past the retention age.
    Sweep {
        /// Override `retention.max_age_days`.
        #[arg(long)]
        max_age_days: Option<u32>,
    },
    /// Manage users.
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand, Debug)]
enum UserCommands {
    /// Create a user, or update the tier and credits of an existing one.
    Add {
        #[arg(long)]
        id: String,
        #[arg(long, default_value_t = Tier::Free)]
        tier: Tier,
        /// Defaults to `credits.initial_balance`.
        #[arg(long)]
        credits: Option<i64>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => mockgen_config::load_and_validate_path(path),
        None => mockgen_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            mockgen_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Sweep { max_age_days }) => admin::run_sweep(config, max_age_days).await,
        Some(Commands::User {
            command: UserCommands::Add { id, tier, credits },
        }) => admin::run_user_add(config, &id, tier, credits).await,
        None => {
            println!("mockgen: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("mockgen={log_level},tower_http={log_level},warn"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the stats epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn parses_user_add() {
        let cli = Cli::try_parse_from([
            "mockgen", "user", "add", "--id", "alice", "--tier", "pro", "--credits", "50",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::User {
                command: UserCommands::Add { id, tier, credits },
            }) => {
                assert_eq!(id, "alice");
                assert_eq!(tier, Tier::Pro);
                assert_eq!(credits, Some(50));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_sweep_with_global_config() {
        let cli = Cli::try_parse_from([
            "mockgen", "sweep", "--max-age-days", "3", "--config", "/tmp/m.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/m.toml")));
        assert!(matches!(cli.command, Some(Commands::Sweep { max_age_days: Some(3) })));
    }

    #[test]
    fn rejects_unknown_tier() {
        assert!(
            Cli::try_parse_from(["mockgen", "user", "add", "--id", "a", "--tier", "gold"]).is_err()
        );
    }

    #[test]
    #[serial_test::serial]
    fn binary_loads_config_defaults() {
        let config = mockgen_config::load_and_validate().expect("default config should be valid");
        assert_eq!(config.server.port, 8787);
    }
}
