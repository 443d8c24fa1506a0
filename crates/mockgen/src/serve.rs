// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `mockgen serve` command implementation.
//!
//! Opens storage, builds the provider fallback chain, and serves the job API
//! and live-data endpoint until SIGINT or SIGTERM. When
//! `retention.sweep_interval_secs` is set, a background task deletes expired
//! terminal jobs on that interval. Job runs are drained before storage closes,
//! and jobs a crashed process left unfinished are failed at startup.

use std::sync::Arc;
use std::time::Duration;

use mockgen_billing::QuotaPolicy;
use mockgen_config::MockgenConfig;
use mockgen_core::{MockgenError, StorageAdapter};
use mockgen_gateway::{GatewayState, LiveDataService};
use mockgen_jobs::{GenerationJobRunner, JobStore};
use mockgen_storage::SqliteStorage;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How long in-flight job runs may keep going after the server stops.
const RUN_DRAIN_GRACE: Duration = Duration::from_secs(10);

/// Runs the `mockgen serve` command.
pub async fn run_serve(config: MockgenConfig) -> Result<(), MockgenError> {
    info!("starting mockgen serve");

    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let storage: Arc<dyn StorageAdapter> = Arc::new(storage);

    let orchestrator = Arc::new(mockgen_providers::build_orchestrator(&config.providers)?);
    info!(providers = ?orchestrator.provider_names(), "provider chain ready");

    let store = JobStore::new(Arc::clone(&storage), &config.credits);
    store.fail_unfinished_jobs().await?;
    let runner = GenerationJobRunner::new(store.clone(), orchestrator);
    let live = LiveDataService::new(Arc::clone(&storage), QuotaPolicy::new(&config.quota));
    let state = GatewayState::new(runner, live);

    let cancel = install_signal_handler();

    if let Some(interval_secs) = config.retention.sweep_interval_secs {
        let sweep_cancel = cancel.clone();
        let max_age_days = config.retention.max_age_days;
        tokio::spawn(async move {
            sweep_loop(store, Duration::from_secs(interval_secs), max_age_days, sweep_cancel).await;
        });
        info!(interval_secs, max_age_days, "retention sweep enabled");
    }

    let shutdown = cancel.clone().cancelled_owned();
    mockgen_gateway::start_server(&config.server, state.clone(), shutdown).await?;

    cancel.cancel();
    state.drain(RUN_DRAIN_GRACE).await;
    storage.close().await?;
    info!("mockgen serve shutdown complete");
    Ok(())
}

async fn sweep_loop(store: JobStore, every: Duration, max_age_days: u32, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(every);
    // Skip the first immediate tick.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = store.cleanup_old_jobs(max_age_days).await {
                    warn!(error = %e, "retention sweep failed (non-fatal)");
                }
            }
            _ = cancel.cancelled() => {
                debug!("retention sweep shutting down");
                break;
            }
        }
    }
}

/// Cancels the returned token on SIGINT (Ctrl+C) or SIGTERM.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                        _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl+C only");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
    });

    token
}
