// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    Router,
    http::Method,
    middleware as axum_middleware,
    routing::{get, post, put},
};
use mockgen_config::model::ServerConfig;
use mockgen_core::MockgenError;
use mockgen_jobs::GenerationJobRunner;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;
use crate::live::LiveDataService;

/// Health state for the unauthenticated health endpoint.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Job runner; also owns the job store.
    pub runner: GenerationJobRunner,
    pub live: LiveDataService,
    pub health: HealthState,
    /// Job runs started by request handlers.
    pub runs: TaskTracker,
    /// Interrupts runs still in flight once the drain grace period is over.
    pub interrupt: CancellationToken,
}

impl GatewayState {
    pub fn new(runner: GenerationJobRunner, live: LiveDataService) -> Self {
        Self {
            runner,
            live,
            health: HealthState {
                start_time: std::time::Instant::now(),
            },
            runs: TaskTracker::new(),
            interrupt: CancellationToken::new(),
        }
    }

    /// Stop accepting runs and wait for the ones in flight.
    ///
    /// Runs still going after `grace` are interrupted, which records their
    /// jobs as failed so they can be retried.
    pub async fn drain(&self, grace: Duration) {
        self.runs.close();
        if tokio::time::timeout(grace, self.runs.wait()).await.is_err() {
            warn!(
                in_flight = self.runs.len(),
                "job runs still in flight after grace period, interrupting"
            );
            self.interrupt.cancel();
            self.runs.wait().await;
        }
        info!("job runs drained");
    }
}

/// Assemble the full router:
/// - GET /health (public)
/// - GET|POST /api/data (public, metered, CORS for any origin when enabled)
/// - /v1/... job API (bearer token + `X-User-Id`)
pub fn build_router(config: &ServerConfig, state: GatewayState) -> Router {
    let auth = AuthConfig {
        bearer_token: config.api_token.clone(),
    };

    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let mut live_routes = Router::new()
        .route(
            "/api/data",
            get(handlers::get_live_data).post(handlers::get_live_data),
        )
        .with_state(state.clone());
    if config.cors_allow_any {
        live_routes = live_routes.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(Any),
        );
    }

    let api_routes = Router::new()
        .route("/v1/jobs", post(handlers::create_job))
        .route("/v1/jobs/{id}", get(handlers::get_job))
        .route("/v1/jobs/{id}/retry", post(handlers::retry_job))
        .route("/v1/jobs/{id}/publish", post(handlers::publish_job))
        .route(
            "/v1/projects/{project_id}/jobs/latest",
            get(handlers::latest_job),
        )
        .route("/v1/resources/{id}/live", put(handlers::set_resource_live))
        .route_layer(axum_middleware::from_fn_with_state(auth, auth_middleware))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(live_routes)
        .merge(api_routes)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Bind `host:port` and serve until `shutdown` resolves.
///
/// Returns once open connections have closed; callers drain job runs with
/// [`GatewayState::drain`] afterwards.
pub async fn start_server<F>(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: F,
) -> Result<(), MockgenError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(config, state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MockgenError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    info!("gateway listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .map_err(|e| MockgenError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
