// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.
//!
//! Job API under `/v1` (authenticated), the public live-data endpoint, and
//! the unauthenticated health check.

use std::net::SocketAddr;

use axum::{
    Extension, Json,
    extract::{ConnectInfo, Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use mockgen_core::MockgenError;
use mockgen_core::types::{FieldSpec, Job, JobStatus, NewResource, Resource};
use mockgen_jobs::{JobSubmission, RunOutcome};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::CallerId;
use crate::error::{ApiError, RATE_LIMIT_LIMIT, RATE_LIMIT_REMAINING};
use crate::live::RequestMeta;
use crate::server::GatewayState;

/// Request body for POST /v1/jobs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub project_id: String,
    pub prompt: String,
    pub objects_count: u32,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub schema: Option<Vec<FieldSpec>>,
}

/// Response body for POST /v1/jobs.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobResponse {
    pub job_id: String,
    pub status: JobStatus,
}

/// Request body for POST /v1/jobs/{id}/publish.
#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub name: String,
    #[serde(default)]
    pub live: bool,
}

/// Request body for PUT /v1/resources/{id}/live.
#[derive(Debug, Deserialize)]
pub struct LiveToggleRequest {
    pub live: bool,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Query string of the live-data endpoint.
#[derive(Debug, Deserialize)]
pub struct LiveQuery {
    #[serde(rename = "resourceID")]
    pub resource_id: Option<String>,
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
    })
}

/// POST /v1/jobs
///
/// Queues the job and runs it on a tracked task; clients poll for the result.
pub async fn create_job(
    State(state): State<GatewayState>,
    Extension(CallerId(user_id)): Extension<CallerId>,
    Json(body): Json<CreateJobRequest>,
) -> Result<Response, ApiError> {
    let job = state
        .runner
        .store()
        .create_job(JobSubmission {
            user_id,
            project_id: body.project_id,
            prompt: body.prompt,
            objects_count: body.objects_count,
            resource_type: body.resource_type,
            schema: body.schema,
        })
        .await?;

    let runner = state.runner.clone();
    let interrupt = state.interrupt.clone();
    let request = job.generation_request();
    let (job_id, owner) = (job.id.clone(), job.user_id.clone());
    state.runs.spawn(async move {
        runner
            .run_until_cancelled(&job_id, &owner, &request, &interrupt)
            .await;
    });

    info!(job_id = %job.id, user_id = %job.user_id, "job accepted");
    Ok((
        StatusCode::CREATED,
        Json(CreateJobResponse {
            job_id: job.id,
            status: job.status,
        }),
    )
        .into_response())
}

/// GET /v1/jobs/{id}
pub async fn get_job(
    State(state): State<GatewayState>,
    Extension(caller): Extension<CallerId>,
    Path(job_id): Path<String>,
) -> Result<Json<Job>, ApiError> {
    Ok(Json(owned_job(&state, &caller, &job_id).await?))
}

/// POST /v1/jobs/{id}/retry
///
/// Runs the retry to completion before answering.
pub async fn retry_job(
    State(state): State<GatewayState>,
    Extension(caller): Extension<CallerId>,
    Path(job_id): Path<String>,
) -> Result<Json<RunOutcome>, ApiError> {
    owned_job(&state, &caller, &job_id).await?;
    Ok(Json(state.runner.retry(&job_id).await?))
}

/// GET /v1/projects/{project_id}/jobs/latest
pub async fn latest_job(
    State(state): State<GatewayState>,
    Extension(CallerId(user_id)): Extension<CallerId>,
    Path(project_id): Path<String>,
) -> Result<Json<Job>, ApiError> {
    state
        .runner
        .store()
        .latest_job_for_project(&user_id, &project_id)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError(MockgenError::NotFound {
                entity: "job",
                id: format!("latest in project {project_id}"),
            })
        })
}

/// POST /v1/jobs/{id}/publish
///
/// Saves a completed job's result as a resource of the job's project.
pub async fn publish_job(
    State(state): State<GatewayState>,
    Extension(caller): Extension<CallerId>,
    Path(job_id): Path<String>,
    Json(body): Json<PublishRequest>,
) -> Result<Response, ApiError> {
    let job = owned_job(&state, &caller, &job_id).await?;
    let Some(result) = job.result.filter(|_| job.status == JobStatus::Completed) else {
        return Err(ApiError(MockgenError::InvalidState {
            job_id: job.id,
            status: job.status,
        }));
    };
    if body.name.trim().is_empty() {
        return Err(ApiError(MockgenError::Validation("name must not be empty".into())));
    }

    let data = serde_json::to_value(result).map_err(|e| MockgenError::Internal(e.to_string()))?;
    let resource = state
        .runner
        .store()
        .storage()
        .create_resource(NewResource {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: job.user_id,
            project_id: job.project_id,
            name: body.name,
            data,
            live: body.live,
        })
        .await?;

    info!(job_id = %job.id, resource_id = %resource.id, live = resource.live, "job published");
    Ok((StatusCode::CREATED, Json(resource)).into_response())
}

/// PUT /v1/resources/{id}/live
pub async fn set_resource_live(
    State(state): State<GatewayState>,
    Extension(CallerId(user_id)): Extension<CallerId>,
    Path(resource_id): Path<String>,
    Json(body): Json<LiveToggleRequest>,
) -> Result<Json<Resource>, ApiError> {
    let storage = state.runner.store().storage();
    let not_found = || MockgenError::NotFound {
        entity: "resource",
        id: resource_id.clone(),
    };

    let resource = storage.get_resource(&resource_id).await?.ok_or_else(not_found)?;
    if resource.user_id != user_id {
        return Err(ApiError(not_found()));
    }
    let updated = storage
        .set_resource_live(&resource_id, body.live)
        .await?
        .ok_or_else(not_found)?;
    info!(resource_id = %updated.id, live = updated.live, "resource visibility changed");
    Ok(Json(updated))
}

/// GET|POST /api/data?resourceID=
///
/// Public and unauthenticated; metered against the resource owner's quota.
pub async fn get_live_data(
    State(state): State<GatewayState>,
    Query(query): Query<LiveQuery>,
    connect_info: Option<Extension<ConnectInfo<SocketAddr>>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let Some(resource_id) = query.resource_id.filter(|id| !id.trim().is_empty()) else {
        return Err(ApiError(MockgenError::Validation("resourceID required".into())));
    };

    let meta = RequestMeta {
        ip: client_ip(&headers, connect_info.map(|Extension(ConnectInfo(addr))| addr)),
        user_agent: headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };

    let served = state.live.serve(&resource_id, meta).await.map_err(|err| {
        if matches!(err, MockgenError::QuotaExceeded { .. }) {
            warn!(resource_id = %resource_id, "live data quota exceeded");
        }
        ApiError(err)
    })?;

    let mut response = Json(served.data).into_response();
    let headers = response.headers_mut();
    headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(served.remaining));
    headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(served.limit));
    Ok(response)
}

/// A job visible to `caller`. Other users' jobs read as absent.
async fn owned_job(
    state: &GatewayState,
    CallerId(user_id): &CallerId,
    job_id: &str,
) -> Result<Job, MockgenError> {
    let job = state.runner.store().get_job(job_id).await?;
    if &job.user_id != user_id {
        return Err(MockgenError::NotFound {
            entity: "job",
            id: job_id.to_string(),
        });
    }
    Ok(job)
}

/// First `X-Forwarded-For` hop, else the socket peer.
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}
