// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for mockgen.
//!
//! Two surfaces share one axum router:
//! - the authenticated job API under `/v1`, backed by the job store and runner
//! - the public, metered live-data endpoint at `/api/data`

pub mod auth;
pub mod error;
pub mod handlers;
pub mod live;
pub mod server;

pub use auth::{AuthConfig, CallerId};
pub use error::ApiError;
pub use live::{LiveData, LiveDataService, RequestMeta};
pub use server::{GatewayState, HealthState, build_router, start_server};
