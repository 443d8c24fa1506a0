// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping from the error taxonomy to HTTP responses.

use axum::{
    Json,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use mockgen_core::MockgenError;
use serde::Serialize;

pub const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    pub message: String,
}

/// A [`MockgenError`] on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub MockgenError);

impl From<MockgenError> for ApiError {
    fn from(err: MockgenError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            MockgenError::Validation(_) | MockgenError::NotLive { .. } => StatusCode::BAD_REQUEST,
            MockgenError::InsufficientCredits { .. } => StatusCode::PAYMENT_REQUIRED,
            MockgenError::NotFound { .. } => StatusCode::NOT_FOUND,
            MockgenError::InvalidState { .. } | MockgenError::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            MockgenError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(code = self.0.code(), error = %self.0, "request failed");
            match &self.0 {
                MockgenError::OwnerMissing { .. } => self.0.to_string(),
                _ => "internal server error".to_string(),
            }
        } else {
            self.0.to_string()
        };

        let body = ErrorResponse {
            error: self.0.code().to_string(),
            message,
        };
        let mut response = (status, Json(body)).into_response();

        if let MockgenError::QuotaExceeded { limit, used } = self.0 {
            let headers = response.headers_mut();
            headers.insert(
                RATE_LIMIT_REMAINING,
                HeaderValue::from(limit.saturating_sub(used)),
            );
            headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(limit));
        }
        response
    }
}
