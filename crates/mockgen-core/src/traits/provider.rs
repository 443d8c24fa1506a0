// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation provider trait for AI model backends.

use async_trait::async_trait;

use crate::error::MockgenError;
use crate::traits::adapter::PluginAdapter;
use crate::types::GenerationRequest;

/// One concrete model variant that turns a prompt into raw text.
///
/// Implementations build their own instruction prompt from the request and
/// apply their own generation parameters. Failures must be reported as
/// [`MockgenError::RateLimited`] when upstream throttles,
/// [`MockgenError::EmptyResponse`] when the call succeeds without text, and
/// [`MockgenError::Provider`] for everything else.
#[async_trait]
pub trait GenerationProvider: PluginAdapter {
    /// Generates raw model text for `request`. The text is not validated here.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, MockgenError>;
}
