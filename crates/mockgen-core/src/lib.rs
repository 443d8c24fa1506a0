// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for mockgen.
//!
//! Holds the error taxonomy, domain types and adapter traits used throughout
//! the workspace. Providers and storage backends implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

pub use error::MockgenError;
pub use types::{
    AdapterType, FieldSpec, FieldValue, GeneratedRecord, Generation, GenerationRequest,
    HealthStatus, Job, JobAttempt, JobMetadata, JobStatus, JobStatusUpdate, NewJob, NewResource,
    QuotaLimits, Resource, Tier, UsageCounter, UsageGrant, UsageLogEntry, User,
};

pub use traits::{GenerationProvider, PluginAdapter, StorageAdapter};
