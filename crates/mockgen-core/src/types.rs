// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across adapter traits and services.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::MockgenError;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Provider,
    Storage,
}

// --- Jobs ---

/// Lifecycle status of a generation job.
///
/// Valid moves: `queued -> processing`, `processing -> completed | failed`,
/// `failed -> processing` (manual retry) and `queued -> failed` (a run that
/// could not even start). Nothing ever returns to `queued`, and `completed`
/// is final.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// `completed` and `failed` end a run.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether a job in this status may move to `next`.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Queued, Processing)
                | (Queued, Failed)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Failed, Processing)
        )
    }
}

/// A single generated value. JSON, restricted to a closed set of shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    /// Integers above `i64::MAX`.
    Unsigned(u64),
    Float(f64),
    Text(String),
    List(Vec<FieldValue>),
    Object(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Unsigned(_) | Self::Float(_))
    }
}

/// One object of a job result. Always carries a numeric `id` once normalized.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneratedRecord(pub BTreeMap<String, FieldValue>);

impl GeneratedRecord {
    pub const ID_FIELD: &'static str = "id";

    pub fn id(&self) -> Option<&FieldValue> {
        self.0.get(Self::ID_FIELD)
    }

    pub fn set_id(&mut self, id: i64) {
        self.0
            .insert(Self::ID_FIELD.to_string(), FieldValue::Integer(id));
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One field of the target schema a user asked the generator to follow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Optional job metadata: provider used, resource-type hint, target schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Vec<FieldSpec>>,
}

/// A durable generation job record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub user_id: String,
    pub project_id: String,
    pub prompt: String,
    pub objects_count: u32,
    pub status: JobStatus,
    pub result: Option<Vec<GeneratedRecord>>,
    pub error: Option<String>,
    pub error_code: Option<String>,
    pub created_at: String,
    pub completed_at: Option<String>,
    pub processing_time_ms: Option<u64>,
    /// Number of times the job entered `processing`.
    pub attempts: u32,
    pub metadata: JobMetadata,
}

impl Job {
    /// The provider request this job was submitted with.
    pub fn generation_request(&self) -> GenerationRequest {
        GenerationRequest {
            prompt: self.prompt.clone(),
            object_count: self.objects_count,
            resource_type: self.metadata.resource_type.clone(),
            schema: self.metadata.schema.clone(),
        }
    }
}

/// Input for inserting a new `queued` job.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub id: String,
    pub user_id: String,
    pub project_id: String,
    pub prompt: String,
    pub objects_count: u32,
    pub metadata: JobMetadata,
}

/// A status change applied atomically to one job record.
#[derive(Debug, Clone, PartialEq)]
pub struct JobStatusUpdate {
    pub status: JobStatus,
    pub result: Option<Vec<GeneratedRecord>>,
    pub error: Option<String>,
    pub error_code: Option<String>,
    pub processing_time_ms: Option<u64>,
    pub provider: Option<String>,
}

impl JobStatusUpdate {
    pub fn processing() -> Self {
        Self {
            status: JobStatus::Processing,
            result: None,
            error: None,
            error_code: None,
            processing_time_ms: None,
            provider: None,
        }
    }

    pub fn completed(
        result: Vec<GeneratedRecord>,
        processing_time_ms: u64,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            status: JobStatus::Completed,
            result: Some(result),
            error: None,
            error_code: None,
            processing_time_ms: Some(processing_time_ms),
            provider: Some(provider.into()),
        }
    }

    pub fn failed(error: &MockgenError, processing_time_ms: Option<u64>) -> Self {
        Self {
            status: JobStatus::Failed,
            result: None,
            error: Some(error.to_string()),
            error_code: Some(error.code().to_string()),
            processing_time_ms,
            provider: None,
        }
    }
}

/// One terminal outcome of a job, kept even after a retry overwrites the job row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAttempt {
    pub job_id: String,
    pub attempt: u32,
    pub status: JobStatus,
    pub error: Option<String>,
    pub error_code: Option<String>,
    pub item_count: Option<u32>,
    pub provider: Option<String>,
    pub processing_time_ms: Option<u64>,
    pub finished_at: String,
}

/// What a provider is asked to produce.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub object_count: u32,
    pub resource_type: Option<String>,
    pub schema: Option<Vec<FieldSpec>>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, object_count: u32) -> Self {
        Self {
            prompt: prompt.into(),
            object_count,
            resource_type: None,
            schema: None,
        }
    }
}

/// Raw text produced by the first provider that succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub raw_text: String,
    pub provider: String,
}

// --- Users, billing and the live gateway ---

/// Subscription tier. `Pro` is the unlimited tier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Pro,
}

impl Tier {
    pub fn is_unlimited(self) -> bool {
        matches!(self, Self::Pro)
    }
}

/// A user as far as the pipeline cares: tier, credits and live-data usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub tier: Tier,
    pub credits: i64,
    pub usage: UsageCounter,
    pub created_at: String,
}

/// Monthly live-data request limits per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaLimits {
    pub free: u64,
    pub pro: u64,
}

impl QuotaLimits {
    pub fn for_tier(&self, tier: Tier) -> u64 {
        match tier {
            Tier::Free => self.free,
            Tier::Pro => self.pro,
        }
    }
}

/// Per-user live-data request counter for one billing period.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UsageCounter {
    pub count: u64,
    pub period: Option<String>,
}

impl UsageCounter {
    /// Requests already counted against `period`; zero when the stored period is stale.
    pub fn used_in(&self, period: &str) -> u64 {
        match self.period.as_deref() {
            Some(p) if p == period => self.count,
            _ => 0,
        }
    }

    /// Admits one request in `period` under `limit`.
    ///
    /// A stale or unset period resets the count before the limit check.
    /// On rejection the counter is left untouched.
    pub fn admit(&self, period: &str, limit: u64) -> Result<UsageCounter, MockgenError> {
        let used = self.used_in(period);
        if used >= limit {
            return Err(MockgenError::QuotaExceeded { limit, used });
        }
        Ok(UsageCounter {
            count: used + 1,
            period: Some(period.to_string()),
        })
    }
}

/// Result of a successful quota admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageGrant {
    pub limit: u64,
    pub used: u64,
}

impl UsageGrant {
    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.used)
    }
}

/// A named, persisted result set bound to a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub user_id: String,
    pub project_id: String,
    pub name: String,
    pub data: serde_json::Value,
    pub live: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for persisting a resource.
#[derive(Debug, Clone)]
pub struct NewResource {
    pub id: String,
    pub user_id: String,
    pub project_id: String,
    pub name: String,
    pub data: serde_json::Value,
    pub live: bool,
}

/// Audit entry for one public live-data request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageLogEntry {
    pub resource_id: String,
    pub user_id: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub status: u16,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_transitions_only_move_forward() {
        use JobStatus::*;
        assert!(Queued.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));
        assert!(Failed.can_transition_to(Processing));

        assert!(!Processing.can_transition_to(Queued));
        assert!(!Completed.can_transition_to(Processing));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Completed));
        assert!(!Queued.can_transition_to(Completed));
        assert!(!Processing.can_transition_to(Processing));
    }

    #[test]
    fn status_strings_are_lowercase() {
        assert_eq!(JobStatus::Processing.to_string(), "processing");
        assert_eq!(JobStatus::from_str("failed").unwrap(), JobStatus::Failed);
        assert_eq!(
            serde_json::to_string(&JobStatus::Completed).unwrap(),
            "\"completed\""
        );
    }

    #[test]
    fn field_values_keep_integers_and_floats_apart() {
        let record: GeneratedRecord = serde_json::from_str(
            r#"{"id": 7, "price": 9.5, "tags": ["a", null], "active": true, "meta": {"x": 1}}"#,
        )
        .unwrap();
        assert_eq!(record.id(), Some(&FieldValue::Integer(7)));
        assert_eq!(record.get("price"), Some(&FieldValue::Float(9.5)));
        assert_eq!(
            record.get("tags"),
            Some(&FieldValue::List(vec![
                FieldValue::Text("a".into()),
                FieldValue::Null
            ]))
        );
        assert_eq!(record.get("active"), Some(&FieldValue::Bool(true)));
        assert!(matches!(record.get("meta"), Some(FieldValue::Object(_))));
    }

    #[test]
    fn integers_beyond_i64_stay_exact() {
        let raw = r#"{"id":18446744073709551615,"small":-3}"#;
        let record: GeneratedRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.id(), Some(&FieldValue::Unsigned(u64::MAX)));
        assert_eq!(record.get("small"), Some(&FieldValue::Integer(-3)));
        assert!(record.id().unwrap().is_number());
        assert_eq!(serde_json::to_string(&record).unwrap(), raw);
    }

    #[test]
    fn usage_counter_resets_on_new_period() {
        let counter = UsageCounter {
            count: 999,
            period: Some("2024-1".into()),
        };
        let next = counter.admit("2024-2", 1000).unwrap();
        assert_eq!(
            next,
            UsageCounter {
                count: 1,
                period: Some("2024-2".into())
            }
        );
    }

    #[test]
    fn usage_counter_rejects_at_limit() {
        let counter = UsageCounter {
            count: 1000,
            period: Some("2024-2".into()),
        };
        let err = counter.admit("2024-2", 1000).unwrap_err();
        assert!(matches!(
            err,
            MockgenError::QuotaExceeded {
                limit: 1000,
                used: 1000
            }
        ));
    }

    #[test]
    fn unset_period_counts_from_zero() {
        let next = UsageCounter::default().admit("2025-3", 5).unwrap();
        assert_eq!(next.count, 1);
        assert_eq!(next.period.as_deref(), Some("2025-3"));
    }

    #[test]
    fn pro_tier_is_unlimited() {
        assert!(Tier::Pro.is_unlimited());
        assert!(!Tier::Free.is_unlimited());
        let limits = QuotaLimits {
            free: 1000,
            pro: 50_000,
        };
        assert_eq!(limits.for_tier(Tier::Free), 1000);
        assert_eq!(limits.for_tier(Tier::Pro), 50_000);
    }

    #[test]
    fn failed_update_carries_code_and_message() {
        let err = MockgenError::MalformedOutput("no array".into());
        let update = JobStatusUpdate::failed(&err, Some(12));
        assert_eq!(update.status, JobStatus::Failed);
        assert_eq!(update.error_code.as_deref(), Some("malformed_output"));
        assert!(update.error.unwrap().contains("no array"));
    }
}
