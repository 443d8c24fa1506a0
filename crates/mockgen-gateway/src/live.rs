// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Public, metered access to live resources.
//!
//! Every request is charged against the resource owner's monthly quota.
//! Admitted and quota-rejected requests are both written to the audit log.

use std::sync::Arc;

use mockgen_billing::{QuotaPolicy, current_period};
use mockgen_core::types::UsageLogEntry;
use mockgen_core::{MockgenError, StorageAdapter};
use tracing::{debug, warn};

/// Caller details recorded in the audit log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMeta {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// A served resource with the owner's remaining quota.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveData {
    pub data: serde_json::Value,
    pub limit: u64,
    pub remaining: u64,
}

#[derive(Clone)]
pub struct LiveDataService {
    storage: Arc<dyn StorageAdapter>,
    quota: QuotaPolicy,
}

impl LiveDataService {
    pub fn new(storage: Arc<dyn StorageAdapter>, quota: QuotaPolicy) -> Self {
        Self { storage, quota }
    }

    /// Serve `resource_id` in the current billing period.
    pub async fn serve(
        &self,
        resource_id: &str,
        meta: RequestMeta,
    ) -> Result<LiveData, MockgenError> {
        self.serve_in(resource_id, meta, &current_period()).await
    }

    /// Serve `resource_id`, counting the request against `period`.
    pub async fn serve_in(
        &self,
        resource_id: &str,
        meta: RequestMeta,
        period: &str,
    ) -> Result<LiveData, MockgenError> {
        let resource = self
            .storage
            .get_resource(resource_id)
            .await?
            .ok_or_else(|| MockgenError::NotFound {
                entity: "resource",
                id: resource_id.to_string(),
            })?;
        if !resource.live {
            return Err(MockgenError::NotLive {
                resource_id: resource.id,
            });
        }

        let owner_missing = || MockgenError::OwnerMissing {
            resource_id: resource.id.clone(),
            user_id: resource.user_id.clone(),
        };
        if self.storage.get_user(&resource.user_id).await?.is_none() {
            return Err(owner_missing());
        }

        let admitted = self
            .quota
            .admit_in(self.storage.as_ref(), &resource.user_id, period)
            .await;
        let status = match &admitted {
            Ok(_) => 200,
            Err(MockgenError::QuotaExceeded { .. }) => 429,
            Err(MockgenError::NotFound { .. }) => return Err(owner_missing()),
            Err(_) => 500,
        };
        self.audit(&resource.id, &resource.user_id, meta, status).await;

        let grant = admitted?;
        debug!(
            resource_id = %resource.id,
            user_id = %resource.user_id,
            used = grant.used,
            limit = grant.limit,
            "live data served"
        );
        Ok(LiveData {
            data: resource.data,
            limit: grant.limit,
            remaining: grant.remaining(),
        })
    }

    async fn audit(&self, resource_id: &str, user_id: &str, meta: RequestMeta, status: u16) {
        let entry = UsageLogEntry {
            resource_id: resource_id.to_string(),
            user_id: user_id.to_string(),
            ip: meta.ip,
            user_agent: meta.user_agent,
            status,
            created_at: String::new(),
        };
        if let Err(e) = self.storage.append_usage_log(entry).await {
            warn!(resource_id, error = %e, "usage log append failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockgen_config::model::QuotaConfig;
    use mockgen_core::types::{NewResource, Tier};
    use mockgen_test_utils::TestHarness;
    use serde_json::json;

    async fn setup(limit: u64) -> (TestHarness, LiveDataService) {
        let harness = TestHarness::builder()
            .with_user("owner", Tier::Free, 10)
            .with_user("pro", Tier::Pro, 10)
            .build()
            .await
            .unwrap();
        for (id, user, live) in [
            ("fruits", "owner", true),
            ("draft", "owner", false),
            ("orphan", "ghost", true),
            ("big", "pro", true),
        ] {
            harness
                .storage
                .create_resource(NewResource {
                    id: id.into(),
                    user_id: user.into(),
                    project_id: "p1".into(),
                    name: id.into(),
                    data: json!([{"id": 1, "name": "apple"}]),
                    live,
                })
                .await
                .unwrap();
        }
        let quota = QuotaPolicy::new(&QuotaConfig {
            free_monthly_requests: limit,
            pro_monthly_requests: limit * 50,
        });
        let service = LiveDataService::new(harness.storage.clone(), quota);
        (harness, service)
    }

    fn meta() -> RequestMeta {
        RequestMeta {
            ip: Some("203.0.113.7".into()),
            user_agent: Some("curl/8".into()),
        }
    }

    #[tokio::test]
    async fn serves_live_resource_and_counts_usage() {
        let (harness, service) = setup(1000).await;
        let served = service.serve_in("fruits", meta(), "2024-1").await.unwrap();
        assert_eq!(served.data, json!([{"id": 1, "name": "apple"}]));
        assert_eq!((served.limit, served.remaining), (1000, 999));

        let log = harness.storage.list_usage_log("fruits", 10).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].status, 200);
        assert_eq!(log[0].ip.as_deref(), Some("203.0.113.7"));
        assert_eq!(log[0].user_agent.as_deref(), Some("curl/8"));
    }

    #[tokio::test]
    async fn missing_and_unpublished_resources() {
        let (_harness, service) = setup(1000).await;
        assert!(matches!(
            service.serve_in("nope", meta(), "2024-1").await.unwrap_err(),
            MockgenError::NotFound { entity: "resource", .. }
        ));
        assert!(matches!(
            service.serve_in("draft", meta(), "2024-1").await.unwrap_err(),
            MockgenError::NotLive { .. }
        ));
    }

    #[tokio::test]
    async fn orphaned_resource_is_owner_missing() {
        let (_harness, service) = setup(1000).await;
        assert!(matches!(
            service.serve_in("orphan", meta(), "2024-1").await.unwrap_err(),
            MockgenError::OwnerMissing { user_id, .. } if user_id == "ghost"
        ));
    }

    #[tokio::test]
    async fn quota_rejection_is_logged_and_not_counted() {
        let (harness, service) = setup(2).await;
        service.serve_in("fruits", meta(), "2024-1").await.unwrap();
        service.serve_in("fruits", meta(), "2024-1").await.unwrap();

        let err = service.serve_in("fruits", meta(), "2024-1").await.unwrap_err();
        assert!(matches!(err, MockgenError::QuotaExceeded { limit: 2, used: 2 }));

        let user = harness.storage.get_user("owner").await.unwrap().unwrap();
        assert_eq!(user.usage.count, 2);
        let log = harness.storage.list_usage_log("fruits", 10).await.unwrap();
        let statuses: Vec<u16> = log.iter().map(|e| e.status).collect();
        assert_eq!(statuses, vec![429, 200, 200]);
    }

    #[tokio::test]
    async fn new_period_resets_counter_lazily() {
        let (harness, service) = setup(1).await;
        service.serve_in("fruits", meta(), "2024-1").await.unwrap();
        assert!(service.serve_in("fruits", meta(), "2024-1").await.is_err());

        let served = service.serve_in("fruits", meta(), "2024-2").await.unwrap();
        assert_eq!(served.remaining, 0);
        let user = harness.storage.get_user("owner").await.unwrap().unwrap();
        assert_eq!(user.usage.count, 1);
        assert_eq!(user.usage.period.as_deref(), Some("2024-2"));
    }

    #[tokio::test]
    async fn pro_owner_gets_pro_limit() {
        let (_harness, service) = setup(1).await;
        let served = service.serve_in("big", meta(), "2024-1").await.unwrap();
        assert_eq!(served.limit, 50);
    }

    #[tokio::test]
    async fn concurrent_requests_never_lose_increments() {
        let (harness, service) = setup(1000).await;
        let mut handles = Vec::new();
        for _ in 0..20 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service
                    .serve_in("fruits", RequestMeta::default(), "2024-1")
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        let user = harness.storage.get_user("owner").await.unwrap().unwrap();
        assert_eq!(user.usage.count, 20);
    }
}
