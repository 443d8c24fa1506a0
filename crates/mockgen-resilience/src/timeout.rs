// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deadline for one provider call, scaled to the requested object count.

use std::future::Future;
use std::time::Duration;

use mockgen_core::MockgenError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutBudget {
    base: Duration,
    per_item: Duration,
    cap: Duration,
}

impl Default for TimeoutBudget {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(3000),
            Duration::from_millis(100),
            Duration::from_millis(9500),
        )
    }
}

impl TimeoutBudget {
    pub fn new(base: Duration, per_item: Duration, cap: Duration) -> Self {
        Self {
            base,
            per_item,
            cap,
        }
    }

    /// `min(base + per_item * items, cap)`.
    pub fn for_items(&self, items: u32) -> Duration {
        self.base
            .saturating_add(self.per_item.saturating_mul(items))
            .min(self.cap)
    }

    /// Run `fut` under the budget for `items`.
    ///
    /// Expiry drops the in-flight future and reports a provider failure
    /// without status, so fallback moves on to the next provider.
    pub async fn run<T, Fut>(&self, provider: &str, items: u32, fut: Fut) -> Result<T, MockgenError>
    where
        Fut: Future<Output = Result<T, MockgenError>>,
    {
        let limit = self.for_items(items);
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(MockgenError::Provider {
                provider: provider.to_string(),
                status: None,
                message: format!("timed out after {}ms", limit.as_millis()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_scales_then_caps() {
        let budget = TimeoutBudget::default();
        assert_eq!(budget.for_items(0), Duration::from_millis(3000));
        assert_eq!(budget.for_items(10), Duration::from_millis(4000));
        assert_eq!(budget.for_items(65), Duration::from_millis(9500));
        assert_eq!(budget.for_items(1000), Duration::from_millis(9500));
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_becomes_provider_error() {
        let budget = TimeoutBudget::default();
        let result: Result<(), _> = budget
            .run("slow", 5, async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;
        match result {
            Err(MockgenError::Provider {
                provider, status, ..
            }) => {
                assert_eq!(provider, "slow");
                assert_eq!(status, None);
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fast_call_passes_through() {
        let budget = TimeoutBudget::default();
        let value = budget.run("fast", 5, async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }
}
