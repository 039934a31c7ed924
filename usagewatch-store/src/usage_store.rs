//! Main usage state store.
//!
//! Holds the latest snapshot per provider plus refresh failure
//! bookkeeping. Readers always get an owned clone taken under the read
//! lock, so a response never mixes two refreshes.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use usagewatch_core::{CombinedUsage, ProviderKind, UsageSnapshot};

// ============================================================================
// Inner State
// ============================================================================

/// Internal state for the usage store.
#[derive(Debug, Default)]
struct UsageStoreInner {
    /// Usage snapshots by provider.
    snapshots: HashMap<ProviderKind, UsageSnapshot>,
    /// Last error message by provider.
    errors: HashMap<ProviderKind, String>,
    /// Consecutive failed refreshes by provider.
    failures: HashMap<ProviderKind, u32>,
}

// ============================================================================
// Usage Store
// ============================================================================

/// Shared state store for provider usage data.
///
/// Cheap to clone; all clones share state.
#[derive(Debug, Clone, Default)]
pub struct UsageStore {
    inner: Arc<RwLock<UsageStoreInner>>,
}

impl UsageStore {
    /// Creates an empty usage store.
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Snapshot Access
    // ========================================================================

    /// Gets a snapshot for a provider.
    pub async fn get_snapshot(&self, provider: ProviderKind) -> Option<UsageSnapshot> {
        self.inner.read().await.snapshots.get(&provider).cloned()
    }

    /// Composes the response document from every provider's snapshot.
    ///
    /// All slots are read under a single lock acquisition.
    pub async fn combined(&self, version: &str) -> CombinedUsage {
        let inner = self.inner.read().await;
        let mut usage = CombinedUsage::new(version);
        for kind in ProviderKind::all() {
            usage.set(*kind, inner.snapshots.get(kind).cloned());
        }
        usage
    }

    /// Sets a snapshot for a provider and clears its failure state.
    pub async fn set_snapshot(&self, provider: ProviderKind, snapshot: UsageSnapshot) {
        let mut inner = self.inner.write().await;
        inner.snapshots.insert(provider, snapshot);
        inner.errors.remove(&provider);
        inner.failures.remove(&provider);
        debug!(provider = %provider, "Snapshot updated");
    }

    // ========================================================================
    // Failures
    // ========================================================================

    /// Records a failed refresh and returns the consecutive failure count.
    ///
    /// The stored snapshot is left untouched.
    pub async fn record_failure(&self, provider: ProviderKind, error: impl Into<String>) -> u32 {
        let mut inner = self.inner.write().await;
        inner.errors.insert(provider, error.into());
        let count = inner.failures.entry(provider).or_insert(0);
        *count = count.saturating_add(1);
        let count = *count;
        debug!(provider = %provider, consecutive_failures = count, "Refresh failure recorded");
        count
    }

    /// Gets the last error for a provider.
    pub async fn get_error(&self, provider: ProviderKind) -> Option<String> {
        self.inner.read().await.errors.get(&provider).cloned()
    }

    /// Returns the number of consecutive failed refreshes for a provider.
    pub async fn consecutive_failures(&self, provider: ProviderKind) -> u32 {
        self.inner
            .read()
            .await
            .failures
            .get(&provider)
            .copied()
            .unwrap_or(0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(quota: u64, used: u64) -> UsageSnapshot {
        UsageSnapshot::from_counts(quota, used, 10).unwrap()
    }

    #[tokio::test]
    async fn test_snapshot_operations() {
        let store = UsageStore::new();

        // Initially no snapshot
        assert!(store.get_snapshot(ProviderKind::IiNet).await.is_none());

        store.set_snapshot(ProviderKind::IiNet, snapshot(100, 40)).await;

        let latest = store.get_snapshot(ProviderKind::IiNet).await.unwrap();
        assert_eq!(latest.remaining, 60);
        assert!(store.get_snapshot(ProviderKind::Vodafone).await.is_none());
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_snapshot() {
        let store = UsageStore::new();
        store.set_snapshot(ProviderKind::Vodafone, snapshot(40, 10)).await;

        assert_eq!(store.record_failure(ProviderKind::Vodafone, "timed out").await, 1);
        assert_eq!(store.record_failure(ProviderKind::Vodafone, "login rejected").await, 2);

        assert_eq!(store.get_snapshot(ProviderKind::Vodafone).await.unwrap().used, 10);
        assert_eq!(
            store.get_error(ProviderKind::Vodafone).await.as_deref(),
            Some("login rejected")
        );
        assert_eq!(store.consecutive_failures(ProviderKind::Vodafone).await, 2);
    }

    #[tokio::test]
    async fn test_success_clears_failures() {
        let store = UsageStore::new();
        store.record_failure(ProviderKind::IiNet, "status 500").await;

        store.set_snapshot(ProviderKind::IiNet, snapshot(100, 1)).await;

        assert_eq!(store.consecutive_failures(ProviderKind::IiNet).await, 0);
        assert!(store.get_error(ProviderKind::IiNet).await.is_none());
    }

    #[tokio::test]
    async fn test_combined() {
        let store = UsageStore::new();
        store.set_snapshot(ProviderKind::IiNet, snapshot(100, 25)).await;

        let usage = store.combined("1.2.3").await;
        assert_eq!(usage.version, "1.2.3");
        assert_eq!(usage.data.internet.as_ref().map(|s| s.used), Some(25));
        assert!(usage.data.mobile.is_none());
        assert_eq!(usage.missing(), vec![ProviderKind::Vodafone]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reads_never_torn() {
        let store = UsageStore::new();
        store.set_snapshot(ProviderKind::IiNet, snapshot(1_000, 100)).await;

        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                for used in 0..=1_000 {
                    store.set_snapshot(ProviderKind::IiNet, snapshot(1_000, used)).await;
                    tokio::task::yield_now().await;
                }
            })
        };

        let readers = (0..1_000).map(|_| {
            let store = store.clone();
            tokio::spawn(async move {
                let s = store.get_snapshot(ProviderKind::IiNet).await.unwrap();
                assert_eq!(s.quota, 1_000);
                assert_eq!(s.used + s.remaining, s.quota);
                assert!((s.percent_used + s.percent_remaining - 100.0).abs() < 1e-9);
            })
        });

        for result in futures::future::join_all(readers).await {
            result.unwrap();
        }
        writer.await.unwrap();
    }
}
