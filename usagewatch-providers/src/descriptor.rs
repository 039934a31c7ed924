//! Provider descriptor system.
//!
//! A descriptor holds the static configuration for a provider: how it is
//! fetched, which domains it talks to and how to build its strategy from
//! account credentials.

use std::sync::Arc;
use usagewatch_core::{Credentials, ProviderKind};
use usagewatch_fetch::{FetchKind, FetchStrategy};

/// Builds a provider's strategy from its credentials.
pub type StrategyFactory = fn(Credentials) -> Arc<dyn FetchStrategy>;

// ============================================================================
// Provider Descriptor
// ============================================================================

/// Complete descriptor for a provider.
pub struct ProviderDescriptor {
    /// Provider identifier.
    pub id: ProviderKind,
    /// Strategy identifier, e.g. `iinet.feed`.
    pub strategy_id: &'static str,
    /// How usage is obtained.
    pub fetch_kind: FetchKind,
    /// Domains the provider is reached on.
    pub domains: &'static [&'static str],
    build_strategy: StrategyFactory,
}

impl ProviderDescriptor {
    /// Creates a descriptor.
    pub const fn new(
        id: ProviderKind,
        strategy_id: &'static str,
        fetch_kind: FetchKind,
        domains: &'static [&'static str],
        build_strategy: StrategyFactory,
    ) -> Self {
        Self {
            id,
            strategy_id,
            fetch_kind,
            domains,
            build_strategy,
        }
    }

    /// Builds the fetch strategy for this provider.
    pub fn build_strategy(&self, credentials: Credentials) -> Arc<dyn FetchStrategy> {
        (self.build_strategy)(credentials)
    }
}

impl std::fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("id", &self.id)
            .field("strategy_id", &self.strategy_id)
            .field("fetch_kind", &self.fetch_kind)
            .field("domains", &self.domains)
            .finish_non_exhaustive()
    }
}
