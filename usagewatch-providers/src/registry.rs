//! Provider registry.
//!
//! Static access to every provider descriptor, and the central point for
//! turning credentials into fetch strategies.

use std::sync::{Arc, OnceLock};
use usagewatch_core::{Credentials, ProviderKind};
use usagewatch_fetch::{FetchKind, FetchStrategy};

use crate::descriptor::ProviderDescriptor;
use crate::iinet::{IINET_DOMAIN, IiNetFeedStrategy};
use crate::vodafone::VodafonePortalStrategy;

// ============================================================================
// Static Registry
// ============================================================================

static DESCRIPTORS: OnceLock<Vec<ProviderDescriptor>> = OnceLock::new();

fn init_descriptors() -> Vec<ProviderDescriptor> {
    vec![
        ProviderDescriptor::new(
            ProviderKind::IiNet,
            "iinet.feed",
            FetchKind::XmlFeed,
            &[IINET_DOMAIN],
            |credentials| Arc::new(IiNetFeedStrategy::new(credentials)),
        ),
        ProviderDescriptor::new(
            ProviderKind::Vodafone,
            "vodafone.portal",
            FetchKind::WebPortal,
            &["myvodafone.com.au"],
            |credentials| Arc::new(VodafonePortalStrategy::new(credentials)),
        ),
    ]
}

// ============================================================================
// Provider Registry
// ============================================================================

/// Global registry of provider descriptors.
pub struct ProviderRegistry;

impl ProviderRegistry {
    /// Returns all provider descriptors.
    pub fn all() -> &'static [ProviderDescriptor] {
        DESCRIPTORS.get_or_init(init_descriptors)
    }

    /// Gets a provider descriptor by kind.
    pub fn get(id: ProviderKind) -> Option<&'static ProviderDescriptor> {
        Self::all().iter().find(|d| d.id == id)
    }

    /// Builds the strategy for a provider.
    pub fn strategy(id: ProviderKind, credentials: Credentials) -> Option<Arc<dyn FetchStrategy>> {
        Self::get(id).map(|d| d.build_strategy(credentials))
    }

    /// Returns the domains the HTTP client must be allowed to reach.
    pub fn allowed_domains() -> Vec<String> {
        Self::all()
            .iter()
            .filter(|d| d.fetch_kind == FetchKind::XmlFeed)
            .flat_map(|d| d.domains.iter().map(|domain| (*domain).to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_provider_registered() {
        for kind in ProviderKind::all() {
            let desc = ProviderRegistry::get(*kind).unwrap();
            assert_eq!(desc.id, *kind);
            assert!(!desc.domains.is_empty());
        }
    }

    #[test]
    fn test_strategy_ids_match_descriptors() {
        for desc in ProviderRegistry::all() {
            let strategy = desc.build_strategy(Credentials::new("login", "secret"));
            assert_eq!(strategy.id(), desc.strategy_id);
            assert_eq!(strategy.provider(), desc.id);
            assert_eq!(strategy.kind(), desc.fetch_kind);
        }
    }

    #[test]
    fn test_allowed_domains() {
        assert_eq!(ProviderRegistry::allowed_domains(), vec!["iinet.net.au".to_string()]);
    }
}
