//! Fetch strategy trait and types.
//!
//! A strategy is one way of obtaining a provider's usage: the iiNet XML feed
//! or the Vodafone portal scrape. The scheduler only ever sees this trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use usagewatch_core::{ProviderKind, UsageSnapshot};

use crate::context::FetchContext;
use crate::error::FetchError;

// ============================================================================
// Fetch Kind
// ============================================================================

/// The kind of fetch mechanism a strategy uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchKind {
    /// Authenticated XML feed over HTTP.
    XmlFeed,
    /// Account portal driven through a scripted browser.
    WebPortal,
}

impl FetchKind {
    /// Returns the display name for this kind.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::XmlFeed => "XML Feed",
            Self::WebPortal => "Web Portal",
        }
    }
}

impl fmt::Display for FetchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Fetch Result
// ============================================================================

/// The result of a successful fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// The fetched usage snapshot.
    pub snapshot: UsageSnapshot,
    /// The strategy that produced it.
    pub strategy_id: String,
    /// The kind of fetch used.
    pub kind: FetchKind,
    /// When the fetch completed.
    pub fetched_at: DateTime<Utc>,
}

impl FetchResult {
    /// Creates a new fetch result stamped with the current time.
    pub fn new(snapshot: UsageSnapshot, strategy_id: impl Into<String>, kind: FetchKind) -> Self {
        Self {
            snapshot,
            strategy_id: strategy_id.into(),
            kind,
            fetched_at: Utc::now(),
        }
    }
}

// ============================================================================
// Fetch Strategy Trait
// ============================================================================

/// A strategy for fetching usage data from a provider.
///
/// ## Implementing a Strategy
///
/// ```ignore
/// struct FeedStrategy;
///
/// #[async_trait]
/// impl FetchStrategy for FeedStrategy {
///     fn id(&self) -> &str {
///         "iinet.feed"
///     }
///
///     fn provider(&self) -> ProviderKind {
///         ProviderKind::IiNet
///     }
///
///     fn kind(&self) -> FetchKind {
///         FetchKind::XmlFeed
///     }
///
///     async fn fetch(&self, ctx: &FetchContext) -> Result<FetchResult, FetchError> {
///         let body = ctx.http.get_text(URL).await?;
///         // Parse body and return FetchResult
///     }
/// }
/// ```
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    /// Unique identifier for this strategy (e.g., "iinet.feed").
    fn id(&self) -> &str;

    /// The provider this strategy reads.
    fn provider(&self) -> ProviderKind;

    /// The kind of fetch this strategy uses.
    fn kind(&self) -> FetchKind;

    /// Human-readable name for this strategy, e.g. `iiNet (XML Feed)`.
    fn display_name(&self) -> String {
        format!("{} ({})", self.provider().display_name(), self.kind())
    }

    /// Fetch usage data using this strategy.
    ///
    /// Implementations must leave no side effects behind on failure.
    async fn fetch(&self, ctx: &FetchContext) -> Result<FetchResult, FetchError>;
}

// ============================================================================
// Tests
// ============================================================================
