//! iiNet fetch strategy.

use async_trait::async_trait;
use tracing::{info, instrument, warn};
use url::Url;
use usagewatch_core::{Credentials, ProviderKind, UsageSnapshot};
use usagewatch_fetch::{FetchContext, FetchError, FetchKind, FetchResult, FetchStrategy, HttpError};

use super::parser::parse_feed;

/// iiNet toolbox volume usage endpoint.
pub const IINET_FEED_URL: &str = "https://toolbox.iinet.net.au/cgi-bin/new/volume_usage_xml.cgi";

/// Domain the feed is served from.
pub const IINET_DOMAIN: &str = "iinet.net.au";

// ============================================================================
// Feed Strategy
// ============================================================================

/// Fetches broadband usage from the iiNet toolbox XML feed.
#[derive(Debug, Clone)]
pub struct IiNetFeedStrategy {
    credentials: Credentials,
    endpoint: String,
}

impl IiNetFeedStrategy {
    /// Creates a strategy for the given toolbox login.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            endpoint: IINET_FEED_URL.to_string(),
        }
    }

    /// Points the strategy at a different feed endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Builds the login URL with URL-encoded credentials.
    fn feed_url(&self) -> Result<Url, FetchError> {
        Url::parse_with_params(
            &self.endpoint,
            &[
                ("username", self.credentials.login()),
                ("action", "login"),
                ("password", self.credentials.secret()),
            ],
        )
        .map_err(|e| FetchError::Http(HttpError::InvalidUrl(e.to_string())))
    }

    async fn fetch_snapshot(&self, ctx: &FetchContext) -> Result<UsageSnapshot, FetchError> {
        let url = self.feed_url()?;
        let body = ctx
            .http
            .get_text(url.as_str())
            .await
            .inspect_err(|e| log_failure("fetch_feed", e))?;

        parse_feed(&body).inspect_err(|e| log_failure("parse_feed", e))
    }
}

fn log_failure(operation: &'static str, error: &FetchError) {
    warn!(
        provider = %ProviderKind::IiNet,
        operation,
        category = %error.category(),
        error = %error,
        "iiNet extraction failed"
    );
}

#[async_trait]
impl FetchStrategy for IiNetFeedStrategy {
    fn id(&self) -> &str {
        "iinet.feed"
    }

    fn provider(&self) -> ProviderKind {
        ProviderKind::IiNet
    }

    fn kind(&self) -> FetchKind {
        FetchKind::XmlFeed
    }

    #[instrument(skip(self, ctx))]
    async fn fetch(&self, ctx: &FetchContext) -> Result<FetchResult, FetchError> {
        let snapshot = self.fetch_snapshot(ctx).await?;

        info!(
            provider = %ProviderKind::IiNet,
            quota = snapshot.quota,
            used = snapshot.used,
            remaining = snapshot.remaining,
            percent_used = snapshot.percent_used,
            days_remaining = snapshot.days_remaining,
            "Fetched iiNet usage"
        );

        Ok(FetchResult::new(snapshot, self.id(), self.kind()))
    }
}
