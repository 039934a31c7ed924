//! iiNet volume usage feed parser.

use serde::Deserialize;
use tracing::debug;
use usagewatch_core::UsageSnapshot;
use usagewatch_fetch::FetchError;

/// Quota allocations are reported in megabytes.
const BYTES_PER_MEGABYTE: u64 = 1_000_000;

// ============================================================================
// Feed Document
// ============================================================================

/// Root `<ii_feed>` element.
#[derive(Debug, Deserialize)]
pub struct IiFeed {
    /// Present when the toolbox rejected the login.
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub volume_usage: Option<VolumeUsage>,
}

#[derive(Debug, Deserialize)]
pub struct VolumeUsage {
    #[serde(default)]
    pub quota_reset: Vec<QuotaReset>,
    #[serde(default)]
    pub expected_traffic_types: Option<TrafficTypes>,
}

#[derive(Debug, Deserialize)]
pub struct QuotaReset {
    #[serde(default)]
    pub anniversary: Option<String>,
    #[serde(default)]
    pub days_remaining: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TrafficTypes {
    #[serde(rename = "type", default)]
    pub types: Vec<TrafficType>,
}

#[derive(Debug, Deserialize)]
pub struct TrafficType {
    #[serde(rename = "@classification", default)]
    pub classification: Option<String>,
    #[serde(rename = "@used", default)]
    pub used: Option<String>,
    #[serde(default)]
    pub quota_allocation: Vec<String>,
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses an iiNet feed body into a snapshot.
///
/// # Errors
///
/// - [`FetchError::AuthenticationFailed`] if the feed carries an `<error>`
/// - [`FetchError::Parse`] for malformed XML or non-numeric counts
/// - [`FetchError::Schema`] for missing elements or inconsistent counts
pub fn parse_feed(xml: &str) -> Result<UsageSnapshot, FetchError> {
    debug!(len = xml.len(), "Parsing iiNet feed");

    let feed: IiFeed = quick_xml::de::from_str(xml)
        .map_err(|e| FetchError::Parse(format!("Invalid feed XML: {e}")))?;

    if let Some(message) = feed.error {
        let message = message.trim();
        let message = if message.is_empty() {
            "login rejected"
        } else {
            message
        };
        return Err(FetchError::AuthenticationFailed(message.to_string()));
    }

    let usage = feed
        .volume_usage
        .ok_or_else(|| FetchError::Schema("missing <volume_usage>".to_string()))?;

    let reset = usage
        .quota_reset
        .first()
        .ok_or_else(|| FetchError::Schema("no <quota_reset> entries".to_string()))?;

    let traffic = usage
        .expected_traffic_types
        .as_ref()
        .and_then(|t| t.types.first())
        .ok_or_else(|| FetchError::Schema("no traffic <type> entries".to_string()))?;

    let allocation = traffic
        .quota_allocation
        .first()
        .ok_or_else(|| FetchError::Schema("no <quota_allocation> entries".to_string()))?;

    let days_remaining = parse_count("days_remaining", reset.days_remaining.as_deref())?;
    let used = parse_count("used", traffic.used.as_deref())?;
    let quota_mb = parse_count("quota_allocation", Some(allocation))?;

    let quota = quota_mb
        .checked_mul(BYTES_PER_MEGABYTE)
        .ok_or_else(|| FetchError::Schema(format!("quota of {quota_mb} MB overflows")))?;

    debug!(
        classification = traffic.classification.as_deref().unwrap_or("unknown"),
        anniversary = reset.anniversary.as_deref().unwrap_or("unknown"),
        "Parsed iiNet feed"
    );

    Ok(UsageSnapshot::from_counts(quota, used, days_remaining)?)
}

/// Parses a trimmed decimal count from the feed.
fn parse_count(field: &str, text: Option<&str>) -> Result<u64, FetchError> {
    let text = text.ok_or_else(|| FetchError::Schema(format!("missing {field}")))?;
    text.trim()
        .parse()
        .map_err(|_| FetchError::Parse(format!("{field} is not a whole number: {text:?}")))
}
