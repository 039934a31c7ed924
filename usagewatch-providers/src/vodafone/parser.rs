//! Vodafone account portal parsers.
//!
//! The portal renders data usage as a JSON blob in a `data-barchart`
//! attribute and the billing period as free text.

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::debug;
use usagewatch_core::UsageSnapshot;
use usagewatch_fetch::FetchError;

static ENDS_TODAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Ends today").expect("Invalid regex"));

static DAYS_LEFT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?P<days_remaining>\d+) days left.+",
        r"Inclusions refresh: (?P<resets_at_date>\d+ \w{3})",
    ))
    .expect("Invalid regex")
});

// ============================================================================
// Data Usage
// ============================================================================

/// The `data-barchart` payload.
#[derive(Debug, Deserialize)]
pub struct Barchart {
    /// Plan allowance.
    #[serde(default)]
    pub unit_total: Option<BarchartValue>,
    /// Amount used so far.
    #[serde(default)]
    pub unit_count: Option<BarchartValue>,
}

/// A barchart figure, rendered either as a string or a bare number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum BarchartValue {
    /// `"12.5"`
    Text(String),
    /// `12.5`
    Number(serde_json::Number),
}

impl BarchartValue {
    fn to_whole_number(&self, field: &str) -> Result<u64, FetchError> {
        match self {
            Self::Text(text) => parse_whole_number(field, text),
            Self::Number(number) => parse_whole_number(field, &number.to_string()),
        }
    }
}

/// Quota and usage read from the barchart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataUsage {
    /// Plan allowance.
    pub quota: u64,
    /// Amount used.
    pub used: u64,
}

/// Parses a `data-barchart` attribute value.
///
/// # Errors
///
/// Returns [`FetchError::Parse`] for invalid JSON or figures, and
/// [`FetchError::Schema`] when the payload is not an object or a figure
/// is absent or of the wrong type.
pub fn parse_barchart(raw: &str) -> Result<DataUsage, FetchError> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| FetchError::Parse(format!("data-barchart is not valid JSON: {e}")))?;

    // A derived struct would also accept a positional array.
    if !value.is_object() {
        return Err(FetchError::Schema(format!("data-barchart is not an object: {value}")));
    }

    let barchart: Barchart = serde_json::from_value(value)
        .map_err(|e| FetchError::Schema(format!("data-barchart has unexpected figures: {e}")))?;

    let quota = barchart
        .unit_total
        .as_ref()
        .ok_or_else(|| FetchError::Schema("data-barchart has no unit_total".to_string()))?
        .to_whole_number("unit_total")?;
    let used = barchart
        .unit_count
        .as_ref()
        .ok_or_else(|| FetchError::Schema("data-barchart has no unit_count".to_string()))?
        .to_whole_number("unit_count")?;

    Ok(DataUsage { quota, used })
}

/// Parses the integer part of a decimal figure (`"12.5"` is 12).
///
/// # Errors
///
/// Returns [`FetchError::Parse`] if the integer part is not a `u64`.
pub fn parse_whole_number(field: &str, text: &str) -> Result<u64, FetchError> {
    let whole = text.trim().split('.').next().unwrap_or_default();
    whole
        .parse()
        .map_err(|_| FetchError::Parse(format!("{field} is not a number: {text:?}")))
}

// ============================================================================
// Billing Period
// ============================================================================

/// Days left in the billing period and, when shown, the refresh date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingPeriod {
    /// Whole days until inclusions refresh.
    pub days_remaining: u64,
    /// Refresh date as printed on the portal, e.g. `14 Jun`.
    pub resets_on: Option<String>,
}

/// Collapses runs of whitespace (including newlines) into single spaces.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses the billing period text.
///
/// # Errors
///
/// Returns [`FetchError::Parse`] if the text matches neither known form.
pub fn parse_period(text: &str) -> Result<BillingPeriod, FetchError> {
    let text = normalize_whitespace(text);

    if ENDS_TODAY.is_match(&text) {
        return Ok(BillingPeriod {
            days_remaining: 0,
            resets_on: None,
        });
    }

    let captures = DAYS_LEFT
        .captures(&text)
        .ok_or_else(|| FetchError::Parse(format!("unrecognised billing period: {text:?}")))?;

    let days_remaining = captures["days_remaining"]
        .parse()
        .map_err(|_| FetchError::Parse(format!("days left out of range: {text:?}")))?;

    Ok(BillingPeriod {
        days_remaining,
        resets_on: Some(captures["resets_at_date"].to_string()),
    })
}

/// Builds a snapshot from the raw barchart attribute and period text.
///
/// # Errors
///
/// Propagates parse failures and rejects inconsistent counts.
pub fn parse_portal_usage(barchart: &str, period: &str) -> Result<UsageSnapshot, FetchError> {
    let usage = parse_barchart(barchart)?;
    let period = parse_period(period)?;

    debug!(
        quota = usage.quota,
        used = usage.used,
        days_remaining = period.days_remaining,
        resets_on = period.resets_on.as_deref().unwrap_or("today"),
        "Parsed Vodafone usage"
    );

    Ok(UsageSnapshot::from_counts(
        usage.quota,
        usage.used,
        period.days_remaining,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whole_number_truncates() {
        assert_eq!(parse_whole_number("unit_total", "12.5").unwrap(), 12);
        assert_eq!(parse_whole_number("unit_total", "40").unwrap(), 40);
        assert_eq!(parse_whole_number("unit_total", " 7.99 ").unwrap(), 7);
    }

    #[test]
    fn test_parse_whole_number_rejects_junk() {
        assert!(matches!(
            parse_whole_number("unit_count", "abc"),
            Err(FetchError::Parse(_))
        ));
        assert!(parse_whole_number("unit_count", "-1").is_err());
        assert!(parse_whole_number("unit_count", ".5").is_err());
    }

    #[test]
    fn test_parse_barchart_strings() {
        let usage =
            parse_barchart(r#"{"unit_total":"40.00","unit_count":"12.5","unit":"GB"}"#).unwrap();
        assert_eq!(usage, DataUsage { quota: 40, used: 12 });
    }

    #[test]
    fn test_parse_barchart_rejects_array() {
        assert!(matches!(parse_barchart("[40, 10]"), Err(FetchError::Schema(_))));
        assert!(matches!(
            parse_portal_usage("[40, 10]", "3 days left. Inclusions refresh: 14 Jun"),
            Err(FetchError::Schema(_))
        ));
    }

    #[test]
    fn test_parse_barchart_wrong_figure_type() {
        let result = parse_barchart(r#"{"unit_total":true,"unit_count":"1"}"#);
        assert!(matches!(result, Err(FetchError::Schema(_))));
    }

    #[test]
    fn test_parse_barchart_numbers() {
        let usage = parse_barchart(r#"{"unit_total":40,"unit_count":3.75}"#).unwrap();
        assert_eq!(usage, DataUsage { quota: 40, used: 3 });
    }

    #[test]
    fn test_parse_barchart_missing_field() {
        assert!(matches!(
            parse_barchart(r#"{"unit_total":"40"}"#),
            Err(FetchError::Schema(_))
        ));
    }

    #[test]
    fn test_parse_barchart_invalid_json() {
        assert!(matches!(parse_barchart("{unit_total"), Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_period_ends_today() {
        let period = parse_period("  Ends today\n  ").unwrap();
        assert_eq!(period.days_remaining, 0);
        assert_eq!(period.resets_on, None);
    }

    #[test]
    fn test_period_days_left() {
        let period = parse_period("3 days left. Inclusions refresh: 14 Jun").unwrap();
        assert_eq!(period.days_remaining, 3);
        assert_eq!(period.resets_on.as_deref(), Some("14 Jun"));
    }

    #[test]
    fn test_period_with_line_breaks() {
        let period =
            parse_period("\n   21 days left.\n\n   Inclusions refresh:\t 2 Jul\n").unwrap();
        assert_eq!(period.days_remaining, 21);
        assert_eq!(period.resets_on.as_deref(), Some("2 Jul"));
    }

    #[test]
    fn test_period_unrecognised() {
        assert!(matches!(parse_period("Plan paused"), Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \n\n b\t c  "), "a b c");
        assert_eq!(normalize_whitespace(" \n "), "");
    }

    #[test]
    fn test_parse_portal_usage() {
        let snapshot = parse_portal_usage(
            r#"{"unit_total":"40","unit_count":"10"}"#,
            "3 days left. Inclusions refresh: 14 Jun",
        )
        .unwrap();

        assert_eq!(snapshot.quota, 40);
        assert_eq!(snapshot.used, 10);
        assert_eq!(snapshot.remaining, 30);
        assert!((snapshot.percent_used - 25.0).abs() < 1e-9);
        assert_eq!(snapshot.days_remaining, 3);
    }
}
