//! Fetch error types.

use std::fmt;
use thiserror::Error;

// ============================================================================
// Error Category
// ============================================================================

/// Coarse classification of a fetch failure, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The provider could not be reached or answered with an error status.
    Fetch,
    /// Login was rejected or the login form was missing.
    Auth,
    /// The payload did not have the expected shape.
    Schema,
    /// A value in the payload could not be parsed.
    Parse,
}

impl ErrorCategory {
    /// Returns the category name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Auth => "auth",
            Self::Schema => "schema",
            Self::Parse => "parse",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// The provider answered with a non-success status.
    #[error("Unexpected status code: {0}")]
    Status(u16),

    /// The whole operation ran past its deadline.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The payload is missing an element the extractor depends on.
    #[error("Unexpected payload shape: {0}")]
    Schema(String),

    /// A value in the payload could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Scripted browser error.
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    /// The counts could not form a valid snapshot.
    #[error("Invalid usage: {0}")]
    Core(#[from] usagewatch_core::CoreError),
}

impl FetchError {
    /// Returns the category this error falls into.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Http(_) | Self::Status(_) | Self::Timeout(_) => ErrorCategory::Fetch,
            Self::AuthenticationFailed(_) => ErrorCategory::Auth,
            Self::Schema(_) | Self::Core(_) => ErrorCategory::Schema,
            Self::Parse(_) | Self::Json(_) => ErrorCategory::Parse,
            Self::Browser(e) => e.category(),
        }
    }
}

// ============================================================================
// HTTP Error
// ============================================================================

/// HTTP-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request error.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

// ============================================================================
// Browser Error
// ============================================================================

/// Error type for scripted browser sessions.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// Page request failed.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Page answered with a non-success status.
    #[error("{url} returned status {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// URL could not be parsed or resolved.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// CSS selector did not parse.
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// No form matched the selector.
    #[error("Form not found: {0}")]
    FormNotFound(String),

    /// Form submission was rejected.
    #[error("Form submission failed: {0}")]
    SubmitFailed(String),

    /// An operation needed a loaded page.
    #[error("No page loaded")]
    NoPage,
}

impl BrowserError {
    /// Returns the category this error falls into.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FormNotFound(_) | Self::SubmitFailed(_) => ErrorCategory::Auth,
            Self::InvalidSelector(_) => ErrorCategory::Schema,
            Self::Request(_) | Self::Status { .. } | Self::InvalidUrl(_) | Self::NoPage => {
                ErrorCategory::Fetch
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use usagewatch_core::CoreError;

    #[test]
    fn test_categories() {
        assert_eq!(FetchError::Status(500).category(), ErrorCategory::Fetch);
        assert_eq!(FetchError::Timeout(20).category(), ErrorCategory::Fetch);
        assert_eq!(
            FetchError::AuthenticationFailed("bad password".into()).category(),
            ErrorCategory::Auth
        );
        assert_eq!(FetchError::Core(CoreError::ZeroQuota).category(), ErrorCategory::Schema);
        assert_eq!(FetchError::Parse("x".into()).category(), ErrorCategory::Parse);
    }

    #[test]
    fn test_browser_categories() {
        let err: FetchError = BrowserError::FormNotFound("form#loginForm".into()).into();
        assert_eq!(err.category(), ErrorCategory::Auth);

        let err: FetchError = BrowserError::NoPage.into();
        assert_eq!(err.category(), ErrorCategory::Fetch);
    }
}
