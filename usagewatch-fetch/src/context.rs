//! Fetch context providing access to host APIs.
//!
//! The fetch context is passed to all strategies and provides unified
//! access to the HTTP client and the scripted browser launcher.

use std::sync::Arc;
use std::time::Duration;

use crate::error::HttpError;
use crate::host::browser::{BrowserLauncher, DEFAULT_PAGE_TIMEOUT_SECS, HttpBrowserLauncher};
use crate::host::http::{DEFAULT_TIMEOUT_SECS, HttpClient};

/// Default deadline for a whole scripted browser session.
pub const DEFAULT_BROWSER_SESSION_SECS: u64 = 60;

// ============================================================================
// Fetch Settings
// ============================================================================

/// Settings for fetch operations.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Timeout for a single HTTP request.
    pub timeout: Duration,
    /// Deadline for an entire browser session (navigate, login, scrape).
    pub browser_timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            browser_timeout: Duration::from_secs(DEFAULT_BROWSER_SESSION_SECS),
        }
    }
}

impl FetchSettings {
    /// Creates settings with a custom request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Creates settings with a custom browser session deadline.
    #[must_use]
    pub fn with_browser_timeout(mut self, timeout: Duration) -> Self {
        self.browser_timeout = timeout;
        self
    }
}

// ============================================================================
// Fetch Context
// ============================================================================

/// Context provided to fetch strategies, giving access to host APIs.
pub struct FetchContext {
    /// HTTP client with tracing.
    pub http: Arc<HttpClient>,
    /// Scripted browser launcher.
    pub browser: Arc<dyn BrowserLauncher>,
    /// Fetch settings.
    pub settings: FetchSettings,
}

impl FetchContext {
    /// Creates a new fetch context with default host API implementations.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, HttpError> {
        Self::builder().build()
    }

    /// Creates a builder for customizing the context.
    pub fn builder() -> FetchContextBuilder {
        FetchContextBuilder::new()
    }

    /// Returns the request timeout.
    pub fn timeout(&self) -> Duration {
        self.settings.timeout
    }

    /// Returns the browser session deadline.
    pub fn browser_timeout(&self) -> Duration {
        self.settings.browser_timeout
    }
}

impl std::fmt::Debug for FetchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchContext")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Fetch Context Builder
// ============================================================================

/// Builder for constructing a `FetchContext`.
pub struct FetchContextBuilder {
    http: Option<Arc<HttpClient>>,
    browser: Option<Arc<dyn BrowserLauncher>>,
    settings: FetchSettings,
}

impl FetchContextBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            http: None,
            browser: None,
            settings: FetchSettings::default(),
        }
    }

    /// Sets the HTTP client.
    #[must_use]
    pub fn http(mut self, http: Arc<HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    /// Sets the browser launcher.
    #[must_use]
    pub fn browser(mut self, browser: Arc<dyn BrowserLauncher>) -> Self {
        self.browser = Some(browser);
        self
    }

    /// Sets the fetch settings.
    #[must_use]
    pub fn settings(mut self, settings: FetchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = timeout;
        self
    }

    /// Sets the browser session deadline.
    #[must_use]
    pub fn browser_timeout(mut self, timeout: Duration) -> Self {
        self.settings.browser_timeout = timeout;
        self
    }

    /// Builds the fetch context.
    ///
    /// # Errors
    ///
    /// Returns an error if a default HTTP client has to be built and fails.
    pub fn build(self) -> Result<FetchContext, HttpError> {
        let http = match self.http {
            Some(http) => http,
            None => Arc::new(HttpClient::with_timeout(self.settings.timeout)?),
        };
        let browser = self.browser.unwrap_or_else(|| {
            let page_timeout = self
                .settings
                .timeout
                .min(Duration::from_secs(DEFAULT_PAGE_TIMEOUT_SECS));
            Arc::new(HttpBrowserLauncher::new(page_timeout))
        });

        Ok(FetchContext {
            http,
            browser,
            settings: self.settings,
        })
    }
}

impl Default for FetchContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
