//! HTTP client with tracing, timeout, and domain allowlist.
//!
//! This module provides a wrapped HTTP client that adds:
//! - Request/response tracing (query strings are never logged, they carry credentials)
//! - Domain allowlist, enforced on redirects too
//! - A bounded request timeout

use reqwest::redirect::Policy;
use reqwest::{Client, Response};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{FetchError, HttpError};

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// User agent string for usagewatch.
const USER_AGENT: &str = concat!("usagewatch/", env!("CARGO_PKG_VERSION"));

/// Redirect hops followed before giving up.
const MAX_REDIRECTS: usize = 10;

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing and domain allowlist.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    timeout: Duration,
    allowed_domains: Option<Arc<[String]>>,
}

impl HttpClient {
    /// Creates a new HTTP client with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new HTTP client with a custom timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        Self::build(timeout, None)
    }

    fn build(timeout: Duration, allowed_domains: Option<Arc<[String]>>) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(redirect_policy(allowed_domains.clone()))
            .build()?;

        Ok(Self {
            inner: client,
            timeout,
            allowed_domains,
        })
    }

    /// Restricts this client, including redirect targets, to the given
    /// domains and their subdomains.
    ///
    /// # Errors
    ///
    /// Returns an error if the restricted client cannot be built.
    pub fn allow_domains(self, domains: Vec<String>) -> Result<Self, HttpError> {
        Self::build(self.timeout, Some(domains.into()))
    }

    /// Checks if a URL's domain is allowed.
    fn is_domain_allowed(&self, url: &str) -> Result<(), HttpError> {
        let Some(ref allowed) = self.allowed_domains else {
            return Ok(()); // No restrictions
        };

        let parsed = Url::parse(url).map_err(|e| HttpError::InvalidUrl(e.to_string()))?;

        let host = parsed
            .host_str()
            .ok_or_else(|| HttpError::InvalidUrl("No host in URL".to_string()))?;

        if host_allowed(allowed, host) {
            Ok(())
        } else {
            Err(HttpError::InvalidUrl(format!("domain not allowed: {host}")))
        }
    }

    /// Performs a GET request.
    #[instrument(skip(self, url), fields(url = %redact_query(url)))]
    pub async fn get(&self, url: &str) -> Result<Response, HttpError> {
        self.is_domain_allowed(url)?;
        debug!("GET request");

        let response = self.inner.get(url).send().await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Performs a GET request and returns the body of a successful response.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] on transport failure and
    /// [`FetchError::Status`] on a non-success status code.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.get(url).await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Http(HttpError::Request(e)))
    }
}

fn host_allowed(allowed: &[String], host: &str) -> bool {
    allowed
        .iter()
        .any(|domain| host == domain || host.ends_with(&format!(".{domain}")))
}

/// Follows redirects only while they stay on the allowed domains.
fn redirect_policy(allowed_domains: Option<Arc<[String]>>) -> Policy {
    let Some(allowed) = allowed_domains else {
        return Policy::limited(MAX_REDIRECTS);
    };

    Policy::custom(move |attempt| {
        let permitted = attempt
            .url()
            .host_str()
            .is_some_and(|host| host_allowed(&allowed, host));

        if !permitted {
            let target = redact_query(attempt.url().as_str());
            attempt.error(format!("redirect to disallowed domain: {target}"))
        } else if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else {
            attempt.follow()
        }
    })
}

/// Strips the query string and fragment from a URL for logging.
pub fn redact_query(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.split('?').next().unwrap_or_default().to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
