//! Scripted browser sessions for portal scraping.
//!
//! Extractors that have to log in to an account portal talk to a
//! [`BrowserSession`]: navigate, read the title, look elements up by CSS
//! selector, fill and submit forms. Sessions are created by a
//! [`BrowserLauncher`] so that every refresh starts from a clean cookie jar.
//!
//! [`HttpBrowser`] is the default implementation. It keeps cookies across
//! requests, parses pages with `scraper`, and submits forms the way a browser
//! would without running any JavaScript.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use crate::error::BrowserError;

/// Desktop browser user agent; the portal serves a reduced page to unknown agents.
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; WOW64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/52.0.2743.116 Safari/537.36";

/// Default per-request timeout for browser page loads.
pub const DEFAULT_PAGE_TIMEOUT_SECS: u64 = 20;

// ============================================================================
// Element
// ============================================================================

/// An element captured from a page.
///
/// Owned so it can outlive the parsed document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    text: String,
    attributes: Vec<(String, String)>,
}

impl Element {
    /// Sets the element's text content.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Returns the concatenated text content of the element and its children.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns an attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn from_ref(element: ElementRef<'_>) -> Self {
        Self {
            text: element.text().collect(),
            attributes: element
                .value()
                .attrs()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
        }
    }
}

// ============================================================================
// Capability Traits
// ============================================================================

/// A scripted browsing session.
#[async_trait]
pub trait BrowserSession: Send {
    /// Loads a page, replacing the current one.
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Returns the current page's title.
    fn title(&self) -> Option<String>;

    /// Returns the first element on the current page matching `selector`.
    fn find_one(&self, selector: &str) -> Result<Option<Element>, BrowserError>;

    /// Fills the named fields of the form matching `selector` and submits it.
    ///
    /// The response becomes the current page.
    async fn fill_and_submit_form(
        &mut self,
        selector: &str,
        fields: &[(&str, &str)],
    ) -> Result<(), BrowserError>;
}

/// Creates fresh browsing sessions.
pub trait BrowserLauncher: Send + Sync {
    /// Starts a new session with an empty cookie jar.
    fn launch(&self) -> Result<Box<dyn BrowserSession>, BrowserError>;
}

// ============================================================================
// HTTP Browser
// ============================================================================

/// A loaded page.
#[derive(Debug, Clone)]
struct Page {
    url: Url,
    html: String,
}

/// Cookie-carrying HTTP session that behaves like a browser without JavaScript.
#[derive(Debug)]
pub struct HttpBrowser {
    client: Client,
    page: Option<Page>,
}

impl HttpBrowser {
    /// Creates a session with the given per-request timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, BrowserError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client, page: None })
    }

    fn current(&self) -> Result<&Page, BrowserError> {
        self.page.as_ref().ok_or(BrowserError::NoPage)
    }

    async fn load(&mut self, request: RequestBuilder) -> Result<(), BrowserError> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().clone();

        if !status.is_success() {
            return Err(BrowserError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response.text().await?;
        debug!(url = %url, bytes = html.len(), "Page loaded");
        self.page = Some(Page { url, html });
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for HttpBrowser {
    #[instrument(skip(self))]
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        let url = Url::parse(url).map_err(|e| BrowserError::InvalidUrl(e.to_string()))?;
        let request = self.client.get(url);
        self.load(request).await
    }

    fn title(&self) -> Option<String> {
        self.page.as_ref().and_then(|page| page_title(&page.html))
    }

    fn find_one(&self, selector: &str) -> Result<Option<Element>, BrowserError> {
        select_first(&self.current()?.html, selector)
    }

    #[instrument(skip(self, fields), fields(field_count = fields.len()))]
    async fn fill_and_submit_form(
        &mut self,
        selector: &str,
        fields: &[(&str, &str)],
    ) -> Result<(), BrowserError> {
        let page = self.current()?;
        let submission = build_submission(&page.url, &page.html, selector, fields)?;
        debug!(method = %submission.method, action = %submission.action, "Submitting form");

        let request = if submission.method == Method::POST {
            self.client.post(submission.action).form(&submission.pairs)
        } else {
            let mut action = submission.action;
            action
                .query_pairs_mut()
                .clear()
                .extend_pairs(submission.pairs.iter());
            self.client.get(action)
        };

        self.load(request).await.map_err(|e| match e {
            BrowserError::Status { url, status } => {
                BrowserError::SubmitFailed(format!("{url} returned status {status}"))
            }
            other => other,
        })
    }
}

/// Launches [`HttpBrowser`] sessions with a desktop user agent.
#[derive(Debug, Clone)]
pub struct HttpBrowserLauncher {
    timeout: Duration,
}

impl HttpBrowserLauncher {
    /// Creates a launcher with the given per-request timeout.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for HttpBrowserLauncher {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_PAGE_TIMEOUT_SECS))
    }
}

impl BrowserLauncher for HttpBrowserLauncher {
    fn launch(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        Ok(Box::new(HttpBrowser::new(self.timeout, DESKTOP_USER_AGENT)?))
    }
}

// ============================================================================
// Page Helpers
// ============================================================================

fn parse_selector(selector: &str) -> Result<Selector, BrowserError> {
    Selector::parse(selector).map_err(|e| BrowserError::InvalidSelector(format!("{selector}: {e}")))
}

/// Returns the trimmed `<title>` of a document.
fn page_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = parse_selector("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|title| title.text().collect::<String>().trim().to_string())
}

/// Returns the first element matching `selector`.
fn select_first(html: &str, selector: &str) -> Result<Option<Element>, BrowserError> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);
    Ok(document.select(&selector).next().map(Element::from_ref))
}

/// A form ready to be sent.
#[derive(Debug)]
struct FormSubmission {
    method: Method,
    action: Url,
    pairs: Vec<(String, String)>,
}

/// Collects a form's successful controls, applies `fields`, and resolves the action.
fn build_submission(
    base: &Url,
    html: &str,
    selector: &str,
    fields: &[(&str, &str)],
) -> Result<FormSubmission, BrowserError> {
    let form_selector = parse_selector(selector)?;
    let control_selector = parse_selector("input[name], textarea[name], select[name]")?;
    let option_selector = parse_selector("option")?;

    let document = Html::parse_document(html);
    let form = document
        .select(&form_selector)
        .next()
        .ok_or_else(|| BrowserError::FormNotFound(selector.to_string()))?;

    let mut pairs: Vec<(String, String)> = Vec::new();
    for control in form.select(&control_selector) {
        let element = control.value();
        let Some(name) = element.attr("name") else {
            continue;
        };

        let value = match element.name() {
            "textarea" => control.text().collect::<String>(),
            "select" => {
                let options: Vec<_> = control.select(&option_selector).collect();
                let chosen = options
                    .iter()
                    .find(|o| o.value().attr("selected").is_some())
                    .or_else(|| options.first());
                match chosen {
                    Some(option) => option
                        .value()
                        .attr("value")
                        .map_or_else(|| option.text().collect::<String>(), str::to_string),
                    None => continue,
                }
            }
            _ => {
                let kind = element.attr("type").unwrap_or("text").to_ascii_lowercase();
                match kind.as_str() {
                    "submit" | "button" | "image" | "reset" | "file" => continue,
                    "checkbox" | "radio" => {
                        if element.attr("checked").is_none() {
                            continue;
                        }
                        element.attr("value").unwrap_or("on").to_string()
                    }
                    _ => element.attr("value").unwrap_or_default().to_string(),
                }
            }
        };
        pairs.push((name.to_string(), value));
    }

    for (name, value) in fields {
        match pairs.iter_mut().find(|(n, _)| n == name) {
            Some(pair) => pair.1 = (*value).to_string(),
            None => pairs.push(((*name).to_string(), (*value).to_string())),
        }
    }

    let action = match form.value().attr("action").map(str::trim) {
        Some(action) if !action.is_empty() => base
            .join(action)
            .map_err(|e| BrowserError::InvalidUrl(format!("{action}: {e}")))?,
        _ => base.clone(),
    };

    let method = match form.value().attr("method") {
        Some(m) if m.eq_ignore_ascii_case("post") => Method::POST,
        _ => Method::GET,
    };

    Ok(FormSubmission {
        method,
        action,
        pairs,
    })
}

// ============================================================================
// Tests
// ============================================================================
