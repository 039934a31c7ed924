//! Vodafone fetch strategy.
//!
//! Drives the My Vodafone portal through a scripted browser session:
//! sign in if needed, then read the data barchart and billing period.

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};
use usagewatch_core::{Credentials, ProviderKind, UsageSnapshot};
use usagewatch_fetch::{
    BrowserError, BrowserSession, FetchContext, FetchError, FetchKind, FetchResult, FetchStrategy,
};

use super::parser::parse_portal_usage;

/// Portal landing page.
pub const VODAFONE_HOME_URL: &str = "https://myaccount.myvodafone.com.au/home";

/// Title of the landing page once signed in.
pub const SIGNED_IN_TITLE: &str = "My usage | Vodafone Australia";

const LOGIN_FORM: &str = "form#loginForm";
const LOGIN_USER_FIELD: &str = "userid";
const LOGIN_PASSWORD_FIELD: &str = "password";

const DATA_USAGE_NODE: &str = "#included-data-plan > figure:nth-child(3)";
const DATA_USAGE_ATTR: &str = "data-barchart";
const BILLING_PERIOD_NODE: &str =
    "div.hidden-mobile:nth-child(1) > div:nth-child(1) > div:nth-child(1) > span:nth-child(1)";

// ============================================================================
// Portal Strategy
// ============================================================================

/// Fetches mobile data usage from the My Vodafone portal.
#[derive(Debug, Clone)]
pub struct VodafonePortalStrategy {
    credentials: Credentials,
}

impl VodafonePortalStrategy {
    /// Creates a strategy for the given mobile number and password.
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    async fn scrape(&self, ctx: &FetchContext) -> Result<UsageSnapshot, FetchError> {
        let mut session = at("launch", ctx.browser.launch().map_err(FetchError::from))?;

        at(
            "navigate",
            session
                .navigate(VODAFONE_HOME_URL)
                .await
                .map_err(FetchError::from),
        )?;

        if session.title().as_deref() == Some(SIGNED_IN_TITLE) {
            debug!("Portal session already signed in");
        } else {
            debug!(title = ?session.title(), "Signing in to portal");
            at("login", self.sign_in(session.as_mut()).await)?;
        }

        let barchart = at("read_data_usage", read_data_usage(session.as_ref()))?;
        let period = at("read_billing_period", read_billing_period(session.as_ref()))?;

        at("parse_usage", parse_portal_usage(&barchart, &period))
    }

    async fn sign_in(&self, session: &mut dyn BrowserSession) -> Result<(), FetchError> {
        session
            .fill_and_submit_form(
                LOGIN_FORM,
                &[
                    (LOGIN_USER_FIELD, self.credentials.login()),
                    (LOGIN_PASSWORD_FIELD, self.credentials.secret()),
                ],
            )
            .await
            .map_err(login_error)
    }
}

fn login_error(error: BrowserError) -> FetchError {
    match error {
        BrowserError::FormNotFound(selector) => {
            FetchError::AuthenticationFailed(format!("login form {selector} not found"))
        }
        other => FetchError::AuthenticationFailed(other.to_string()),
    }
}

fn read_data_usage(session: &dyn BrowserSession) -> Result<String, FetchError> {
    let node = session
        .find_one(DATA_USAGE_NODE)?
        .ok_or_else(|| FetchError::Schema(format!("data usage node {DATA_USAGE_NODE} not found")))?;

    node.attr(DATA_USAGE_ATTR)
        .map(str::to_string)
        .ok_or_else(|| FetchError::Schema(format!("data usage node has no {DATA_USAGE_ATTR}")))
}

fn read_billing_period(session: &dyn BrowserSession) -> Result<String, FetchError> {
    let node = session
        .find_one(BILLING_PERIOD_NODE)?
        .ok_or_else(|| FetchError::Schema("billing period node not found".to_string()))?;

    if node.text().trim().is_empty() {
        return Err(FetchError::Schema("billing period text is empty".to_string()));
    }
    Ok(node.text().to_string())
}

/// Logs a failed step with its operation name and passes the result through.
fn at<T>(operation: &'static str, result: Result<T, FetchError>) -> Result<T, FetchError> {
    result.inspect_err(|e| {
        warn!(
            provider = %ProviderKind::Vodafone,
            operation,
            category = %e.category(),
            error = %e,
            "Vodafone extraction failed"
        );
    })
}

#[async_trait]
impl FetchStrategy for VodafonePortalStrategy {
    fn id(&self) -> &str {
        "vodafone.portal"
    }

    fn provider(&self) -> ProviderKind {
        ProviderKind::Vodafone
    }

    fn kind(&self) -> FetchKind {
        FetchKind::WebPortal
    }

    #[instrument(skip(self, ctx))]
    async fn fetch(&self, ctx: &FetchContext) -> Result<FetchResult, FetchError> {
        let deadline = ctx.browser_timeout();
        let snapshot = match tokio::time::timeout(deadline, self.scrape(ctx)).await {
            Ok(result) => result?,
            Err(_) => {
                let err = FetchError::Timeout(deadline.as_secs());
                warn!(
                    provider = %ProviderKind::Vodafone,
                    operation = "session",
                    category = %err.category(),
                    error = %err,
                    "Vodafone extraction failed"
                );
                return Err(err);
            }
        };

        info!(
            provider = %ProviderKind::Vodafone,
            quota = snapshot.quota,
            used = snapshot.used,
            remaining = snapshot.remaining,
            percent_used = snapshot.percent_used,
            days_remaining = snapshot.days_remaining,
            "Fetched Vodafone usage"
        );

        Ok(FetchResult::new(snapshot, self.id(), self.kind()))
    }
}

// ============================================================================
// Tests
// ============================================================================
