//! Vodafone provider implementation.
//!
//! Vodafone has no usage API; the My Vodafone account portal is driven
//! through a scripted browser session. Signing in uses the mobile number
//! and account password.
//!
//! Portal domain: `myaccount.myvodafone.com.au`

pub(crate) mod parser;
mod strategies;

pub use parser::{
    BillingPeriod, DataUsage, normalize_whitespace, parse_barchart, parse_period,
    parse_portal_usage, parse_whole_number,
};
pub use strategies::{SIGNED_IN_TITLE, VODAFONE_HOME_URL, VodafonePortalStrategy};
