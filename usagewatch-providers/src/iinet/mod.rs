//! iiNet provider implementation.
//!
//! iiNet publishes broadband volume usage through the toolbox XML feed.
//! Credentials travel in the query string, so feed URLs are never logged
//! with their query.
//!
//! Feed domain: `toolbox.iinet.net.au`

pub(crate) mod parser;
mod strategies;

pub use parser::parse_feed;
pub use strategies::{IINET_DOMAIN, IINET_FEED_URL, IiNetFeedStrategy};
