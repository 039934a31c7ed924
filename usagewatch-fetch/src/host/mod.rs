//! Host APIs for usagewatch fetch strategies.
//!
//! - [`http`] - HTTP client with tracing and domain allowlist
//! - [`browser`] - Scripted browser sessions for portal scraping

pub mod browser;
pub mod http;

// Re-export key types
pub use browser::{BrowserLauncher, BrowserSession, Element, HttpBrowser, HttpBrowserLauncher};
pub use http::HttpClient;
