// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # usagewatch Fetch
//!
//! Transport and browser host APIs plus the fetch strategy seam.
//!
//! ## Host APIs
//!
//! - [`host::http`] - HTTP client with tracing, timeout and domain allowlist
//! - [`host::browser`] - Scripted browser sessions (navigate, select, submit forms)
//!
//! ## Strategies
//!
//! - [`strategy::FetchStrategy`] - Trait every provider extractor implements
//! - [`context::FetchContext`] - Provides access to host APIs
//!
//! ## Example
//!
//! ```ignore
//! use usagewatch_fetch::FetchContext;
//!
//! let ctx = FetchContext::new()?;
//! let result = strategy.fetch(&ctx).await?;
//! store.set_snapshot(strategy.provider(), result.snapshot).await;
//! ```

pub mod context;
pub mod error;
pub mod host;
pub mod strategy;

// Errors
pub use error::{BrowserError, ErrorCategory, FetchError, HttpError};

// Host APIs
pub use host::{
    browser::{BrowserLauncher, BrowserSession, Element, HttpBrowser, HttpBrowserLauncher},
    http::HttpClient,
};

// Strategy
pub use context::{FetchContext, FetchContextBuilder, FetchSettings};
pub use strategy::{FetchKind, FetchResult, FetchStrategy};
