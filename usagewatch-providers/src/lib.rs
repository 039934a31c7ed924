// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # usagewatch Providers
//!
//! Provider-specific usage extractors.
//!
//! Each provider module includes:
//!
//! - **Strategies**: The [`usagewatch_fetch::FetchStrategy`] implementation
//! - **Parser**: Payload parsing into a [`usagewatch_core::UsageSnapshot`]
//!
//! ## Supported Providers
//!
//! | Provider | Slot | Source | Login |
//! |----------|------|--------|-------|
//! | iiNet | `internet` | Toolbox XML feed | username + password |
//! | Vodafone | `mobile` | Account portal (scripted browser) | mobile number + password |
//!
//! ## Usage
//!
//! ```ignore
//! use usagewatch_core::{Credentials, ProviderKind};
//! use usagewatch_fetch::FetchContext;
//! use usagewatch_providers::ProviderRegistry;
//!
//! let strategy = ProviderRegistry::strategy(ProviderKind::IiNet, Credentials::new(user, pass))
//!     .unwrap();
//! let ctx = FetchContext::new()?;
//! let result = strategy.fetch(&ctx).await?;
//! ```

pub mod descriptor;
pub mod registry;

// Provider modules (alphabetical)
pub mod iinet;
pub mod vodafone;

pub use descriptor::ProviderDescriptor;
pub use iinet::IiNetFeedStrategy;
pub use registry::ProviderRegistry;
pub use vodafone::VodafonePortalStrategy;

// Edge case tests
mod parser_edge_tests;
