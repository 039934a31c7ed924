// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `usagewatch` Core
//!
//! Core types and models shared by every `usagewatch` crate.
//!
//! - Domain models (providers, normalized usage snapshots, combined output)
//! - Error types for snapshot construction
//!
//! ## Key Types
//!
//! - [`ProviderKind`] - The two polled providers and their output slots
//! - [`UsageSnapshot`] - Normalized usage for one provider
//! - [`CombinedUsage`] - The JSON document served to callers
//! - [`Credentials`] - Provider logins (secret redacted from `Debug`)

pub mod error;
pub mod models;

pub use error::CoreError;

pub use models::{CombinedUsage, Credentials, ProviderKind, SlotData, UsageSnapshot};
