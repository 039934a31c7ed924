//! Domain models for `usagewatch`.
//!
//! ## Submodules
//!
//! - [`credentials`] - Provider login credentials
//! - [`provider`] - Provider kinds and their output slots
//! - [`usage`] - Usage snapshot and the combined response document

mod credentials;
mod provider;
mod usage;

pub use credentials::Credentials;
pub use provider::ProviderKind;
pub use usage::{CombinedUsage, SlotData, UsageSnapshot};
