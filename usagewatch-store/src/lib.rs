// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # usagewatch Store
//!
//! Shared state for the usagewatch service.
//!
//! This crate provides:
//!
//! - **UsageStore**: Latest snapshot per provider plus failure bookkeeping
//! - **RefreshCadence**: Tick-counted refresh schedule (adaptive or fixed)
//! - **Config**: Environment-driven configuration
//!
//! ## Usage
//!
//! ```ignore
//! use usagewatch_core::ProviderKind;
//! use usagewatch_store::{RefreshCadence, RefreshPolicy, TickDecision, UsageStore};
//!
//! let store = UsageStore::new();
//! let cadence = RefreshCadence::new(RefreshPolicy::Adaptive);
//!
//! if cadence.on_tick(ProviderKind::IiNet) == TickDecision::Due {
//!     store.set_snapshot(ProviderKind::IiNet, snapshot).await;
//!     cadence.mark_refreshed(ProviderKind::IiNet);
//! }
//! ```

pub mod cadence;
pub mod config;
pub mod error;
pub mod usage_store;

pub use cadence::{
    CadenceState, DEFAULT_MAX_TICKS, RefreshCadence, RefreshPolicy, TickDecision,
    default_min_ticks,
};
pub use config::{Config, DEFAULT_PORT, DEFAULT_TICK_SECS};
pub use error::StoreError;
pub use usage_store::UsageStore;
