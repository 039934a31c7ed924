//! Usage-related types.
//!
//! - [`UsageSnapshot`] - Normalized usage for a single provider
//! - [`CombinedUsage`] - Both providers plus the release version, as served

use serde::{Deserialize, Serialize};

use super::provider::ProviderKind;
use crate::error::CoreError;

// ============================================================================
// Usage Snapshot
// ============================================================================

/// Normalized usage for one provider at one point in time.
///
/// All byte counts are in the provider's own unit after normalization
/// (bytes for the ISP feed, the portal's unit for the mobile carrier).
/// The derived fields are always consistent with `quota` and `used`
/// because the only way to build one is [`UsageSnapshot::from_counts`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Total allowance for the billing cycle.
    pub quota: u64,
    /// Amount consumed so far.
    pub used: u64,
    /// `quota - used`.
    pub remaining: u64,
    /// Percentage of the quota consumed.
    pub percent_used: f64,
    /// `100 - percent_used`.
    pub percent_remaining: f64,
    /// Days left in the current billing cycle.
    pub days_remaining: u64,
}

impl UsageSnapshot {
    /// Builds a snapshot from raw counts, deriving remaining and percentages.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ZeroQuota`] when `quota` is zero and
    /// [`CoreError::UsageExceedsQuota`] when `used` is larger than `quota`.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_counts(quota: u64, used: u64, days_remaining: u64) -> Result<Self, CoreError> {
        if quota == 0 {
            return Err(CoreError::ZeroQuota);
        }
        let remaining = quota
            .checked_sub(used)
            .ok_or(CoreError::UsageExceedsQuota { quota, used })?;

        let percent_used = (used as f64 / quota as f64) * 100.0;

        Ok(Self {
            quota,
            used,
            remaining,
            percent_used,
            percent_remaining: 100.0 - percent_used,
            days_remaining,
        })
    }
}

// ============================================================================
// Combined Output
// ============================================================================

/// Per-slot snapshots in the served document.
///
/// A slot is `None` (serialized as `null`) until its provider has been
/// refreshed successfully at least once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotData {
    /// ISP usage.
    pub internet: Option<UsageSnapshot>,
    /// Mobile usage.
    pub mobile: Option<UsageSnapshot>,
}

/// The document served on `GET /`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedUsage {
    /// Snapshots keyed by slot.
    pub data: SlotData,
    /// Release version of the running service.
    pub version: String,
}

impl CombinedUsage {
    /// Creates an empty document for the given version.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            data: SlotData::default(),
            version: version.into(),
        }
    }

    /// Places a provider's snapshot into its slot.
    pub fn set(&mut self, provider: ProviderKind, snapshot: Option<UsageSnapshot>) {
        match provider {
            ProviderKind::IiNet => self.data.internet = snapshot,
            ProviderKind::Vodafone => self.data.mobile = snapshot,
        }
    }

    /// Returns the snapshot in a provider's slot.
    pub fn get(&self, provider: ProviderKind) -> Option<&UsageSnapshot> {
        match provider {
            ProviderKind::IiNet => self.data.internet.as_ref(),
            ProviderKind::Vodafone => self.data.mobile.as_ref(),
        }
    }

    /// Returns the providers whose slot is still empty.
    pub fn missing(&self) -> Vec<ProviderKind> {
        ProviderKind::all()
            .iter()
            .copied()
            .filter(|kind| self.get(*kind).is_none())
            .collect()
    }

    /// Returns true when every slot holds a snapshot.
    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
