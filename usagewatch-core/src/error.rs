//! Core error types for `usagewatch`.

use thiserror::Error;

/// Core error type for snapshot construction and validation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Quota of zero makes every percentage undefined.
    #[error("quota is zero")]
    ZeroQuota,

    /// Reported usage is larger than the quota.
    #[error("used {used} exceeds quota {quota}")]
    UsageExceedsQuota {
        /// Quota reported by the provider.
        quota: u64,
        /// Usage reported by the provider.
        used: u64,
    },
}
