//! Store error types.

use thiserror::Error;
use usagewatch_core::ProviderKind;

/// Errors that can occur in the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No successful refresh has been recorded for the provider yet.
    #[error("No usage recorded yet for {0}")]
    StaleData(ProviderKind),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            StoreError::StaleData(ProviderKind::Vodafone).to_string(),
            "No usage recorded yet for vodafone"
        );
    }
}
