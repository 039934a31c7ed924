//! Provider-related types.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Provider Kind
// ============================================================================

/// The providers usagewatch polls.
///
/// Each provider owns one slot in the served document: the ISP feeds the
/// `internet` slot and the mobile carrier feeds the `mobile` slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// iiNet broadband, read from the toolbox XML feed.
    IiNet,
    /// Vodafone Australia mobile, scraped from the account portal.
    Vodafone,
}

impl ProviderKind {
    /// Returns the display name for this provider.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::IiNet => "iiNet",
            Self::Vodafone => "Vodafone",
        }
    }

    /// Returns the identifier used in logs and on the command line.
    pub fn id(&self) -> &'static str {
        match self {
            Self::IiNet => "iinet",
            Self::Vodafone => "vodafone",
        }
    }

    /// Returns the key this provider's snapshot is served under.
    pub fn slot(&self) -> &'static str {
        match self {
            Self::IiNet => "internet",
            Self::Vodafone => "mobile",
        }
    }

    /// Returns all provider kinds.
    pub fn all() -> &'static [ProviderKind] {
        &[Self::IiNet, Self::Vodafone]
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
