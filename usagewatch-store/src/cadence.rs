//! Refresh cadence tracking.
//!
//! Each provider is refreshed on a tick-counted schedule. Under the
//! adaptive policy a provider that was just refreshed waits the maximum
//! number of ticks, and any incoming request pulls every provider back
//! to its minimum so that watched usage stays fresh.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;
use usagewatch_core::ProviderKind;

use crate::error::StoreError;

/// Ticks to wait after a refresh when nobody is watching.
pub const DEFAULT_MAX_TICKS: u32 = 30;

/// Returns the default minimum ticks between refreshes for a provider.
pub fn default_min_ticks(provider: ProviderKind) -> u32 {
    match provider {
        ProviderKind::IiNet => 15,
        ProviderKind::Vodafone => 30,
    }
}

// ============================================================================
// Policy
// ============================================================================

/// How the refresh threshold evolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPolicy {
    /// Back off to the maximum after a refresh, snap to the minimum on request.
    #[default]
    Adaptive,
    /// Refresh every minimum-ticks period regardless of requests.
    Fixed,
}

impl RefreshPolicy {
    /// Returns the policy name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adaptive => "adaptive",
            Self::Fixed => "fixed",
        }
    }
}

impl fmt::Display for RefreshPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RefreshPolicy {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "adaptive" => Ok(Self::Adaptive),
            "fixed" => Ok(Self::Fixed),
            other => Err(StoreError::Config(format!(
                "unknown refresh policy {other:?} (expected adaptive or fixed)"
            ))),
        }
    }
}

// ============================================================================
// Tick State
// ============================================================================

/// Outcome of a tick for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickDecision {
    /// The provider should be refreshed now.
    Due,
    /// Not yet; the tick was counted.
    Wait,
}

/// Counters for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CadenceState {
    /// Threshold at which the provider becomes due.
    pub ticks_until_due: u32,
    /// Ticks counted since the last successful refresh.
    pub ticks_since_refresh: u32,
}

impl CadenceState {
    /// Returns true if the provider should be refreshed on the next tick.
    pub fn is_due(&self) -> bool {
        self.ticks_since_refresh >= self.ticks_until_due
    }
}

#[derive(Debug)]
struct ProviderCadence {
    min_ticks: u32,
    state: CadenceState,
}

// ============================================================================
// Refresh Cadence
// ============================================================================

/// Shared per-provider refresh counters.
///
/// Cheap to clone; all clones share state.
#[derive(Debug, Clone)]
pub struct RefreshCadence {
    policy: RefreshPolicy,
    max_ticks: u32,
    providers: Arc<Mutex<HashMap<ProviderKind, ProviderCadence>>>,
}

impl RefreshCadence {
    /// Creates a cadence with the default thresholds for every provider.
    pub fn new(policy: RefreshPolicy) -> Self {
        let providers = ProviderKind::all()
            .iter()
            .map(|kind| {
                let min_ticks = default_min_ticks(*kind);
                (
                    *kind,
                    ProviderCadence {
                        min_ticks,
                        state: CadenceState {
                            ticks_until_due: min_ticks,
                            ticks_since_refresh: 0,
                        },
                    },
                )
            })
            .collect();

        Self {
            policy,
            max_ticks: DEFAULT_MAX_TICKS,
            providers: Arc::new(Mutex::new(providers)),
        }
    }

    /// Overrides the minimum ticks for a provider.
    #[must_use]
    pub fn with_min_ticks(self, provider: ProviderKind, ticks: u32) -> Self {
        {
            let mut providers = self.lock();
            if let Some(cadence) = providers.get_mut(&provider) {
                cadence.min_ticks = ticks;
                cadence.state.ticks_until_due = ticks;
            }
        }
        self
    }

    /// Overrides the maximum ticks used after a refresh.
    #[must_use]
    pub fn with_max_ticks(mut self, ticks: u32) -> Self {
        self.max_ticks = ticks;
        self
    }

    /// Returns the active policy.
    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ProviderKind, ProviderCadence>> {
        // Counters stay consistent even if a holder panicked.
        self.providers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Counts a tick for a provider and reports whether it is due.
    ///
    /// Under the adaptive policy the tick is compared before it is
    /// counted. The fixed policy counts first, so a provider is due on
    /// exactly every `min_ticks`th tick. A due provider stays due until
    /// the refresh outcome is recorded, so a failed refresh is retried
    /// next tick.
    pub fn on_tick(&self, provider: ProviderKind) -> TickDecision {
        let mut providers = self.lock();
        let Some(cadence) = providers.get_mut(&provider) else {
            return TickDecision::Wait;
        };
        let state = &mut cadence.state;

        match self.policy {
            RefreshPolicy::Adaptive => {
                if state.is_due() {
                    return TickDecision::Due;
                }
                state.ticks_since_refresh += 1;
                TickDecision::Wait
            }
            RefreshPolicy::Fixed => {
                if !state.is_due() {
                    state.ticks_since_refresh += 1;
                }
                if state.is_due() {
                    TickDecision::Due
                } else {
                    TickDecision::Wait
                }
            }
        }
    }

    /// Records a successful refresh.
    pub fn mark_refreshed(&self, provider: ProviderKind) {
        let mut providers = self.lock();
        if let Some(cadence) = providers.get_mut(&provider) {
            cadence.state.ticks_since_refresh = 0;
            cadence.state.ticks_until_due = match self.policy {
                RefreshPolicy::Adaptive => self.max_ticks,
                RefreshPolicy::Fixed => cadence.min_ticks,
            };
            debug!(
                provider = %provider,
                ticks_until_due = cadence.state.ticks_until_due,
                "Cadence reset after refresh"
            );
        }
    }

    /// Makes a provider due on the next tick.
    pub fn mark_due(&self, provider: ProviderKind) {
        let mut providers = self.lock();
        if let Some(cadence) = providers.get_mut(&provider) {
            cadence.state.ticks_since_refresh = cadence.state.ticks_until_due;
        }
    }

    /// Pulls every provider back to its minimum threshold.
    ///
    /// Has no effect under the fixed policy.
    pub fn reset_to_minimum(&self) {
        if self.policy == RefreshPolicy::Fixed {
            return;
        }
        for cadence in self.lock().values_mut() {
            cadence.state.ticks_until_due = cadence.min_ticks;
        }
    }

    /// Returns the counters for a provider.
    pub fn state(&self, provider: ProviderKind) -> Option<CadenceState> {
        self.lock().get(&provider).map(|c| c.state)
    }

    /// Returns the current threshold for a provider.
    pub fn ticks_until_due(&self, provider: ProviderKind) -> Option<u32> {
        self.state(provider).map(|s| s.ticks_until_due)
    }

    /// Returns the ticks counted since the last refresh of a provider.
    pub fn ticks_since_refresh(&self, provider: ProviderKind) -> Option<u32> {
        self.state(provider).map(|s| s.ticks_since_refresh)
    }
}

impl Default for RefreshCadence {
    fn default() -> Self {
        Self::new(RefreshPolicy::default())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tick_until_due(cadence: &RefreshCadence, provider: ProviderKind) -> u32 {
        let mut ticks = 0;
        while cadence.on_tick(provider) == TickDecision::Wait {
            ticks += 1;
            assert!(ticks <= 1_000, "provider never became due");
        }
        ticks
    }

    #[test]
    fn test_initial_thresholds() {
        let cadence = RefreshCadence::default();
        assert_eq!(cadence.ticks_until_due(ProviderKind::IiNet), Some(15));
        assert_eq!(cadence.ticks_until_due(ProviderKind::Vodafone), Some(30));
        assert_eq!(cadence.ticks_since_refresh(ProviderKind::IiNet), Some(0));
    }

    #[test]
    fn test_due_after_min_ticks() {
        let cadence = RefreshCadence::default();
        assert_eq!(tick_until_due(&cadence, ProviderKind::IiNet), 15);
        // Stays due until the refresh is recorded.
        assert_eq!(cadence.on_tick(ProviderKind::IiNet), TickDecision::Due);
    }

    #[test]
    fn test_adaptive_backs_off_to_max() {
        let cadence = RefreshCadence::new(RefreshPolicy::Adaptive);
        cadence.mark_refreshed(ProviderKind::IiNet);

        assert_eq!(cadence.ticks_until_due(ProviderKind::IiNet), Some(DEFAULT_MAX_TICKS));
        assert_eq!(cadence.ticks_since_refresh(ProviderKind::IiNet), Some(0));
        assert_eq!(tick_until_due(&cadence, ProviderKind::IiNet), DEFAULT_MAX_TICKS);
    }

    #[test]
    fn test_request_resets_both_providers() {
        let cadence = RefreshCadence::new(RefreshPolicy::Adaptive);
        cadence.mark_refreshed(ProviderKind::IiNet);
        cadence.mark_refreshed(ProviderKind::Vodafone);

        cadence.reset_to_minimum();

        assert_eq!(cadence.ticks_until_due(ProviderKind::IiNet), Some(15));
        assert_eq!(cadence.ticks_until_due(ProviderKind::Vodafone), Some(30));
    }

    #[test]
    fn test_reset_keeps_elapsed_ticks() {
        let cadence = RefreshCadence::new(RefreshPolicy::Adaptive);
        cadence.mark_refreshed(ProviderKind::IiNet);
        for _ in 0..20 {
            cadence.on_tick(ProviderKind::IiNet);
        }

        cadence.reset_to_minimum();

        // 20 ticks already elapsed, past the minimum of 15.
        assert_eq!(cadence.on_tick(ProviderKind::IiNet), TickDecision::Due);
    }

    #[test]
    fn test_fixed_ignores_requests() {
        let cadence = RefreshCadence::new(RefreshPolicy::Fixed);
        cadence.mark_refreshed(ProviderKind::IiNet);
        assert_eq!(cadence.ticks_until_due(ProviderKind::IiNet), Some(15));

        cadence.reset_to_minimum();
        assert_eq!(cadence.ticks_until_due(ProviderKind::IiNet), Some(15));
        // Due on the 15th tick after the refresh.
        assert_eq!(tick_until_due(&cadence, ProviderKind::IiNet), 14);
    }

    #[test]
    fn test_fixed_refreshes_every_min_ticks() {
        let cadence = RefreshCadence::new(RefreshPolicy::Fixed);
        let mut due_on = Vec::new();

        for tick in 1..=45 {
            if cadence.on_tick(ProviderKind::IiNet) == TickDecision::Due {
                due_on.push(tick);
                cadence.mark_refreshed(ProviderKind::IiNet);
            }
        }

        assert_eq!(due_on, vec![15, 30, 45]);
    }

    #[test]
    fn test_fixed_failed_refresh_stays_due() {
        let cadence =
            RefreshCadence::new(RefreshPolicy::Fixed).with_min_ticks(ProviderKind::Vodafone, 2);

        assert_eq!(cadence.on_tick(ProviderKind::Vodafone), TickDecision::Wait);
        assert_eq!(cadence.on_tick(ProviderKind::Vodafone), TickDecision::Due);
        assert_eq!(cadence.on_tick(ProviderKind::Vodafone), TickDecision::Due);
        assert_eq!(cadence.ticks_since_refresh(ProviderKind::Vodafone), Some(2));
    }

    #[test]
    fn test_fixed_mark_due() {
        let cadence = RefreshCadence::new(RefreshPolicy::Fixed);
        cadence.mark_due(ProviderKind::IiNet);
        assert_eq!(cadence.on_tick(ProviderKind::IiNet), TickDecision::Due);
    }

    #[test]
    fn test_mark_due() {
        let cadence = RefreshCadence::default();
        cadence.mark_due(ProviderKind::Vodafone);
        assert_eq!(cadence.on_tick(ProviderKind::Vodafone), TickDecision::Due);
        assert_eq!(cadence.on_tick(ProviderKind::IiNet), TickDecision::Wait);
    }

    #[test]
    fn test_custom_thresholds() {
        let cadence = RefreshCadence::new(RefreshPolicy::Adaptive)
            .with_min_ticks(ProviderKind::IiNet, 2)
            .with_max_ticks(5);

        assert_eq!(tick_until_due(&cadence, ProviderKind::IiNet), 2);
        cadence.mark_refreshed(ProviderKind::IiNet);
        assert_eq!(cadence.ticks_until_due(ProviderKind::IiNet), Some(5));
    }

    #[test]
    fn test_clones_share_state() {
        let cadence = RefreshCadence::default();
        let handle = cadence.clone();
        handle.mark_refreshed(ProviderKind::IiNet);
        assert_eq!(cadence.ticks_until_due(ProviderKind::IiNet), Some(DEFAULT_MAX_TICKS));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("adaptive".parse::<RefreshPolicy>().unwrap(), RefreshPolicy::Adaptive);
        assert_eq!(" Fixed ".parse::<RefreshPolicy>().unwrap(), RefreshPolicy::Fixed);
        assert!(matches!(
            "sometimes".parse::<RefreshPolicy>(),
            Err(StoreError::Config(_))
        ));
    }
}
