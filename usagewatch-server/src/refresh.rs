//! Per-provider refresh scheduling.
//!
//! Each provider gets its own task driven by a fixed-period tick. The
//! task awaits the extraction before taking the next tick, so at most one
//! extraction per provider is ever in flight.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{error, info, instrument, warn};
use usagewatch_core::ProviderKind;
use usagewatch_fetch::{FetchContext, FetchStrategy};
use usagewatch_store::{RefreshCadence, TickDecision, UsageStore};

/// Consecutive failures after which refresh errors are logged at `error`.
pub const FAILURE_ESCALATION_THRESHOLD: u32 = 3;

// ============================================================================
// Refresher
// ============================================================================

/// Runs one provider's strategy and records the outcome.
#[derive(Clone)]
pub struct Refresher {
    strategy: Arc<dyn FetchStrategy>,
    ctx: Arc<FetchContext>,
    store: UsageStore,
    cadence: RefreshCadence,
}

impl Refresher {
    /// Creates a refresher for the strategy's provider.
    pub fn new(
        strategy: Arc<dyn FetchStrategy>,
        ctx: Arc<FetchContext>,
        store: UsageStore,
        cadence: RefreshCadence,
    ) -> Self {
        Self {
            strategy,
            ctx,
            store,
            cadence,
        }
    }

    /// Returns the provider this refresher serves.
    pub fn provider(&self) -> ProviderKind {
        self.strategy.provider()
    }

    /// Runs the extraction once.
    ///
    /// On success the snapshot is stored and the cadence restarted. On
    /// failure the previous snapshot and the cadence counters are kept, so
    /// the provider stays due. Returns whether the refresh succeeded.
    #[instrument(skip(self), fields(provider = %self.provider()))]
    pub async fn refresh(&self) -> bool {
        let provider = self.provider();
        let started = Instant::now();

        match self.strategy.fetch(&self.ctx).await {
            Ok(result) => {
                self.store.set_snapshot(provider, result.snapshot).await;
                self.cadence.mark_refreshed(provider);
                info!(
                    strategy = %result.strategy_id,
                    elapsed_ms = started.elapsed().as_millis(),
                    ticks_until_due = ?self.cadence.ticks_until_due(provider),
                    "Refresh succeeded"
                );
                true
            }
            Err(e) => {
                let failures = self.store.record_failure(provider, e.to_string()).await;
                if failures >= FAILURE_ESCALATION_THRESHOLD {
                    error!(
                        category = %e.category(),
                        error = %e,
                        consecutive_failures = failures,
                        "Refresh keeps failing, serving previous snapshot"
                    );
                } else {
                    warn!(
                        category = %e.category(),
                        error = %e,
                        consecutive_failures = failures,
                        "Refresh failed, retrying next tick"
                    );
                }
                false
            }
        }
    }

    /// Refreshes once at start-up; a failure makes the first tick retry.
    pub async fn initial_refresh(&self) -> bool {
        let ok = self.refresh().await;
        if !ok {
            self.cadence.mark_due(self.provider());
        }
        ok
    }

    /// Handles one tick. Returns the refresh outcome if the provider was due.
    pub async fn on_tick(&self) -> Option<bool> {
        match self.cadence.on_tick(self.provider()) {
            TickDecision::Due => Some(self.refresh().await),
            TickDecision::Wait => None,
        }
    }

    /// Spawns the tick loop. The first tick fires one period from now.
    pub fn spawn(self, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(
                provider = %self.provider(),
                strategy = %self.strategy.display_name(),
                period_secs = period.as_secs(),
                "Refresh task started"
            );

            loop {
                ticker.tick().await;
                self.on_tick().await;
            }
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
