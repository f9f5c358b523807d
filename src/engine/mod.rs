mod accounting;
mod simulator;
mod source;
mod throttle;

pub use accounting::{DayAccountant, Observation};
pub use simulator::{AbsentCounter, SimulatedCounter};
pub use source::{
    CounterDevice, PollingStepSource, RawCountListener, StepSource, DEFAULT_POLL_INTERVAL,
};
pub use throttle::Throttle;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use log::{error, info};
use tokio::sync::broadcast;

use crate::db::Database;
use crate::models::{DayKey, RawCounterSample};
use crate::updates::{StepUpdate, UpdateBus};

/// Tunables for the accounting engine. The defaults mirror shipped behavior:
/// at most one update per 200 ms, rebaseline only on a day change.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub throttle_interval: Duration,
    /// Also move the zero point when the raw counter drops below the stored
    /// baseline (a reboot without a date change). Off by default: the shipped
    /// tracker floors the rest of the day at zero instead, and turning this
    /// on changes reported totals.
    pub rebaseline_on_counter_reset: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            throttle_interval: Duration::from_millis(200),
            rebaseline_on_counter_reset: false,
        }
    }
}

struct EngineState {
    start_count: u32,
    accountant: DayAccountant,
    throttle: Throttle,
}

struct EngineInner {
    db: Database,
    source: Arc<dyn StepSource>,
    updates: UpdateBus,
    state: Mutex<EngineState>,
}

impl EngineInner {
    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The daily step accounting engine.
///
/// One instance is created at application scope and cloned into every screen
/// that needs live step data; clones share the ref-counted hardware
/// subscription, the current baseline, and the throttle. Each visible screen
/// calls [`acquire`](Self::acquire) on show and [`release`](Self::release) on
/// hide; the underlying source is registered only while at least one caller
/// holds it.
#[derive(Clone)]
pub struct StepCounterEngine {
    inner: Arc<EngineInner>,
}

impl StepCounterEngine {
    /// Wire the engine to its storage and source, hydrating the current
    /// baseline so a restart mid-day does not reset the count.
    pub async fn new(
        db: Database,
        source: Arc<dyn StepSource>,
        config: EngineConfig,
    ) -> Result<Self> {
        let baseline = db
            .load_current_baseline()
            .await
            .context("failed to hydrate step baseline")?;
        if let Some(baseline) = &baseline {
            info!(
                "hydrated step baseline: day {} base {}",
                baseline.day, baseline.base_steps
            );
        }

        Ok(Self {
            inner: Arc::new(EngineInner {
                db,
                source,
                updates: UpdateBus::new(),
                state: Mutex::new(EngineState {
                    start_count: 0,
                    accountant: DayAccountant::new(baseline, config.rebaseline_on_counter_reset),
                    throttle: Throttle::new(config.throttle_interval),
                }),
            }),
        })
    }

    /// Take a share of the hardware subscription. The source is registered on
    /// the first outstanding acquire only; further acquires just bump the
    /// count. No-op when the counter hardware is absent.
    pub fn acquire(&self) {
        if !self.inner.source.is_available() {
            return;
        }

        let mut state = self.inner.lock_state();
        state.start_count += 1;
        if state.start_count == 1 {
            let listener: Arc<dyn RawCountListener> = Arc::clone(&self.inner) as Arc<dyn RawCountListener>;
            if let Err(err) = self.inner.source.register(listener) {
                error!("failed to register with step source: {err:#}");
                state.start_count = 0;
            }
        }
    }

    /// Give back a share. The source is unregistered when the last
    /// outstanding acquire is released; releasing more often than acquiring
    /// is a no-op.
    pub fn release(&self) {
        if !self.inner.source.is_available() {
            return;
        }

        let mut state = self.inner.lock_state();
        if state.start_count == 0 {
            return;
        }
        state.start_count -= 1;
        if state.start_count == 0 {
            self.inner.source.unregister();
        }
    }

    pub fn is_active(&self) -> bool {
        self.inner.lock_state().start_count > 0
    }

    /// Live updates, one receiver per subscriber. Drop the receiver to
    /// unsubscribe.
    pub fn subscribe(&self) -> broadcast::Receiver<StepUpdate> {
        self.inner.updates.subscribe()
    }

    /// The last value published on the update bus, if any was emitted since
    /// startup.
    pub fn last_published(&self) -> Option<u64> {
        self.inner.lock_state().throttle.last_admitted_value()
    }

    /// Today's persisted total; the hydration read a screen performs on
    /// resume before live updates start arriving. Zero when nothing has been
    /// recorded today.
    pub async fn today_steps(&self) -> Result<u64> {
        let today = DayKey::today_local();
        let record = self.inner.db.steps_for_day(today).await?;
        Ok(record.map_or(0, |r| r.steps))
    }
}

impl RawCountListener for EngineInner {
    fn on_raw_count(&self, sample: RawCounterSample) {
        // Derived per sample, never cached: a session spanning local midnight
        // must roll over on the first post-midnight sample.
        let today = DayKey::today_local();
        let now = Instant::now();

        let (observation, admitted) = {
            let mut state = self.lock_state();
            let observation = state
                .accountant
                .observe(&today, sample.total_steps_since_boot);
            let admitted = state.throttle.admit(observation.steps_today, now);
            (observation, admitted)
        };

        // The new zero point is queued even when the emission itself is
        // throttled; losing it would miscount the whole day.
        if let Some(baseline) = observation.new_baseline {
            info!(
                "step baseline rolled over: day {} base {}",
                baseline.day, baseline.base_steps
            );
            self.db.record_baseline(baseline);
        }

        if !admitted {
            return;
        }

        self.db
            .record_daily_steps(today.clone(), observation.steps_today);
        self.updates.publish(StepUpdate {
            day: today,
            steps_today: observation.steps_today,
            at: Utc::now(),
        });
    }
}
