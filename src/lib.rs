//! Daily step accounting engine for a personal fitness tracker.
//!
//! The hardware exposes one number: cumulative steps since boot. This crate
//! turns that into "steps taken today" by capturing a per-day baseline at the
//! first sample of each calendar day, persisting daily totals to SQLite, and
//! fanning throttled updates out to every visible screen.
//!
//! The pieces:
//! - [`StepCounterEngine`] owns the baseline rollover, the throttle, and the
//!   ref-counted hardware subscription shared by all screens.
//! - [`Database`] serves daily records and baseline history from a single
//!   worker thread; the engine's writes are fire-and-forget.
//! - [`PollingStepSource`] adapts a [`CounterDevice`] into sensor-style
//!   callbacks; [`SimulatedCounter`] stands in when there is no hardware.
//! - [`SettingsStore`] keeps the daily step goal; [`stats`] derives the
//!   weekly chart, recent-day cards, and the calorie/time/BMI estimates.

pub mod db;
pub mod engine;
pub mod models;
pub mod settings;
pub mod stats;
pub mod updates;

pub use db::Database;
pub use engine::{
    AbsentCounter, CounterDevice, EngineConfig, PollingStepSource, RawCountListener,
    SimulatedCounter, StepCounterEngine, StepSource, DEFAULT_POLL_INTERVAL,
};
pub use models::{DailyStepRecord, DayBaseline, DayKey, RawCounterSample};
pub use settings::{SettingsStore, DEFAULT_STEP_GOAL};
pub use updates::{StepUpdate, UpdateBus};
