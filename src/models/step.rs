use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::day_key::DayKey;

/// One reading from the cumulative hardware step counter. The value counts
/// steps since the last boot and never decreases within a boot session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawCounterSample {
    pub total_steps_since_boot: u64,
}

/// Persisted total for one calendar day. Upsert-replaced whenever the engine
/// computes a new value for the current day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStepRecord {
    pub day: DayKey,
    pub steps: u64,
    pub updated_at: DateTime<Utc>,
}

/// The counter value captured at the first sample observed on a given day;
/// the zero point for that day's count. Superseded, never deleted, when a new
/// day is observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBaseline {
    pub day: DayKey,
    pub base_steps: u64,
    pub recorded_at: DateTime<Utc>,
}
