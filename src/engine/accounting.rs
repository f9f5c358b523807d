use chrono::Utc;

use crate::models::{DayBaseline, DayKey};

/// Outcome of folding one raw counter reading into the day's ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub steps_today: u64,
    /// Present when this sample established a new baseline: the first sample
    /// of a day, or a counter reset when rebaselining on reset is enabled.
    /// The caller is responsible for persisting it.
    pub new_baseline: Option<DayBaseline>,
}

/// Per-day baseline bookkeeping. Holds the current baseline in memory and
/// decides, sample by sample, whether the zero point moves.
///
/// Day rollover is keyed purely off the day key: the first sample observed on
/// a new calendar day becomes that day's zero point, so steps walked before
/// the engine saw the new day are not retroactively counted.
#[derive(Debug)]
pub struct DayAccountant {
    baseline: Option<DayBaseline>,
    rebaseline_on_counter_reset: bool,
}

impl DayAccountant {
    pub fn new(baseline: Option<DayBaseline>, rebaseline_on_counter_reset: bool) -> Self {
        Self {
            baseline,
            rebaseline_on_counter_reset,
        }
    }

    pub fn baseline(&self) -> Option<&DayBaseline> {
        self.baseline.as_ref()
    }

    pub fn observe(&mut self, day: &DayKey, total_steps_since_boot: u64) -> Observation {
        let needs_baseline = match &self.baseline {
            Some(current) if current.day == *day => {
                // Same day: the zero point only moves on an observed counter
                // reset, and only when that behavior is opted into. Otherwise
                // a post-reboot reading below the baseline floors at zero.
                self.rebaseline_on_counter_reset
                    && total_steps_since_boot < current.base_steps
            }
            _ => true,
        };

        let mut new_baseline = None;
        if needs_baseline {
            let baseline = DayBaseline {
                day: day.clone(),
                base_steps: total_steps_since_boot,
                recorded_at: Utc::now(),
            };
            new_baseline = Some(baseline.clone());
            self.baseline = Some(baseline);
        }

        let base_steps = self
            .baseline
            .as_ref()
            .map_or(total_steps_since_boot, |b| b.base_steps);

        Observation {
            steps_today: total_steps_since_boot.saturating_sub(base_steps),
            new_baseline,
        }
    }
}
