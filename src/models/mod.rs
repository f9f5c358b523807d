mod day_key;
mod step;

pub use day_key::DayKey;
pub use step::{DailyStepRecord, DayBaseline, RawCounterSample};
