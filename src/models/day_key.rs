use std::fmt;

use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// Calendar-day key in canonical `YYYY-MM-DD` form, derived from the device's
/// local time zone. Daily records and baselines are keyed by this value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey(NaiveDate);

impl DayKey {
    /// The current local calendar day. Callers on the sample path must derive
    /// this per sample so a session spanning midnight rolls over correctly.
    pub fn today_local() -> Self {
        Self(Local::now().date_naive())
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parse a persisted key. Fails on anything that is not a valid
    /// `YYYY-MM-DD` date, which callers treat as a missing key.
    pub fn parse(raw: &str) -> Result<Self> {
        NaiveDate::parse_from_str(raw, DAY_KEY_FORMAT)
            .map(Self)
            .map_err(|err| anyhow!("invalid day key '{raw}': {err}"))
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DAY_KEY_FORMAT))
    }
}
