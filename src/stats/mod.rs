mod estimates;

pub use estimates::{
    bmi, bmi_category, estimated_active_duration, estimated_calories, BmiCategory,
};

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::models::{DailyStepRecord, DayKey};

/// One day's total inside a week overview; zero when nothing was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayTotal {
    pub day: DayKey,
    pub steps: u64,
}

/// Monday-through-Sunday totals backing the weekly bar chart.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekOverview {
    pub week_start: DayKey,
    pub days: Vec<DayTotal>,
    pub total: u64,
    pub daily_average: f64,
}

/// Build the overview for the week containing `any_day`. Days without a
/// record are zero-filled so the chart always has seven bars.
pub fn week_overview(records: &[DailyStepRecord], any_day: NaiveDate) -> WeekOverview {
    let week_start = any_day - Duration::days(any_day.weekday().num_days_from_monday() as i64);

    let by_day: HashMap<DayKey, u64> = records
        .iter()
        .map(|record| (record.day.clone(), record.steps))
        .collect();

    let days: Vec<DayTotal> = (0..7)
        .map(|offset| {
            let day = DayKey::from_date(week_start + Duration::days(offset));
            let steps = by_day.get(&day).copied().unwrap_or(0);
            DayTotal { day, steps }
        })
        .collect();

    let total = days.iter().map(|d| d.steps).sum();

    WeekOverview {
        week_start: DayKey::from_date(week_start),
        days,
        total,
        daily_average: total as f64 / 7.0,
    }
}

/// The quick cards above the chart: today, yesterday, two days ago.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentSummary {
    pub today: u64,
    pub yesterday: u64,
    pub two_days_ago: u64,
}

pub fn recent_summary(records: &[DailyStepRecord], today: NaiveDate) -> RecentSummary {
    let steps_on = |date: NaiveDate| {
        let key = DayKey::from_date(date);
        records
            .iter()
            .find(|record| record.day == key)
            .map_or(0, |record| record.steps)
    };

    RecentSummary {
        today: steps_on(today),
        yesterday: steps_on(today - Duration::days(1)),
        two_days_ago: steps_on(today - Duration::days(2)),
    }
}

/// Ring-style progress toward the daily goal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub steps: u64,
    pub goal: u64,
    /// Capped at 100.
    pub percent: f32,
    pub reached: bool,
}

pub fn goal_progress(steps: u64, goal: u64) -> GoalProgress {
    let percent = if goal == 0 {
        100.0
    } else {
        ((steps as f64 / goal as f64) * 100.0).min(100.0) as f32
    };

    GoalProgress {
        steps,
        goal,
        percent,
        reached: steps >= goal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    fn record(day: &str, steps: u64) -> DailyStepRecord {
        DailyStepRecord {
            day: DayKey::parse(day).unwrap(),
            steps,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn week_starts_on_monday_and_zero_fills_gaps() {
        // 2024-01-03 is a Wednesday; its week runs 2024-01-01..2024-01-07.
        let records = vec![
            record("2024-01-01", 3000),
            record("2024-01-03", 5000),
            record("2024-01-10", 9000), // next week, ignored
        ];

        let overview = week_overview(&records, date("2024-01-03"));
        assert_eq!(overview.week_start.to_string(), "2024-01-01");
        assert_eq!(overview.days.len(), 7);
        assert_eq!(overview.days[0].steps, 3000);
        assert_eq!(overview.days[1].steps, 0);
        assert_eq!(overview.days[2].steps, 5000);
        assert_eq!(overview.total, 8000);
        assert!((overview.daily_average - 8000.0 / 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn monday_input_is_its_own_week_start() {
        let overview = week_overview(&[], date("2024-01-01"));
        assert_eq!(overview.week_start.to_string(), "2024-01-01");
        assert_eq!(overview.days[6].day.to_string(), "2024-01-07");
        assert_eq!(overview.total, 0);
    }

    #[test]
    fn recent_summary_picks_the_last_three_days() {
        let records = vec![
            record("2024-01-05", 7000),
            record("2024-01-04", 4000),
            record("2024-01-02", 1000), // three days back, not shown
        ];

        let summary = recent_summary(&records, date("2024-01-05"));
        assert_eq!(summary.today, 7000);
        assert_eq!(summary.yesterday, 4000);
        assert_eq!(summary.two_days_ago, 0);
    }

    #[test]
    fn goal_progress_caps_at_one_hundred_percent() {
        let progress = goal_progress(5000, 10_000);
        assert!((progress.percent - 50.0).abs() < f32::EPSILON);
        assert!(!progress.reached);

        let progress = goal_progress(15_000, 10_000);
        assert!((progress.percent - 100.0).abs() < f32::EPSILON);
        assert!(progress.reached);
    }

    #[test]
    fn zero_goal_counts_as_reached() {
        let progress = goal_progress(0, 0);
        assert!(progress.reached);
        assert!((progress.percent - 100.0).abs() < f32::EPSILON);
    }
}
