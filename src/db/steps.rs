use anyhow::{Context, Result};
use chrono::Utc;
use log::error;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{DailyStepRecord, DayKey};

use super::{parse_datetime, to_i64, to_u64, Database};

const SELECT_COLUMNS: &str = "SELECT day, steps, updated_at FROM daily_steps";

fn row_to_daily_record(row: &Row) -> Result<DailyStepRecord, rusqlite::Error> {
    let day_raw: String = row.get("day")?;
    let steps_raw: i64 = row.get("steps")?;
    let updated_raw: String = row.get("updated_at")?;

    let convert = |err: anyhow::Error| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            err.into(),
        )
    };

    Ok(DailyStepRecord {
        day: DayKey::parse(&day_raw).map_err(convert)?,
        steps: to_u64(steps_raw).map_err(convert)?,
        updated_at: parse_datetime(&updated_raw).map_err(convert)?,
    })
}

fn upsert_row(conn: &Connection, day: &DayKey, steps: u64) -> Result<()> {
    conn.execute(
        "INSERT INTO daily_steps (day, steps, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(day) DO UPDATE SET
             steps = excluded.steps,
             updated_at = excluded.updated_at",
        params![day.to_string(), to_i64(steps)?, Utc::now().to_rfc3339()],
    )
    .with_context(|| format!("failed to upsert daily steps for {day}"))?;
    Ok(())
}

impl Database {
    /// Replace (or create) the persisted total for a day and wait for the
    /// write to land.
    pub async fn upsert_daily_steps(&self, day: DayKey, steps: u64) -> Result<()> {
        self.execute(move |conn| upsert_row(conn, &day, steps)).await
    }

    /// Queue the day's total without waiting. Failures are logged on the
    /// worker and dropped; the published in-memory value stays authoritative
    /// for the UI even when the write misses.
    pub fn record_daily_steps(&self, day: DayKey, steps: u64) {
        self.submit(move |conn| {
            if let Err(err) = upsert_row(conn, &day, steps) {
                error!("dropping daily step write for {day}: {err:#}");
            }
        });
    }

    pub async fn steps_for_day(&self, day: DayKey) -> Result<Option<DailyStepRecord>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE day = ?1"))?;
            let record = stmt
                .query_row(params![day.to_string()], row_to_daily_record)
                .optional()?;
            Ok(record)
        })
        .await
    }

    /// Most recent days first. Feeds the history cards on the stats screen.
    pub async fn recent_daily_steps(&self, limit: u32) -> Result<Vec<DailyStepRecord>> {
        self.execute(move |conn| {
            let mut stmt =
                conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY day DESC LIMIT ?1"))?;
            let records = stmt
                .query_map(params![limit], row_to_daily_record)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(records)
        })
        .await
    }

    /// Full history in chronological order.
    pub async fn all_daily_steps(&self) -> Result<Vec<DailyStepRecord>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY day ASC"))?;
            let records = stmt
                .query_map([], row_to_daily_record)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(records)
        })
        .await
    }
}
