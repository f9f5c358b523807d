use anyhow::{Context, Result};
use log::{error, warn};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{DayBaseline, DayKey};

use super::{parse_datetime, to_i64, to_u64, Database};

fn upsert_row(conn: &Connection, baseline: &DayBaseline) -> Result<()> {
    conn.execute(
        "INSERT INTO day_baselines (day, base_steps, recorded_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(day) DO UPDATE SET
             base_steps = excluded.base_steps,
             recorded_at = excluded.recorded_at",
        params![
            baseline.day.to_string(),
            to_i64(baseline.base_steps)?,
            baseline.recorded_at.to_rfc3339(),
        ],
    )
    .with_context(|| format!("failed to upsert baseline for {}", baseline.day))?;
    Ok(())
}

impl Database {
    /// The most recently recorded baseline, if any. A stored row that no
    /// longer parses (corrupted day key or timestamp) is ignored with a
    /// warning, which forces a fresh rollover on the next sample.
    pub async fn load_current_baseline(&self) -> Result<Option<DayBaseline>> {
        self.execute(|conn| {
            let row: Option<(String, i64, String)> = conn
                .query_row(
                    "SELECT day, base_steps, recorded_at
                     FROM day_baselines
                     ORDER BY recorded_at DESC, day DESC
                     LIMIT 1",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?;

            let Some((day_raw, base_raw, recorded_raw)) = row else {
                return Ok(None);
            };

            let parsed = DayKey::parse(&day_raw).and_then(|day| {
                Ok(DayBaseline {
                    day,
                    base_steps: to_u64(base_raw)?,
                    recorded_at: parse_datetime(&recorded_raw)?,
                })
            });

            match parsed {
                Ok(baseline) => Ok(Some(baseline)),
                Err(err) => {
                    warn!("ignoring unreadable stored baseline: {err:#}");
                    Ok(None)
                }
            }
        })
        .await
    }

    /// Queue a baseline write without waiting. Superseded days keep their
    /// rows; only the latest one is ever read back.
    pub fn record_baseline(&self, baseline: DayBaseline) {
        self.submit(move |conn| {
            if let Err(err) = upsert_row(conn, &baseline) {
                error!("dropping baseline write for {}: {err:#}", baseline.day);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn day(raw: &str) -> DayKey {
        DayKey::parse(raw).unwrap()
    }

    async fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("steps.sqlite3")).unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn empty_store_has_no_baseline() {
        let (_dir, db) = test_db().await;
        assert!(db.load_current_baseline().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn latest_recorded_baseline_wins() {
        let (_dir, db) = test_db().await;
        let earlier = Utc::now() - Duration::hours(26);

        db.record_baseline(DayBaseline {
            day: day("2024-01-01"),
            base_steps: 5000,
            recorded_at: earlier,
        });
        db.record_baseline(DayBaseline {
            day: day("2024-01-02"),
            base_steps: 8005,
            recorded_at: Utc::now(),
        });
        db.flush().await.unwrap();

        let current = db
            .load_current_baseline()
            .await
            .unwrap()
            .expect("baseline should exist");
        assert_eq!(current.day, day("2024-01-02"));
        assert_eq!(current.base_steps, 8005);
    }

    #[tokio::test]
    async fn superseded_baselines_are_retained() {
        let (_dir, db) = test_db().await;
        let earlier = Utc::now() - Duration::hours(26);

        db.record_baseline(DayBaseline {
            day: day("2024-01-01"),
            base_steps: 5000,
            recorded_at: earlier,
        });
        db.record_baseline(DayBaseline {
            day: day("2024-01-02"),
            base_steps: 8005,
            recorded_at: Utc::now(),
        });
        db.flush().await.unwrap();

        let count: i64 = db
            .execute(|conn| {
                conn.query_row("SELECT COUNT(*) FROM day_baselines", [], |row| row.get(0))
                    .map_err(Into::into)
            })
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn corrupted_day_key_reads_as_absent() {
        let (_dir, db) = test_db().await;

        db.execute(|conn| {
            conn.execute(
                "INSERT INTO day_baselines (day, base_steps, recorded_at)
                 VALUES ('garbage', 5000, ?1)",
                params![Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })
        .await
        .unwrap();

        assert!(db.load_current_baseline().await.unwrap().is_none());
    }
}
