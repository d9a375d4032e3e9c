use crate::codec::{decode_time, encode_date};
use crate::error::CoreError;
use crate::models::{DaySummary, UnitKind};
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::{NaiveDate, TimeDelta};
use uuid::Uuid;

/// Sums scheduled durations from stored day-clock `HHMM` code pairs.
///
/// Both codes live on the same working-day clock, so end before start means
/// the slot wrapped past day-clock midnight and gets a day added.
fn planned_seconds_from_codes(rows: &[(i64, i64)]) -> Result<i64, CoreError> {
    let mut total = TimeDelta::zero();
    for (start_code, end_code) in rows {
        let start = decode_time(*start_code)?;
        let end = decode_time(*end_code)?;
        let mut slot = end - start;
        if slot < TimeDelta::zero() {
            slot += TimeDelta::days(1);
        }
        total += slot;
    }
    Ok(total.num_seconds())
}

#[async_trait]
impl super::SummaryRepository for SqliteRepository {
    async fn total_seconds_for_day(
        &self,
        day: NaiveDate,
        kind: UnitKind,
    ) -> Result<i64, CoreError> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(seconds) FROM work_units WHERE start_date = $1 AND kind = $2",
        )
        .bind(encode_date(day))
        .bind(kind)
        .fetch_one(self.pool())
        .await?;
        Ok(total.unwrap_or(0))
    }

    async fn total_seconds_for_subject_and_day(
        &self,
        day: NaiveDate,
        subject_id: Uuid,
        kind: UnitKind,
    ) -> Result<i64, CoreError> {
        let total: Option<i64> = sqlx::query_scalar(
            r#"SELECT SUM(seconds) FROM work_units
            WHERE start_date = $1 AND subject_id = $2 AND kind = $3"#,
        )
        .bind(encode_date(day))
        .bind(subject_id)
        .bind(kind)
        .fetch_one(self.pool())
        .await?;
        Ok(total.unwrap_or(0))
    }

    async fn planned_seconds_for_day(&self, day: NaiveDate) -> Result<i64, CoreError> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT start_time, end_time FROM schedule_entries WHERE at_date = $1",
        )
        .bind(encode_date(day))
        .fetch_all(self.pool())
        .await?;
        planned_seconds_from_codes(&rows)
    }

    async fn planned_seconds_for_subject_and_day(
        &self,
        day: NaiveDate,
        subject_id: Uuid,
    ) -> Result<i64, CoreError> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            r#"SELECT e.start_time, e.end_time
            FROM schedule_entries e
            JOIN schedule_series s ON s.id = e.series_id
            WHERE e.at_date = $1 AND s.subject_id = $2"#,
        )
        .bind(encode_date(day))
        .bind(subject_id)
        .fetch_all(self.pool())
        .await?;
        planned_seconds_from_codes(&rows)
    }

    async fn day_summary(&self, day: NaiveDate) -> Result<DaySummary, CoreError> {
        Ok(DaySummary {
            date: day,
            planned_seconds: self.planned_seconds_for_day(day).await?,
            work_seconds: self.total_seconds_for_day(day, UnitKind::Work).await?,
            break_seconds: self.total_seconds_for_day(day, UnitKind::Break).await?,
            coffee_seconds: self.total_seconds_for_day(day, UnitKind::Coffee).await?,
        })
    }
}
