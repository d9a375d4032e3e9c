use crate::codec::{decode_date, encode_date, encode_time, to_day_clock};
use crate::error::CoreError;
use crate::models::{ScheduleEntry, ScheduleSeries, UpdateEntryData};
use crate::repository::series::{fetch_entry_in_transaction, fetch_series_in_transaction};
use crate::repository::{EntryRow, EntryWithSeries, SqliteRepository};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Flattened entry-plus-series row produced by the range query.
#[derive(Debug, FromRow)]
struct JoinedEntryRow {
    id: Uuid,
    series_id: Uuid,
    day_start: i64,
    start_time: i64,
    end_time: i64,
    at_date: i64,
    note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    series_type_id: Uuid,
    series_subject_id: Uuid,
    series_start_date: i64,
    series_end_date: i64,
    series_note: Option<String>,
    series_created_at: DateTime<Utc>,
    series_updated_at: DateTime<Utc>,
}

impl JoinedEntryRow {
    fn into_model(self) -> Result<EntryWithSeries, CoreError> {
        let series = ScheduleSeries {
            id: self.series_id,
            type_id: self.series_type_id,
            subject_id: self.series_subject_id,
            start_date: decode_date(self.series_start_date)?,
            end_date: decode_date(self.series_end_date)?,
            note: self.series_note,
            created_at: self.series_created_at,
            updated_at: self.series_updated_at,
        };
        let entry = EntryRow {
            id: self.id,
            series_id: self.series_id,
            day_start: self.day_start,
            start_time: self.start_time,
            end_time: self.end_time,
            at_date: self.at_date,
            note: self.note,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_model()?;
        Ok(EntryWithSeries { entry, series })
    }
}

#[async_trait]
impl super::EntryRepository for SqliteRepository {
    async fn find_entry_by_id(&self, id: Uuid) -> Result<Option<ScheduleEntry>, CoreError> {
        let row: Option<EntryRow> = sqlx::query_as("SELECT * FROM schedule_entries WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        row.map(EntryRow::into_model).transpose()
    }

    async fn find_entries_in_range(
        &self,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> Result<Vec<EntryWithSeries>, CoreError> {
        // Ordering by the stored day-clock time keeps post-midnight entries
        // after the evening ones of the same working day
        let rows: Vec<JoinedEntryRow> = sqlx::query_as(
            r#"SELECT
                e.id, e.series_id, e.day_start, e.start_time, e.end_time, e.at_date,
                e.note, e.created_at, e.updated_at,
                s.type_id AS series_type_id,
                s.subject_id AS series_subject_id,
                s.start_date AS series_start_date,
                s.end_date AS series_end_date,
                s.note AS series_note,
                s.created_at AS series_created_at,
                s.updated_at AS series_updated_at
            FROM schedule_entries e
            JOIN schedule_series s ON s.id = e.series_id
            WHERE e.at_date >= $1 AND e.at_date <= $2
            ORDER BY e.at_date ASC, e.start_time ASC"#,
        )
        .bind(encode_date(range_start))
        .bind(encode_date(range_end))
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(JoinedEntryRow::into_model).collect()
    }

    async fn find_entries_for_series(
        &self,
        series_id: Uuid,
    ) -> Result<Vec<ScheduleEntry>, CoreError> {
        let rows: Vec<EntryRow> = sqlx::query_as(
            "SELECT * FROM schedule_entries WHERE series_id = $1 ORDER BY at_date ASC",
        )
        .bind(series_id)
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(EntryRow::into_model).collect()
    }

    async fn update_entry(
        &self,
        id: Uuid,
        data: UpdateEntryData,
    ) -> Result<ScheduleEntry, CoreError> {
        if let Some(day_start) = data.day_start {
            if day_start >= 24 {
                return Err(CoreError::InvalidInput(
                    "Day start must be an hour between 0 and 23".to_string(),
                ));
            }
        }

        let mut tx = self.pool().begin().await?;

        let current = fetch_entry_in_transaction(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Schedule entry with id {} not found", id)))?;
        let series = fetch_series_in_transaction(&mut tx, current.series_id)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound(format!(
                    "Schedule series with id {} not found",
                    current.series_id
                ))
            })?;

        let entry = ScheduleEntry {
            id: current.id,
            series_id: current.series_id,
            day_start: data.day_start.unwrap_or(current.day_start),
            start_time: data.start_time.unwrap_or(current.start_time),
            end_time: data.end_time.unwrap_or(current.end_time),
            at_date: data.at_date.unwrap_or(current.at_date),
            note: data.note.unwrap_or(current.note),
            created_at: current.created_at,
            updated_at: Utc::now(),
        };

        // An entry never leaves the date range of the series that owns it
        if entry.at_date < series.start_date || entry.at_date > series.end_date {
            return Err(CoreError::DateOutsideSeries {
                date: entry.at_date,
                start: series.start_date,
                end: series.end_date,
            });
        }

        sqlx::query(
            r#"UPDATE schedule_entries
            SET day_start = $1, start_time = $2, end_time = $3, at_date = $4, note = $5, updated_at = $6
            WHERE id = $7"#,
        )
        .bind(i64::from(entry.day_start))
        .bind(encode_time(to_day_clock(entry.start_time, entry.day_start)))
        .bind(encode_time(to_day_clock(entry.end_time, entry.day_start)))
        .bind(encode_date(entry.at_date))
        .bind(&entry.note)
        .bind(entry.updated_at)
        .bind(entry.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(entry)
    }

    async fn delete_entry(&self, id: Uuid) -> Result<(), CoreError> {
        let result = sqlx::query("DELETE FROM schedule_entries WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!(
                "Schedule entry with id {} not found",
                id
            )));
        }
        Ok(())
    }
}
