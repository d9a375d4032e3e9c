use crate::codec::{decode_date, decode_time, encode_date, encode_time, to_day_clock, to_wall_clock};
use crate::error::CoreError;
use crate::models::{NewWorkUnitData, UnitKind, UnitState, UpdateWorkUnitData, WorkUnit};
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// `work_units` row as stored: day-clock time codes, `YYYYMMDD` date codes.
#[derive(Debug, FromRow)]
struct WorkUnitRow {
    id: Uuid,
    type_id: Uuid,
    subject_id: Uuid,
    schedule_entry_id: Option<Uuid>,
    kind: UnitKind,
    day_start: i64,
    start_time: i64,
    start_date: i64,
    end_time: i64,
    end_date: i64,
    seconds: i64,
    state: UnitState,
    note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl WorkUnitRow {
    fn into_model(self) -> Result<WorkUnit, CoreError> {
        let day_start = u8::try_from(self.day_start)
            .ok()
            .filter(|hour| *hour < 24)
            .ok_or(CoreError::InvalidDayStart(self.day_start))?;
        Ok(WorkUnit {
            id: self.id,
            type_id: self.type_id,
            subject_id: self.subject_id,
            schedule_entry_id: self.schedule_entry_id,
            kind: self.kind,
            day_start,
            start_time: to_wall_clock(decode_time(self.start_time)?, day_start),
            start_date: decode_date(self.start_date)?,
            end_time: to_wall_clock(decode_time(self.end_time)?, day_start),
            end_date: decode_date(self.end_date)?,
            seconds: self.seconds,
            state: self.state,
            note: self.note,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// One stored slice of a recorded span: a working day plus day-clock times
/// and the slice's own duration.
struct Segment {
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    seconds: i64,
}

/// Cuts a day-clock span at working-day boundaries.
///
/// Each produced segment lies within a single working day and carries the
/// seconds actually spent in it; the durations sum to the whole span.
fn split_at_day_boundaries(
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Vec<Segment>, CoreError> {
    // last minute the HHMM codec can express within a day
    let day_end = decode_time(2359)?;

    let mut segments = Vec::new();
    let mut cursor = start;
    while cursor.date() < end.date() {
        let next_midnight = cursor
            .date()
            .succ_opt()
            .ok_or_else(|| CoreError::InvalidInput("work unit overflows the calendar".to_string()))?
            .and_time(NaiveTime::MIN);
        segments.push(Segment {
            date: cursor.date(),
            start: cursor.time(),
            end: day_end,
            seconds: (next_midnight - cursor).num_seconds(),
        });
        cursor = next_midnight;
    }
    segments.push(Segment {
        date: cursor.date(),
        start: cursor.time(),
        end: end.time(),
        seconds: (end - cursor).num_seconds(),
    });
    Ok(segments)
}

#[async_trait]
impl super::WorkUnitRepository for SqliteRepository {
    async fn record_work_unit(&self, data: NewWorkUnitData) -> Result<Vec<WorkUnit>, CoreError> {
        if data.day_start >= 24 {
            return Err(CoreError::InvalidInput(
                "Day start must be an hour between 0 and 23".to_string(),
            ));
        }

        // Shift the wall-clock span onto the working-day clock; the date
        // component then names the working day each instant belongs to
        let shift = TimeDelta::hours(i64::from(data.day_start));
        let start = NaiveDateTime::new(data.start_date, data.start_time) - shift;
        let end = NaiveDateTime::new(data.end_date, data.end_time) - shift;
        if end < start {
            return Err(CoreError::InvalidInput(
                "Work unit ends before it starts".to_string(),
            ));
        }

        let segments = split_at_day_boundaries(start, end)?;

        let mut units = Vec::with_capacity(segments.len());
        for segment in &segments {
            units.push(WorkUnit {
                id: Uuid::now_v7(),
                type_id: data.type_id,
                subject_id: data.subject_id,
                schedule_entry_id: data.schedule_entry_id,
                kind: data.kind,
                day_start: data.day_start,
                start_time: to_wall_clock(segment.start, data.day_start),
                start_date: segment.date,
                end_time: to_wall_clock(segment.end, data.day_start),
                end_date: segment.date,
                seconds: segment.seconds,
                state: data.state,
                note: data.note.clone(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            });
        }

        // All slices of the span land in the same transaction
        let mut tx = self.pool().begin().await?;
        for unit in &units {
            insert_work_unit_in_transaction(&mut tx, unit).await?;
        }
        tx.commit().await?;

        tracing::debug!(rows = units.len(), "recorded work unit");
        Ok(units)
    }

    async fn find_work_unit_by_id(&self, id: Uuid) -> Result<Option<WorkUnit>, CoreError> {
        let row: Option<WorkUnitRow> = sqlx::query_as("SELECT * FROM work_units WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        row.map(WorkUnitRow::into_model).transpose()
    }

    async fn find_work_units_in_range(
        &self,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> Result<Vec<WorkUnit>, CoreError> {
        let rows: Vec<WorkUnitRow> = sqlx::query_as(
            r#"SELECT * FROM work_units
            WHERE start_date <= $1 AND end_date >= $2
            ORDER BY start_date ASC, start_time ASC"#,
        )
        .bind(encode_date(range_end))
        .bind(encode_date(range_start))
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(WorkUnitRow::into_model).collect()
    }

    async fn find_work_unit_for_entry(
        &self,
        entry_id: Uuid,
    ) -> Result<Option<WorkUnit>, CoreError> {
        let row: Option<WorkUnitRow> = sqlx::query_as(
            "SELECT * FROM work_units WHERE schedule_entry_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(entry_id)
        .fetch_optional(self.pool())
        .await?;
        row.map(WorkUnitRow::into_model).transpose()
    }

    async fn update_work_unit(
        &self,
        id: Uuid,
        data: UpdateWorkUnitData,
    ) -> Result<WorkUnit, CoreError> {
        let mut tx = self.pool().begin().await?;

        let row: Option<WorkUnitRow> = sqlx::query_as("SELECT * FROM work_units WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let current = row
            .map(WorkUnitRow::into_model)
            .transpose()?
            .ok_or_else(|| CoreError::NotFound(format!("Work unit with id {} not found", id)))?;

        let mut unit = WorkUnit {
            id: current.id,
            type_id: data.type_id.unwrap_or(current.type_id),
            subject_id: data.subject_id.unwrap_or(current.subject_id),
            schedule_entry_id: data.schedule_entry_id.unwrap_or(current.schedule_entry_id),
            kind: data.kind.unwrap_or(current.kind),
            day_start: current.day_start,
            start_time: data.start_time.unwrap_or(current.start_time),
            start_date: data.start_date.unwrap_or(current.start_date),
            end_time: data.end_time.unwrap_or(current.end_time),
            end_date: data.end_date.unwrap_or(current.end_date),
            seconds: current.seconds,
            state: data.state.unwrap_or(current.state),
            note: data.note.unwrap_or(current.note),
            created_at: current.created_at,
            updated_at: Utc::now(),
        };

        // Recompute the duration from the stored working-day span
        let start = NaiveDateTime::new(unit.start_date, to_day_clock(unit.start_time, unit.day_start));
        let end = NaiveDateTime::new(unit.end_date, to_day_clock(unit.end_time, unit.day_start));
        if end < start {
            return Err(CoreError::InvalidInput(
                "Work unit ends before it starts".to_string(),
            ));
        }
        unit.seconds = (end - start).num_seconds();

        sqlx::query(
            r#"UPDATE work_units
            SET type_id = $1, subject_id = $2, schedule_entry_id = $3, kind = $4,
                start_time = $5, start_date = $6, end_time = $7, end_date = $8,
                seconds = $9, state = $10, note = $11, updated_at = $12
            WHERE id = $13"#,
        )
        .bind(unit.type_id)
        .bind(unit.subject_id)
        .bind(unit.schedule_entry_id)
        .bind(&unit.kind)
        .bind(encode_time(to_day_clock(unit.start_time, unit.day_start)))
        .bind(encode_date(unit.start_date))
        .bind(encode_time(to_day_clock(unit.end_time, unit.day_start)))
        .bind(encode_date(unit.end_date))
        .bind(unit.seconds)
        .bind(&unit.state)
        .bind(&unit.note)
        .bind(unit.updated_at)
        .bind(unit.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(unit)
    }

    async fn delete_work_unit(&self, id: Uuid) -> Result<(), CoreError> {
        let result = sqlx::query("DELETE FROM work_units WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Work unit with id {} not found", id)));
        }
        Ok(())
    }
}

async fn insert_work_unit_in_transaction(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    unit: &WorkUnit,
) -> Result<(), CoreError> {
    sqlx::query(
        r#"INSERT INTO work_units (id, type_id, subject_id, schedule_entry_id, kind, day_start,
            start_time, start_date, end_time, end_date, seconds, state, note, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)"#,
    )
    .bind(unit.id)
    .bind(unit.type_id)
    .bind(unit.subject_id)
    .bind(unit.schedule_entry_id)
    .bind(&unit.kind)
    .bind(i64::from(unit.day_start))
    .bind(encode_time(to_day_clock(unit.start_time, unit.day_start)))
    .bind(encode_date(unit.start_date))
    .bind(encode_time(to_day_clock(unit.end_time, unit.day_start)))
    .bind(encode_date(unit.end_date))
    .bind(unit.seconds)
    .bind(&unit.state)
    .bind(&unit.note)
    .bind(unit.created_at)
    .bind(unit.updated_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
