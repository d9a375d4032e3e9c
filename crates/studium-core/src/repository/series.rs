use crate::codec::{encode_date, encode_time, to_day_clock};
use crate::error::CoreError;
use crate::expansion::SeriesExpander;
use crate::models::{
    DissolvedEntry, NewSeriesData, ReconcileOutcome, ScheduleEntry, ScheduleSeries,
    UpdateSeriesData,
};
use crate::repository::{EntryRow, SeriesRow, SqliteRepository};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Sqlite, Transaction};
use uuid::Uuid;

#[async_trait]
impl super::SeriesRepository for SqliteRepository {
    async fn create_series(
        &self,
        data: NewSeriesData,
    ) -> Result<(ScheduleSeries, Vec<ScheduleEntry>), CoreError> {
        if data.start_date > data.end_date {
            return Err(CoreError::InvalidDateRange {
                start: data.start_date,
                end: data.end_date,
            });
        }
        if data.template.day_start >= 24 {
            return Err(CoreError::InvalidInput(
                "Day start must be an hour between 0 and 23".to_string(),
            ));
        }

        let mut tx = self.pool().begin().await?;

        // Ensure the referenced catalog rows exist
        ensure_subject_type_exists(&mut tx, data.type_id).await?;
        ensure_subject_exists(&mut tx, data.subject_id).await?;

        let series = ScheduleSeries {
            id: Uuid::now_v7(),
            type_id: data.type_id,
            subject_id: data.subject_id,
            start_date: data.start_date,
            end_date: data.end_date,
            note: data.note,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let expander = SeriesExpander::from_template(series.id, &data.template);
        let entries = expander.expand_between(series.start_date, series.end_date);

        // Series row and every expanded entry land in the same transaction
        insert_series_in_transaction(&mut tx, &series).await?;
        for entry in &entries {
            insert_entry_in_transaction(&mut tx, entry).await?;
        }

        tx.commit().await?;

        tracing::debug!(
            series_id = %series.id,
            entries = entries.len(),
            "created schedule series"
        );
        Ok((series, entries))
    }

    async fn find_series_by_id(&self, id: Uuid) -> Result<Option<ScheduleSeries>, CoreError> {
        let row: Option<SeriesRow> = sqlx::query_as("SELECT * FROM schedule_series WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        row.map(SeriesRow::into_model).transpose()
    }

    async fn update_series(
        &self,
        id: Uuid,
        data: UpdateSeriesData,
    ) -> Result<ReconcileOutcome, CoreError> {
        let mut tx = self.pool().begin().await?;

        let current = fetch_series_in_transaction(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Schedule series with id {} not found", id)))?;

        if let Some(type_id) = data.type_id {
            ensure_subject_type_exists(&mut tx, type_id).await?;
        }
        if let Some(subject_id) = data.subject_id {
            ensure_subject_exists(&mut tx, subject_id).await?;
        }

        let new_start = data.start_date.unwrap_or(current.start_date);
        let new_end = data.end_date.unwrap_or(current.end_date);

        let entries = entries_for_series_in_transaction(&mut tx, id).await?;
        let plan = SeriesExpander::plan_reconcile(&current, &entries, new_start, new_end)?;

        let series = ScheduleSeries {
            id: current.id,
            type_id: data.type_id.unwrap_or(current.type_id),
            subject_id: data.subject_id.unwrap_or(current.subject_id),
            start_date: new_start,
            end_date: new_end,
            note: data.note.unwrap_or(current.note),
            created_at: current.created_at,
            updated_at: Utc::now(),
        };

        // The series row and both reconcile phases commit or roll back together
        sqlx::query(
            r#"UPDATE schedule_series
            SET type_id = $1, subject_id = $2, start_date = $3, end_date = $4, note = $5, updated_at = $6
            WHERE id = $7"#,
        )
        .bind(series.type_id)
        .bind(series.subject_id)
        .bind(encode_date(series.start_date))
        .bind(encode_date(series.end_date))
        .bind(&series.note)
        .bind(series.updated_at)
        .bind(series.id)
        .execute(&mut *tx)
        .await?;

        for entry_id in &plan.to_delete {
            sqlx::query("DELETE FROM schedule_entries WHERE id = $1")
                .bind(entry_id)
                .execute(&mut *tx)
                .await?;
        }
        for entry in &plan.to_create {
            insert_entry_in_transaction(&mut tx, entry).await?;
        }

        tx.commit().await?;

        tracing::debug!(
            series_id = %id,
            deleted = plan.to_delete.len(),
            created = plan.to_create.len(),
            "reconciled schedule series"
        );
        Ok(ReconcileOutcome {
            series,
            created: plan.to_create,
            deleted: plan.to_delete,
        })
    }

    async fn delete_series(&self, id: Uuid) -> Result<(), CoreError> {
        let mut tx = self.pool().begin().await?;

        fetch_series_in_transaction(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Schedule series with id {} not found", id)))?;

        // Entries first, the series row references are gone afterwards
        sqlx::query("DELETE FROM schedule_entries WHERE series_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM schedule_series WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn detach_entry(&self, entry_id: Uuid) -> Result<ScheduleSeries, CoreError> {
        let mut tx = self.pool().begin().await?;

        let entry = fetch_entry_in_transaction(&mut tx, entry_id)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound(format!("Schedule entry with id {} not found", entry_id))
            })?;
        let parent = fetch_series_in_transaction(&mut tx, entry.series_id)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound(format!(
                    "Schedule series with id {} not found",
                    entry.series_id
                ))
            })?;

        // Single-day series covering exactly the entry's working day
        let series = single_day_series(&parent, &entry);
        insert_series_in_transaction(&mut tx, &series).await?;

        sqlx::query("UPDATE schedule_entries SET series_id = $1, updated_at = $2 WHERE id = $3")
            .bind(series.id)
            .bind(Utc::now())
            .bind(entry.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(entry_id = %entry_id, series_id = %series.id, "detached entry");
        Ok(series)
    }

    async fn dissolve_series(&self, id: Uuid) -> Result<Vec<DissolvedEntry>, CoreError> {
        let mut tx = self.pool().begin().await?;

        let parent = fetch_series_in_transaction(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Schedule series with id {} not found", id)))?;

        let entries = entries_for_series_in_transaction(&mut tx, id).await?;

        let mut dissolved = Vec::with_capacity(entries.len());
        for mut entry in entries {
            let series = single_day_series(&parent, &entry);
            insert_series_in_transaction(&mut tx, &series).await?;

            entry.series_id = series.id;
            entry.updated_at = Utc::now();
            sqlx::query("UPDATE schedule_entries SET series_id = $1, updated_at = $2 WHERE id = $3")
                .bind(series.id)
                .bind(entry.updated_at)
                .bind(entry.id)
                .execute(&mut *tx)
                .await?;

            dissolved.push(DissolvedEntry { entry, series });
        }

        // Every entry now lives in its own series, the original is empty
        sqlx::query("DELETE FROM schedule_series WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(series_id = %id, entries = dissolved.len(), "dissolved schedule series");
        Ok(dissolved)
    }
}

/// Builds the one-day series a detached or dissolved entry moves into.
fn single_day_series(parent: &ScheduleSeries, entry: &ScheduleEntry) -> ScheduleSeries {
    ScheduleSeries {
        id: Uuid::now_v7(),
        type_id: parent.type_id,
        subject_id: parent.subject_id,
        start_date: entry.at_date,
        end_date: entry.at_date,
        note: parent.note.clone(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

async fn ensure_subject_type_exists(
    tx: &mut Transaction<'_, Sqlite>,
    type_id: Uuid,
) -> Result<(), CoreError> {
    let found: Option<Uuid> = sqlx::query_scalar("SELECT id FROM subject_types WHERE id = $1")
        .bind(type_id)
        .fetch_optional(&mut **tx)
        .await?;
    found
        .map(|_| ())
        .ok_or_else(|| CoreError::NotFound(format!("Subject type with id {} not found", type_id)))
}

async fn ensure_subject_exists(
    tx: &mut Transaction<'_, Sqlite>,
    subject_id: Uuid,
) -> Result<(), CoreError> {
    let found: Option<Uuid> = sqlx::query_scalar("SELECT id FROM subjects WHERE id = $1")
        .bind(subject_id)
        .fetch_optional(&mut **tx)
        .await?;
    found
        .map(|_| ())
        .ok_or_else(|| CoreError::NotFound(format!("Subject with id {} not found", subject_id)))
}

pub(crate) async fn fetch_series_in_transaction(
    tx: &mut Transaction<'_, Sqlite>,
    id: Uuid,
) -> Result<Option<ScheduleSeries>, CoreError> {
    let row: Option<SeriesRow> = sqlx::query_as("SELECT * FROM schedule_series WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
    row.map(SeriesRow::into_model).transpose()
}

pub(crate) async fn fetch_entry_in_transaction(
    tx: &mut Transaction<'_, Sqlite>,
    id: Uuid,
) -> Result<Option<ScheduleEntry>, CoreError> {
    let row: Option<EntryRow> = sqlx::query_as("SELECT * FROM schedule_entries WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
    row.map(EntryRow::into_model).transpose()
}

pub(crate) async fn entries_for_series_in_transaction(
    tx: &mut Transaction<'_, Sqlite>,
    series_id: Uuid,
) -> Result<Vec<ScheduleEntry>, CoreError> {
    let rows: Vec<EntryRow> =
        sqlx::query_as("SELECT * FROM schedule_entries WHERE series_id = $1 ORDER BY at_date ASC")
            .bind(series_id)
            .fetch_all(&mut **tx)
            .await?;
    rows.into_iter().map(EntryRow::into_model).collect()
}

pub(crate) async fn insert_series_in_transaction(
    tx: &mut Transaction<'_, Sqlite>,
    series: &ScheduleSeries,
) -> Result<(), CoreError> {
    sqlx::query(
        r#"INSERT INTO schedule_series (id, type_id, subject_id, start_date, end_date, note, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
    )
    .bind(series.id)
    .bind(series.type_id)
    .bind(series.subject_id)
    .bind(encode_date(series.start_date))
    .bind(encode_date(series.end_date))
    .bind(&series.note)
    .bind(series.created_at)
    .bind(series.updated_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Inserts an entry, shifting its wall-clock times onto the working-day
/// clock for storage.
pub(crate) async fn insert_entry_in_transaction(
    tx: &mut Transaction<'_, Sqlite>,
    entry: &ScheduleEntry,
) -> Result<(), CoreError> {
    sqlx::query(
        r#"INSERT INTO schedule_entries (id, series_id, day_start, start_time, end_time, at_date, note, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"#,
    )
    .bind(entry.id)
    .bind(entry.series_id)
    .bind(i64::from(entry.day_start))
    .bind(encode_time(to_day_clock(entry.start_time, entry.day_start)))
    .bind(encode_time(to_day_clock(entry.end_time, entry.day_start)))
    .bind(encode_date(entry.at_date))
    .bind(&entry.note)
    .bind(entry.created_at)
    .bind(entry.updated_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
