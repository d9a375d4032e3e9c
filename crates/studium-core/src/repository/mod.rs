use crate::codec::{decode_date, decode_time, to_wall_clock};
use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{
    DaySummary, DissolvedEntry, NewSeriesData, NewSubjectData, NewWorkUnitData, ReconcileOutcome,
    ScheduleEntry, ScheduleSeries, Setting, Subject, SubjectType, UnitKind, UpdateEntryData,
    UpdateSeriesData, UpdateSubjectData, UpdateWorkUnitData, WorkUnit,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

// Re-export domain modules
pub mod entries;
pub mod series;
pub mod settings;
pub mod subjects;
pub mod summary;
pub mod work_units;

// Traits are defined in this module and implemented in respective domain modules

/// `schedule_series` row as stored: dates are `YYYYMMDD` integers.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct SeriesRow {
    pub id: Uuid,
    pub type_id: Uuid,
    pub subject_id: Uuid,
    pub start_date: i64,
    pub end_date: i64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SeriesRow {
    pub(crate) fn into_model(self) -> Result<ScheduleSeries, CoreError> {
        Ok(ScheduleSeries {
            id: self.id,
            type_id: self.type_id,
            subject_id: self.subject_id,
            start_date: decode_date(self.start_date)?,
            end_date: decode_date(self.end_date)?,
            note: self.note,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// `schedule_entries` row as stored: times on the working-day clock,
/// `at_date` a `YYYYMMDD` integer naming the working day.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct EntryRow {
    pub id: Uuid,
    pub series_id: Uuid,
    pub day_start: i64,
    pub start_time: i64,
    pub end_time: i64,
    pub at_date: i64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EntryRow {
    /// Decodes the stored codes and shifts the times back to the wall clock.
    pub(crate) fn into_model(self) -> Result<ScheduleEntry, CoreError> {
        let day_start = u8::try_from(self.day_start)
            .ok()
            .filter(|hour| *hour < 24)
            .ok_or(CoreError::InvalidDayStart(self.day_start))?;
        Ok(ScheduleEntry {
            id: self.id,
            series_id: self.series_id,
            day_start,
            start_time: to_wall_clock(decode_time(self.start_time)?, day_start),
            end_time: to_wall_clock(decode_time(self.end_time)?, day_start),
            at_date: decode_date(self.at_date)?,
            note: self.note,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// An entry joined with the series that owns it, as the planner UI consumes
/// a day range.
#[derive(Debug)]
pub struct EntryWithSeries {
    pub entry: ScheduleEntry,
    pub series: ScheduleSeries,
}

/// Domain-specific trait for schedule series operations
#[async_trait]
pub trait SeriesRepository {
    async fn create_series(
        &self,
        data: NewSeriesData,
    ) -> Result<(ScheduleSeries, Vec<ScheduleEntry>), CoreError>;
    async fn find_series_by_id(&self, id: Uuid) -> Result<Option<ScheduleSeries>, CoreError>;
    async fn update_series(
        &self,
        id: Uuid,
        data: UpdateSeriesData,
    ) -> Result<ReconcileOutcome, CoreError>;
    async fn delete_series(&self, id: Uuid) -> Result<(), CoreError>;
    async fn detach_entry(&self, entry_id: Uuid) -> Result<ScheduleSeries, CoreError>;
    async fn dissolve_series(&self, id: Uuid) -> Result<Vec<DissolvedEntry>, CoreError>;
}

/// Domain-specific trait for schedule entry operations
#[async_trait]
pub trait EntryRepository {
    async fn find_entry_by_id(&self, id: Uuid) -> Result<Option<ScheduleEntry>, CoreError>;
    async fn find_entries_in_range(
        &self,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> Result<Vec<EntryWithSeries>, CoreError>;
    async fn find_entries_for_series(
        &self,
        series_id: Uuid,
    ) -> Result<Vec<ScheduleEntry>, CoreError>;
    async fn update_entry(&self, id: Uuid, data: UpdateEntryData)
        -> Result<ScheduleEntry, CoreError>;
    async fn delete_entry(&self, id: Uuid) -> Result<(), CoreError>;
}

/// Domain-specific trait for the subject catalog
#[async_trait]
pub trait SubjectRepository {
    async fn add_subject_type(
        &self,
        name: String,
        note: Option<String>,
    ) -> Result<SubjectType, CoreError>;
    async fn find_subject_types(&self) -> Result<Vec<SubjectType>, CoreError>;
    async fn find_subject_type_by_name(&self, name: &str)
        -> Result<Option<SubjectType>, CoreError>;
    async fn add_subject(&self, data: NewSubjectData) -> Result<Subject, CoreError>;
    async fn find_subject_by_id(&self, id: Uuid) -> Result<Option<Subject>, CoreError>;
    async fn find_subject_by_name(&self, name: &str) -> Result<Option<Subject>, CoreError>;
    async fn find_subjects(&self, active_only: bool) -> Result<Vec<Subject>, CoreError>;
    async fn update_subject(&self, id: Uuid, data: UpdateSubjectData)
        -> Result<Subject, CoreError>;
    async fn archive_subject(&self, id: Uuid) -> Result<Subject, CoreError>;
    async fn delete_subject(&self, id: Uuid) -> Result<(), CoreError>;
    async fn seed_defaults(&self) -> Result<(), CoreError>;
}

/// Domain-specific trait for recorded work units
#[async_trait]
pub trait WorkUnitRepository {
    async fn record_work_unit(&self, data: NewWorkUnitData) -> Result<Vec<WorkUnit>, CoreError>;
    async fn find_work_unit_by_id(&self, id: Uuid) -> Result<Option<WorkUnit>, CoreError>;
    async fn find_work_units_in_range(
        &self,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> Result<Vec<WorkUnit>, CoreError>;
    async fn find_work_unit_for_entry(
        &self,
        entry_id: Uuid,
    ) -> Result<Option<WorkUnit>, CoreError>;
    async fn update_work_unit(
        &self,
        id: Uuid,
        data: UpdateWorkUnitData,
    ) -> Result<WorkUnit, CoreError>;
    async fn delete_work_unit(&self, id: Uuid) -> Result<(), CoreError>;
}

/// Domain-specific trait for planned-vs-actual aggregates
#[async_trait]
pub trait SummaryRepository {
    async fn total_seconds_for_day(&self, day: NaiveDate, kind: UnitKind)
        -> Result<i64, CoreError>;
    async fn total_seconds_for_subject_and_day(
        &self,
        day: NaiveDate,
        subject_id: Uuid,
        kind: UnitKind,
    ) -> Result<i64, CoreError>;
    async fn planned_seconds_for_day(&self, day: NaiveDate) -> Result<i64, CoreError>;
    async fn planned_seconds_for_subject_and_day(
        &self,
        day: NaiveDate,
        subject_id: Uuid,
    ) -> Result<i64, CoreError>;
    async fn day_summary(&self, day: NaiveDate) -> Result<DaySummary, CoreError>;
}

/// Domain-specific trait for persisted user settings
#[async_trait]
pub trait SettingsRepository {
    async fn put_setting(
        &self,
        name: &str,
        scope: i64,
        value: &str,
        note: Option<String>,
    ) -> Result<Setting, CoreError>;
    async fn get_setting(&self, name: &str, scope: i64) -> Result<Option<Setting>, CoreError>;
    async fn list_settings(&self) -> Result<Vec<Setting>, CoreError>;
    async fn delete_setting(&self, name: &str, scope: i64) -> Result<(), CoreError>;
}

/// Main repository trait that composes all domain traits
#[async_trait]
pub trait Repository:
    SeriesRepository
    + EntryRepository
    + SubjectRepository
    + WorkUnitRepository
    + SummaryRepository
    + SettingsRepository
{
    // This trait automatically composes all domain-specific repositories
    // Individual domain operations are defined in their respective traits
}

/// SQLite implementation of the repository pattern
pub struct SqliteRepository {
    pool: DbPool,
}

impl SqliteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the database pool for internal use across modules
    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }
}

// The main Repository trait implementation will automatically be available
// when all domain trait implementations are defined
impl Repository for SqliteRepository {}
