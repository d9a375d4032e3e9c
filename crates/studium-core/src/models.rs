use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// A recurring weekly block of planned study time.
///
/// A series owns one `ScheduleEntry` per week between `start_date` and
/// `end_date` (both inclusive). The entries carry the concrete weekday and
/// times; the series row only pins the date range, the subject and the kind
/// of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSeries {
    #[serde(with = "uuid::serde::compact")]
    pub id: Uuid,
    /// Foreign key to subject_types
    pub type_id: Uuid,
    /// Foreign key to subjects
    pub subject_id: Uuid,
    /// First calendar day covered by the series (inclusive)
    pub start_date: NaiveDate,
    /// Last calendar day covered by the series (inclusive)
    pub end_date: NaiveDate,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for ScheduleSeries {
    fn default() -> Self {
        let today = Utc::now().date_naive();
        Self {
            id: Uuid::now_v7(),
            type_id: Uuid::now_v7(),
            subject_id: Uuid::now_v7(),
            start_date: today,
            end_date: today,
            note: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

/// One concrete occurrence of a series on a single working day.
///
/// `at_date` labels the working day the entry belongs to, which is also the
/// calendar day the working day started on. Times are wall-clock in memory;
/// the repository shifts them onto the working-day clock for storage, so an
/// entry running past midnight still sorts into the day it started.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    #[serde(with = "uuid::serde::compact")]
    pub id: Uuid,
    #[serde(with = "uuid::serde::compact")]
    pub series_id: Uuid,
    /// Hour at which this entry's working day starts (wall clock)
    pub day_start: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Working day this entry belongs to
    pub at_date: NaiveDate,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for ScheduleEntry {
    fn default() -> Self {
        Self {
            id: Uuid::now_v7(),
            series_id: Uuid::now_v7(),
            day_start: 5,
            start_time: NaiveTime::MIN,
            end_time: NaiveTime::MIN,
            at_date: Utc::now().date_naive(),
            note: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

// ============================================================================
// Data Transfer Objects (DTOs) for Schedule Operations
// ============================================================================

/// Shape of the weekly occurrence a new series is expanded from.
///
/// `at_date` picks the weekday; every generated entry lands on that weekday
/// and copies the times and note.
#[derive(Debug, Clone)]
pub struct EntryTemplate {
    pub at_date: NaiveDate,
    pub day_start: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub note: Option<String>,
}

/// Data required to create a new schedule series
#[derive(Debug, Clone)]
pub struct NewSeriesData {
    pub type_id: Uuid,
    pub subject_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub note: Option<String>,
    /// Weekday, times and note of the weekly occurrence
    pub template: EntryTemplate,
}

/// Data for modifying an existing series
///
/// Changing `start_date` or `end_date` triggers reconciliation of the
/// series' entries against the new range.
#[derive(Debug, Clone, Default)]
pub struct UpdateSeriesData {
    pub type_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub note: Option<Option<String>>,
}

/// Data for modifying a single entry without touching its series
#[derive(Debug, Clone, Default)]
pub struct UpdateEntryData {
    pub day_start: Option<u8>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub at_date: Option<NaiveDate>,
    pub note: Option<Option<String>>,
}

/// Result of reconciling a series against updated bounds.
#[derive(Debug)]
pub struct ReconcileOutcome {
    /// The series row after the update
    pub series: ScheduleSeries,
    /// Entries created to fill growth at either boundary
    pub created: Vec<ScheduleEntry>,
    /// Ids of entries deleted because they fell outside the new bounds
    pub deleted: Vec<Uuid>,
}

/// One entry after a dissolve, paired with the single-day series that now
/// owns it.
#[derive(Debug)]
pub struct DissolvedEntry {
    pub entry: ScheduleEntry,
    pub series: ScheduleSeries,
}

// ============================================================================
// Subject Catalog Models
// ============================================================================

/// Kind of work a subject type names (lecture, exercise, ...).
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct SubjectType {
    #[serde(with = "uuid::serde::compact")]
    pub id: Uuid,
    /// Short tag shown in the UI ("V", "U", ...)
    pub name: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum SubjectKind {
    /// A regular course with its own schedule
    Regular,
    /// The catch-all self-study subject
    Study,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid subject kind: {0}")]
pub struct ParseSubjectKindError(String);

impl FromStr for SubjectKind {
    type Err = ParseSubjectKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "regular" => Ok(SubjectKind::Regular),
            "study" => Ok(SubjectKind::Study),
            _ => Err(ParseSubjectKindError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: Uuid,
    pub name: String,
    pub note: Option<String>,
    /// Display color as "r,g,b,a" with each channel 0-255
    pub color: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Archived subjects keep their history but are hidden from pickers
    pub active: bool,
    pub kind: SubjectKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Subject {
    fn default() -> Self {
        let today = Utc::now().date_naive();
        Self {
            id: Uuid::now_v7(),
            name: "".to_string(),
            note: None,
            color: "128,128,128,255".to_string(),
            start_date: today,
            end_date: today,
            active: true,
            kind: SubjectKind::Regular,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewSubjectData {
    pub name: String,
    pub note: Option<String>,
    pub color: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub kind: SubjectKind,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateSubjectData {
    pub name: Option<String>,
    pub note: Option<Option<String>>,
    pub color: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub active: Option<bool>,
    pub kind: Option<SubjectKind>,
}

// ============================================================================
// Work Unit Models
// ============================================================================

/// What a recorded stretch of time was spent on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum UnitKind {
    /// Placeholder written when a session starts, before its kind is known
    Init,
    Work,
    Break,
    Coffee,
    /// Attended class time, recorded against a schedule entry
    School,
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitKind::Init => write!(f, "init"),
            UnitKind::Work => write!(f, "work"),
            UnitKind::Break => write!(f, "break"),
            UnitKind::Coffee => write!(f, "coffee"),
            UnitKind::School => write!(f, "school"),
        }
    }
}

impl FromStr for UnitKind {
    type Err = ParseUnitKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "init" => Ok(UnitKind::Init),
            "work" => Ok(UnitKind::Work),
            "break" => Ok(UnitKind::Break),
            "coffee" => Ok(UnitKind::Coffee),
            "school" => Ok(UnitKind::School),
            _ => Err(ParseUnitKindError(s.to_string())),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid unit kind: {0}")]
pub struct ParseUnitKindError(String);

/// Lifecycle of a work unit relative to the session that records it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum UnitState {
    /// Freshly recorded, session still running
    Open,
    /// Rewritten at least once by a session tick
    Running,
    /// Session over, duration final
    Closed,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid unit state: {0}")]
pub struct ParseUnitStateError(String);

impl FromStr for UnitState {
    type Err = ParseUnitStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(UnitState::Open),
            "running" => Ok(UnitState::Running),
            "closed" => Ok(UnitState::Closed),
            _ => Err(ParseUnitStateError(s.to_string())),
        }
    }
}

/// A recorded stretch of worked (or rested) time.
///
/// A unit never spans two working days in storage; recording a span that
/// crosses the working-day boundary produces one unit per day, each with its
/// own duration. Times follow the same wall-clock/day-clock convention as
/// `ScheduleEntry`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkUnit {
    pub id: Uuid,
    pub type_id: Uuid,
    pub subject_id: Uuid,
    /// The planned entry this unit fulfills, if any
    pub schedule_entry_id: Option<Uuid>,
    pub kind: UnitKind,
    pub day_start: u8,
    pub start_time: NaiveTime,
    /// Working day the unit started in
    pub start_date: NaiveDate,
    pub end_time: NaiveTime,
    /// Working day the unit ended in
    pub end_date: NaiveDate,
    /// Recorded duration of this row in seconds
    pub seconds: i64,
    pub state: UnitState,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for WorkUnit {
    fn default() -> Self {
        let today = Utc::now().date_naive();
        Self {
            id: Uuid::now_v7(),
            type_id: Uuid::now_v7(),
            subject_id: Uuid::now_v7(),
            schedule_entry_id: None,
            kind: UnitKind::Init,
            day_start: 5,
            start_time: NaiveTime::MIN,
            start_date: today,
            end_time: NaiveTime::MIN,
            end_date: today,
            seconds: 0,
            state: UnitState::Open,
            note: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

/// Data required to record a new work unit.
///
/// Dates and times are plain wall-clock calendar values; the repository
/// handles the working-day shift and any boundary split.
#[derive(Debug, Clone)]
pub struct NewWorkUnitData {
    pub type_id: Uuid,
    pub subject_id: Uuid,
    pub schedule_entry_id: Option<Uuid>,
    pub kind: UnitKind,
    pub day_start: u8,
    pub start_time: NaiveTime,
    pub start_date: NaiveDate,
    pub end_time: NaiveTime,
    pub end_date: NaiveDate,
    pub state: UnitState,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateWorkUnitData {
    pub type_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub schedule_entry_id: Option<Option<Uuid>>,
    pub kind: Option<UnitKind>,
    pub start_time: Option<NaiveTime>,
    pub start_date: Option<NaiveDate>,
    pub end_time: Option<NaiveTime>,
    pub end_date: Option<NaiveDate>,
    pub state: Option<UnitState>,
    pub note: Option<Option<String>>,
}

// ============================================================================
// Settings and Summaries
// ============================================================================

/// A persisted user preference, unique per (name, scope).
///
/// `scope` partitions settings, so e.g. per-subject overrides of a global
/// value can share a name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Setting {
    pub id: Uuid,
    pub name: String,
    pub note: Option<String>,
    pub scope: i64,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Planned-vs-actual aggregate for one working day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySummary {
    pub date: NaiveDate,
    /// Scheduled seconds from entries of that working day
    pub planned_seconds: i64,
    pub work_seconds: i64,
    pub break_seconds: i64,
    pub coffee_seconds: i64,
}
