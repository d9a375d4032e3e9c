use chrono::{Datelike, Days, NaiveDate, NaiveTime, Utc, Weekday};
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{EntryTemplate, ScheduleEntry, ScheduleSeries};

/// Plan for bringing a series' entries in line with new date bounds.
///
/// Purely descriptive; nothing is persisted until a repository applies it.
#[derive(Debug, Default)]
pub struct ReconcilePlan {
    /// Entries that fall outside the new bounds
    pub to_delete: Vec<Uuid>,
    /// Entries filling the gap where a boundary moved outward
    pub to_create: Vec<ScheduleEntry>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_create.is_empty()
    }
}

/// SeriesExpander: turns a weekly occurrence template into concrete entries.
///
/// Responsibilities:
/// 1. Generate one entry per week on the template's weekday between two dates
/// 2. Plan the per-boundary delete/create work when a series' bounds change
///
/// Expansion is pure date arithmetic; repositories own all persistence.
#[derive(Debug, Clone)]
pub struct SeriesExpander {
    series_id: Uuid,
    weekday: Weekday,
    day_start: u8,
    start_time: NaiveTime,
    end_time: NaiveTime,
    note: Option<String>,
}

impl SeriesExpander {
    /// Creates an expander that reproduces an existing entry's weekly slot.
    pub fn new(series: &ScheduleSeries, template: &ScheduleEntry) -> Self {
        Self {
            series_id: series.id,
            weekday: template.at_date.weekday(),
            day_start: template.day_start,
            start_time: template.start_time,
            end_time: template.end_time,
            note: template.note.clone(),
        }
    }

    /// Creates an expander from the template a new series is built around.
    pub fn from_template(series_id: Uuid, template: &EntryTemplate) -> Self {
        Self {
            series_id,
            weekday: template.at_date.weekday(),
            day_start: template.day_start,
            start_time: template.start_time,
            end_time: template.end_time,
            note: template.note.clone(),
        }
    }

    /// Generates the weekly entries covering `range_start..=range_end`.
    ///
    /// # Arguments
    /// * `range_start` - First candidate day (inclusive)
    /// * `range_end` - Last candidate day (inclusive)
    ///
    /// # Returns
    /// * `Vec<ScheduleEntry>` - Entries in ascending date order, possibly empty
    ///
    /// # Behavior
    /// - The first entry lands on the first date `>= range_start` whose
    ///   weekday matches the template, at most six days in
    /// - Subsequent entries follow in exact seven-day steps while they still
    ///   fit inside `range_end`
    /// - An inverted range produces no entries
    pub fn expand_between(&self, range_start: NaiveDate, range_end: NaiveDate) -> Vec<ScheduleEntry> {
        if range_start > range_end {
            return Vec::new();
        }

        let to_first = (7 + self.weekday.num_days_from_monday() as i64
            - range_start.weekday().num_days_from_monday() as i64)
            % 7;
        let Some(first) = range_start.checked_add_days(Days::new(to_first as u64)) else {
            return Vec::new();
        };

        let mut entries = Vec::new();
        let mut cursor = first;
        while cursor <= range_end {
            entries.push(self.entry_on(cursor));
            match cursor.checked_add_days(Days::new(7)) {
                Some(next) => cursor = next,
                None => break,
            }
        }
        entries
    }

    /// Plans the entry changes needed to move `series` to new date bounds.
    ///
    /// # Arguments
    /// * `series` - The series as currently stored
    /// * `entries` - All of the series' current entries, any order
    /// * `new_start` / `new_end` - The bounds being applied
    ///
    /// # Returns
    /// * `Result<ReconcilePlan, CoreError>` - Deletions and creations per
    ///   boundary, or a validation error
    ///
    /// # Behavior
    /// - Each boundary is handled independently: moving it inward deletes the
    ///   entries left outside, moving it outward fills the opened gap with
    ///   fresh entries
    /// - Fill entries copy the weekday, times and day start of the earliest
    ///   existing entry but carry no note
    /// - Growing a series that has no entries left fails with `EmptySeries`,
    ///   since there is no slot to replicate
    pub fn plan_reconcile(
        series: &ScheduleSeries,
        entries: &[ScheduleEntry],
        new_start: NaiveDate,
        new_end: NaiveDate,
    ) -> Result<ReconcilePlan, CoreError> {
        if new_start > new_end {
            return Err(CoreError::InvalidDateRange {
                start: new_start,
                end: new_end,
            });
        }

        let grows = new_start < series.start_date || new_end > series.end_date;
        let template = entries.iter().min_by_key(|entry| entry.at_date);
        let filler = match template {
            Some(entry) => {
                let mut expander = Self::new(series, entry);
                expander.note = None;
                Some(expander)
            }
            None if grows => return Err(CoreError::EmptySeries(series.id)),
            None => None,
        };

        let mut plan = ReconcilePlan::default();

        if new_start > series.start_date {
            plan.to_delete.extend(
                entries
                    .iter()
                    .filter(|entry| entry.at_date < new_start)
                    .map(|entry| entry.id),
            );
        } else if new_start < series.start_date {
            let gap_end = series
                .start_date
                .pred_opt()
                .ok_or_else(|| CoreError::InvalidInput("series start underflows the calendar".to_string()))?;
            if let Some(filler) = &filler {
                plan.to_create.extend(filler.expand_between(new_start, gap_end));
            }
        }

        if new_end < series.end_date {
            plan.to_delete.extend(
                entries
                    .iter()
                    .filter(|entry| entry.at_date > new_end)
                    .map(|entry| entry.id),
            );
        } else if new_end > series.end_date {
            let gap_start = series
                .end_date
                .succ_opt()
                .ok_or_else(|| CoreError::InvalidInput("series end overflows the calendar".to_string()))?;
            if let Some(filler) = &filler {
                plan.to_create.extend(filler.expand_between(gap_start, new_end));
            }
        }

        Ok(plan)
    }

    fn entry_on(&self, date: NaiveDate) -> ScheduleEntry {
        ScheduleEntry {
            id: Uuid::now_v7(),
            series_id: self.series_id,
            day_start: self.day_start,
            start_time: self.start_time,
            end_time: self.end_time,
            at_date: date,
            note: self.note.clone(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
