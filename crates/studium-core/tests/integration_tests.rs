use chrono::{NaiveDate, NaiveTime};
use studium_core::db::establish_connection;
use studium_core::error::CoreError;
use studium_core::models::*;
use studium_core::repository::{
    EntryRepository, SeriesRepository, SettingsRepository, SqliteRepository, SubjectRepository,
    SummaryRepository, WorkUnitRepository,
};
use tempfile::TempDir;
use uuid::Uuid;

/// Helper function to create a seeded test database
async fn setup_test_db() -> (SqliteRepository, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");

    let pool = establish_connection(&db_path.to_string_lossy())
        .await
        .expect("Failed to establish test database connection");

    let repository = SqliteRepository::new(pool);
    repository
        .seed_defaults()
        .await
        .expect("Failed to seed default catalog");

    (repository, temp_dir)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

async fn lecture_type(repo: &SqliteRepository) -> SubjectType {
    repo.find_subject_type_by_name("V")
        .await
        .expect("Failed to query subject types")
        .expect("Default catalog should contain the lecture type")
}

async fn study_subject(repo: &SqliteRepository) -> Subject {
    repo.find_subject_by_name("Study")
        .await
        .expect("Failed to query subjects")
        .expect("Default catalog should contain the Study subject")
}

/// Helper creating a Monday 10:15-11:45 series over the given range.
/// 2024-01-01 is a Monday.
async fn create_monday_series(
    repo: &SqliteRepository,
    start: NaiveDate,
    end: NaiveDate,
) -> (ScheduleSeries, Vec<ScheduleEntry>) {
    let subject_type = lecture_type(repo).await;
    let subject = study_subject(repo).await;

    repo.create_series(NewSeriesData {
        type_id: subject_type.id,
        subject_id: subject.id,
        start_date: start,
        end_date: end,
        note: Some("Algebra".to_string()),
        template: EntryTemplate {
            at_date: date(2024, 1, 1),
            day_start: 5,
            start_time: time(10, 15),
            end_time: time(11, 45),
            note: Some("Algebra".to_string()),
        },
    })
    .await
    .expect("Failed to create test series")
}

async fn record_test_unit(
    repo: &SqliteRepository,
    subject_id: Uuid,
    kind: UnitKind,
    day: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
) -> Vec<WorkUnit> {
    let subject_type = lecture_type(repo).await;
    repo.record_work_unit(NewWorkUnitData {
        type_id: subject_type.id,
        subject_id,
        schedule_entry_id: None,
        kind,
        day_start: 5,
        start_time: start,
        start_date: day,
        end_time: end,
        end_date: day,
        state: UnitState::Closed,
        note: None,
    })
    .await
    .expect("Failed to record work unit")
}

// ============================================================================
// Series creation and expansion
// ============================================================================

#[tokio::test]
async fn test_create_series_expands_weekly() {
    let (repo, _temp_dir) = setup_test_db().await;

    let (series, entries) = create_monday_series(&repo, date(2024, 1, 1), date(2024, 1, 31)).await;

    let dates: Vec<NaiveDate> = entries.iter().map(|e| e.at_date).collect();
    assert_eq!(
        dates,
        vec![
            date(2024, 1, 1),
            date(2024, 1, 8),
            date(2024, 1, 15),
            date(2024, 1, 22),
            date(2024, 1, 29),
        ]
    );

    // Everything is persisted, not just returned
    let stored = repo
        .find_series_by_id(series.id)
        .await
        .unwrap()
        .expect("Series should be stored");
    assert_eq!(stored.start_date, date(2024, 1, 1));
    assert_eq!(stored.end_date, date(2024, 1, 31));
    assert_eq!(stored.note.as_deref(), Some("Algebra"));

    let stored_entries = repo.find_entries_for_series(series.id).await.unwrap();
    assert_eq!(stored_entries.len(), 5);
    for entry in &stored_entries {
        assert_eq!(entry.series_id, series.id);
        assert_eq!(entry.start_time, time(10, 15));
        assert_eq!(entry.end_time, time(11, 45));
        assert_eq!(entry.note.as_deref(), Some("Algebra"));
    }
}

#[tokio::test]
async fn test_create_series_first_entry_within_six_days() {
    let (repo, _temp_dir) = setup_test_db().await;
    let subject_type = lecture_type(&repo).await;
    let subject = study_subject(&repo).await;

    // Wednesday template against a range starting Monday
    let (_series, entries) = repo
        .create_series(NewSeriesData {
            type_id: subject_type.id,
            subject_id: subject.id,
            start_date: date(2024, 1, 1),
            end_date: date(2024, 1, 31),
            note: None,
            template: EntryTemplate {
                at_date: date(2024, 1, 3),
                day_start: 5,
                start_time: time(14, 0),
                end_time: time(16, 0),
                note: None,
            },
        })
        .await
        .unwrap();

    assert_eq!(entries[0].at_date, date(2024, 1, 3));
    assert_eq!(entries.len(), 5);
}

#[tokio::test]
async fn test_create_series_rejects_inverted_bounds() {
    let (repo, _temp_dir) = setup_test_db().await;
    let subject_type = lecture_type(&repo).await;
    let subject = study_subject(&repo).await;

    let result = repo
        .create_series(NewSeriesData {
            type_id: subject_type.id,
            subject_id: subject.id,
            start_date: date(2024, 1, 31),
            end_date: date(2024, 1, 1),
            note: None,
            template: EntryTemplate {
                at_date: date(2024, 1, 1),
                day_start: 5,
                start_time: time(10, 0),
                end_time: time(11, 0),
                note: None,
            },
        })
        .await;

    assert!(matches!(
        result.unwrap_err(),
        CoreError::InvalidDateRange { .. }
    ));
}

#[tokio::test]
async fn test_create_series_requires_known_catalog_rows() {
    let (repo, _temp_dir) = setup_test_db().await;
    let subject = study_subject(&repo).await;

    let result = repo
        .create_series(NewSeriesData {
            type_id: Uuid::now_v7(),
            subject_id: subject.id,
            start_date: date(2024, 1, 1),
            end_date: date(2024, 1, 31),
            note: None,
            template: EntryTemplate {
                at_date: date(2024, 1, 1),
                day_start: 5,
                start_time: time(10, 0),
                end_time: time(11, 0),
                note: None,
            },
        })
        .await;

    assert!(matches!(result.unwrap_err(), CoreError::NotFound(_)));
}

// ============================================================================
// Reconciliation on series updates
// ============================================================================

#[tokio::test]
async fn test_shrink_start_deletes_leading_entries() {
    let (repo, _temp_dir) = setup_test_db().await;
    let (series, _) = create_monday_series(&repo, date(2024, 1, 1), date(2024, 1, 31)).await;

    let outcome = repo
        .update_series(
            series.id,
            UpdateSeriesData {
                start_date: Some(date(2024, 1, 10)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.deleted.len(), 2);
    assert!(outcome.created.is_empty());
    assert_eq!(outcome.series.start_date, date(2024, 1, 10));

    let remaining = repo.find_entries_for_series(series.id).await.unwrap();
    let dates: Vec<NaiveDate> = remaining.iter().map(|e| e.at_date).collect();
    assert_eq!(
        dates,
        vec![date(2024, 1, 15), date(2024, 1, 22), date(2024, 1, 29)]
    );

    let stored = repo.find_series_by_id(series.id).await.unwrap().unwrap();
    assert_eq!(stored.start_date, date(2024, 1, 10));
}

#[tokio::test]
async fn test_grow_end_fills_gap_with_noteless_entries() {
    let (repo, _temp_dir) = setup_test_db().await;
    let (series, _) = create_monday_series(&repo, date(2024, 1, 1), date(2024, 1, 31)).await;

    let outcome = repo
        .update_series(
            series.id,
            UpdateSeriesData {
                end_date: Some(date(2024, 2, 14)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let created_dates: Vec<NaiveDate> = outcome.created.iter().map(|e| e.at_date).collect();
    assert_eq!(created_dates, vec![date(2024, 2, 5), date(2024, 2, 12)]);
    assert!(outcome.created.iter().all(|e| e.note.is_none()));
    assert!(outcome.deleted.is_empty());

    // Filler entries copy the weekly slot of the earliest existing entry
    assert!(outcome.created.iter().all(|e| e.start_time == time(10, 15)));

    let all = repo.find_entries_for_series(series.id).await.unwrap();
    assert_eq!(all.len(), 7);
}

#[tokio::test]
async fn test_grow_start_fills_gap() {
    let (repo, _temp_dir) = setup_test_db().await;
    let (series, _) = create_monday_series(&repo, date(2024, 1, 1), date(2024, 1, 31)).await;

    let outcome = repo
        .update_series(
            series.id,
            UpdateSeriesData {
                start_date: Some(date(2023, 12, 18)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let created_dates: Vec<NaiveDate> = outcome.created.iter().map(|e| e.at_date).collect();
    assert_eq!(created_dates, vec![date(2023, 12, 18), date(2023, 12, 25)]);

    let all = repo.find_entries_for_series(series.id).await.unwrap();
    assert_eq!(all.len(), 7);
    assert_eq!(all[0].at_date, date(2023, 12, 18));
}

#[tokio::test]
async fn test_reconcile_handles_both_boundaries() {
    let (repo, _temp_dir) = setup_test_db().await;
    let (series, _) = create_monday_series(&repo, date(2024, 1, 1), date(2024, 1, 31)).await;

    let outcome = repo
        .update_series(
            series.id,
            UpdateSeriesData {
                start_date: Some(date(2024, 1, 10)),
                end_date: Some(date(2024, 2, 14)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.deleted.len(), 2);
    assert_eq!(outcome.created.len(), 2);

    let dates: Vec<NaiveDate> = repo
        .find_entries_for_series(series.id)
        .await
        .unwrap()
        .iter()
        .map(|e| e.at_date)
        .collect();
    assert_eq!(
        dates,
        vec![
            date(2024, 1, 15),
            date(2024, 1, 22),
            date(2024, 1, 29),
            date(2024, 2, 5),
            date(2024, 2, 12),
        ]
    );
}

#[tokio::test]
async fn test_growing_entryless_series_fails() {
    let (repo, _temp_dir) = setup_test_db().await;
    // one-day range on a Tuesday with a Monday template expands to nothing
    let (series, entries) = create_monday_series(&repo, date(2024, 1, 2), date(2024, 1, 2)).await;
    assert!(entries.is_empty());

    let result = repo
        .update_series(
            series.id,
            UpdateSeriesData {
                end_date: Some(date(2024, 1, 31)),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result.unwrap_err(), CoreError::EmptySeries(_)));
}

#[tokio::test]
async fn test_update_series_not_found() {
    let (repo, _temp_dir) = setup_test_db().await;

    let result = repo
        .update_series(Uuid::now_v7(), UpdateSeriesData::default())
        .await;

    assert!(matches!(result.unwrap_err(), CoreError::NotFound(_)));
}

#[tokio::test]
async fn test_update_series_metadata_leaves_entries_alone() {
    let (repo, _temp_dir) = setup_test_db().await;
    let (series, entries) = create_monday_series(&repo, date(2024, 1, 1), date(2024, 1, 31)).await;
    let seminar = repo
        .add_subject_type("S".to_string(), Some("Seminar".to_string()))
        .await
        .unwrap();

    let outcome = repo
        .update_series(
            series.id,
            UpdateSeriesData {
                type_id: Some(seminar.id),
                note: Some(Some("Algebra II".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(outcome.created.is_empty());
    assert!(outcome.deleted.is_empty());
    assert_eq!(outcome.series.type_id, seminar.id);
    assert_eq!(outcome.series.note.as_deref(), Some("Algebra II"));

    let after = repo.find_entries_for_series(series.id).await.unwrap();
    assert_eq!(after.len(), entries.len());
}

// ============================================================================
// Detach and dissolve
// ============================================================================

#[tokio::test]
async fn test_detach_entry_moves_it_into_single_day_series() {
    let (repo, _temp_dir) = setup_test_db().await;
    let (series, entries) = create_monday_series(&repo, date(2024, 1, 1), date(2024, 1, 31)).await;
    let middle = &entries[2];

    let new_series = repo.detach_entry(middle.id).await.unwrap();

    assert_eq!(new_series.start_date, middle.at_date);
    assert_eq!(new_series.end_date, middle.at_date);
    assert_eq!(new_series.type_id, series.type_id);
    assert_eq!(new_series.subject_id, series.subject_id);
    assert_eq!(new_series.note, series.note);

    let moved = repo.find_entry_by_id(middle.id).await.unwrap().unwrap();
    assert_eq!(moved.series_id, new_series.id);
    assert_eq!(moved.at_date, middle.at_date);
    assert_eq!(moved.start_time, middle.start_time);
}

#[tokio::test]
async fn test_detach_leaves_siblings_and_parent_untouched() {
    let (repo, _temp_dir) = setup_test_db().await;
    let (series, entries) = create_monday_series(&repo, date(2024, 1, 1), date(2024, 1, 31)).await;

    repo.detach_entry(entries[2].id).await.unwrap();

    let parent = repo.find_series_by_id(series.id).await.unwrap().unwrap();
    assert_eq!(parent.start_date, date(2024, 1, 1));
    assert_eq!(parent.end_date, date(2024, 1, 31));

    let siblings = repo.find_entries_for_series(series.id).await.unwrap();
    let sibling_dates: Vec<NaiveDate> = siblings.iter().map(|e| e.at_date).collect();
    assert_eq!(
        sibling_dates,
        vec![
            date(2024, 1, 1),
            date(2024, 1, 8),
            date(2024, 1, 22),
            date(2024, 1, 29),
        ]
    );
}

#[tokio::test]
async fn test_detach_missing_entry_fails() {
    let (repo, _temp_dir) = setup_test_db().await;

    let result = repo.detach_entry(Uuid::now_v7()).await;

    assert!(matches!(result.unwrap_err(), CoreError::NotFound(_)));
}

#[tokio::test]
async fn test_dissolve_series_gives_every_entry_its_own_series() {
    let (repo, _temp_dir) = setup_test_db().await;
    let (series, entries) = create_monday_series(&repo, date(2024, 1, 1), date(2024, 1, 31)).await;

    let dissolved = repo.dissolve_series(series.id).await.unwrap();

    assert_eq!(dissolved.len(), entries.len());
    for item in &dissolved {
        assert_eq!(item.series.start_date, item.entry.at_date);
        assert_eq!(item.series.end_date, item.entry.at_date);
        assert_eq!(item.entry.series_id, item.series.id);
        assert_eq!(item.series.note, series.note);

        // both halves are persisted
        let stored_series = repo
            .find_series_by_id(item.series.id)
            .await
            .unwrap()
            .expect("Dissolved series should be stored");
        assert_eq!(stored_series.start_date, item.entry.at_date);
        let stored_entry = repo.find_entry_by_id(item.entry.id).await.unwrap().unwrap();
        assert_eq!(stored_entry.series_id, item.series.id);
    }

    // the original series is gone, its entries live on
    assert!(repo.find_series_by_id(series.id).await.unwrap().is_none());
    let all = repo
        .find_entries_in_range(date(2024, 1, 1), date(2024, 1, 31))
        .await
        .unwrap();
    assert_eq!(all.len(), entries.len());
}

#[tokio::test]
async fn test_dissolve_missing_series_fails() {
    let (repo, _temp_dir) = setup_test_db().await;

    let result = repo.dissolve_series(Uuid::now_v7()).await;

    assert!(matches!(result.unwrap_err(), CoreError::NotFound(_)));
}

#[tokio::test]
async fn test_delete_series_removes_its_entries() {
    let (repo, _temp_dir) = setup_test_db().await;
    let (series, _) = create_monday_series(&repo, date(2024, 1, 1), date(2024, 1, 31)).await;

    repo.delete_series(series.id).await.unwrap();

    assert!(repo.find_series_by_id(series.id).await.unwrap().is_none());
    assert!(repo
        .find_entries_for_series(series.id)
        .await
        .unwrap()
        .is_empty());
    assert!(repo
        .find_entries_in_range(date(2024, 1, 1), date(2024, 1, 31))
        .await
        .unwrap()
        .is_empty());
}

// ============================================================================
// Entry operations
// ============================================================================

#[tokio::test]
async fn test_update_entry_within_series_bounds() {
    let (repo, _temp_dir) = setup_test_db().await;
    let (_series, entries) = create_monday_series(&repo, date(2024, 1, 1), date(2024, 1, 31)).await;

    let updated = repo
        .update_entry(
            entries[1].id,
            UpdateEntryData {
                at_date: Some(date(2024, 1, 9)),
                start_time: Some(time(8, 30)),
                end_time: Some(time(9, 15)),
                note: Some(Some("Moved to Tuesday".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.at_date, date(2024, 1, 9));
    assert_eq!(updated.start_time, time(8, 30));

    let stored = repo.find_entry_by_id(entries[1].id).await.unwrap().unwrap();
    assert_eq!(stored.at_date, date(2024, 1, 9));
    assert_eq!(stored.end_time, time(9, 15));
    assert_eq!(stored.note.as_deref(), Some("Moved to Tuesday"));
}

#[tokio::test]
async fn test_update_entry_outside_series_bounds_rejected() {
    let (repo, _temp_dir) = setup_test_db().await;
    let (_series, entries) = create_monday_series(&repo, date(2024, 1, 1), date(2024, 1, 31)).await;

    let result = repo
        .update_entry(
            entries[0].id,
            UpdateEntryData {
                at_date: Some(date(2024, 2, 5)),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(
        result.unwrap_err(),
        CoreError::DateOutsideSeries { .. }
    ));

    // the rejected move left the entry untouched
    let stored = repo.find_entry_by_id(entries[0].id).await.unwrap().unwrap();
    assert_eq!(stored.at_date, date(2024, 1, 1));
}

#[tokio::test]
async fn test_delete_entry_leaves_siblings() {
    let (repo, _temp_dir) = setup_test_db().await;
    let (series, entries) = create_monday_series(&repo, date(2024, 1, 1), date(2024, 1, 31)).await;

    repo.delete_entry(entries[0].id).await.unwrap();

    let remaining = repo.find_entries_for_series(series.id).await.unwrap();
    assert_eq!(remaining.len(), 4);

    let result = repo.delete_entry(entries[0].id).await;
    assert!(matches!(result.unwrap_err(), CoreError::NotFound(_)));
}

#[tokio::test]
async fn test_entries_in_range_carry_their_series() {
    let (repo, _temp_dir) = setup_test_db().await;
    let (series, _) = create_monday_series(&repo, date(2024, 1, 1), date(2024, 1, 31)).await;

    let window = repo
        .find_entries_in_range(date(2024, 1, 8), date(2024, 1, 15))
        .await
        .unwrap();

    assert_eq!(window.len(), 2);
    assert_eq!(window[0].entry.at_date, date(2024, 1, 8));
    assert_eq!(window[1].entry.at_date, date(2024, 1, 15));
    for item in &window {
        assert_eq!(item.series.id, series.id);
        assert_eq!(item.series.note.as_deref(), Some("Algebra"));
        assert_eq!(item.series.start_date, date(2024, 1, 1));
    }
}

#[tokio::test]
async fn test_entry_times_survive_the_day_clock_round_trip() {
    let (repo, _temp_dir) = setup_test_db().await;
    let subject_type = lecture_type(&repo).await;
    let subject = study_subject(&repo).await;

    // A late block running past midnight: wall 23:30 to 00:45
    let (_series, entries) = repo
        .create_series(NewSeriesData {
            type_id: subject_type.id,
            subject_id: subject.id,
            start_date: date(2024, 1, 1),
            end_date: date(2024, 1, 1),
            note: None,
            template: EntryTemplate {
                at_date: date(2024, 1, 1),
                day_start: 5,
                start_time: time(23, 30),
                end_time: time(0, 45),
                note: None,
            },
        })
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);

    let stored = repo.find_entry_by_id(entries[0].id).await.unwrap().unwrap();
    assert_eq!(stored.start_time, time(23, 30));
    assert_eq!(stored.end_time, time(0, 45));
    assert_eq!(stored.at_date, date(2024, 1, 1));

    // on the day clock that block is 18:30 to 19:45, 75 minutes
    let planned = repo.planned_seconds_for_day(date(2024, 1, 1)).await.unwrap();
    assert_eq!(planned, 75 * 60);
}

// ============================================================================
// Work units
// ============================================================================

#[tokio::test]
async fn test_record_work_unit_within_one_day() {
    let (repo, _temp_dir) = setup_test_db().await;
    let subject = study_subject(&repo).await;

    let units = record_test_unit(
        &repo,
        subject.id,
        UnitKind::Work,
        date(2024, 1, 8),
        time(10, 0),
        time(10, 25),
    )
    .await;

    assert_eq!(units.len(), 1);
    assert_eq!(units[0].seconds, 1500);
    assert_eq!(units[0].start_date, date(2024, 1, 8));
    assert_eq!(units[0].end_date, date(2024, 1, 8));

    let stored = repo
        .find_work_unit_by_id(units[0].id)
        .await
        .unwrap()
        .expect("Unit should be stored");
    assert_eq!(stored.start_time, time(10, 0));
    assert_eq!(stored.end_time, time(10, 25));
    assert_eq!(stored.kind, UnitKind::Work);
}

#[tokio::test]
async fn test_record_work_unit_splits_at_working_day_boundary() {
    let (repo, _temp_dir) = setup_test_db().await;
    let subject = study_subject(&repo).await;

    // Wall 04:30 to 05:30 straddles the 05:00 working-day boundary
    let units = record_test_unit(
        &repo,
        subject.id,
        UnitKind::Work,
        date(2024, 1, 9),
        time(4, 30),
        time(5, 30),
    )
    .await;

    assert_eq!(units.len(), 2);

    // first slice belongs to the previous working day
    assert_eq!(units[0].start_date, date(2024, 1, 8));
    assert_eq!(units[0].start_time, time(4, 30));
    assert_eq!(units[0].end_time, time(4, 59));
    assert_eq!(units[0].seconds, 1800);

    // second slice starts the next working day at its first wall minute
    assert_eq!(units[1].start_date, date(2024, 1, 9));
    assert_eq!(units[1].start_time, time(5, 0));
    assert_eq!(units[1].end_time, time(5, 30));
    assert_eq!(units[1].seconds, 1800);

    let total: i64 = units.iter().map(|u| u.seconds).sum();
    assert_eq!(total, 3600);
}

#[tokio::test]
async fn test_record_work_unit_rejects_backwards_span() {
    let (repo, _temp_dir) = setup_test_db().await;
    let subject = study_subject(&repo).await;
    let subject_type = lecture_type(&repo).await;

    let result = repo
        .record_work_unit(NewWorkUnitData {
            type_id: subject_type.id,
            subject_id: subject.id,
            schedule_entry_id: None,
            kind: UnitKind::Work,
            day_start: 5,
            start_time: time(12, 0),
            start_date: date(2024, 1, 8),
            end_time: time(11, 0),
            end_date: date(2024, 1, 8),
            state: UnitState::Closed,
            note: None,
        })
        .await;

    assert!(matches!(result.unwrap_err(), CoreError::InvalidInput(_)));
}

#[tokio::test]
async fn test_update_work_unit_recomputes_duration() {
    let (repo, _temp_dir) = setup_test_db().await;
    let subject = study_subject(&repo).await;
    let units = record_test_unit(
        &repo,
        subject.id,
        UnitKind::Work,
        date(2024, 1, 8),
        time(10, 0),
        time(10, 25),
    )
    .await;

    let updated = repo
        .update_work_unit(
            units[0].id,
            UpdateWorkUnitData {
                end_time: Some(time(10, 50)),
                state: Some(UnitState::Running),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.seconds, 3000);
    assert_eq!(updated.state, UnitState::Running);

    let stored = repo.find_work_unit_by_id(units[0].id).await.unwrap().unwrap();
    assert_eq!(stored.seconds, 3000);
    assert_eq!(stored.end_time, time(10, 50));
}

#[tokio::test]
async fn test_find_work_unit_for_entry() {
    let (repo, _temp_dir) = setup_test_db().await;
    let (_series, entries) = create_monday_series(&repo, date(2024, 1, 1), date(2024, 1, 31)).await;
    let subject = study_subject(&repo).await;
    let subject_type = lecture_type(&repo).await;

    let units = repo
        .record_work_unit(NewWorkUnitData {
            type_id: subject_type.id,
            subject_id: subject.id,
            schedule_entry_id: Some(entries[0].id),
            kind: UnitKind::School,
            day_start: 5,
            start_time: time(10, 15),
            start_date: date(2024, 1, 1),
            end_time: time(11, 45),
            end_date: date(2024, 1, 1),
            state: UnitState::Closed,
            note: None,
        })
        .await
        .unwrap();

    let found = repo
        .find_work_unit_for_entry(entries[0].id)
        .await
        .unwrap()
        .expect("Unit should be linked to the entry");
    assert_eq!(found.id, units[0].id);
    assert_eq!(found.kind, UnitKind::School);

    assert!(repo
        .find_work_unit_for_entry(entries[1].id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_work_units_in_range_and_delete() {
    let (repo, _temp_dir) = setup_test_db().await;
    let subject = study_subject(&repo).await;

    record_test_unit(&repo, subject.id, UnitKind::Work, date(2024, 1, 8), time(9, 0), time(10, 0))
        .await;
    record_test_unit(&repo, subject.id, UnitKind::Work, date(2024, 1, 10), time(9, 0), time(10, 0))
        .await;
    let out_of_window =
        record_test_unit(&repo, subject.id, UnitKind::Work, date(2024, 2, 1), time(9, 0), time(10, 0))
            .await;

    let window = repo
        .find_work_units_in_range(date(2024, 1, 1), date(2024, 1, 31))
        .await
        .unwrap();
    assert_eq!(window.len(), 2);
    assert!(window.iter().all(|u| u.start_date < date(2024, 2, 1)));

    repo.delete_work_unit(out_of_window[0].id).await.unwrap();
    let result = repo.delete_work_unit(out_of_window[0].id).await;
    assert!(matches!(result.unwrap_err(), CoreError::NotFound(_)));
}

// ============================================================================
// Summaries
// ============================================================================

#[tokio::test]
async fn test_summaries_pick_only_the_requested_slice() {
    let (repo, _temp_dir) = setup_test_db().await;
    let subject = study_subject(&repo).await;
    let other = repo
        .add_subject(NewSubjectData {
            name: "Physics".to_string(),
            note: None,
            color: "200,30,30,255".to_string(),
            start_date: date(2024, 1, 1),
            end_date: date(2024, 12, 31),
            kind: SubjectKind::Regular,
        })
        .await
        .unwrap();

    record_test_unit(&repo, subject.id, UnitKind::Work, date(2024, 1, 8), time(9, 0), time(9, 25))
        .await;
    record_test_unit(&repo, subject.id, UnitKind::Break, date(2024, 1, 8), time(9, 25), time(9, 30))
        .await;
    record_test_unit(&repo, other.id, UnitKind::Work, date(2024, 1, 8), time(10, 0), time(10, 10))
        .await;
    record_test_unit(&repo, subject.id, UnitKind::Work, date(2024, 1, 9), time(9, 0), time(9, 30))
        .await;

    assert_eq!(
        repo.total_seconds_for_day(date(2024, 1, 8), UnitKind::Work)
            .await
            .unwrap(),
        1500 + 600
    );
    assert_eq!(
        repo.total_seconds_for_day(date(2024, 1, 8), UnitKind::Break)
            .await
            .unwrap(),
        300
    );
    assert_eq!(
        repo.total_seconds_for_subject_and_day(date(2024, 1, 8), subject.id, UnitKind::Work)
            .await
            .unwrap(),
        1500
    );
    assert_eq!(
        repo.total_seconds_for_subject_and_day(date(2024, 1, 8), other.id, UnitKind::Work)
            .await
            .unwrap(),
        600
    );

    // a day with nothing recorded sums to zero
    assert_eq!(
        repo.total_seconds_for_day(date(2024, 1, 10), UnitKind::Work)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_day_summary_combines_planned_and_recorded() {
    let (repo, _temp_dir) = setup_test_db().await;
    let subject = study_subject(&repo).await;
    // plans one entry on Monday 2024-01-08, 90 minutes
    create_monday_series(&repo, date(2024, 1, 8), date(2024, 1, 8)).await;

    record_test_unit(&repo, subject.id, UnitKind::Work, date(2024, 1, 8), time(10, 0), time(10, 25))
        .await;
    record_test_unit(&repo, subject.id, UnitKind::Break, date(2024, 1, 8), time(10, 25), time(10, 30))
        .await;

    let summary = repo.day_summary(date(2024, 1, 8)).await.unwrap();
    assert_eq!(summary.date, date(2024, 1, 8));
    assert_eq!(summary.planned_seconds, 90 * 60);
    assert_eq!(summary.work_seconds, 1500);
    assert_eq!(summary.break_seconds, 300);
    assert_eq!(summary.coffee_seconds, 0);

    let empty = repo.day_summary(date(2024, 1, 9)).await.unwrap();
    assert_eq!(empty.planned_seconds, 0);
    assert_eq!(empty.work_seconds, 0);
}

#[tokio::test]
async fn test_planned_seconds_filter_by_subject() {
    let (repo, _temp_dir) = setup_test_db().await;
    let subject = study_subject(&repo).await;
    create_monday_series(&repo, date(2024, 1, 8), date(2024, 1, 8)).await;

    assert_eq!(
        repo.planned_seconds_for_subject_and_day(date(2024, 1, 8), subject.id)
            .await
            .unwrap(),
        90 * 60
    );
    assert_eq!(
        repo.planned_seconds_for_subject_and_day(date(2024, 1, 8), Uuid::now_v7())
            .await
            .unwrap(),
        0
    );
}

// ============================================================================
// Settings
// ============================================================================

#[tokio::test]
async fn test_settings_upsert_and_scoping() {
    let (repo, _temp_dir) = setup_test_db().await;

    let first = repo
        .put_setting("sound", 0, "on", Some("Bell at round end".to_string()))
        .await
        .unwrap();
    assert_eq!(first.value, "on");

    // same name and scope overwrites in place
    let second = repo.put_setting("sound", 0, "off", None).await.unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.value, "off");

    // same name in another scope is a separate setting
    let scoped = repo.put_setting("sound", 7, "on", None).await.unwrap();
    assert_ne!(scoped.id, first.id);

    let fetched = repo.get_setting("sound", 0).await.unwrap().unwrap();
    assert_eq!(fetched.value, "off");
    assert!(repo.get_setting("sound", 99).await.unwrap().is_none());

    let all = repo.list_settings().await.unwrap();
    assert_eq!(all.len(), 2);

    repo.delete_setting("sound", 7).await.unwrap();
    let result = repo.delete_setting("sound", 7).await;
    assert!(matches!(result.unwrap_err(), CoreError::NotFound(_)));
}

// ============================================================================
// Subject catalog
// ============================================================================

#[tokio::test]
async fn test_seeded_catalog_is_present_and_stable() {
    let (repo, _temp_dir) = setup_test_db().await;

    let types = repo.find_subject_types().await.unwrap();
    let names: Vec<&str> = types.iter().map(|t| t.name.as_str()).collect();
    for expected in ["V", "U", "C", "F"] {
        assert!(names.contains(&expected), "missing default type {}", expected);
    }

    let study = study_subject(&repo).await;
    assert_eq!(study.kind, SubjectKind::Study);
    assert!(study.active);
    assert_eq!(study.color, "64,224,208,150");

    // seeding again changes nothing
    repo.seed_defaults().await.unwrap();
    assert_eq!(repo.find_subject_types().await.unwrap().len(), types.len());
    assert_eq!(repo.find_subjects(false).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_archive_subject_hides_it_from_active_listing() {
    let (repo, _temp_dir) = setup_test_db().await;
    let physics = repo
        .add_subject(NewSubjectData {
            name: "Physics".to_string(),
            note: None,
            color: "200,30,30,255".to_string(),
            start_date: date(2024, 1, 1),
            end_date: date(2024, 12, 31),
            kind: SubjectKind::Regular,
        })
        .await
        .unwrap();

    let archived = repo.archive_subject(physics.id).await.unwrap();
    assert!(!archived.active);

    let active = repo.find_subjects(true).await.unwrap();
    assert!(active.iter().all(|s| s.id != physics.id));
    let all = repo.find_subjects(false).await.unwrap();
    assert!(all.iter().any(|s| s.id == physics.id));
}

#[tokio::test]
async fn test_delete_subject_refused_while_referenced() {
    let (repo, _temp_dir) = setup_test_db().await;
    let subject = study_subject(&repo).await;
    let (series, _) = create_monday_series(&repo, date(2024, 1, 1), date(2024, 1, 31)).await;

    let result = repo.delete_subject(subject.id).await;
    assert!(matches!(result.unwrap_err(), CoreError::InvalidInput(_)));

    // dropping the referencing series clears the way
    repo.delete_series(series.id).await.unwrap();
    repo.delete_subject(subject.id).await.unwrap();
    assert!(repo.find_subject_by_id(subject.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_subject_merges_fields() {
    let (repo, _temp_dir) = setup_test_db().await;
    let physics = repo
        .add_subject(NewSubjectData {
            name: "Physics".to_string(),
            note: None,
            color: "200,30,30,255".to_string(),
            start_date: date(2024, 1, 1),
            end_date: date(2024, 12, 31),
            kind: SubjectKind::Regular,
        })
        .await
        .unwrap();

    let updated = repo
        .update_subject(
            physics.id,
            UpdateSubjectData {
                name: Some("Physics II".to_string()),
                note: Some(Some("Electrodynamics".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Physics II");
    assert_eq!(updated.note.as_deref(), Some("Electrodynamics"));
    assert_eq!(updated.color, physics.color);

    let result = repo
        .update_subject(
            physics.id,
            UpdateSubjectData {
                start_date: Some(date(2025, 1, 1)),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(
        result.unwrap_err(),
        CoreError::InvalidDateRange { .. }
    ));
}

// ============================================================================
// Migrations
// ============================================================================

#[tokio::test]
async fn test_migrations_survive_reconnecting() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");
    let path = db_path.to_string_lossy();

    let pool = establish_connection(&path).await.unwrap();
    drop(pool);

    // a second startup replays nothing and still reports the latest version
    let pool = establish_connection(&path).await.unwrap();
    let version: i32 = sqlx::query_scalar("SELECT MAX(version) FROM migrations")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(version, 3);

    let applied: i32 = sqlx::query_scalar("SELECT COUNT(*) FROM migrations")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(applied, 3);
}
