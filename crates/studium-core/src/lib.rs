//! # Studium Core Library
//!
//! A study-planner library built around weekly schedule series, recorded
//! work units and planned-vs-actual summaries, persisted in SQLite.
//!
//! ## Features
//!
//! - **Weekly Series Expansion**: A series is expanded into one concrete
//!   entry per week between its bounds; moving a bound reconciles the
//!   entries per boundary instead of regenerating everything
//! - **Working-Day Clock**: Days run from a configurable start hour (05:00
//!   by default), so a session ending at 01:30 still counts to the evening
//!   it belongs to
//! - **Detach and Dissolve**: Single entries can be cut loose into their own
//!   one-day series, or a whole series exploded into independent days
//! - **Worked-Time Tracking**: Recorded units are split at working-day
//!   boundaries and summed into per-day, per-subject summaries
//! - **Session Clock**: Pure countdown/count-up state for Pomodoro-style
//!   rounds, driven by the caller's tick cadence
//! - **Transactional Storage**: Every multi-row operation commits or rolls
//!   back as one unit
//!
//! ## Core Modules
//!
//! - [`db`]: Database connection and migration management
//! - [`models`]: Core data structures and transfer objects
//! - [`repository`]: Data access layer with Repository pattern
//! - [`expansion`]: Weekly series expansion and reconciliation planning
//! - [`codec`]: Integer date/time codecs and the working-day clock
//! - [`timer`]: In-memory session clock
//! - [`config`]: Layered deploy-time configuration
//! - [`error`]: Error types shared across the crate
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use chrono::{NaiveDate, NaiveTime};
//! use studium_core::{
//!     db,
//!     models::{EntryTemplate, NewSeriesData},
//!     repository::{SeriesRepository, SqliteRepository, SubjectRepository},
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Initialize database
//!     let pool = db::establish_connection("studium.db").await?;
//!     let repo = SqliteRepository::new(pool);
//!     repo.seed_defaults().await?;
//!
//!     let lecture = repo
//!         .find_subject_type_by_name("V")
//!         .await?
//!         .expect("default catalog is seeded");
//!     let study = repo
//!         .find_subject_by_name("Study")
//!         .await?
//!         .expect("default catalog is seeded");
//!
//!     // Every Monday morning through January
//!     let (series, entries) = repo
//!         .create_series(NewSeriesData {
//!             type_id: lecture.id,
//!             subject_id: study.id,
//!             start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!             end_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
//!             note: Some("Linear algebra".to_string()),
//!             template: EntryTemplate {
//!                 at_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!                 day_start: 5,
//!                 start_time: NaiveTime::from_hms_opt(10, 15, 0).unwrap(),
//!                 end_time: NaiveTime::from_hms_opt(11, 45, 0).unwrap(),
//!                 note: None,
//!             },
//!         })
//!         .await?;
//!     println!("Expanded {} into {} entries", series.id, entries.len());
//!
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod db;
pub mod error;
pub mod expansion;
pub mod models;
pub mod repository;
pub mod timer;
