use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Date {date} is outside the series range {start}..={end}")]
    DateOutsideSeries {
        date: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("Stored value {0} is not a valid calendar date")]
    InvalidDateCode(i64),

    #[error("Stored value {0} is not a valid time of day")]
    InvalidTimeCode(i64),

    #[error("Stored value {0} is not a valid day-start hour")]
    InvalidDayStart(i64),

    #[error("Series {0} has no entries left to use as a template")]
    EmptySeries(Uuid),
}
