//! Integer codecs for the storage representation of dates and times.
//!
//! Dates are persisted as `YYYYMMDD` (2019-10-01 becomes `20191001`) and
//! times of day as `HHMM` (14:12 becomes `1412`); seconds are not
//! represented. Decoding rejects integers that do not name a real calendar
//! date or minute of day, so storage corruption surfaces as an error instead
//! of a silently clamped value.
//!
//! The module also implements the working-day clock: a working day starts at
//! a configurable hour (5 by default, so it runs 05:00 to 04:59 wall clock)
//! and stored times are expressed relative to that start. [`to_day_clock`]
//! and [`to_wall_clock`] convert between the two, wrapping around midnight.

use chrono::{NaiveDate, NaiveTime, TimeDelta};

use crate::error::CoreError;

/// Encodes a calendar date as a `YYYYMMDD` integer.
pub fn encode_date(date: NaiveDate) -> i64 {
    use chrono::Datelike;
    date.year() as i64 * 10_000 + date.month() as i64 * 100 + date.day() as i64
}

/// Decodes a `YYYYMMDD` integer back into a calendar date.
pub fn decode_date(code: i64) -> Result<NaiveDate, CoreError> {
    let year = code / 10_000;
    let month = (code % 10_000) / 100;
    let day = code % 100;

    if year < 1 || !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(CoreError::InvalidDateCode(code));
    }

    NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
        .ok_or(CoreError::InvalidDateCode(code))
}

/// Encodes a time of day as an `HHMM` integer, discarding seconds.
pub fn encode_time(time: NaiveTime) -> i64 {
    use chrono::Timelike;
    time.hour() as i64 * 100 + time.minute() as i64
}

/// Decodes an `HHMM` integer back into a time of day.
pub fn decode_time(code: i64) -> Result<NaiveTime, CoreError> {
    let hour = code / 100;
    let minute = code % 100;

    if !(0..24).contains(&hour) || !(0..60).contains(&minute) {
        return Err(CoreError::InvalidTimeCode(code));
    }

    NaiveTime::from_hms_opt(hour as u32, minute as u32, 0).ok_or(CoreError::InvalidTimeCode(code))
}

/// Shifts a wall-clock time onto the working-day clock, wrapping past
/// midnight. With `day_start = 5`, wall 05:00 maps to 00:00 and wall 04:59
/// maps to 23:59 of the previous working day.
pub fn to_day_clock(time: NaiveTime, day_start: u8) -> NaiveTime {
    time - TimeDelta::hours(i64::from(day_start))
}

/// Inverse of [`to_day_clock`]: shifts a working-day-clock time back to the
/// wall clock.
pub fn to_wall_clock(time: NaiveTime, day_start: u8) -> NaiveTime {
    time + TimeDelta::hours(i64::from(day_start))
}
