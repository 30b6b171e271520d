//! Date arithmetic: today's date and the day count between two dates.

use chrono::{Datelike, Local, NaiveDate};

use crate::error::{DateError, DateField};

/// Longest accepted date argument (`YYYY-MM-DD`).
pub const MAX_DATE_LEN: usize = 10;

/// Earliest accepted year (from 1900-01-01).
pub const MIN_YEAR: i32 = 1900;

/// Latest accepted year (through 2100-12-31).
pub const MAX_YEAR: i32 = 2100;

/// Source of "today".
///
/// The agent is constructed with a clock so tests can pin the date instead of
/// depending on the wall clock.
pub trait Clock {
    /// The current local calendar date.
    fn today(&self) -> NaiveDate;
}

/// Wall-clock date in the local timezone.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock that always reports the same date.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Today's date as `YYYY-MM-DD`.
#[must_use]
pub fn get_current_date(clock: &impl Clock) -> String {
    let today = clock.today().format("%Y-%m-%d").to_string();
    tracing::debug!(today = %today, "get_current_date");
    today
}

/// Whether `s` has the exact `YYYY-MM-DD` shape (digits and two dashes).
///
/// This is a lexical check only; `2023-02-30` has the shape but is not a date.
#[must_use]
pub fn has_iso_shape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == MAX_DATE_LEN
        && bytes.iter().enumerate().all(|(i, b)| {
            if i == 4 || i == 7 {
                *b == b'-'
            } else {
                b.is_ascii_digit()
            }
        })
}

/// Number of days from `start_date` to `end_date`.
///
/// Both arguments must be `YYYY-MM-DD` dates within 1900-01-01..=2100-12-31
/// and `start_date` must not be after `end_date`.
///
/// # Errors
/// Returns a [`DateError`] naming the first offending argument. Length is
/// checked for both arguments before either is parsed.
pub fn calculate_days_between(start_date: &str, end_date: &str) -> Result<u64, DateError> {
    check_len(start_date, DateField::Start)?;
    check_len(end_date, DateField::End)?;

    tracing::debug!(
        start_len = start_date.len(),
        end_len = end_date.len(),
        "calculate_days_between"
    );

    let start = parse(start_date, DateField::Start)?;
    let end = parse(end_date, DateField::End)?;
    check_range(start, DateField::Start)?;
    check_range(end, DateField::End)?;

    if start > end {
        return Err(DateError::StartAfterEnd);
    }

    let days = (end - start).num_days().unsigned_abs();
    tracing::debug!(days, "calculate_days_between result");
    Ok(days)
}

const fn check_len(value: &str, field: DateField) -> Result<(), DateError> {
    if value.len() > MAX_DATE_LEN {
        return Err(DateError::TooLong {
            field,
            max: MAX_DATE_LEN,
        });
    }
    Ok(())
}

fn parse(value: &str, field: DateField) -> Result<NaiveDate, DateError> {
    // chrono accepts single-digit months and days; the shape check does not.
    if !has_iso_shape(value) {
        return Err(DateError::NotIsoDate { field });
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| DateError::NotIsoDate { field })
}

fn check_range(date: NaiveDate, field: DateField) -> Result<(), DateError> {
    if (MIN_YEAR..=MAX_YEAR).contains(&date.year()) {
        Ok(())
    } else {
        Err(DateError::OutOfRange { field })
    }
}
