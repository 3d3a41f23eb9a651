//! Weekday calendar range.
//!
//! The column axis of the matrix. Both the builder and every reader recompute
//! it from `[start, end)` alone; it is never stored in the artifact.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use std::ops::Range;

use crate::{Error, Result};

/// Number of columns packed into one byte.
pub const COLUMN_GROUP: usize = 8;

/// Ascending Monday–Friday dates in `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekdayRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl WeekdayRange {
    /// Create a range. `start` must not be after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::Config(format!(
                "range start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// First calendar date (inclusive).
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last calendar date (exclusive).
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of weekdays in the range.
    pub fn len(&self) -> usize {
        weekdays_before(self.start, self.end)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the weekdays in ascending order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start
            .iter_days()
            .take_while(move |d| *d < self.end)
            .filter(|d| is_weekday(*d))
    }

    /// Column of `date`, or `None` for weekends and dates outside the range.
    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        if date < self.start || date >= self.end || !is_weekday(date) {
            return None;
        }
        Some(weekdays_before(self.start, date))
    }

    /// Date stored at `column`, or `None` past the end.
    pub fn date_at(&self, column: usize) -> Option<NaiveDate> {
        if column >= self.len() {
            return None;
        }

        // Skip to the first weekday, then walk whole weeks and the remainder.
        let mut first = self.start;
        while !is_weekday(first) {
            first = first.succ_opt()?;
        }
        let offset_in_week = first.weekday().num_days_from_monday() as usize;
        let total = offset_in_week + column;
        let days = (total / 5) * 7 + total % 5 - offset_in_week;
        first.checked_add_days(Days::new(days as u64))
    }

    /// Columns of the weekdays in `[from, to)`, clamped to the range.
    pub fn column_span(&self, from: NaiveDate, to: NaiveDate) -> Range<usize> {
        let from = from.clamp(self.start, self.end);
        let to = to.clamp(from, self.end);
        weekdays_before(self.start, from)..weekdays_before(self.start, to)
    }

    /// Reject ranges whose weekday count is not a whole number of bytes.
    ///
    /// Trailing dates are never dropped to make the count fit.
    pub fn require_byte_aligned(&self) -> Result<()> {
        let len = self.len();
        if len % COLUMN_GROUP != 0 {
            return Err(Error::Build(format!(
                "weekday count {} for [{}, {}) is not divisible by {}",
                len, self.start, self.end, COLUMN_GROUP
            )));
        }
        Ok(())
    }
}

impl Default for WeekdayRange {
    /// 1970-01-01 to 2050-01-01, 20 872 weekdays.
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN),
            end: NaiveDate::from_ymd_opt(2050, 1, 1).unwrap_or(NaiveDate::MIN),
        }
    }
}

/// Monday through Friday.
pub fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Count weekdays in `[from, to)` in constant time.
fn weekdays_before(from: NaiveDate, to: NaiveDate) -> usize {
    if to <= from {
        return 0;
    }
    let days = (to - from).num_days() as usize;
    let full_weeks = days / 7;
    let mut count = full_weeks * 5;

    let mut weekday = from.weekday().num_days_from_monday();
    for _ in 0..days % 7 {
        if weekday < 5 {
            count += 1;
        }
        weekday = (weekday + 1) % 7;
    }
    count
}
