//! Query-side calendar: a packed artifact paired with its index.

use chrono::NaiveDate;
use std::path::Path;

use crate::codec::PackedReader;
use crate::config::{DEFAULT_ARTIFACT_NAME, DEFAULT_INDEX_NAME};
use crate::index::JurisdictionIndex;
use crate::range::{is_weekday, WeekdayRange};
use crate::{Error, Result};

/// Answers "is date D a holiday in jurisdiction J" in constant time.
///
/// Dimensions and checksum are validated when the pair is loaded, so a
/// mismatched artifact never reaches a query. Read-only after construction
/// and safe to share across threads.
///
/// # Example
///
/// ```ignore
/// use holidaybits::HolidayCalendar;
/// use chrono::NaiveDate;
/// use std::path::Path;
///
/// let calendar = HolidayCalendar::open_dir(Path::new("data"))?;
/// let date = NaiveDate::from_ymd_opt(2024, 1, 26).unwrap();
/// if calendar.is_holiday("AU", Some("NSW"), date)? {
///     println!("Australia Day");
/// }
/// ```
pub struct HolidayCalendar {
    index: JurisdictionIndex,
    reader: PackedReader,
}

impl HolidayCalendar {
    /// Open an artifact and its index, memory-mapping the artifact.
    pub fn open(artifact: &Path, index: &Path) -> Result<Self> {
        let index = JurisdictionIndex::load(index)?;
        let reader = PackedReader::open(artifact, index.layout())?;
        Self::from_parts(index, reader)
    }

    /// Open `holidays.bin` and `holidays.yaml` inside `dir`.
    pub fn open_dir(dir: &Path) -> Result<Self> {
        Self::open_named(dir, DEFAULT_ARTIFACT_NAME, DEFAULT_INDEX_NAME)
    }

    /// Open a pair published under custom file names inside `dir`.
    pub fn open_named(dir: &Path, artifact_name: &str, index_name: &str) -> Result<Self> {
        Self::open(&dir.join(artifact_name), &dir.join(index_name))
    }

    /// Build from artifact bytes already in memory.
    pub fn from_bytes(data: Vec<u8>, index: JurisdictionIndex) -> Result<Self> {
        let reader = PackedReader::from_bytes(data, index.layout())?;
        Self::from_parts(index, reader)
    }

    fn from_parts(index: JurisdictionIndex, reader: PackedReader) -> Result<Self> {
        index.verify_artifact(reader.as_bytes())?;
        log::debug!(
            "Loaded calendar: {} jurisdictions, {} weekdays [{}, {})",
            index.row_count(),
            index.metadata().column_count,
            index.range().start(),
            index.range().end()
        );
        Ok(Self { index, reader })
    }

    pub fn index(&self) -> &JurisdictionIndex {
        &self.index
    }

    pub fn range(&self) -> WeekdayRange {
        self.index.range()
    }

    fn column(&self, date: NaiveDate) -> Result<usize> {
        self.range()
            .position(date)
            .ok_or(Error::DateOutOfRange(date))
    }

    /// Whether `date` is a holiday.
    ///
    /// Weekends are not stored; asking about one is `DateOutOfRange`, as is
    /// any date outside the calendar range.
    pub fn is_holiday(
        &self,
        country: &str,
        subdivision: Option<&str>,
        date: NaiveDate,
    ) -> Result<bool> {
        let row = self.index.resolve(country, subdivision)?;
        let column = self.column(date)?;
        self.reader.get(row, column)
    }

    /// Whether `date` is a working day: a weekday that is not a holiday.
    pub fn is_business_day(
        &self,
        country: &str,
        subdivision: Option<&str>,
        date: NaiveDate,
    ) -> Result<bool> {
        let row = self.index.resolve(country, subdivision)?;
        let range = self.range();
        if date < range.start() || date >= range.end() {
            return Err(Error::DateOutOfRange(date));
        }
        if !is_weekday(date) {
            return Ok(false);
        }
        Ok(!self.reader.get(row, self.column(date)?)?)
    }

    /// Holiday dates in `[from, to)`, clamped to the calendar range.
    pub fn holidays_in(
        &self,
        country: &str,
        subdivision: Option<&str>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        let row = self.index.resolve(country, subdivision)?;
        let range = self.range();
        let span = range.column_span(from, to);
        let first = span.start;

        let mut dates = Vec::new();
        for (offset, holiday) in self.reader.row_range(row, span)?.enumerate() {
            if holiday {
                let column = first + offset;
                dates.push(range.date_at(column).ok_or(Error::OutOfRange {
                    axis: "column",
                    index: column,
                    limit: range.len(),
                })?);
            }
        }
        Ok(dates)
    }
}
