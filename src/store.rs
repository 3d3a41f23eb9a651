//! Hot-reloadable calendar store.
//!
//! Wraps a [`HolidayCalendar`] in an `ArcSwap` so a freshly published artifact
//! pair can replace the live one without blocking readers. A reload that fails
//! validation leaves the current calendar in place.

use arc_swap::ArcSwap;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::calendar::HolidayCalendar;
use crate::config::{DEFAULT_ARTIFACT_NAME, DEFAULT_INDEX_NAME};
use crate::Result;

/// Shared, swappable calendar.
///
/// # Example
///
/// ```ignore
/// use holidaybits::CalendarStore;
/// use std::path::Path;
///
/// let store = CalendarStore::open_dir(Path::new("data"))?;
/// let open = store.is_business_day("GB", None, date)?;
///
/// // After a new build has been published into data/
/// store.reload()?;
/// ```
pub struct CalendarStore {
    inner: ArcSwap<HolidayCalendar>,
    dir: PathBuf,
    artifact_name: String,
    index_name: String,
    generation: AtomicU64,
}

impl CalendarStore {
    /// Load `holidays.bin` and `holidays.yaml` from `dir`.
    pub fn open_dir(dir: &Path) -> Result<Self> {
        Self::open_named(dir, DEFAULT_ARTIFACT_NAME, DEFAULT_INDEX_NAME)
    }

    /// Load a pair published under custom file names; reloads use the same names.
    pub fn open_named(dir: &Path, artifact_name: &str, index_name: &str) -> Result<Self> {
        let calendar = HolidayCalendar::open_named(dir, artifact_name, index_name)?;
        log::info!("Loaded calendar from {:?}", dir);
        Ok(Self {
            inner: ArcSwap::from_pointee(calendar),
            dir: dir.to_path_buf(),
            artifact_name: artifact_name.to_string(),
            index_name: index_name.to_string(),
            generation: AtomicU64::new(0),
        })
    }

    /// Re-read the pair from the store directory and swap it in.
    pub fn reload(&self) -> Result<()> {
        let dir = self.dir.clone();
        self.reload_from(&dir)
    }

    /// Load a pair with this store's file names from `dir` and swap it in.
    pub fn reload_from(&self, dir: &Path) -> Result<()> {
        let loaded = HolidayCalendar::open_named(dir, &self.artifact_name, &self.index_name);
        let calendar = match loaded {
            Ok(calendar) => calendar,
            Err(e) => {
                log::warn!("Keeping current calendar, reload from {:?} failed: {}", dir, e);
                return Err(e);
            }
        };
        self.inner.store(Arc::new(calendar));
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        log::info!("Reloaded calendar from {:?} (generation {})", dir, generation);
        Ok(())
    }

    /// Number of successful reloads.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Snapshot of the current calendar.
    pub fn current(&self) -> Arc<HolidayCalendar> {
        self.inner.load_full()
    }

    pub fn is_holiday(
        &self,
        country: &str,
        subdivision: Option<&str>,
        date: NaiveDate,
    ) -> Result<bool> {
        self.inner.load().is_holiday(country, subdivision, date)
    }

    pub fn is_business_day(
        &self,
        country: &str,
        subdivision: Option<&str>,
        date: NaiveDate,
    ) -> Result<bool> {
        self.inner.load().is_business_day(country, subdivision, date)
    }
}
