//! holidaybits - bit-packed weekday holiday calendars.
//!
//! This crate compresses, for every supported jurisdiction, a multi-decade
//! Monday–Friday holiday calendar into one dense binary artifact plus a small
//! YAML index mapping jurisdiction names to rows. Queries resolve a
//! jurisdiction to a row, compute a bit offset and read one byte.
//!
//! # Features
//!
//! - **Provider-agnostic build**: any [`CalendarProvider`] supplying an
//!   `is_holiday(date)` predicate per jurisdiction
//! - **Parallel, all-or-nothing build**: rows are filled on worker threads;
//!   a single predicate failure aborts the build before anything is written
//! - **Bit-packed layout**: row-major, 8 weekdays per byte, LSB first,
//!   row count padded to a multiple of 8
//! - **O(1) queries**: memory-mapped artifact, no decoding up front
//! - **Default subdivisions**: `AU` resolves to `AU/ACT`, `GB` to `GB/UK`, ...
//! - **Hot reload**: [`CalendarStore`] swaps in a newly published pair atomically
//!
//! # Quick Start
//!
//! ```ignore
//! use holidaybits::{BuildConfig, DateListProvider, HolidayCalendar, MatrixBuilder};
//! use chrono::NaiveDate;
//! use std::path::Path;
//!
//! // Build holidays.bin + holidays.yaml from a list of holiday dates
//! let provider = DateListProvider::load("holidays_source.yaml")?;
//! MatrixBuilder::new(BuildConfig::default()).publish(&provider, Path::new("data"))?;
//!
//! // Query
//! let calendar = HolidayCalendar::open_dir(Path::new("data"))?;
//! let date = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
//! assert!(calendar.is_holiday("GB", None, date)?);
//! ```
//!
//! # Artifact Pair
//!
//! - `holidays.bin`: headerless packed matrix, `padded_row_count * ceil(weekdays / 8)` bytes
//! - `holidays.yaml`: jurisdiction -> row (or subdivision -> row), plus a
//!   `Metadata` block with the padded row count, default subdivisions, the date
//!   range and the artifact checksum
//!
//! The weekday count is never stored in the artifact; both sides recompute it
//! from the date range.

mod error;

pub mod builder;
pub mod calendar;
pub mod codec;
pub mod config;
pub mod index;
pub mod jurisdiction;
pub mod matrix;
pub mod provider;
pub mod range;
pub mod store;

mod yaml;

// Re-export core types
pub use error::{Error, Result};
pub use jurisdiction::{Jurisdiction, SupportedCountry};
pub use range::WeekdayRange;

// Re-export build types
pub use builder::{BuildOutput, MatrixBuilder};
pub use config::BuildConfig;
pub use matrix::CalendarMatrix;
pub use provider::{CalendarProvider, DateListProvider, HolidayPredicate};

// Re-export codec and index types
pub use codec::{ArtifactPaths, ArtifactWriter, Layout, PackedReader};
pub use index::{IndexBuilder, IndexEntry, IndexMetadata, JurisdictionIndex, DEFAULT_SUBDIVISIONS};

// Re-export query types
pub use calendar::HolidayCalendar;
pub use store::CalendarStore;
