//! Error types for holidaybits.

use chrono::NaiveDate;
use thiserror::Error;

/// Error type for holidaybits operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Build aborted; nothing was written
    #[error("build failed: {0}")]
    Build(String),

    /// Index metadata disagrees with the artifact it ships with
    #[error("dimension mismatch in {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Row or column outside the matrix
    #[error("{axis} {index} out of range (limit {limit})")]
    OutOfRange {
        axis: &'static str,
        index: usize,
        limit: usize,
    },

    /// Date not covered by the weekday range (weekend or outside [start, end))
    #[error("date {0} is not a weekday inside the calendar range")]
    DateOutOfRange(NaiveDate),

    /// Unknown jurisdiction, subdivision or default
    #[error("not found: {0}")]
    NotFound(String),

    /// Artifact bytes do not hash to the checksum recorded in the index
    #[error("checksum mismatch")]
    ChecksumMismatch,

    /// Holiday provider failure
    #[error("provider error: {0}")]
    Provider(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error belongs to the out-of-range family.
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Error::OutOfRange { .. } | Error::DateOutOfRange(_))
    }
}

/// Result type alias for holidaybits operations.
pub type Result<T> = std::result::Result<T, Error>;
