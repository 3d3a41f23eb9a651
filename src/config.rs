//! Build configuration.

use crate::range::WeekdayRange;

/// Default artifact file name.
pub const DEFAULT_ARTIFACT_NAME: &str = "holidays.bin";

/// Default index file name.
pub const DEFAULT_INDEX_NAME: &str = "holidays.yaml";

/// Configuration for a calendar build.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Column axis of the matrix.
    pub range: WeekdayRange,
    /// Worker threads evaluating rows.
    pub workers: usize,
    /// Artifact file name inside the output directory.
    pub artifact_name: String,
    /// Index file name inside the output directory.
    pub index_name: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            range: WeekdayRange::default(),
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            artifact_name: DEFAULT_ARTIFACT_NAME.to_string(),
            index_name: DEFAULT_INDEX_NAME.to_string(),
        }
    }
}

impl BuildConfig {
    /// Default configuration over a custom range.
    pub fn with_range(range: WeekdayRange) -> Self {
        Self {
            range,
            ..Self::default()
        }
    }

    /// Set the worker count (at least one).
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the output file names.
    pub fn file_names(mut self, artifact: &str, index: &str) -> Self {
        self.artifact_name = artifact.to_string();
        self.index_name = index.to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BuildConfig::default();
        assert_eq!(config.range, WeekdayRange::default());
        assert!(config.workers >= 1);
        assert_eq!(config.artifact_name, "holidays.bin");
        assert_eq!(config.index_name, "holidays.yaml");
    }

    #[test]
    fn test_workers_floor() {
        assert_eq!(BuildConfig::default().workers(0).workers, 1);
        assert_eq!(BuildConfig::default().workers(4).workers, 4);
    }
}
