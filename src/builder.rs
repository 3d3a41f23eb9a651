//! Calendar matrix builder.
//!
//! Evaluates one predicate per jurisdiction over the weekday range and packs the
//! result. Rows are independent, so they are split into contiguous chunks and
//! filled on scoped worker threads, each owning a disjoint slice of the matrix.
//! Any failure aborts the whole build before anything is written.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::Path;

use crate::codec::{self, ArtifactPaths, ArtifactWriter};
use crate::config::BuildConfig;
use crate::index::{IndexBuilder, JurisdictionIndex};
use crate::jurisdiction::{flatten, Jurisdiction, SupportedCountry};
use crate::matrix::CalendarMatrix;
use crate::provider::CalendarProvider;
use crate::{Error, Result};

/// A built matrix and the index describing its rows.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub matrix: CalendarMatrix,
    pub index: JurisdictionIndex,
}

impl BuildOutput {
    /// Pack the matrix and stamp its checksum into the index.
    pub fn into_artifact(self) -> (Vec<u8>, JurisdictionIndex) {
        let data = codec::pack(&self.matrix);
        let index = self.index.with_checksum(codec::checksum(&data));
        (data, index)
    }
}

/// Builds calendar matrices from a [`CalendarProvider`].
pub struct MatrixBuilder {
    config: BuildConfig,
    defaults: Option<BTreeMap<String, String>>,
}

impl MatrixBuilder {
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            defaults: None,
        }
    }

    /// Override the default-subdivision policy.
    pub fn with_defaults<I, K, V>(mut self, defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.defaults = Some(
            defaults
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Build over every country the provider supports.
    pub fn build<P>(&self, provider: &P) -> Result<BuildOutput>
    where
        P: CalendarProvider + ?Sized,
    {
        let countries = provider.supported_countries();
        self.build_countries(&countries, provider)
    }

    /// Build over `countries`, in the given order.
    pub fn build_countries<P>(
        &self,
        countries: &[SupportedCountry],
        provider: &P,
    ) -> Result<BuildOutput>
    where
        P: CalendarProvider + ?Sized,
    {
        let range = self.config.range;
        if range.is_empty() {
            return Err(Error::Build(format!(
                "no weekdays in [{}, {})",
                range.start(),
                range.end()
            )));
        }
        range.require_byte_aligned()?;

        let rows = flatten(countries);
        if rows.is_empty() {
            return Err(Error::Build("no jurisdictions to build".to_string()));
        }

        let mut index_builder = IndexBuilder::new();
        if let Some(defaults) = &self.defaults {
            index_builder = index_builder.with_defaults(defaults.clone());
        }
        for jurisdiction in &rows {
            index_builder.push(jurisdiction)?;
        }
        let index = index_builder.finish(range)?;

        let dates: Vec<NaiveDate> = range.dates().collect();
        let mut matrix = CalendarMatrix::new(rows.len(), dates.len());

        log::info!(
            "Building {} rows x {} weekdays on {} worker(s)",
            rows.len(),
            dates.len(),
            self.config.workers.clamp(1, rows.len())
        );

        self.fill(provider, &rows, &dates, &mut matrix)?;

        log::info!(
            "Built matrix: {} rows ({} padded)",
            matrix.row_count(),
            matrix.padded_row_count()
        );

        Ok(BuildOutput { matrix, index })
    }

    /// Build, pack and publish the artifact pair into `dir`.
    pub fn publish<P>(&self, provider: &P, dir: &Path) -> Result<ArtifactPaths>
    where
        P: CalendarProvider + ?Sized,
    {
        let (data, index) = self.build(provider)?.into_artifact();
        ArtifactWriter::new(dir, &self.config.artifact_name, &self.config.index_name)
            .publish(&data, &index)
    }

    fn fill<P>(
        &self,
        provider: &P,
        rows: &[Jurisdiction],
        dates: &[NaiveDate],
        matrix: &mut CalendarMatrix,
    ) -> Result<()>
    where
        P: CalendarProvider + ?Sized,
    {
        let workers = self.config.workers.clamp(1, rows.len());
        let rows_per_worker = rows.len().div_ceil(workers);
        let cells = matrix.real_cells_mut();

        std::thread::scope(|scope| {
            let handles: Vec<_> = cells
                .chunks_mut(rows_per_worker * dates.len())
                .zip(rows.chunks(rows_per_worker))
                .map(|(cells, rows)| scope.spawn(move || fill_rows(provider, rows, dates, cells)))
                .collect();

            let results: Vec<Result<()>> = handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(Error::Build("row worker panicked".to_string())))
                })
                .collect();
            results.into_iter().collect()
        })
    }
}

impl Default for MatrixBuilder {
    fn default() -> Self {
        Self::new(BuildConfig::default())
    }
}

fn fill_rows<P>(
    provider: &P,
    rows: &[Jurisdiction],
    dates: &[NaiveDate],
    cells: &mut [bool],
) -> Result<()>
where
    P: CalendarProvider + ?Sized,
{
    for (jurisdiction, row) in rows.iter().zip(cells.chunks_mut(dates.len())) {
        let predicate = provider
            .predicate(jurisdiction)
            .map_err(|e| Error::Build(format!("{}: {}", jurisdiction, e)))?;

        for (cell, date) in row.iter_mut().zip(dates) {
            *cell = predicate
                .is_holiday(*date)
                .map_err(|e| Error::Build(format!("{} on {}: {}", jurisdiction, date, e)))?;
        }

        log::debug!("Evaluated {}", jurisdiction);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::PackedReader;
    use crate::provider::HolidayPredicate;
    use crate::range::WeekdayRange;
    use chrono::Datelike;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Holidays fall on a fixed day of the month, different per row.
    struct DayOfMonthProvider {
        countries: Vec<SupportedCountry>,
        fail_on: Option<NaiveDate>,
    }

    impl DayOfMonthProvider {
        fn new() -> Self {
            Self {
                countries: vec![
                    SupportedCountry::new("AR"),
                    SupportedCountry::with_subdivisions("AU", ["ACT", "NSW", "VIC"]),
                    SupportedCountry::new("BE"),
                    SupportedCountry::with_subdivisions("CA", ["ON", "QC"]),
                    SupportedCountry::new("JP"),
                    SupportedCountry::new("NZ"),
                ],
                fail_on: None,
            }
        }

        fn day_for(jurisdiction: &Jurisdiction) -> u32 {
            let key = jurisdiction.to_string();
            key.bytes().map(u32::from).sum::<u32>() % 28 + 1
        }
    }

    impl CalendarProvider for DayOfMonthProvider {
        fn supported_countries(&self) -> Vec<SupportedCountry> {
            self.countries.clone()
        }

        fn predicate<'a>(
            &'a self,
            jurisdiction: &Jurisdiction,
        ) -> Result<Box<dyn HolidayPredicate + 'a>> {
            let day = Self::day_for(jurisdiction);
            let fail_on = self.fail_on;
            Ok(Box::new(move |date: NaiveDate| -> Result<bool> {
                if Some(date) == fail_on {
                    return Err(Error::Provider("lookup failed".to_string()));
                }
                Ok(date.day() == day)
            }))
        }
    }

    fn config(workers: usize) -> BuildConfig {
        let range = WeekdayRange::new(ymd(2024, 1, 1), ymd(2024, 3, 29)).unwrap();
        BuildConfig::with_range(range).workers(workers)
    }

    #[test]
    fn test_build_matches_predicate() {
        let provider = DayOfMonthProvider::new();
        let builder = MatrixBuilder::new(config(3));
        let output = builder.build(&provider).unwrap();

        let range = builder.config().range;
        assert_eq!(output.matrix.row_count(), 9);
        assert_eq!(range.len(), 64);
        assert_eq!(output.matrix.padded_row_count(), 16);
        assert_eq!(output.matrix.column_count(), range.len());

        for (jurisdiction, row) in output.index.jurisdictions() {
            let day = DayOfMonthProvider::day_for(&jurisdiction);
            for (column, date) in range.dates().enumerate() {
                assert_eq!(
                    output.matrix.get(row, column),
                    Some(date.day() == day),
                    "{} {}",
                    jurisdiction,
                    date
                );
            }
        }
    }

    #[test]
    fn test_worker_count_does_not_change_output() {
        let provider = DayOfMonthProvider::new();
        let single = MatrixBuilder::new(config(1)).build(&provider).unwrap();
        for workers in [2, 4, 7, 32] {
            let multi = MatrixBuilder::new(config(workers)).build(&provider).unwrap();
            assert_eq!(multi.matrix, single.matrix);
            assert_eq!(multi.index, single.index);
        }
    }

    #[test]
    fn test_row_order_follows_enumeration() {
        let provider = DayOfMonthProvider::new();
        let output = MatrixBuilder::new(config(2)).build(&provider).unwrap();
        let order: Vec<String> = output
            .index
            .jurisdictions()
            .iter()
            .map(|(j, _)| j.to_string())
            .collect();
        assert_eq!(
            order,
            vec!["AR", "AU/ACT", "AU/NSW", "AU/VIC", "BE", "CA/ON", "CA/QC", "JP", "NZ"]
        );
        assert_eq!(output.index.resolve("AU", None).unwrap(), 1);
        assert_eq!(output.index.resolve("CA", None).unwrap(), 5);
    }

    #[test]
    fn test_predicate_failure_aborts_build() {
        let mut provider = DayOfMonthProvider::new();
        provider.fail_on = Some(ymd(2024, 2, 14));
        let dir = tempfile::tempdir().unwrap();

        let result = MatrixBuilder::new(config(4)).publish(&provider, dir.path());
        assert!(matches!(result, Err(Error::Build(_))));
        // Nothing published
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unaligned_range_rejected() {
        let provider = DayOfMonthProvider::new();
        // Five weekdays
        let range = WeekdayRange::new(ymd(2024, 1, 1), ymd(2024, 1, 8)).unwrap();
        let result = MatrixBuilder::new(BuildConfig::with_range(range)).build(&provider);
        assert!(matches!(result, Err(Error::Build(_))));
    }

    #[test]
    fn test_empty_inputs_rejected() {
        let provider = DayOfMonthProvider::new();
        let builder = MatrixBuilder::new(config(1));
        assert!(matches!(
            builder.build_countries(&[], &provider),
            Err(Error::Build(_))
        ));

        let empty = WeekdayRange::new(ymd(2024, 1, 6), ymd(2024, 1, 8)).unwrap();
        assert!(matches!(
            MatrixBuilder::new(BuildConfig::with_range(empty)).build(&provider),
            Err(Error::Build(_))
        ));
    }

    #[test]
    fn test_publish_roundtrip() {
        let provider = DayOfMonthProvider::new();
        let dir = tempfile::tempdir().unwrap();
        let builder = MatrixBuilder::new(config(2));

        let paths = builder.publish(&provider, dir.path()).unwrap();
        assert_eq!(paths.artifact, dir.path().join("holidays.bin"));
        assert_eq!(paths.index, dir.path().join("holidays.yaml"));

        let index = JurisdictionIndex::load(&paths.index).unwrap();
        let data = std::fs::read(&paths.artifact).unwrap();
        index.verify_artifact(&data).unwrap();
        assert_eq!(data.len(), 16 * index.layout().row_bytes());

        let reader = PackedReader::open(&paths.artifact, index.layout()).unwrap();
        let row = index.resolve("JP", None).unwrap();
        let day = DayOfMonthProvider::day_for(&Jurisdiction::country("JP"));
        for (column, date) in index.range().dates().enumerate() {
            assert_eq!(reader.get(row, column).unwrap(), date.day() == day);
        }
    }

    #[test]
    fn test_custom_defaults() {
        let provider = DayOfMonthProvider::new();
        let output = MatrixBuilder::new(config(1))
            .with_defaults([("AU", "VIC")])
            .build(&provider)
            .unwrap();
        assert_eq!(output.index.resolve("AU", None).unwrap(), 3);
        assert!(output.index.resolve("CA", None).is_err());
    }
}
