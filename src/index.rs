//! Jurisdiction index: jurisdiction names to matrix rows.
//!
//! Serialized as YAML next to the artifact:
//!
//! ```yaml
//! AR: 0
//! AU:
//!   ACT: 1
//!   NSW: 2
//! Metadata:
//!   padded_row_count: 8
//!   defaults:
//!     AU: ACT
//!   start: 1970-01-01
//!   end: 2050-01-01
//!   column_count: 20872
//!   checksum: 9f86d0...
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use crate::codec::{self, padded_row_count, Layout};
use crate::jurisdiction::Jurisdiction;
use crate::range::WeekdayRange;
use crate::yaml;
use crate::{Error, Result};

/// Reserved top-level key holding [`IndexMetadata`].
pub const METADATA_KEY: &str = "Metadata";

/// Subdivision used when a caller names only the country.
pub const DEFAULT_SUBDIVISIONS: &[(&str, &str)] = &[
    ("AU", "ACT"),
    ("AT", "9"),
    ("CA", "ON"),
    ("FR", "Métropole"),
    ("NI", "MN"),
    ("GB", "UK"),
];

/// Row assignment for one country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum IndexEntry {
    /// Country without subdivisions
    Row(usize),
    /// One row per subdivision
    Subdivisions(BTreeMap<String, usize>),
}

impl IndexEntry {
    fn from_value(value: Value, country: &str) -> Result<Self> {
        match value {
            Value::Mapping(subs) => Ok(IndexEntry::Subdivisions(yaml::string_keyed(subs, country)?)),
            other => Ok(IndexEntry::Row(serde_yaml::from_value(other)?)),
        }
    }
}

impl<'de> Deserialize<'de> for IndexEntry {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        IndexEntry::from_value(value, "index entry").map_err(<D::Error as serde::de::Error>::custom)
    }
}

/// Dimensions and policy shipped with the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Rows in the artifact, padding included
    pub padded_row_count: usize,
    /// Country -> subdivision used when none is given
    #[serde(default, deserialize_with = "yaml::scalar_map")]
    pub defaults: BTreeMap<String, String>,
    /// First calendar date (inclusive)
    pub start: NaiveDate,
    /// Last calendar date (exclusive)
    pub end: NaiveDate,
    /// Weekdays in `[start, end)`
    pub column_count: usize,
    /// Hex SHA-256 of the artifact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum FileValue {
    Row(usize),
    Metadata(IndexMetadata),
    Subdivisions(BTreeMap<String, usize>),
}

/// Immutable jurisdiction -> row mapping for one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JurisdictionIndex {
    entries: BTreeMap<String, IndexEntry>,
    metadata: IndexMetadata,
    range: WeekdayRange,
}

impl JurisdictionIndex {
    /// Assemble and validate an index.
    pub fn new(entries: BTreeMap<String, IndexEntry>, metadata: IndexMetadata) -> Result<Self> {
        let range = WeekdayRange::new(metadata.start, metadata.end)?;
        let index = Self {
            entries,
            metadata,
            range,
        };
        index.validate()?;
        Ok(index)
    }

    pub fn metadata(&self) -> &IndexMetadata {
        &self.metadata
    }

    pub fn entries(&self) -> &BTreeMap<String, IndexEntry> {
        &self.entries
    }

    /// Date range the columns were built from.
    pub fn range(&self) -> WeekdayRange {
        self.range
    }

    /// Artifact dimensions described by this index.
    pub fn layout(&self) -> Layout {
        Layout::new(self.metadata.padded_row_count, self.metadata.column_count)
    }

    /// Addressable rows (padding excluded).
    pub fn row_count(&self) -> usize {
        self.entries
            .values()
            .map(|entry| match entry {
                IndexEntry::Row(_) => 1,
                IndexEntry::Subdivisions(subs) => subs.len(),
            })
            .sum()
    }

    pub fn checksum(&self) -> Option<&str> {
        self.metadata.checksum.as_deref()
    }

    /// Record the artifact checksum.
    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.metadata.checksum = Some(checksum.into());
        self
    }

    /// Every jurisdiction with its row, in row order.
    pub fn jurisdictions(&self) -> Vec<(Jurisdiction, usize)> {
        let mut rows: Vec<(Jurisdiction, usize)> = self
            .entries
            .iter()
            .flat_map(|(country, entry)| match entry {
                IndexEntry::Row(row) => vec![(Jurisdiction::country(country), *row)],
                IndexEntry::Subdivisions(subs) => subs
                    .iter()
                    .map(|(sub, row)| (Jurisdiction::subdivision(country, sub), *row))
                    .collect(),
            })
            .collect();
        rows.sort_by_key(|(_, row)| *row);
        rows
    }

    /// Resolve a country and optional subdivision to a row.
    ///
    /// A missing subdivision resolves through `defaults`. An unknown
    /// subdivision is an error; it never falls back to the default.
    pub fn resolve(&self, country: &str, subdivision: Option<&str>) -> Result<usize> {
        let entry = self
            .entries
            .get(country)
            .ok_or_else(|| Error::NotFound(format!("jurisdiction {}", country)))?;

        match (entry, subdivision) {
            (IndexEntry::Row(row), None) => Ok(*row),
            (IndexEntry::Row(_), Some(sub)) => Err(Error::NotFound(format!(
                "{} has no subdivisions, got {}",
                country, sub
            ))),
            (IndexEntry::Subdivisions(subs), Some(sub)) => subs
                .get(sub)
                .copied()
                .ok_or_else(|| Error::NotFound(format!("subdivision {}/{}", country, sub))),
            (IndexEntry::Subdivisions(_), None) => {
                let default = self.metadata.defaults.get(country).ok_or_else(|| {
                    Error::NotFound(format!("default subdivision for {}", country))
                })?;
                self.resolve(country, Some(default))
            }
        }
    }

    /// Check `data` is the artifact this index describes.
    pub fn verify_artifact(&self, data: &[u8]) -> Result<()> {
        self.layout().check_len(data.len())?;
        if let Some(expected) = self.checksum() {
            if codec::checksum(data) != expected {
                return Err(Error::ChecksumMismatch);
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let padded = self.metadata.padded_row_count;
        if padded % codec::BITS_PER_BYTE != 0 {
            return Err(Error::Config(format!(
                "padded_row_count {} is not a multiple of {}",
                padded,
                codec::BITS_PER_BYTE
            )));
        }

        let columns = self.range.len();
        if columns != self.metadata.column_count {
            return Err(Error::DimensionMismatch {
                what: "column count",
                expected: columns,
                actual: self.metadata.column_count,
            });
        }

        let mut seen = BTreeSet::new();
        for (jurisdiction, row) in self.jurisdictions() {
            if row >= padded {
                return Err(Error::OutOfRange {
                    axis: "row",
                    index: row,
                    limit: padded,
                });
            }
            if !seen.insert(row) {
                return Err(Error::Config(format!(
                    "row {} assigned twice (again to {})",
                    row, jurisdiction
                )));
            }
        }

        for (country, entry) in &self.entries {
            if country == METADATA_KEY {
                return Err(Error::Config(format!("{} is a reserved key", METADATA_KEY)));
            }
            if matches!(entry, IndexEntry::Subdivisions(subs) if subs.is_empty()) {
                return Err(Error::Config(format!("{} has an empty subdivision map", country)));
            }
        }

        let expected = padded_row_count(seen.len());
        if expected != padded {
            return Err(Error::DimensionMismatch {
                what: "padded row count",
                expected,
                actual: padded,
            });
        }

        Ok(())
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        let mut file: BTreeMap<String, FileValue> = self
            .entries
            .iter()
            .map(|(country, entry)| {
                let value = match entry {
                    IndexEntry::Row(row) => FileValue::Row(*row),
                    IndexEntry::Subdivisions(subs) => FileValue::Subdivisions(subs.clone()),
                };
                (country.clone(), value)
            })
            .collect();
        file.insert(
            METADATA_KEY.to_string(),
            FileValue::Metadata(self.metadata.clone()),
        );
        Ok(serde_yaml::to_string(&file)?)
    }

    /// Parse and validate YAML.
    ///
    /// Unquoted numeric subdivision codes (`9: 3`) are read as strings.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let raw: Mapping = serde_yaml::from_str(content)?;

        let mut metadata = None;
        let mut entries = BTreeMap::new();
        for (key, value) in raw {
            let key = yaml::key_string(&key, "index")?;
            if key == METADATA_KEY {
                let meta: IndexMetadata = serde_yaml::from_value(value).map_err(|e| {
                    Error::Config(format!("malformed {} block: {}", METADATA_KEY, e))
                })?;
                metadata = Some(meta);
                continue;
            }
            let entry = IndexEntry::from_value(value, &key)?;
            if entries.insert(key.clone(), entry).is_some() {
                return Err(Error::Config(format!("{} listed twice", key)));
            }
        }

        let metadata = metadata
            .ok_or_else(|| Error::Config(format!("missing {} block", METADATA_KEY)))?;
        Self::new(entries, metadata)
    }

    /// Load an index file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Save an index file (non-atomic; see `ArtifactWriter` for publishing).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_yaml()?)?;
        Ok(())
    }
}

/// Accumulates row assignments during a build.
///
/// Owns the mapping exclusively until [`IndexBuilder::finish`] hands back an
/// immutable [`JurisdictionIndex`].
#[derive(Debug)]
pub struct IndexBuilder {
    entries: BTreeMap<String, IndexEntry>,
    defaults: BTreeMap<String, String>,
    next_row: usize,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexBuilder {
    /// Empty builder using [`DEFAULT_SUBDIVISIONS`].
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            defaults: DEFAULT_SUBDIVISIONS
                .iter()
                .map(|(country, sub)| (country.to_string(), sub.to_string()))
                .collect(),
            next_row: 0,
        }
    }

    /// Replace the default-subdivision policy.
    pub fn with_defaults<I, K, V>(mut self, defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.defaults = defaults
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Rows assigned so far.
    pub fn len(&self) -> usize {
        self.next_row
    }

    pub fn is_empty(&self) -> bool {
        self.next_row == 0
    }

    /// Assign the next row to `jurisdiction`.
    pub fn push(&mut self, jurisdiction: &Jurisdiction) -> Result<usize> {
        if jurisdiction.country == METADATA_KEY {
            return Err(Error::Build(format!(
                "{} is a reserved key",
                METADATA_KEY
            )));
        }

        let row = self.next_row;
        let duplicate = || Error::Build(format!("{} listed twice", jurisdiction));
        let mixed = || {
            Error::Build(format!(
                "{} mixes country-level and subdivision rows",
                jurisdiction.country
            ))
        };

        match self.entries.get_mut(&jurisdiction.country) {
            None => {
                let entry = match &jurisdiction.subdivision {
                    None => IndexEntry::Row(row),
                    Some(sub) => IndexEntry::Subdivisions(BTreeMap::from([(sub.clone(), row)])),
                };
                self.entries.insert(jurisdiction.country.clone(), entry);
            }
            Some(IndexEntry::Subdivisions(subs)) => match &jurisdiction.subdivision {
                Some(sub) => {
                    if subs.contains_key(sub) {
                        return Err(duplicate());
                    }
                    subs.insert(sub.clone(), row);
                }
                None => return Err(mixed()),
            },
            Some(IndexEntry::Row(_)) => {
                return Err(match jurisdiction.subdivision {
                    None => duplicate(),
                    Some(_) => mixed(),
                })
            }
        }

        self.next_row += 1;
        Ok(row)
    }

    /// Freeze the mapping for an artifact built over `range`.
    ///
    /// Defaults are kept only for countries that have the named subdivision.
    pub fn finish(self, range: WeekdayRange) -> Result<JurisdictionIndex> {
        let defaults = self
            .defaults
            .into_iter()
            .filter(|(country, sub)| match self.entries.get(country) {
                Some(IndexEntry::Subdivisions(subs)) => {
                    let known = subs.contains_key(sub);
                    if !known {
                        log::warn!("Dropping default {}/{}: no such subdivision", country, sub);
                    }
                    known
                }
                Some(IndexEntry::Row(_)) => {
                    log::warn!(
                        "Dropping default {}/{}: {} has no subdivisions",
                        country,
                        sub,
                        country
                    );
                    false
                }
                None => {
                    log::debug!("Skipping default {}/{}: country not built", country, sub);
                    false
                }
            })
            .collect();

        let metadata = IndexMetadata {
            padded_row_count: padded_row_count(self.next_row),
            defaults,
            start: range.start(),
            end: range.end(),
            column_count: range.len(),
            checksum: None,
        };

        JurisdictionIndex::new(self.entries, metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range() -> WeekdayRange {
        WeekdayRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 11).unwrap(),
        )
        .unwrap()
    }

    fn sample() -> JurisdictionIndex {
        let mut builder = IndexBuilder::new();
        for j in [
            Jurisdiction::country("AR"),
            Jurisdiction::subdivision("AU", "ACT"),
            Jurisdiction::subdivision("AU", "NSW"),
            Jurisdiction::country("BE"),
            Jurisdiction::subdivision("CA", "AB"),
        ] {
            builder.push(&j).unwrap();
        }
        builder.finish(range()).unwrap()
    }

    #[test]
    fn test_rows_in_push_order() {
        let index = sample();
        assert_eq!(index.resolve("AR", None).unwrap(), 0);
        assert_eq!(index.resolve("AU", Some("ACT")).unwrap(), 1);
        assert_eq!(index.resolve("AU", Some("NSW")).unwrap(), 2);
        assert_eq!(index.resolve("BE", None).unwrap(), 3);
        assert_eq!(index.resolve("CA", Some("AB")).unwrap(), 4);
        assert_eq!(index.row_count(), 5);
        assert_eq!(index.metadata().padded_row_count, 8);
        assert_eq!(index.metadata().column_count, 8);
    }

    #[test]
    fn test_default_resolution() {
        let index = sample();
        assert_eq!(
            index.resolve("AU", None).unwrap(),
            index.resolve("AU", Some("ACT")).unwrap()
        );
    }

    #[test]
    fn test_defaults_filtered_to_known_subdivisions() {
        let index = sample();
        let defaults = &index.metadata().defaults;
        assert_eq!(defaults.get("AU").map(String::as_str), Some("ACT"));
        // CA has subdivisions but not ON; GB is absent
        assert!(!defaults.contains_key("CA"));
        assert!(!defaults.contains_key("GB"));
        assert!(matches!(index.resolve("CA", None), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_unknown_subdivision_never_falls_back() {
        let index = sample();
        assert!(matches!(
            index.resolve("AU", Some("WA")),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            index.resolve("AR", Some("B")),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(index.resolve("ZZ", None), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_rows_unique_and_in_bounds() {
        let index = sample();
        let rows: Vec<usize> = index.jurisdictions().iter().map(|(_, r)| *r).collect();
        assert_eq!(rows, vec![0, 1, 2, 3, 4]);
        assert!(rows.iter().all(|&r| r < index.metadata().padded_row_count));
    }

    #[test]
    fn test_push_rejects_duplicates_and_mixing() {
        let mut builder = IndexBuilder::new();
        builder.push(&Jurisdiction::country("AR")).unwrap();
        assert!(builder.push(&Jurisdiction::country("AR")).is_err());
        assert!(builder
            .push(&Jurisdiction::subdivision("AR", "B"))
            .is_err());

        builder.push(&Jurisdiction::subdivision("AU", "ACT")).unwrap();
        assert!(builder
            .push(&Jurisdiction::subdivision("AU", "ACT"))
            .is_err());
        assert!(builder.push(&Jurisdiction::country("AU")).is_err());
        assert!(builder.push(&Jurisdiction::country(METADATA_KEY)).is_err());
        assert_eq!(builder.len(), 2);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let index = sample().with_checksum("abc123");
        let yaml = index.to_yaml().unwrap();
        assert!(yaml.contains("Metadata:"));
        assert!(yaml.contains("padded_row_count: 8"));

        let loaded = JurisdictionIndex::from_yaml(&yaml).unwrap();
        assert_eq!(loaded, index);
        assert_eq!(loaded.checksum(), Some("abc123"));
    }

    #[test]
    fn test_from_yaml_rejects_inconsistent_metadata() {
        let missing = "AR: 0\n";
        assert!(matches!(
            JurisdictionIndex::from_yaml(missing),
            Err(Error::Config(_))
        ));

        let row_past_padding = r#"
AR: 8
Metadata:
  padded_row_count: 8
  start: 2024-01-01
  end: 2024-01-11
  column_count: 8
"#;
        assert!(matches!(
            JurisdictionIndex::from_yaml(row_past_padding),
            Err(Error::OutOfRange { .. })
        ));

        let wrong_columns = r#"
AR: 0
Metadata:
  padded_row_count: 8
  start: 2024-01-01
  end: 2024-01-11
  column_count: 9
"#;
        assert!(matches!(
            JurisdictionIndex::from_yaml(wrong_columns),
            Err(Error::DimensionMismatch { .. })
        ));

        let shared_row = r#"
AR: 0
BE: 0
Metadata:
  padded_row_count: 8
  start: 2024-01-01
  end: 2024-01-11
  column_count: 8
"#;
        assert!(JurisdictionIndex::from_yaml(shared_row).is_err());
    }

    #[test]
    fn test_from_yaml_numeric_subdivisions() {
        let yaml = r#"
AR: 0
AT:
  1: 1
  9: 2
Metadata:
  padded_row_count: 8
  defaults:
    AT: 9
  start: 2024-01-01
  end: 2024-01-11
  column_count: 8
"#;
        let index = JurisdictionIndex::from_yaml(yaml).unwrap();
        assert_eq!(index.resolve("AT", Some("9")).unwrap(), 2);
        assert_eq!(index.resolve("AT", Some("1")).unwrap(), 1);
        assert_eq!(index.resolve("AT", None).unwrap(), 2);

        // Saved form loads back identically
        let reloaded = JurisdictionIndex::from_yaml(&index.to_yaml().unwrap()).unwrap();
        assert_eq!(reloaded, index);
    }

    #[test]
    fn test_from_yaml_rejects_reversed_range() {
        let yaml = r#"
AR: 0
Metadata:
  padded_row_count: 8
  start: 2024-01-11
  end: 2024-01-01
  column_count: 0
"#;
        assert!(matches!(
            JurisdictionIndex::from_yaml(yaml),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_index_entry_deserialize() {
        let entry: IndexEntry = serde_yaml::from_str("9: 3\nW: 4\n").unwrap();
        assert_eq!(
            entry,
            IndexEntry::Subdivisions(BTreeMap::from([
                ("9".to_string(), 3),
                ("W".to_string(), 4)
            ]))
        );
        let entry: IndexEntry = serde_yaml::from_str("5").unwrap();
        assert_eq!(entry, IndexEntry::Row(5));
    }

    #[test]
    fn test_default_dropped_for_country_level_row() {
        let mut builder = IndexBuilder::new();
        builder.push(&Jurisdiction::country("GB")).unwrap();
        builder.push(&Jurisdiction::subdivision("AU", "ACT")).unwrap();
        let index = builder.finish(range()).unwrap();

        assert!(!index.metadata().defaults.contains_key("GB"));
        assert_eq!(index.resolve("GB", None).unwrap(), 0);
        assert_eq!(index.resolve("AU", None).unwrap(), 1);
    }

    #[test]
    fn test_verify_artifact() {
        let data = vec![0u8; 8];
        let index = sample().with_checksum(codec::checksum(&data));
        assert!(index.verify_artifact(&data).is_ok());

        let mut tampered = data.clone();
        tampered[0] = 1;
        assert!(matches!(
            index.verify_artifact(&tampered),
            Err(Error::ChecksumMismatch)
        ));
        assert!(matches!(
            index.verify_artifact(&data[..7]),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("holidays.yaml");
        let index = sample();
        index.save(&path).unwrap();
        assert_eq!(JurisdictionIndex::load(&path).unwrap(), index);
    }
}
