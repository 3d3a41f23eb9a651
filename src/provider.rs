//! Holiday provider seam.
//!
//! The builder never decides what a holiday is. It asks a [`CalendarProvider`]
//! for the supported jurisdictions and for one [`HolidayPredicate`] per row.
//! [`DateListProvider`] is the bundled implementation, backed by a YAML list
//! of dates:
//!
//! ```yaml
//! JP:
//!   - 2024-01-01
//! AU:
//!   ACT:
//!     - 2024-01-26
//!   NSW:
//!     - 2024-01-26
//! ```

use chrono::NaiveDate;
use serde_yaml::{Mapping, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use crate::jurisdiction::{Jurisdiction, SupportedCountry};
use crate::yaml::key_string;
use crate::{Error, Result};

/// "Is this date a holiday" for one jurisdiction.
pub trait HolidayPredicate {
    fn is_holiday(&self, date: NaiveDate) -> Result<bool>;
}

impl<F> HolidayPredicate for F
where
    F: Fn(NaiveDate) -> Result<bool>,
{
    fn is_holiday(&self, date: NaiveDate) -> Result<bool> {
        self(date)
    }
}

/// Source of jurisdictions and their holiday predicates.
///
/// Shared across build workers, hence `Sync`.
pub trait CalendarProvider: Sync {
    /// Supported countries in row order.
    fn supported_countries(&self) -> Vec<SupportedCountry>;

    /// Predicate bound to `jurisdiction`.
    fn predicate<'a>(&'a self, jurisdiction: &Jurisdiction)
        -> Result<Box<dyn HolidayPredicate + 'a>>;
}

/// Provider backed by explicit holiday dates.
#[derive(Debug, Clone, Default)]
pub struct DateListProvider {
    countries: BTreeMap<String, CountryDates>,
}

#[derive(Debug, Clone)]
enum CountryDates {
    National(BTreeSet<NaiveDate>),
    Subdivided(BTreeMap<String, BTreeSet<NaiveDate>>),
}

struct DateSet<'a>(&'a BTreeSet<NaiveDate>);

impl HolidayPredicate for DateSet<'_> {
    fn is_holiday(&self, date: NaiveDate) -> Result<bool> {
        Ok(self.0.contains(&date))
    }
}

impl DateListProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a YAML holiday source.
    ///
    /// Unquoted numeric country or subdivision codes are accepted.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let raw: Mapping = serde_yaml::from_str(content)?;
        let mut provider = Self::new();
        for (key, value) in raw {
            let country = key_string(&key, "holiday source")?;
            match value {
                Value::Sequence(_) => {
                    let dates: Vec<NaiveDate> = serde_yaml::from_value(value)?;
                    provider.add_country(&country, dates)?;
                }
                Value::Mapping(subs) => {
                    if subs.is_empty() {
                        return Err(Error::Config(format!(
                            "country {} lists an empty subdivision map",
                            country
                        )));
                    }
                    for (key, dates) in subs {
                        let sub = key_string(&key, &country)?;
                        let dates: Vec<NaiveDate> = serde_yaml::from_value(dates)?;
                        provider.add_subdivision(&country, &sub, dates)?;
                    }
                }
                _ => {
                    return Err(Error::Config(format!(
                        "country {} must list dates or subdivisions",
                        country
                    )))
                }
            }
        }
        Ok(provider)
    }

    /// Load a YAML holiday source from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Add holidays for a country without subdivisions.
    ///
    /// Fails if the country was already registered with subdivisions.
    pub fn add_country<I>(&mut self, country: &str, dates: I) -> Result<()>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let entry = self
            .countries
            .entry(country.to_string())
            .or_insert_with(|| CountryDates::National(BTreeSet::new()));
        match entry {
            CountryDates::National(set) => {
                set.extend(dates);
                Ok(())
            }
            CountryDates::Subdivided(_) => Err(Error::Config(format!(
                "country {} already has subdivision calendars",
                country
            ))),
        }
    }

    /// Add holidays for one subdivision of a country.
    ///
    /// Fails if the country was already registered without subdivisions.
    pub fn add_subdivision<I>(&mut self, country: &str, subdivision: &str, dates: I) -> Result<()>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let entry = self
            .countries
            .entry(country.to_string())
            .or_insert_with(|| CountryDates::Subdivided(BTreeMap::new()));
        match entry {
            CountryDates::Subdivided(subs) => {
                subs.entry(subdivision.to_string())
                    .or_default()
                    .extend(dates);
                Ok(())
            }
            CountryDates::National(_) => Err(Error::Config(format!(
                "country {} already has a country-level calendar",
                country
            ))),
        }
    }
}

impl CalendarProvider for DateListProvider {
    fn supported_countries(&self) -> Vec<SupportedCountry> {
        self.countries
            .iter()
            .map(|(country, dates)| match dates {
                CountryDates::National(_) => SupportedCountry::new(country),
                CountryDates::Subdivided(subs) => {
                    SupportedCountry::with_subdivisions(country, subs.keys())
                }
            })
            .collect()
    }

    fn predicate<'a>(
        &'a self,
        jurisdiction: &Jurisdiction,
    ) -> Result<Box<dyn HolidayPredicate + 'a>> {
        let not_found = || Error::NotFound(jurisdiction.to_string());
        let dates = self.countries.get(&jurisdiction.country).ok_or_else(not_found)?;
        let set = match (dates, &jurisdiction.subdivision) {
            (CountryDates::National(set), None) => set,
            (CountryDates::Subdivided(subs), Some(sub)) => subs.get(sub).ok_or_else(not_found)?,
            _ => return Err(not_found()),
        };
        Ok(Box::new(DateSet(set)))
    }
}
