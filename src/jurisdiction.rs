//! Jurisdiction identifiers.

use std::fmt;

/// A country, optionally narrowed to one of its subdivisions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Jurisdiction {
    pub country: String,
    pub subdivision: Option<String>,
}

impl Jurisdiction {
    /// Country-level jurisdiction.
    pub fn country(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            subdivision: None,
        }
    }

    /// Subdivision-level jurisdiction.
    pub fn subdivision(country: impl Into<String>, subdivision: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            subdivision: Some(subdivision.into()),
        }
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subdivision {
            Some(sub) => write!(f, "{}/{}", self.country, sub),
            None => write!(f, "{}", self.country),
        }
    }
}

/// A supported country and its subdivisions, as enumerated by a provider.
///
/// An empty `subdivisions` list means the country is a single row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedCountry {
    pub country: String,
    pub subdivisions: Vec<String>,
}

impl SupportedCountry {
    pub fn new(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            subdivisions: Vec::new(),
        }
    }

    pub fn with_subdivisions<I, S>(country: impl Into<String>, subdivisions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            country: country.into(),
            subdivisions: subdivisions.into_iter().map(Into::into).collect(),
        }
    }

    /// Rows this country contributes, in order.
    pub fn jurisdictions(&self) -> Vec<Jurisdiction> {
        if self.subdivisions.is_empty() {
            vec![Jurisdiction::country(&self.country)]
        } else {
            self.subdivisions
                .iter()
                .map(|sub| Jurisdiction::subdivision(&self.country, sub))
                .collect()
        }
    }
}

/// Flatten countries into matrix rows: countries in order, then subdivisions.
pub fn flatten(countries: &[SupportedCountry]) -> Vec<Jurisdiction> {
    countries.iter().flat_map(|c| c.jurisdictions()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_order() {
        let countries = vec![
            SupportedCountry::new("AR"),
            SupportedCountry::with_subdivisions("AU", ["ACT", "NSW"]),
            SupportedCountry::new("BE"),
        ];
        let rows: Vec<String> = flatten(&countries).iter().map(|j| j.to_string()).collect();
        assert_eq!(rows, vec!["AR", "AU/ACT", "AU/NSW", "BE"]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Jurisdiction::country("JP").to_string(), "JP");
        assert_eq!(Jurisdiction::subdivision("FR", "Métropole").to_string(), "FR/Métropole");
    }
}
