use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A normalized country record.
///
/// `code` (ISO 3166-1 alpha-3) is the sole identity: equality, favoriting
/// and routing all key on it. All optional fields of the upstream payload
/// are resolved to concrete values here, once, so downstream code never
/// deals with absent data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub code: String,
    pub name: String,
    pub official_name: String,
    pub capital: Vec<String>,
    pub region: String,
    pub subregion: String,
    pub population: u64,
    pub flag_url: Option<String>,
    pub languages: BTreeMap<String, String>,
    /// Currency code → currency name.
    pub currencies: BTreeMap<String, String>,
    pub timezones: Vec<String>,
}

impl Country {
    /// The city used as the weather query key, when the country has one.
    pub fn capital_city(&self) -> Option<&str> {
        self.capital.first().map(String::as_str)
    }
}

/// Current weather in a capital city. Derived per detail view and
/// discarded when the view changes; never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature_c: f64,
    /// Short condition group, e.g. "Clouds".
    pub condition: String,
    /// Longer condition text, e.g. "scattered clouds".
    pub description: String,
    pub observed_at: DateTime<Utc>,
}

/// Raw restcountries v3.1 country object, as returned by the API.
/// Normalized into [`Country`] at the decode boundary and not exposed
/// beyond it.
#[derive(Debug, Deserialize)]
pub(crate) struct RawCountry {
    pub cca3: String,
    pub name: Option<RawName>,
    pub capital: Option<Vec<String>>,
    pub region: Option<String>,
    pub subregion: Option<String>,
    pub population: Option<u64>,
    pub flags: Option<RawFlags>,
    pub languages: Option<BTreeMap<String, String>>,
    pub currencies: Option<BTreeMap<String, RawCurrency>>,
    pub timezones: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawName {
    pub common: Option<String>,
    pub official: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawFlags {
    pub png: Option<String>,
    pub svg: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCurrency {
    pub name: Option<String>,
}

impl From<RawCountry> for Country {
    fn from(raw: RawCountry) -> Self {
        let (common, official) = match raw.name {
            Some(name) => (name.common, name.official),
            None => (None, None),
        };
        // Display names fall back to each other, then to the code.
        let name = common.clone().or_else(|| official.clone()).unwrap_or_else(|| raw.cca3.clone());
        let official_name = official.or(common).unwrap_or_else(|| raw.cca3.clone());

        let flag_url = raw.flags.and_then(|f| f.png.or(f.svg));

        let currencies = raw
            .currencies
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(code, c)| c.name.map(|n| (code, n)))
            .collect();

        Country {
            code: raw.cca3,
            name,
            official_name,
            capital: raw.capital.unwrap_or_default(),
            region: raw.region.unwrap_or_default(),
            subregion: raw.subregion.unwrap_or_default(),
            population: raw.population.unwrap_or(0),
            flag_url,
            languages: raw.languages.unwrap_or_default(),
            currencies,
            timezones: raw.timezones.unwrap_or_default(),
        }
    }
}

/// Normalize a raw catalog into [`Country`] records, preserving order and
/// dropping any later duplicate of an already-seen code so that a code
/// identifies at most one country.
pub(crate) fn normalize(raw: Vec<RawCountry>) -> Vec<Country> {
    let mut seen: HashSet<String> = HashSet::with_capacity(raw.len());
    raw.into_iter()
        .filter(|r| seen.insert(r.cca3.clone()))
        .map(Country::from)
        .collect()
}

#[cfg(test)]
pub(crate) fn test_country(code: &str, name: &str, region: &str, population: u64) -> Country {
    Country {
        code: code.to_string(),
        name: name.to_string(),
        official_name: name.to_string(),
        capital: vec![],
        region: region.to_string(),
        subregion: String::new(),
        population,
        flag_url: None,
        languages: BTreeMap::new(),
        currencies: BTreeMap::new(),
        timezones: vec![],
    }
}
