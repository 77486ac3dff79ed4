// src/services/countries.rs
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read country config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse country config {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("country {country}: unknown market timezone '{timezone}'")]
    Timezone { country: String, timezone: String },
}

/// Descriptive metadata for one country. Advisory only: records are never
/// validated against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryProfile {
    pub country_name: String,
    pub currency: String,
    pub macro_events: Vec<String>,
    /// Asset class (equities, rates, fx, volatility) to ticker.
    pub assets: BTreeMap<String, String>,
    pub market_timezone: String,
}

impl CountryProfile {
    pub fn timezone(&self) -> Option<Tz> {
        self.market_timezone.parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryRegistry {
    countries: BTreeMap<String, CountryProfile>,
}

fn profile(
    country_name: &str,
    currency: &str,
    macro_events: &[&str],
    assets: &[(&str, &str)],
    market_timezone: &str,
) -> CountryProfile {
    CountryProfile {
        country_name: country_name.to_string(),
        currency: currency.to_string(),
        macro_events: macro_events.iter().map(|e| e.to_string()).collect(),
        assets: assets
            .iter()
            .map(|(class, ticker)| (class.to_string(), ticker.to_string()))
            .collect(),
        market_timezone: market_timezone.to_string(),
    }
}

impl CountryRegistry {
    pub fn new(countries: BTreeMap<String, CountryProfile>) -> Result<Self, ConfigError> {
        for (code, profile) in &countries {
            if profile.timezone().is_none() {
                return Err(ConfigError::Timezone {
                    country: code.clone(),
                    timezone: profile.market_timezone.clone(),
                });
            }
        }
        Ok(CountryRegistry { countries })
    }

    /// The two markets the tracker ships with.
    pub fn builtin() -> Self {
        let mut countries = BTreeMap::new();
        countries.insert(
            "US".to_string(),
            profile(
                "united states",
                "USD",
                &["CPI", "Non Farm Payrolls"],
                &[
                    ("equities", "SPY"),
                    ("rates", "^TNX"),
                    ("fx", "DXY"),
                    ("volatility", "^VIX"),
                ],
                "US/Eastern",
            ),
        );
        countries.insert(
            "INDIA".to_string(),
            profile(
                "india",
                "INR",
                &["CPI", "Repo Rate"],
                &[
                    ("equities", "^NSEI"),
                    ("rates", "IN10YR"),
                    ("fx", "USDINR=X"),
                    ("volatility", "^INDIAVIX"),
                ],
                "Asia/Kolkata",
            ),
        );
        CountryRegistry { countries }
    }

    pub fn from_json(json: &str, path: &str) -> Result<Self, ConfigError> {
        let countries = serde_json::from_str(json).map_err(|source| ConfigError::Json {
            path: path.to_string(),
            source,
        })?;
        Self::new(countries)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        let registry = Self::from_json(&json, &display)?;
        info!("Loaded {} country profiles from {}", registry.countries.len(), display);
        Ok(registry)
    }

    pub fn get(&self, code: &str) -> Option<&CountryProfile> {
        self.countries.get(code)
    }

    pub fn profiles(&self) -> &BTreeMap<String, CountryProfile> {
        &self.countries
    }

    /// Convert a UTC timestamp into the country's market time, when the
    /// country is configured.
    pub fn market_local_time(&self, code: &str, utc: NaiveDateTime) -> Option<DateTime<Tz>> {
        let tz = self.get(code)?.timezone()?;
        Some(Utc.from_utc_datetime(&utc).with_timezone(&tz))
    }

    /// Attach the country's market timezone to a wall-clock timestamp that
    /// was recorded without an offset. Times skipped by a DST change yield `None`.
    pub fn localize(&self, code: &str, local: NaiveDateTime) -> Option<DateTime<Tz>> {
        let tz = self.get(code)?.timezone()?;
        tz.from_local_datetime(&local).earliest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn builtin_registry_has_valid_timezones() {
        let registry = CountryRegistry::builtin();
        assert_eq!(registry.profiles().len(), 2);
        for profile in registry.profiles().values() {
            assert!(profile.timezone().is_some(), "{}", profile.market_timezone);
        }
        assert_eq!(registry.get("US").unwrap().assets["equities"], "SPY");
        assert_eq!(registry.get("INDIA").unwrap().currency, "INR");
    }

    #[test]
    fn converts_to_market_local_time() {
        let registry = CountryRegistry::builtin();
        let utc = NaiveDate::from_ymd_opt(2024, 1, 11)
            .unwrap()
            .and_hms_opt(13, 30, 0)
            .unwrap();
        let ny = registry.market_local_time("US", utc).unwrap();
        assert_eq!(ny.to_rfc3339(), "2024-01-11T08:30:00-05:00");
        let mumbai = registry.market_local_time("INDIA", utc).unwrap();
        assert_eq!(mumbai.to_rfc3339(), "2024-01-11T19:00:00+05:30");
        assert!(registry.market_local_time("JP", utc).is_none());
    }

    #[test]
    fn localizes_wall_clock_release_times() {
        let registry = CountryRegistry::builtin();
        let release = NaiveDate::from_ymd_opt(2024, 1, 11)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        let ny = registry.localize("US", release).unwrap();
        assert_eq!(ny.to_rfc3339(), "2024-01-11T08:30:00-05:00");
        let summer = NaiveDate::from_ymd_opt(2024, 7, 11)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(
            registry.localize("US", summer).unwrap().to_rfc3339(),
            "2024-07-11T08:30:00-04:00"
        );
        assert!(registry.localize("JP", release).is_none());
    }

    #[test]
    fn parses_json_config() {
        let json = r#"{
            "UK": {
                "country_name": "united kingdom",
                "currency": "GBP",
                "macro_events": ["CPI"],
                "assets": {"equities": "ISF.L"},
                "market_timezone": "Europe/London"
            }
        }"#;
        let registry = CountryRegistry::from_json(json, "inline").unwrap();
        assert_eq!(registry.get("UK").unwrap().macro_events, vec!["CPI"]);
    }

    #[test]
    fn rejects_unknown_timezone() {
        let json = r#"{
            "XX": {
                "country_name": "nowhere",
                "currency": "XXX",
                "macro_events": [],
                "assets": {},
                "market_timezone": "Mars/Olympus"
            }
        }"#;
        assert!(matches!(
            CountryRegistry::from_json(json, "inline"),
            Err(ConfigError::Timezone { .. })
        ));
    }
}
