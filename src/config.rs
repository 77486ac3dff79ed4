// src/config.rs
use anyhow::{Context, Result};
use log::{info, warn};
use std::env;
use std::path::PathBuf;

use crate::services::countries::CountryRegistry;
use crate::services::store::DataSources;

pub const DEFAULT_PORT: u16 = 3030;
pub const DEFAULT_DAILY_PATH: &str = "./data/daily_reactions.csv";
pub const DEFAULT_INTRADAY_PATH: &str = "./data/intraday_reactions.csv";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub port: u16,
    pub sources: DataSources,
    pub country_config: Option<PathBuf>,
}

impl AppConfig {
    /// Read settings from the process environment (after `.env`, if the caller loaded one).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("PORT must be a number, got '{}'", raw))?,
            None => {
                warn!("$PORT not set, defaulting to {}", DEFAULT_PORT);
                DEFAULT_PORT
            }
        };

        let daily = lookup("DAILY_REACTIONS_PATH")
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DAILY_PATH.to_string());

        // An explicitly empty value turns the intraday source off.
        let intraday = match lookup("INTRADAY_REACTIONS_PATH") {
            Some(p) if p.trim().is_empty() => None,
            Some(p) => Some(PathBuf::from(p)),
            None => Some(PathBuf::from(DEFAULT_INTRADAY_PATH)),
        };

        let country_config = lookup("COUNTRY_CONFIG_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Ok(AppConfig {
            port,
            sources: DataSources {
                daily: PathBuf::from(daily),
                intraday,
            },
            country_config,
        })
    }

    pub fn country_registry(&self) -> Result<CountryRegistry> {
        match &self.country_config {
            Some(path) => CountryRegistry::from_path(path)
                .with_context(|| format!("loading country config from {}", path.display())),
            None => {
                info!("COUNTRY_CONFIG_PATH not set, using built-in country profiles");
                Ok(CountryRegistry::builtin())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.sources.daily, PathBuf::from(DEFAULT_DAILY_PATH));
        assert_eq!(config.sources.intraday, Some(PathBuf::from(DEFAULT_INTRADAY_PATH)));
        assert_eq!(config.country_config, None);
    }

    #[test]
    fn reads_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("DAILY_REACTIONS_PATH", "/srv/daily.csv"),
            ("INTRADAY_REACTIONS_PATH", ""),
            ("COUNTRY_CONFIG_PATH", "config/countries.json"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.sources.daily, PathBuf::from("/srv/daily.csv"));
        assert_eq!(config.sources.intraday, None);
        assert_eq!(config.country_config, Some(PathBuf::from("config/countries.json")));
    }

    #[test]
    fn invalid_port_is_an_error() {
        assert!(AppConfig::from_lookup(lookup_from(&[("PORT", "http")])).is_err());
    }
}
