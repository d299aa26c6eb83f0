use crate::venue::VenueZone;
use chrono_tz::Tz;
use dotenv::dotenv;
use log::info;
use std::env;
use std::time::Duration;
use thiserror::Error;

// Debug vs release address
#[cfg(debug_assertions)]
const DEFAULT_ADDRESS: &str = "127.0.0.1:8388";
#[cfg(not(debug_assertions))]
const DEFAULT_ADDRESS: &str = "0.0.0.0:8388";

const DEFAULT_TARGET_HOURS: [u32; 2] = [17, 18];
const DEFAULT_FEED_TIMEOUT_SECS: u64 = 10;

const BASE_URL: &str = "BASE_URL";
const TARGET_HOURS: &str = "TARGET_HOURS";
const VENUE_TZ: &str = "VENUE_TZ";
const FEED_TIMEOUT_SECS: &str = "FEED_TIMEOUT_SECS";
const BIND_ADDRESS: &str = "BIND_ADDRESS";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

fn invalid(name: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Server configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Upstream booking site, without a trailing slash
    pub base_url: String,
    pub address: String,
    /// Start hours of the one hour slots to report on
    pub target_hours: Vec<u32>,
    pub venue_zone: VenueZone,
    pub feed_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        if dotenv().is_ok() {
            info!("Loaded .env file");
        }

        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(BASE_URL)
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing(BASE_URL))?;

        let target_hours = match lookup(TARGET_HOURS) {
            Some(value) => parse_target_hours(&value)?,
            None => DEFAULT_TARGET_HOURS.to_vec(),
        };

        let venue_zone = match lookup(VENUE_TZ) {
            Some(value) => value
                .trim()
                .parse::<Tz>()
                .map(VenueZone::Named)
                .map_err(|_| invalid(VENUE_TZ, &value, "unknown time zone"))?,
            None => VenueZone::System,
        };

        let feed_timeout = match lookup(FEED_TIMEOUT_SECS) {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(invalid(FEED_TIMEOUT_SECS, &value, "expected a positive number of seconds")),
            },
            None => Duration::from_secs(DEFAULT_FEED_TIMEOUT_SECS),
        };

        let address = lookup(BIND_ADDRESS).unwrap_or_else(|| DEFAULT_ADDRESS.to_string());

        Ok(Config {
            base_url,
            address,
            target_hours,
            venue_zone,
            feed_timeout,
        })
    }
}

fn parse_target_hours(value: &str) -> Result<Vec<u32>, ConfigError> {
    let mut hours: Vec<u32> = Vec::new();

    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let hour = match part.parse::<u32>() {
            Ok(hour) if hour <= 23 => hour,
            _ => return Err(invalid(TARGET_HOURS, value, "hours must be between 0 and 23")),
        };

        if !hours.contains(&hour) {
            hours.push(hour);
        }
    }

    if hours.is_empty() {
        return Err(invalid(TARGET_HOURS, value, "at least one hour is required"));
    }

    Ok(hours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn base_url_is_required() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::Missing("BASE_URL"));
        assert_eq!(load(&[("BASE_URL", "  ")]).unwrap_err(), ConfigError::Missing("BASE_URL"));
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[("BASE_URL", "https://courts.example.com/")]).unwrap();

        assert_eq!(config.base_url, "https://courts.example.com");
        assert_eq!(config.target_hours, vec![17, 18]);
        assert_eq!(config.venue_zone, VenueZone::System);
        assert_eq!(config.feed_timeout, Duration::from_secs(10));
        assert_eq!(config.address, DEFAULT_ADDRESS);
    }

    #[test]
    fn overrides_are_read() {
        let config = load(&[
            ("BASE_URL", "http://localhost:9000"),
            ("TARGET_HOURS", "19, 18,19"),
            ("VENUE_TZ", "Europe/London"),
            ("FEED_TIMEOUT_SECS", "3"),
            ("BIND_ADDRESS", "0.0.0.0:9999"),
        ])
        .unwrap();

        assert_eq!(config.target_hours, vec![19, 18]);
        assert_eq!(config.venue_zone, VenueZone::Named(chrono_tz::Europe::London));
        assert_eq!(config.feed_timeout, Duration::from_secs(3));
        assert_eq!(config.address, "0.0.0.0:9999");
    }

    #[test]
    fn bad_values_are_rejected() {
        let base = ("BASE_URL", "http://localhost");

        assert!(matches!(
            load(&[base, ("TARGET_HOURS", "17,24")]),
            Err(ConfigError::Invalid { name: "TARGET_HOURS", .. })
        ));
        assert!(matches!(
            load(&[base, ("TARGET_HOURS", ",")]),
            Err(ConfigError::Invalid { name: "TARGET_HOURS", .. })
        ));
        assert!(matches!(
            load(&[base, ("VENUE_TZ", "Mars/Olympus")]),
            Err(ConfigError::Invalid { name: "VENUE_TZ", .. })
        ));
        assert!(matches!(
            load(&[base, ("FEED_TIMEOUT_SECS", "0")]),
            Err(ConfigError::Invalid { name: "FEED_TIMEOUT_SECS", .. })
        ));
    }
}
