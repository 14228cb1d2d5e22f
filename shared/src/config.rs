use crate::{Error, Result};
use std::time::Duration;
use tracing::warn;

pub struct Config {
    pub max_age: Duration,
    pub source_latency: Duration,
    pub source_jitter: Duration,
    pub event_capacity: usize,
}

impl Config {
    const DEFAULT_MAX_AGE_MS: u64 = 30_000;
    const DEFAULT_SOURCE_LATENCY_MS: u64 = 250;
    const DEFAULT_SOURCE_JITTER_MS: u64 = 100;
    const DEFAULT_EVENT_CAPACITY: usize = 256;

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup, falling back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            max_age: Duration::from_millis(read_or(
                &lookup,
                "PRICE_CACHE_MAX_AGE_MS",
                Self::DEFAULT_MAX_AGE_MS,
            )),
            source_latency: Duration::from_millis(read_or(
                &lookup,
                "PRICE_SOURCE_LATENCY_MS",
                Self::DEFAULT_SOURCE_LATENCY_MS,
            )),
            source_jitter: Duration::from_millis(read_or(
                &lookup,
                "PRICE_SOURCE_JITTER_MS",
                Self::DEFAULT_SOURCE_JITTER_MS,
            )),
            event_capacity: read_or(
                &lookup,
                "PRICE_CACHE_EVENT_CAPACITY",
                Self::DEFAULT_EVENT_CAPACITY,
            ),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.event_capacity == 0 {
            return Err(Error::InvalidConfig(
                "event capacity must be greater than zero".to_string(),
            ));
        }
        if self.max_age.is_zero() {
            warn!("max age is zero, every lookup will go to the price source");
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn read_or<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            warn!("{name}='{raw}' is not a valid number, using default {default}");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::default();
        assert_eq!(config.max_age, Duration::from_secs(30));
        assert_eq!(config.source_latency, Duration::from_millis(250));
        assert_eq!(config.source_jitter, Duration::from_millis(100));
        assert_eq!(config.event_capacity, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn values_are_read_from_lookup() {
        let config = Config::from_lookup(lookup_from(&[
            ("PRICE_CACHE_MAX_AGE_MS", "1500"),
            ("PRICE_SOURCE_LATENCY_MS", " 10 "),
            ("PRICE_SOURCE_JITTER_MS", "0"),
            ("PRICE_CACHE_EVENT_CAPACITY", "8"),
        ]));
        assert_eq!(config.max_age, Duration::from_millis(1500));
        assert_eq!(config.source_latency, Duration::from_millis(10));
        assert_eq!(config.source_jitter, Duration::ZERO);
        assert_eq!(config.event_capacity, 8);
    }

    #[test]
    fn unparsable_values_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup_from(&[("PRICE_CACHE_MAX_AGE_MS", "soon")]));
        assert_eq!(config.max_age, Duration::from_secs(30));
    }

    #[test]
    fn zero_event_capacity_is_rejected() {
        let config = Config::from_lookup(lookup_from(&[("PRICE_CACHE_EVENT_CAPACITY", "0")]));
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }
}
