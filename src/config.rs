//! Configuration Module
//!
//! Handles loading and managing cache and server configuration from
//! environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheOptions;
use crate::error::{CacheError, Result};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of entries the cache can hold, 0 = unbounded
    pub max_entries: usize,
    /// Default TTL in milliseconds, 0 = entries never expire
    pub default_ttl: u64,
    /// Staleness check clock debounce window in milliseconds
    pub ttl_resolution: u64,
    /// Return stale values once instead of treating them as missing
    pub allow_stale: bool,
    /// Restart an entry's age on every read
    pub update_age_on_get: bool,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `DEFAULT_TTL` - Default TTL in milliseconds (default: 0, no expiry)
    /// - `TTL_RESOLUTION` - Clock debounce window in milliseconds (default: 1)
    /// - `ALLOW_STALE` - Serve stale values once (default: false)
    /// - `UPDATE_AGE_ON_GET` - Refresh age on read (default: false)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    ///
    /// Unset variables take their defaults; set but malformed ones are errors.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            max_entries: parse_var(
                &lookup,
                "MAX_ENTRIES",
                defaults.max_entries,
                CacheError::InvalidCapacity,
            )?,
            default_ttl: parse_var(
                &lookup,
                "DEFAULT_TTL",
                defaults.default_ttl,
                CacheError::InvalidTtl,
            )?,
            ttl_resolution: parse_var(
                &lookup,
                "TTL_RESOLUTION",
                defaults.ttl_resolution,
                CacheError::InvalidTtl,
            )?,
            allow_stale: parse_var(
                &lookup,
                "ALLOW_STALE",
                defaults.allow_stale,
                CacheError::InvalidRequest,
            )?,
            update_age_on_get: parse_var(
                &lookup,
                "UPDATE_AGE_ON_GET",
                defaults.update_age_on_get,
                CacheError::InvalidRequest,
            )?,
            server_port: parse_var(
                &lookup,
                "SERVER_PORT",
                defaults.server_port,
                CacheError::InvalidRequest,
            )?,
        })
    }

    /// Cache options described by this configuration.
    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions::new(self.max_entries)
            .with_ttl(Duration::from_millis(self.default_ttl))
            .with_ttl_resolution(Duration::from_millis(self.ttl_resolution))
            .with_allow_stale(self.allow_stale)
            .with_update_age_on_get(self.update_age_on_get)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            default_ttl: 0,
            ttl_resolution: 1,
            allow_stale: false,
            update_age_on_get: false,
            server_port: 3000,
        }
    }
}

fn parse_var<T, F, E>(lookup: &F, name: &str, default: T, err: E) -> Result<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
    E: FnOnce(String) -> CacheError,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| err(format!("{} has invalid value {:?}", name, raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_entries, 1000);
        assert_eq!(config.default_ttl, 0);
        assert_eq!(config.ttl_resolution, 1);
        assert!(!config.allow_stale);
        assert!(!config.update_age_on_get);
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_config_from_lookup_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_from_lookup_values() {
        let config = Config::from_lookup(lookup(&[
            ("MAX_ENTRIES", "0"),
            ("DEFAULT_TTL", "60000"),
            ("TTL_RESOLUTION", "0"),
            ("ALLOW_STALE", "true"),
            ("UPDATE_AGE_ON_GET", "true"),
            ("SERVER_PORT", "8080"),
        ]))
        .unwrap();

        assert_eq!(config.max_entries, 0);
        assert_eq!(config.default_ttl, 60_000);
        assert_eq!(config.ttl_resolution, 0);
        assert!(config.allow_stale);
        assert!(config.update_age_on_get);
        assert_eq!(config.server_port, 8080);
    }

    #[test]
    fn test_invalid_capacity() {
        for raw in ["-1", "1.5", "lots", ""] {
            let result = Config::from_lookup(lookup(&[("MAX_ENTRIES", raw)]));
            assert!(
                matches!(result, Err(CacheError::InvalidCapacity(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_invalid_ttl() {
        for raw in ["10.5", "-10", "banana", "inf"] {
            let result = Config::from_lookup(lookup(&[("DEFAULT_TTL", raw)]));
            assert!(
                matches!(result, Err(CacheError::InvalidTtl(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_invalid_flag() {
        let result = Config::from_lookup(lookup(&[("ALLOW_STALE", "maybe")]));
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[test]
    fn test_cache_options() {
        let config = Config {
            max_entries: 5,
            default_ttl: 250,
            ttl_resolution: 0,
            allow_stale: true,
            update_age_on_get: false,
            server_port: 3000,
        };

        let options = config.cache_options();
        assert_eq!(options.capacity, 5);
        assert_eq!(options.ttl, Duration::from_millis(250));
        assert_eq!(options.ttl_resolution, Duration::ZERO);
        assert!(options.allow_stale);
    }
}
