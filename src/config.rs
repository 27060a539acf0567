// Copyright (c) 2025 - Cowboy AI, Inc.
//! Runtime configuration
//!
//! | Variable | Default | Field |
//! |---|---|---|
//! | `TG_DATA_DIR` | `./data` | `data_dir` |
//! | `TG_OBJECT_ROOT` | `./buckets` | `object_store_root` |
//! | `TG_OBJECT_REGION` | `us-east-1` | `object_store_region` |
//! | `TG_REGISTRY_TIMEOUT` | `30` | `registry_timeout_secs` |
//! | `TG_STORE_INIT_TIMEOUT` | `10` | `store_init_timeout_secs` |

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{TerragruntError, TerragruntResult};
use crate::registry::http::HttpOptions;
use crate::service::DEFAULT_BUCKET_REGION;

/// Process configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding one JSON file per entity collection
    pub data_dir: PathBuf,
    /// Root directory of the file-system object store
    pub object_store_root: PathBuf,
    /// Bucket region for regions without a code
    #[serde(default = "default_region")]
    pub object_store_region: String,
    /// Registry request timeout in seconds
    #[serde(default = "default_registry_timeout")]
    pub registry_timeout_secs: u64,
    /// Upper bound on the one-time object store initialization wait
    #[serde(default = "default_store_init_timeout")]
    pub store_init_timeout_secs: u64,
}

fn default_region() -> String {
    DEFAULT_BUCKET_REGION.to_string()
}

fn default_registry_timeout() -> u64 {
    30
}

fn default_store_init_timeout() -> u64 {
    10
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            object_store_root: PathBuf::from("./buckets"),
            object_store_region: default_region(),
            registry_timeout_secs: default_registry_timeout(),
            store_init_timeout_secs: default_store_init_timeout(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> TerragruntResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup; unset keys keep their default
    pub fn from_lookup<F>(lookup: F) -> TerragruntResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            data_dir: lookup("TG_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            object_store_root: lookup("TG_OBJECT_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.object_store_root),
            object_store_region: lookup("TG_OBJECT_REGION")
                .filter(|r| !r.is_empty())
                .unwrap_or(defaults.object_store_region),
            registry_timeout_secs: parse_secs(&lookup, "TG_REGISTRY_TIMEOUT")?
                .unwrap_or(defaults.registry_timeout_secs),
            store_init_timeout_secs: parse_secs(&lookup, "TG_STORE_INIT_TIMEOUT")?
                .unwrap_or(defaults.store_init_timeout_secs),
        })
    }

    pub fn store_init_timeout(&self) -> Duration {
        Duration::from_secs(self.store_init_timeout_secs)
    }

    pub fn registry_http(&self) -> HttpOptions {
        HttpOptions {
            timeout_secs: self.registry_timeout_secs,
        }
    }
}

fn parse_secs<F>(lookup: &F, key: &str) -> TerragruntResult<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim().parse::<u64>().map_err(|e| {
                TerragruntError::Configuration(format!("{} must be a number of seconds: {}", key, e))
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.store_init_timeout(), Duration::from_secs(10));
        assert_eq!(config.registry_http().timeout_secs, 30);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("TG_DATA_DIR", "/var/lib/tg"),
            ("TG_OBJECT_REGION", "eu-west-1"),
            ("TG_REGISTRY_TIMEOUT", " 5 "),
        ]))
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/tg"));
        assert_eq!(config.object_store_region, "eu-west-1");
        assert_eq!(config.registry_timeout_secs, 5);
    }

    #[test]
    fn test_invalid_timeout_is_configuration_error() {
        let err = AppConfig::from_lookup(lookup(&[("TG_STORE_INIT_TIMEOUT", "soon")])).unwrap_err();
        assert!(matches!(err, TerragruntError::Configuration(_)));
    }
}
