//! Feed configuration.
//!
//! Values are layered: built-in defaults, then an optional YAML file, then
//! whatever the caller (usually the CLI) overrides.  The file accepts either
//! `base_uri` or `api_endpoint` for the feed URL:
//!
//! ```yaml
//! api_key: 0123456789abcdef
//! base_uri: https://newsapi.org/v2/everything
//! poll_interval_secs: 5
//! fetch_timeout_secs: 10
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URI: &str = "https://newsapi.org/v2/everything";

/// Everything the adapter needs to talk to the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub api_key: String,
    pub base_uri: String,
    pub poll_interval: Duration,
    /// Upper bound on a single HTTP fetch.
    pub fetch_timeout: Duration,
    /// Articles buffered per subscriber before new ones are dropped.
    pub subscriber_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_uri: DEFAULT_BASE_URI.to_string(),
            poll_interval: crate::scheduler::DEFAULT_INTERVAL,
            fetch_timeout: Duration::from_secs(10),
            subscriber_capacity: 256,
        }
    }
}

/// On-disk shape of the config file.  Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    api_key: Option<String>,
    #[serde(alias = "api_endpoint")]
    base_uri: Option<String>,
    poll_interval_secs: Option<u64>,
    fetch_timeout_secs: Option<u64>,
    subscriber_capacity: Option<usize>,
}

impl FeedConfig {
    /// Defaults overlaid with the keys present in `yaml`.
    pub fn from_yaml_str(yaml: &str, origin: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = if yaml.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
                path: origin.to_string(),
                source,
            })?
        };

        let mut cfg = Self::default();
        if let Some(key) = file.api_key {
            cfg.api_key = key;
        }
        if let Some(uri) = file.base_uri {
            cfg.base_uri = uri;
        }
        if let Some(secs) = file.poll_interval_secs {
            cfg.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = file.fetch_timeout_secs {
            cfg.fetch_timeout = Duration::from_secs(secs);
        }
        if let Some(cap) = file.subscriber_capacity {
            cfg.subscriber_capacity = cap;
        }
        Ok(cfg)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&text, &path.display().to_string())
    }

    /// Fail early on a missing credential or a zero interval or timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroDuration { key: "poll_interval" });
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration { key: "fetch_timeout" });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = FeedConfig::default();
        assert_eq!(cfg.base_uri, DEFAULT_BASE_URI);
        assert_eq!(cfg.poll_interval, Duration::from_secs(5));
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(10));
    }

    #[test]
    fn yaml_overrides_defaults() {
        let cfg = FeedConfig::from_yaml_str(
            "api_key: abc\nbase_uri: http://localhost:8080/v2/everything\npoll_interval_secs: 30\n",
            "test.yaml",
        )
        .unwrap();

        assert_eq!(cfg.api_key, "abc");
        assert_eq!(cfg.base_uri, "http://localhost:8080/v2/everything");
        assert_eq!(cfg.poll_interval, Duration::from_secs(30));
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(10));
    }

    #[test]
    fn api_endpoint_is_an_alias_for_base_uri() {
        let cfg = FeedConfig::from_yaml_str(
            "api_key: abc\napi_endpoint: https://example.com/feed\n",
            "test.yaml",
        )
        .unwrap();
        assert_eq!(cfg.base_uri, "https://example.com/feed");
    }

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = FeedConfig::from_yaml_str("", "empty.yaml").unwrap();
        assert_eq!(cfg, FeedConfig::default());
    }

    #[test]
    fn unknown_key_is_a_parse_error() {
        let err = FeedConfig::from_yaml_str("apikey: abc\n", "typo.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { path, .. } if path == "typo.yaml"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = FeedConfig::from_yaml_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn validate_requires_api_key() {
        let mut cfg = FeedConfig::default();
        assert!(matches!(cfg.validate(), Err(ConfigError::MissingApiKey)));

        cfg.api_key = "  ".into();
        assert!(matches!(cfg.validate(), Err(ConfigError::MissingApiKey)));

        cfg.api_key = "abc".into();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_interval_and_timeout() {
        let cfg = FeedConfig::from_yaml_str("api_key: abc\npoll_interval_secs: 0\n", "t.yaml").unwrap();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ZeroDuration { key: "poll_interval" })
        ));

        let cfg = FeedConfig::from_yaml_str("api_key: abc\nfetch_timeout_secs: 0\n", "t.yaml").unwrap();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ZeroDuration { key: "fetch_timeout" })
        ));
    }
}
