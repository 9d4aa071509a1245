//! Harness configuration loaded from YAML or JSON

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::capabilities::audio::{default_entries, CatalogEntry, MediaCatalog};
use crate::poller::PollConfig;

pub const DEFAULT_TEST_TIMEOUT_MS: u64 = 5_000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML in {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported config format for {path}, expected .yaml, .yml or .json")]
    UnsupportedFormat { path: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub default_timeout_ms: u64,
    pub filter: Option<String>,
    pub poll: PollSettings,
    pub fixtures: FixtureSettings,
    pub audio: AudioSettings,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: DEFAULT_TEST_TIMEOUT_MS,
            filter: None,
            poll: PollSettings::default(),
            fixtures: FixtureSettings::default(),
            audio: AudioSettings::default(),
        }
    }
}

impl HarnessConfig {
    /// Load from a `.yaml`, `.yml` or `.json` file
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let parse: fn(&str, &str) -> Result<Self, ConfigError> =
            match path.extension().and_then(|s| s.to_str()) {
                Some("yaml") | Some("yml") => Self::from_yaml,
                Some("json") => Self::from_json,
                _ => return Err(ConfigError::UnsupportedFormat { path: display }),
            };

        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Io {
                    path: display.clone(),
                    source,
                })?;
        parse(&content, &display)
    }

    pub fn from_yaml(content: &str, origin: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|source| ConfigError::Yaml {
            path: origin.to_string(),
            source,
        })
    }

    pub fn from_json(content: &str, origin: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|source| ConfigError::Json {
            path: origin.to_string(),
            source,
        })
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}

/// Poll interval and budget; `max_duration_ms` wins over `max_retries` when set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    pub interval_ms: u64,
    pub max_retries: u32,
    pub max_duration_ms: Option<u64>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_ms: 50,
            max_retries: 100,
            max_duration_ms: None,
        }
    }
}

impl PollSettings {
    pub fn to_poll_config(&self) -> PollConfig {
        let config = PollConfig::default().with_interval(Duration::from_millis(self.interval_ms));
        match self.max_duration_ms {
            Some(ms) => config.with_max_duration(Duration::from_millis(ms)),
            None => config.with_max_retries(self.max_retries),
        }
    }
}

/// Remote files and their expected properties for the download tests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureSettings {
    pub image_url: String,
    pub image_md5: String,
    pub image_size: u64,
    pub text_url: String,
    pub text_md5: String,
    pub text_contents: String,
    /// URL used when checking that downloads into escaped paths are refused
    pub escape_url: String,
    pub download_timeout_ms: u64,
}

impl Default for FixtureSettings {
    fn default() -> Self {
        Self {
            image_url: "https://s3-us-west-1.amazonaws.com/test-suite-data/avatar2.png".to_string(),
            image_md5: "1e02045c10b8f1145edc7c8375998f87".to_string(),
            image_size: 3230,
            text_url: "https://s3-us-west-1.amazonaws.com/test-suite-data/text-file.txt"
                .to_string(),
            text_md5: "86d73d2f11e507365f7ea8e7ec3cc4cb".to_string(),
            text_contents: "hello, world\nthis is a test file\n".to_string(),
            escape_url: "http://www.google.com".to_string(),
            download_timeout_ms: 9_000,
        }
    }
}

impl FixtureSettings {
    pub fn download_timeout(&self) -> Duration {
        Duration::from_millis(self.download_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub start_latency_ms: u64,
    pub catalog: Vec<CatalogEntry>,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            start_latency_ms: 30,
            catalog: default_entries(),
        }
    }
}

impl AudioSettings {
    pub fn start_latency(&self) -> Duration {
        Duration::from_millis(self.start_latency_ms)
    }

    pub fn media_catalog(&self) -> MediaCatalog {
        MediaCatalog::from_entries(self.catalog.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poller::PollBudget;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.default_timeout(), Duration::from_secs(5));
        assert_eq!(config.poll.to_poll_config(), PollConfig::default());
        assert_eq!(config.fixtures.image_size, 3230);
        assert_eq!(config.audio.media_catalog().len(), 2);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
default_timeout_ms: 2000
poll:
  interval_ms: 10
  max_duration_ms: 500
fixtures:
  text_url: "http://127.0.0.1:8080/text-file.txt"
"#;
        let config = HarnessConfig::from_yaml(yaml, "inline").unwrap();

        assert_eq!(config.default_timeout_ms, 2000);
        let poll = config.poll.to_poll_config();
        assert_eq!(poll.interval, Duration::from_millis(10));
        assert_eq!(poll.budget, PollBudget::MaxDuration(Duration::from_millis(500)));
        assert_eq!(config.fixtures.text_url, "http://127.0.0.1:8080/text-file.txt");
        assert_eq!(config.fixtures.text_md5, "86d73d2f11e507365f7ea8e7ec3cc4cb");
        assert_eq!(config.audio.start_latency_ms, 30);
    }

    #[test]
    fn test_zero_poll_interval_is_clamped() {
        let config = HarnessConfig::from_yaml("poll:\n  interval_ms: 0\n", "inline").unwrap();
        assert_eq!(
            config.poll.to_poll_config().interval,
            crate::poller::MIN_POLL_INTERVAL
        );
    }

    #[test]
    fn test_invalid_json_reports_origin() {
        let err = HarnessConfig::from_json("{ not json", "broken.json").unwrap_err();
        assert!(matches!(err, ConfigError::Json { ref path, .. } if path == "broken.json"));
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let err = HarnessConfig::from_file("settings.toml").await.unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
    }
}
