use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use haru_core::Result;

/// Crawl progress and limits. Persisted as a JSON file that is rewritten in
/// full on every change; created with defaults on first access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Highest article number successfully ingested. Never decreases.
    pub last_crawled_number: u32,
    pub last_crawl_date: Option<DateTime<Utc>>,
    pub max_articles_per_month: usize,
    pub delay_between_requests: f64,
    /// How many ids past the last known one to probe for new content.
    pub auto_increment_limit: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            last_crawled_number: 1668,
            last_crawl_date: None,
            max_articles_per_month: 20,
            delay_between_requests: 1.0,
            auto_increment_limit: 50,
        }
    }
}

impl CrawlerConfig {
    /// Load from `path`; a missing or unreadable file yields defaults, which
    /// are written back so the next run finds them.
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(config) => return config,
                Err(e) => warn!(
                    path = %path.display(),
                    error = %e,
                    "invalid crawler config, rewriting defaults"
                ),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "failed to read crawler config"),
        }

        let config = Self::default();
        if let Err(e) = config.save(path) {
            error!(path = %path.display(), error = %e, "failed to write default crawler config");
        }
        config
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs_f64(self.delay_between_requests.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults_and_writes_them() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("crawler_config.json");

        let config = CrawlerConfig::load_or_default(&path);
        assert_eq!(config, CrawlerConfig::default());
        assert_eq!(config.last_crawled_number, 1668);
        assert_eq!(config.max_articles_per_month, 20);
        assert_eq!(config.auto_increment_limit, 50);
        assert!(config.last_crawl_date.is_none());
        // The defaults were persisted for the next run.
        assert!(path.exists());
    }

    #[test]
    fn saved_config_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("crawler_config.json");

        let mut config = CrawlerConfig::default();
        config.last_crawled_number = 1700;
        config.last_crawl_date = Some(Utc::now());
        config.save(&path).unwrap();

        let loaded = CrawlerConfig::load_or_default(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("crawler_config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let config = CrawlerConfig::load_or_default(&path);
        assert_eq!(config, CrawlerConfig::default());
    }

    #[test]
    fn missing_fields_fall_back_per_field() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("crawler_config.json");
        std::fs::write(&path, r#"{"last_crawled_number": 2000}"#).unwrap();

        let config = CrawlerConfig::load_or_default(&path);
        assert_eq!(config.last_crawled_number, 2000);
        assert_eq!(config.max_articles_per_month, 20);
    }

    #[test]
    fn negative_delay_is_clamped() {
        let config = CrawlerConfig {
            delay_between_requests: -1.0,
            ..Default::default()
        };
        assert_eq!(config.delay(), Duration::ZERO);
    }
}
