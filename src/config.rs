//! Crawl tuning parameters.
//!
//! Values come from three layers, later ones winning:
//!
//! 1. [`CrawlSettings::default`]
//! 2. an optional YAML file (see [`SettingsFile`]), durations in milliseconds
//! 3. command-line flags and environment variables (see `cli.rs`)
//!
//! # Example file
//!
//! ```yaml
//! failure_threshold: 12
//! height_wait_ms: 8000
//! settle_delay_ms: 2000
//! workers: 4
//! ```

use crate::error::{Result, ScrapeError};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, instrument};

/// Everything the crawler and extractor treat as tunable.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlSettings {
    /// Consecutive unproductive scroll cycles before discovery stops.
    pub failure_threshold: u32,
    /// Bound on waiting for the page height to grow after a scroll.
    pub height_wait: Duration,
    /// Pause after each scroll before height polling starts.
    pub settle_delay: Duration,
    /// Interval between polls of a selector or the page height.
    pub poll_interval: Duration,
    /// Bound on the initial render of a channel or article page.
    pub page_load_timeout: Duration,
    /// Bound on the article content container appearing.
    pub content_timeout: Duration,
    /// Stop discovery once this many links are known.
    pub article_limit: Option<usize>,
    /// Article extractions allowed in flight at once.
    pub workers: usize,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 10,
            height_wait: Duration::from_secs(5),
            settle_delay: Duration::from_secs(2),
            poll_interval: Duration::from_millis(250),
            page_load_timeout: Duration::from_secs(20),
            content_timeout: Duration::from_secs(10),
            article_limit: None,
            workers: 3,
        }
    }
}

/// On-disk form of [`CrawlSettings`]; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    pub failure_threshold: Option<u32>,
    pub height_wait_ms: Option<u64>,
    pub settle_delay_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub page_load_timeout_ms: Option<u64>,
    pub content_timeout_ms: Option<u64>,
    pub article_limit: Option<usize>,
    pub workers: Option<usize>,
}

impl SettingsFile {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| ScrapeError::Config(e.to_string()))
    }

    #[instrument(level = "info", skip_all, fields(%path))]
    pub async fn load(path: &str) -> Result<Self> {
        let yaml = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ScrapeError::Config(format!("cannot read {}: {}", path, e)))?;
        let file = Self::from_yaml(&yaml)?;
        info!("Loaded crawl settings file");
        Ok(file)
    }
}

impl CrawlSettings {
    /// Overlay the keys present in `file` onto `self`.
    pub fn merge(mut self, file: SettingsFile) -> Self {
        let ms = Duration::from_millis;
        if let Some(v) = file.failure_threshold {
            self.failure_threshold = v;
        }
        if let Some(v) = file.height_wait_ms {
            self.height_wait = ms(v);
        }
        if let Some(v) = file.settle_delay_ms {
            self.settle_delay = ms(v);
        }
        if let Some(v) = file.poll_interval_ms {
            self.poll_interval = ms(v);
        }
        if let Some(v) = file.page_load_timeout_ms {
            self.page_load_timeout = ms(v);
        }
        if let Some(v) = file.content_timeout_ms {
            self.content_timeout = ms(v);
        }
        if file.article_limit.is_some() {
            self.article_limit = file.article_limit;
        }
        if let Some(v) = file.workers {
            self.workers = v;
        }
        self
    }

    pub fn validate(self) -> Result<Self> {
        if self.failure_threshold == 0 {
            return Err(ScrapeError::Config("failure_threshold must be at least 1".into()));
        }
        if self.workers == 0 {
            return Err(ScrapeError::Config("workers must be at least 1".into()));
        }
        if self.poll_interval.is_zero() {
            return Err(ScrapeError::Config("poll_interval must be non-zero".into()));
        }
        Ok(self)
    }
}
