//! Command-line interface definitions for dzen_rss.
//!
//! Crawl tuning options are global, so they can be given before or after the
//! subcommand, and most can also come from environment variables.

use crate::config::{CrawlSettings, SettingsFile};
use crate::error::Result;
use clap::{Args, Parser, Subcommand};
use std::time::Duration;

/// Command-line arguments for dzen_rss.
///
/// # Examples
///
/// ```sh
/// # Write an RSS file for a channel
/// dzen_rss feed https://dzen.ru/tourister -o tourister.xml
///
/// # Dump the discovered article index as JSON
/// dzen_rss channel https://dzen.ru/tourister --limit 50
///
/// # Serve feeds over HTTP with a tuned crawl
/// dzen_rss --config crawl.yaml serve --bind 127.0.0.1:5000
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub crawl: CrawlArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Feed size used when neither `--limit` nor the config file sets one.
pub const DEFAULT_FEED_LIMIT: usize = 15;

/// Pick the article limit for the `feed` command.
///
/// # Arguments
///
/// * `flag` - The `--limit` value, if given
/// * `configured` - `article_limit` after defaults and the config file
///
/// # Returns
///
/// The flag when present, otherwise the configured limit, otherwise
/// [`DEFAULT_FEED_LIMIT`]. A feed is never unbounded.
pub fn feed_limit(flag: Option<usize>, configured: Option<usize>) -> usize {
    flag.or(configured).unwrap_or(DEFAULT_FEED_LIMIT)
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Crawl a channel and write its RSS feed to a file
    Feed {
        /// Channel URL, e.g. https://dzen.ru/tourister
        channel_url: String,

        /// Output file for the feed
        #[arg(short, long, default_value = "feed.xml")]
        output: String,

        /// Maximum number of articles to include [default: the configured
        /// `article_limit`, else 15]
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Crawl a channel and print its metadata and article links as JSON
    Channel {
        /// Channel URL, e.g. https://dzen.ru/tourister
        channel_url: String,

        /// Stop after this many article links
        #[arg(long)]
        limit: Option<usize>,

        /// Write the JSON to this file instead of stdout
        #[arg(short = 'o', long)]
        json_output: Option<String>,
    },
    /// Extract a single article and print it as JSON
    Article {
        /// Article URL, e.g. https://dzen.ru/a/Z9khBocwVgufmUKF
        article_url: String,
    },
    /// Serve feeds over HTTP at GET /?url=<channel>
    Serve {
        /// Address to listen on
        #[arg(long, env = "DZEN_RSS_BIND", default_value = "0.0.0.0:5000")]
        bind: String,
    },
}

/// Crawl tuning flags; anything left unset falls back to the config file,
/// then to the built-in defaults.
#[derive(Args, Debug, Default)]
pub struct CrawlArgs {
    /// Optional path to a YAML settings file
    #[arg(short, long, global = true, env = "DZEN_RSS_CONFIG")]
    pub config: Option<String>,

    /// Consecutive unproductive scroll cycles before discovery stops
    #[arg(long, global = true, env = "DZEN_RSS_FAILURE_THRESHOLD")]
    pub failure_threshold: Option<u32>,

    /// How long to wait for the page to grow after each scroll, in ms
    #[arg(long, global = true, env = "DZEN_RSS_HEIGHT_WAIT_MS")]
    pub height_wait_ms: Option<u64>,

    /// Pause after each scroll before checking for growth, in ms
    #[arg(long, global = true, env = "DZEN_RSS_SETTLE_DELAY_MS")]
    pub settle_delay_ms: Option<u64>,

    /// Interval between selector and height polls, in ms
    #[arg(long, global = true)]
    pub poll_interval_ms: Option<u64>,

    /// Bound on a page's initial load, in ms
    #[arg(long, global = true)]
    pub page_load_timeout_ms: Option<u64>,

    /// Bound on an article's content appearing, in ms
    #[arg(long, global = true)]
    pub content_timeout_ms: Option<u64>,

    /// Concurrent article extractions
    #[arg(short, long, global = true, env = "DZEN_RSS_WORKERS")]
    pub workers: Option<usize>,
}

impl CrawlArgs {
    /// Resolve defaults, the config file and these flags into settings.
    pub async fn resolve(&self) -> Result<CrawlSettings> {
        let mut settings = CrawlSettings::default();
        if let Some(path) = &self.config {
            settings = settings.merge(SettingsFile::load(path).await?);
        }
        self.apply(settings).validate()
    }

    fn apply(&self, mut settings: CrawlSettings) -> CrawlSettings {
        let ms = Duration::from_millis;
        if let Some(v) = self.failure_threshold {
            settings.failure_threshold = v;
        }
        if let Some(v) = self.height_wait_ms {
            settings.height_wait = ms(v);
        }
        if let Some(v) = self.settle_delay_ms {
            settings.settle_delay = ms(v);
        }
        if let Some(v) = self.poll_interval_ms {
            settings.poll_interval = ms(v);
        }
        if let Some(v) = self.page_load_timeout_ms {
            settings.page_load_timeout = ms(v);
        }
        if let Some(v) = self.content_timeout_ms {
            settings.content_timeout = ms(v);
        }
        if let Some(v) = self.workers {
            settings.workers = v;
        }
        settings
    }
}
