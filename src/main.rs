//! # dzen_rss
//!
//! Turns a Dzen channel into an RSS 2.0 feed. Dzen renders its channel and
//! article pages client-side, so everything is read through a headless
//! Chromium session rather than plain HTTP.
//!
//! ## Usage
//!
//! ```sh
//! dzen_rss feed https://dzen.ru/tourister -o tourister.xml
//! dzen_rss channel https://dzen.ru/tourister --limit 50 -o index.json
//! dzen_rss article https://dzen.ru/a/Z9khBocwVgufmUKF
//! dzen_rss serve --bind 0.0.0.0:5000
//! ```
//!
//! ## Architecture
//!
//! 1. **Discovery**: scroll the channel's articles tab until it stops
//!    yielding new article links (`scrapers::channel`)
//! 2. **Extraction**: open each article on its own session and pull its
//!    title, date and normalized body (`scrapers::article`)
//! 3. **Output**: assemble RSS (`outputs::rss`) or dump JSON (`outputs::json`)
//!
//! The `serve` command runs the same pipeline per request behind
//! `GET /?url=<channel>`.

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod browser;
mod cli;
mod config;
mod error;
mod feed;
mod models;
mod outputs;
mod scrapers;
mod server;
mod utils;

#[cfg(test)]
mod test_utils;

use browser::chromium::ChromiumBrowser;
use cli::{feed_limit, Cli, Command};
use config::CrawlSettings;
use models::CanonicalUrl;
use outputs::json;
use utils::{ensure_writable_parent, truncate_for_log};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = Instant::now();
    info!("dzen_rss starting up");

    let args = Cli::parse();
    debug!(command = ?args.command, "Parsed CLI arguments");

    let settings = match args.crawl.resolve().await {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "Invalid crawl settings");
            return Err(e.into());
        }
    };
    debug!(?settings, "Resolved crawl settings");

    // Fail before launching Chromium if the feed can't be written anyway.
    if let Command::Feed { output, .. } = &args.command {
        if let Err(e) = ensure_writable_parent(output).await {
            error!(path = %output, error = %e, "Output directory is not writable");
            return Err(e);
        }
    }

    let browser = Arc::new(ChromiumBrowser::launch().await?);
    let result = run(args.command, Arc::clone(&browser), settings).await;

    match Arc::try_unwrap(browser) {
        Ok(browser) => {
            if let Err(e) = browser.shutdown().await {
                warn!(error = %e, "Chromium did not shut down cleanly");
            }
        }
        Err(_) => warn!("Browser still shared at exit; skipping shutdown"),
    }

    match &result {
        Ok(()) => info!(elapsed_ms = start_time.elapsed().as_millis() as u64, "dzen_rss finished"),
        Err(e) => error!(error = %e, elapsed_ms = start_time.elapsed().as_millis() as u64, "dzen_rss failed"),
    }
    result
}

async fn run(command: Command, browser: Arc<ChromiumBrowser>, mut settings: CrawlSettings) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Feed { channel_url, output, limit } => {
            settings.article_limit = Some(feed_limit(limit, settings.article_limit));
            let xml = feed::build_feed(browser.as_ref(), &channel_url, &settings).await?;
            tokio::fs::write(&output, xml).await?;
            info!(path = %output, "Wrote RSS feed");
        }
        Command::Channel { channel_url, limit, json_output } => {
            if limit.is_some() {
                settings.article_limit = limit;
            }
            let channel = feed::discover_channel(browser.as_ref(), &channel_url, &settings).await?;
            info!(title = %channel.title, count = channel.article_links.len(), "Channel discovered");
            json::write_record(&channel, json_output.as_deref()).await?;
        }
        Command::Article { article_url } => {
            let Some(url) = CanonicalUrl::parse(&article_url, None) else {
                error!(%article_url, "Not a Dzen article URL");
                return Err(format!("not a Dzen article URL: {}", article_url).into());
            };
            let article = feed::extract_article(browser.as_ref(), &url, &settings).await?;
            debug!(content_preview = %truncate_for_log(&article.content_markup, 300), "Extracted article body");
            json::write_record(&article, None).await?;
        }
        Command::Serve { bind } => {
            let state = server::AppState {
                browser,
                settings: Arc::new(settings),
            };
            server::serve(&bind, state).await?;
        }
    }
    Ok(())
}
