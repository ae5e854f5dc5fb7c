//! Feed building: discovery, fan-out extraction, RSS assembly.
//!
//! The pipeline mirrors the scrapers' two phases:
//!
//! 1. **Indexing**: one session crawls the channel's articles tab
//! 2. **Fetching**: every discovered link is extracted on its own session,
//!    at most `workers` at a time; failures are logged and skipped
//! 3. **Output**: the surviving articles, in discovery order, become RSS
//!
//! A failure in step 1 fails the whole build. A failure in step 2 only drops
//! that article. Every session is released before its step returns.

use crate::browser::{release, Browser};
use crate::config::CrawlSettings;
use crate::error::{Result, ScrapeError};
use crate::models::{ArticleRecord, CanonicalUrl, ChannelRecord};
use crate::outputs::rss;
use crate::scrapers::article::ArticleExtractor;
use crate::scrapers::channel::ChannelCrawler;
use crate::utils::articles_tab_url;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Crawl a channel on a fresh session.
///
/// # Arguments
///
/// * `browser` - Source of isolated page sessions
/// * `channel_url` - Channel URL as given by the user; `tab=articles` is
///   added when missing
/// * `settings` - Crawl tuning, including the optional `article_limit`
///
/// # Returns
///
/// The channel's metadata and its deduplicated article links in discovery
/// order. The session is closed before this returns, whatever the outcome.
///
/// # Errors
///
/// * [`ScrapeError::PageLoad`] if the channel page never renders
/// * [`ScrapeError::MetadataMissing`] if `og:title` or `og:image` is absent
/// * [`ScrapeError::Browser`] if no session can be opened
#[instrument(level = "info", skip_all, fields(%channel_url))]
pub async fn discover_channel<B: Browser>(
    browser: &B,
    channel_url: &str,
    settings: &CrawlSettings,
) -> Result<ChannelRecord> {
    let url = articles_tab_url(channel_url);
    let mut page = browser.open_page().await?;
    let result = ChannelCrawler::new(settings).discover(&mut page, &url).await;
    release(page).await;
    result
}

/// Extract one article on a fresh session.
///
/// # Errors
///
/// * [`ScrapeError::PageLoad`] if the article page never renders
/// * [`ScrapeError::MetadataMissing`] if the title or date is absent or the
///   date is not a calendar date
/// * [`ScrapeError::ContentNotFound`] if the article body never appears
///
/// The session is closed on every path.
pub async fn extract_article<B: Browser>(
    browser: &B,
    url: &CanonicalUrl,
    settings: &CrawlSettings,
) -> Result<ArticleRecord> {
    let mut page = browser.open_page().await?;
    let result = ArticleExtractor::new(settings).extract(&mut page, url).await;
    release(page).await;
    result
}

async fn extract_or_skip<B: Browser>(browser: &B, url: CanonicalUrl, settings: &CrawlSettings) -> Option<ArticleRecord> {
    match extract_article(browser, &url, settings).await {
        Ok(article) => Some(article),
        Err(e) => {
            warn!(%url, error = %e, "Article extraction failed; omitting from feed");
            None
        }
    }
}

/// Extract every link with bounded concurrency.
///
/// At most `settings.workers` sessions are open at once. An article that
/// fails is logged at `warn` and left out; it never aborts the batch.
///
/// # Arguments
///
/// * `browser` - Source of isolated page sessions, one per link
/// * `links` - Canonical article URLs, usually from [`discover_channel`]
/// * `settings` - Crawl tuning; `workers` bounds the concurrency
///
/// # Returns
///
/// The successfully extracted articles, in the same order as `links`.
#[instrument(level = "info", skip_all, fields(count = links.len(), workers = settings.workers))]
pub async fn fetch_articles<B: Browser>(
    browser: &B,
    links: &[CanonicalUrl],
    settings: &CrawlSettings,
) -> Vec<ArticleRecord> {
    let articles: Vec<ArticleRecord> = stream::iter(links.to_vec())
        .map(|url| extract_or_skip(browser, url, settings))
        .buffered(settings.workers.max(1))
        .filter_map(std::future::ready)
        .collect()
        .await;

    info!(
        total = links.len(),
        successful = articles.len(),
        failed = links.len() - articles.len(),
        "Fetched article contents"
    );
    articles
}

/// Build the complete RSS document for a channel.
///
/// Runs [`discover_channel`], then [`fetch_articles`] over the discovered
/// links, then assembles RSS 2.0 stamped with the current time.
///
/// # Errors
///
/// Any error from [`discover_channel`] fails the whole build, as does a
/// [`ScrapeError::Feed`] from XML assembly. Article-level failures only
/// shrink the feed.
#[instrument(level = "info", skip_all, fields(%channel_url))]
pub async fn build_feed<B: Browser>(browser: &B, channel_url: &str, settings: &CrawlSettings) -> Result<String> {
    let start = Instant::now();

    let channel = discover_channel(browser, channel_url, settings).await?;
    info!(count = channel.article_links.len(), "Found articles; fetching details");

    let articles = fetch_articles(browser, &channel.article_links, settings).await;
    let xml = rss::assemble(&channel, &articles, Utc::now()).map_err(ScrapeError::Feed)?;

    info!(
        articles = articles.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Feed built"
    );
    Ok(xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{fast_settings, FakeBrowser, FakeDocument, FakeElement};

    const CHANNEL: &str = "https://dzen.ru/tourister";
    const CHANNEL_TAB: &str = "https://dzen.ru/tourister?tab=articles";

    fn site() -> FakeBrowser {
        let channel = FakeDocument::channel("Tourister", "https://avatars.dzen.ru/t.jpg")
            .batch(vec![
                FakeElement::row("zen-row-1", &["https://dzen.ru/a/GOOD1?from=feed"]),
                FakeElement::row("zen-row-2", &["https://dzen.ru/a/BROKEN"]),
            ])
            .batch(vec![FakeElement::row("zen-row-3", &["/a/GOOD2"])]);
        let body = |text: &str| format!(r#"<div itemprop="articleBody"><p>{text}</p></div>"#);
        let broken = FakeDocument::new()
            .element(crate::scrapers::article::TITLE_META, FakeElement::meta("Broken"))
            .element(crate::scrapers::article::DATE_META, FakeElement::meta("2024-02-01"));

        FakeBrowser::new(vec![
            (CHANNEL_TAB, channel),
            ("https://dzen.ru/a/GOOD1", FakeDocument::article("First", "2024-01-15", &body("one"))),
            ("https://dzen.ru/a/BROKEN", broken),
            ("https://dzen.ru/a/GOOD2", FakeDocument::article("Second", "2024-01-20", &body("two"))),
        ])
    }

    #[tokio::test]
    async fn test_failed_article_is_isolated() {
        let browser = site();
        let settings = fast_settings();
        let channel = discover_channel(&browser, CHANNEL, &settings).await.unwrap();
        assert_eq!(channel.url, CHANNEL_TAB);
        assert_eq!(channel.article_links.len(), 3);

        let articles = fetch_articles(&browser, &channel.article_links, &settings).await;
        let titles: Vec<_> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
        assert_eq!(articles[0].content_markup, r#"<div itemprop="articleBody"><p>one</p></div>"#);
    }

    #[tokio::test]
    async fn test_every_session_is_released() {
        let browser = site();
        build_feed(&browser, CHANNEL, &fast_settings()).await.unwrap();
        // One channel session plus one per article, the failing one included.
        assert_eq!(browser.opened(), 4);
        assert_eq!(browser.closed(), 4);
    }

    #[tokio::test]
    async fn test_build_feed_contains_only_successful_articles() {
        let xml = build_feed(&site(), CHANNEL, &fast_settings()).await.unwrap();
        assert!(xml.contains("<title>Tourister</title>"));
        assert!(xml.contains("<guid>https://dzen.ru/a/GOOD1</guid>"));
        assert!(xml.contains("<guid>https://dzen.ru/a/GOOD2</guid>"));
        assert!(!xml.contains("BROKEN"));
        assert!(xml.find("GOOD1").unwrap() < xml.find("GOOD2").unwrap());
    }

    #[tokio::test]
    async fn test_channel_failure_fails_build_and_releases_session() {
        let browser = FakeBrowser::new(vec![(CHANNEL_TAB, FakeDocument::new())]);
        let err = build_feed(&browser, CHANNEL, &fast_settings()).await.unwrap_err();
        assert!(matches!(err, ScrapeError::MetadataMissing { descriptor: "og:title", .. }));
        assert_eq!(browser.opened(), 1);
        assert_eq!(browser.closed(), 1);
    }

    #[tokio::test]
    async fn test_article_limit_caps_feed() {
        let settings = CrawlSettings { article_limit: Some(1), ..fast_settings() };
        let browser = site();
        let xml = build_feed(&browser, CHANNEL, &settings).await.unwrap();
        assert_eq!(xml.matches("<item>").count(), 1);
        assert_eq!(browser.opened(), 2);
    }
}
