//! Channel discovery over Dzen's infinite-scroll article list.
//!
//! The articles tab renders entries as `div#zen-row-N` containers and only
//! appends more when the window is scrolled. There is no total count and no
//! "has more" flag, so the crawl runs scroll-and-scan cycles and stops after
//! [`CrawlSettings::failure_threshold`] consecutive cycles in which neither
//! the link set nor the page height grew.
//!
//! Two dedup layers are needed. Rows are re-rendered at different scroll
//! offsets, so rows already scanned are skipped by id. A single row can also
//! carry several anchors to the same article (thumbnail and title), so links
//! are deduplicated again by [`CanonicalUrl`].

use super::{load_page, meta_content, page_height, wait_for_growth};
use crate::browser::{PageElement, RenderedPage};
use crate::config::CrawlSettings;
use crate::error::{Result, ScrapeError};
use crate::models::{CanonicalUrl, ChannelRecord};
use std::collections::HashSet;
use tracing::{debug, info, instrument, trace};
use url::Url;

pub const ROW_SELECTOR: &str = r#"div[id^="zen-row-"]"#;
pub const TITLE_META: &str = r#"meta[property="og:title"]"#;
pub const IMAGE_META: &str = r#"meta[property="og:image"]"#;
pub const DESCRIPTION_META: &str = r#"meta[property="og:description"]"#;
const LINK_SELECTOR: &str = "a";

/// Runs one channel discovery per call against a caller-owned page session.
#[derive(Debug)]
pub struct ChannelCrawler<'a> {
    settings: &'a CrawlSettings,
}

impl<'a> ChannelCrawler<'a> {
    pub fn new(settings: &'a CrawlSettings) -> Self {
        Self { settings }
    }

    /// Load `channel_url`, read its metadata and enumerate its articles.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::PageLoad`] if the page does not render in time
    /// - [`ScrapeError::MetadataMissing`] if `og:title` or `og:image` is absent
    #[instrument(level = "info", skip_all, fields(%channel_url))]
    pub async fn discover<P: RenderedPage>(&self, page: &mut P, channel_url: &str) -> Result<ChannelRecord> {
        let base = Url::parse(channel_url).map_err(|e| ScrapeError::page_load(channel_url, e))?;
        load_page(page, channel_url, self.settings).await?;

        let title = meta_content(page, TITLE_META)
            .await?
            .ok_or_else(|| ScrapeError::metadata_missing("og:title", channel_url))?;
        let image_url = meta_content(page, IMAGE_META)
            .await?
            .ok_or_else(|| ScrapeError::metadata_missing("og:image", channel_url))?;
        let description = meta_content(page, DESCRIPTION_META).await?.unwrap_or_default();
        info!(%title, "Read channel metadata");

        let mut discovery = Discovery::new(base, self.settings.article_limit);
        let mut failures = 0u32;
        let mut cycles = 0usize;

        while failures < self.settings.failure_threshold {
            cycles += 1;
            let previous_height = page_height(page).await?;
            let new_links = discovery.scan(page).await?;

            if discovery.limit_reached() {
                info!(limit = ?self.settings.article_limit, "Article limit reached");
                break;
            }

            page.scroll_to_bottom().await?;
            let grew = wait_for_growth(page, previous_height, self.settings).await?;

            if new_links > 0 {
                failures = 0;
            }
            if new_links == 0 || !grew {
                failures += 1;
            }
            debug!(cycle = cycles, new_links, grew, failures, total = discovery.links.len(), "Scroll cycle finished");
        }

        info!(cycles, articles = discovery.links.len(), "Channel discovery complete");
        Ok(ChannelRecord {
            url: channel_url.to_string(),
            title,
            image_url,
            description,
            article_links: discovery.links,
        })
    }
}

/// Per-crawl state; owned by exactly one `discover` call.
struct Discovery {
    base: Url,
    seen_rows: HashSet<String>,
    known: HashSet<CanonicalUrl>,
    links: Vec<CanonicalUrl>,
    limit: Option<usize>,
}

impl Discovery {
    fn new(base: Url, limit: Option<usize>) -> Self {
        Self {
            base,
            seen_rows: HashSet::new(),
            known: HashSet::new(),
            links: Vec::new(),
            limit,
        }
    }

    fn limit_reached(&self) -> bool {
        self.limit.is_some_and(|limit| self.links.len() >= limit)
    }

    /// Record a link if it is an article URL not seen before.
    fn push_link(&mut self, href: &str) -> bool {
        if self.limit_reached() {
            return false;
        }
        match CanonicalUrl::parse(href, Some(&self.base)) {
            Some(url) if self.known.insert(url.clone()) => {
                self.links.push(url);
                true
            }
            _ => false,
        }
    }

    /// Scan every rendered row not scanned before; returns the number of
    /// links appended.
    async fn scan<P: RenderedPage>(&mut self, page: &P) -> Result<usize> {
        let before = self.links.len();
        for row in page.query_all(ROW_SELECTOR).await? {
            if self.limit_reached() {
                break;
            }
            let Some(row_id) = row.attribute("id").await? else {
                continue;
            };
            if !self.seen_rows.insert(row_id.clone()) {
                continue;
            }
            for link in row.find_all(LINK_SELECTOR).await? {
                if let Some(href) = link.attribute("href").await? {
                    if self.push_link(&href) {
                        trace!(%row_id, %href, "Discovered article");
                    }
                }
            }
        }
        Ok(self.links.len() - before)
    }
}
