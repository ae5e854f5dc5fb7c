//! Dzen article extraction.
//!
//! An article page carries its title in `og:title` and its publication date
//! in `meta[itemprop=datePublished]`. The body lives in the primary article
//! container (`aria-label="Статья 1"`), inside its `itemprop=articleBody`
//! element. That element's markup is captured and passed through
//! [`canonicalize_media_blocks`].

use super::canonicalize::canonicalize_media_blocks;
use super::{load_page, meta_content};
use crate::browser::{PageElement, RenderedPage};
use crate::config::CrawlSettings;
use crate::error::{Result, ScrapeError};
use crate::models::{ArticleRecord, CanonicalUrl};
use chrono::NaiveDate;
use tracing::{info, instrument};

pub const TITLE_META: &str = r#"meta[property="og:title"]"#;
pub const DATE_META: &str = r#"meta[itemprop="datePublished"]"#;
pub const ARTICLE_ROOT_SELECTOR: &str = r#"div[aria-label="Статья 1"]"#;
pub const ARTICLE_BODY_SELECTOR: &str = r#"div[itemprop="articleBody"]"#;

/// Parse the calendar date at the start of a `datePublished` value.
///
/// Accepts both `2024-01-15` and full timestamps such as
/// `2024-01-15T09:30:00+03:00`; the time of day is discarded.
pub fn parse_published_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}

#[derive(Debug)]
pub struct ArticleExtractor<'a> {
    settings: &'a CrawlSettings,
}

impl<'a> ArticleExtractor<'a> {
    pub fn new(settings: &'a CrawlSettings) -> Self {
        Self { settings }
    }

    /// Load one article and build its record.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::PageLoad`] if the page does not render in time
    /// - [`ScrapeError::MetadataMissing`] if the title or date is absent or the
    ///   date is not a calendar date
    /// - [`ScrapeError::ContentNotFound`] if the article body does not appear
    ///   within `content_timeout`
    #[instrument(level = "info", skip_all, fields(url = %url))]
    pub async fn extract<P: RenderedPage>(&self, page: &mut P, url: &CanonicalUrl) -> Result<ArticleRecord> {
        let href = url.as_str();
        load_page(page, href, self.settings).await?;

        let title = meta_content(page, TITLE_META)
            .await?
            .ok_or_else(|| ScrapeError::metadata_missing("og:title", href))?;
        let published_date = meta_content(page, DATE_META)
            .await?
            .as_deref()
            .and_then(parse_published_date)
            .ok_or_else(|| ScrapeError::metadata_missing("datePublished", href))?;

        let root = page
            .wait_for(ARTICLE_ROOT_SELECTOR, self.settings.content_timeout)
            .await?
            .ok_or_else(|| ScrapeError::content_not_found(href))?;
        let body = root
            .find(ARTICLE_BODY_SELECTOR)
            .await?
            .ok_or_else(|| ScrapeError::content_not_found(href))?;

        let captured = body.outer_html().await?;
        let content_markup = canonicalize_media_blocks(&captured);
        info!(%title, %published_date, bytes = content_markup.len(), "Extracted article");

        Ok(ArticleRecord {
            source_url: url.clone(),
            title,
            published_date,
            content_markup,
        })
    }
}
