//! Dzen scrapers: channel discovery and article extraction.
//!
//! Dzen has no public API, so both scrapers work on a live rendered page
//! through the [`RenderedPage`](crate::browser::RenderedPage) capability.
//! Each follows the same two-phase pattern as the rest of the binary:
//!
//! 1. **Indexing** ([`channel`]): scroll the channel's articles tab until it
//!    stops growing and collect canonical article URLs
//! 2. **Fetching** ([`article`]): load each article, read its metadata and
//!    canonicalize its body markup ([`canonicalize`])
//!
//! Every browser wait in here is bounded. A timed-out wait comes back as a
//! value (`None` / `false`) for the caller to interpret.

pub mod article;
pub mod canonicalize;
pub mod channel;

use crate::browser::{PageElement, RenderedPage, SCROLL_HEIGHT_JS};
use crate::config::CrawlSettings;
use crate::error::{Result, ScrapeError};
use std::time::Duration;
use tracing::{debug, instrument};

/// Navigate and wait for the document body, both within `page_load_timeout`.
#[instrument(level = "debug", skip_all, fields(%url))]
pub(crate) async fn load_page<P: RenderedPage>(
    page: &mut P,
    url: &str,
    settings: &CrawlSettings,
) -> Result<()> {
    match tokio::time::timeout(settings.page_load_timeout, page.navigate(url)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(ScrapeError::page_load(url, e)),
        Err(_) => return Err(ScrapeError::page_load(url, "navigation timed out")),
    }

    match page.wait_for("body", settings.page_load_timeout).await? {
        Some(_) => Ok(()),
        None => Err(ScrapeError::page_load(url, "document body never rendered")),
    }
}

/// The `content` attribute of the first element matching a `<meta>` selector.
///
/// Blank values count as absent.
pub(crate) async fn meta_content<P: RenderedPage>(page: &P, selector: &str) -> Result<Option<String>> {
    let Some(meta) = page.query_all(selector).await?.into_iter().next() else {
        return Ok(None);
    };
    let content = meta.attribute("content").await?;
    Ok(content.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()))
}

/// Current scrollable height of the document, in CSS pixels.
pub(crate) async fn page_height<P: RenderedPage>(page: &P) -> Result<u64> {
    let value = page.evaluate(SCROLL_HEIGHT_JS).await?;
    Ok(value.as_f64().map(|h| h.max(0.0) as u64).unwrap_or(0))
}

/// Wait for the page height to exceed `previous`.
///
/// Sleeps `settle_delay` first, then polls every `poll_interval` for at most
/// `height_wait`. Returns `false` on timeout.
pub(crate) async fn wait_for_growth<P: RenderedPage>(
    page: &P,
    previous: u64,
    settings: &CrawlSettings,
) -> Result<bool> {
    if settings.settle_delay > Duration::ZERO {
        tokio::time::sleep(settings.settle_delay).await;
    }

    let poll = async {
        loop {
            let height = page_height(page).await?;
            if height > previous {
                debug!(previous, height, "Page height grew");
                return Ok::<_, ScrapeError>(());
            }
            tokio::time::sleep(settings.poll_interval).await;
        }
    };

    match tokio::time::timeout(settings.height_wait, poll).await {
        Ok(Ok(())) => Ok(true),
        Ok(Err(e)) => Err(e),
        Err(_) => Ok(false),
    }
}
