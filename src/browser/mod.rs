//! The rendered-page capability the scrapers run against.
//!
//! The crawler and extractor never talk to a browser directly. They use the
//! small surface below: navigate, wait for a selector, query, evaluate a
//! script, scroll, and read element attributes or markup. Any backend that
//! can satisfy it is substitutable; [`chromium`] is the one shipped.
//!
//! A [`Browser`] hands out isolated page sessions. Whoever opens a session
//! closes it with [`release`], on success and failure paths alike.

pub mod chromium;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

/// Expression yielding the scrollable height of the current document.
pub const SCROLL_HEIGHT_JS: &str = "document.body.scrollHeight";
/// Expression scrolling the window to the current bottom of the document.
pub const SCROLL_TO_BOTTOM_JS: &str = "window.scrollTo(0, document.body.scrollHeight)";

/// A live element handle inside a rendered page.
#[async_trait]
pub trait PageElement: Send + Sync + Sized {
    /// Read an attribute; `None` when the element does not carry it.
    async fn attribute(&self, name: &str) -> Result<Option<String>>;

    /// The element's markup including all descendants.
    async fn outer_html(&self) -> Result<String>;

    /// All descendants matching a CSS selector, in document order.
    async fn find_all(&self, selector: &str) -> Result<Vec<Self>>;

    /// The first descendant matching a CSS selector.
    async fn find(&self, selector: &str) -> Result<Option<Self>> {
        Ok(self.find_all(selector).await?.into_iter().next())
    }
}

/// One browser session showing one page at a time.
#[async_trait]
pub trait RenderedPage: Send + Sync + Sized {
    type Element: PageElement;

    /// How often [`RenderedPage::wait_for`] re-queries by default.
    const POLL_INTERVAL: Duration = Duration::from_millis(100);

    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Evaluate a JavaScript expression; `undefined` comes back as `Null`.
    async fn evaluate(&self, script: &str) -> Result<Value>;

    /// All elements matching a CSS selector, in document order.
    async fn query_all(&self, selector: &str) -> Result<Vec<Self::Element>>;

    /// Poll for the first element matching `selector`.
    ///
    /// Returns `Ok(None)` when the timeout elapses without a match; a
    /// timeout is a signal for the caller, not an error.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<Option<Self::Element>> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(element) = self.query_all(selector).await?.into_iter().next() {
                return Ok(Some(element));
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(Self::POLL_INTERVAL).await;
        }
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.evaluate(SCROLL_TO_BOTTOM_JS).await?;
        Ok(())
    }

    /// Tear the session down. Consumes the page so it cannot be reused.
    async fn close(self) -> Result<()>;
}

/// Something that can open isolated page sessions.
#[async_trait]
pub trait Browser: Send + Sync {
    type Page: RenderedPage;

    async fn open_page(&self) -> Result<Self::Page>;
}

/// Close a session, logging rather than propagating a failed close so the
/// caller's own result is never masked.
pub async fn release<P: RenderedPage>(page: P) {
    if let Err(e) = page.close().await {
        warn!(error = %e, "Failed to close browser session");
    }
}
