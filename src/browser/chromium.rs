//! Headless Chromium backend using chromiumoxide.
//!
//! One Chromium process per [`ChromiumBrowser`]; every [`Browser::open_page`]
//! call opens a fresh tab, so concurrent extractions never share a current page.

use super::{Browser, PageElement, RenderedPage};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde_json::Value;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

/// Locate a Chrome/Chromium executable.
///
/// `DZEN_RSS_CHROMIUM_PATH` wins when it points at an existing file,
/// otherwise the usual binary names are looked up on `PATH`.
pub fn find_chromium() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("DZEN_RSS_CHROMIUM_PATH") {
        let path = PathBuf::from(p);
        if path.exists() {
            return Some(path);
        }
    }

    ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"]
        .iter()
        .find_map(|name| which::which(name).ok())
}

pub struct ChromiumBrowser {
    browser: CdpBrowser,
    handler: JoinHandle<()>,
}

impl ChromiumBrowser {
    /// Launch a headless Chromium instance.
    #[instrument(level = "info")]
    pub async fn launch() -> Result<Self> {
        let chrome_path = find_chromium()
            .context("Chromium not found; install it or set DZEN_RSS_CHROMIUM_PATH")?;
        info!(path = %chrome_path.display(), "Launching Chromium");

        let config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = CdpBrowser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "CDP handler event error");
                }
            }
        });

        Ok(Self { browser, handler })
    }

    /// Close the browser process and stop the CDP event loop.
    pub async fn shutdown(mut self) -> Result<()> {
        self.browser.close().await.context("failed to close Chromium")?;
        let _ = self.browser.wait().await;
        self.handler.abort();
        Ok(())
    }
}

#[async_trait]
impl Browser for ChromiumBrowser {
    type Page = ChromiumPage;

    async fn open_page(&self) -> Result<ChromiumPage> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("failed to open a new tab")?;
        Ok(ChromiumPage { page })
    }
}

/// A single Chromium tab.
pub struct ChromiumPage {
    page: Page,
}

#[async_trait]
impl RenderedPage for ChromiumPage {
    type Element = ChromiumElement;

    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("navigation to {url} failed"))?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("JS execution failed")?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ChromiumElement>> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .with_context(|| format!("query `{selector}` failed"))?;
        Ok(elements.into_iter().map(|element| ChromiumElement { element }).collect())
    }

    async fn close(self) -> Result<()> {
        self.page.close().await.context("failed to close tab")?;
        Ok(())
    }
}

pub struct ChromiumElement {
    element: Element,
}

#[async_trait]
impl PageElement for ChromiumElement {
    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.element
            .attribute(name)
            .await
            .with_context(|| format!("reading attribute `{name}` failed"))
    }

    async fn outer_html(&self) -> Result<String> {
        let html = self
            .element
            .outer_html()
            .await
            .context("reading outer HTML failed")?;
        Ok(html.unwrap_or_default())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Self>> {
        let elements = self
            .element
            .find_elements(selector)
            .await
            .with_context(|| format!("query `{selector}` failed"))?;
        Ok(elements.into_iter().map(|element| ChromiumElement { element }).collect())
    }
}
