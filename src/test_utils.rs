//! Scripted in-memory browser for exercising the scrapers without Chromium.
//!
//! A [`FakeBrowser`] serves [`FakeDocument`]s by URL. A document has static
//! elements keyed by the exact selector the scrapers query with, plus an
//! optional list of row batches that are revealed one at a time as the page
//! is scrolled, growing the reported height with each batch.

use crate::browser::{Browser, PageElement, RenderedPage, SCROLL_HEIGHT_JS, SCROLL_TO_BOTTOM_JS};
use crate::config::CrawlSettings;
use crate::scrapers::channel::ROW_SELECTOR;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const ROW_HEIGHT: u64 = 400;
const BASE_HEIGHT: u64 = 1000;

/// Settings with millisecond waits so scripted crawls finish instantly.
pub fn fast_settings() -> CrawlSettings {
    CrawlSettings {
        failure_threshold: 3,
        height_wait: Duration::from_millis(20),
        settle_delay: Duration::ZERO,
        poll_interval: Duration::from_millis(1),
        page_load_timeout: Duration::from_millis(50),
        content_timeout: Duration::from_millis(20),
        article_limit: None,
        workers: 2,
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    attrs: HashMap<String, String>,
    outer_html: String,
    children: HashMap<String, Vec<FakeElement>>,
}

impl FakeElement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn html(mut self, markup: &str) -> Self {
        self.outer_html = markup.to_string();
        self
    }

    pub fn child(mut self, selector: &str, element: FakeElement) -> Self {
        self.children.entry(selector.to_string()).or_default().push(element);
        self
    }

    /// `<meta content="...">`
    pub fn meta(content: &str) -> Self {
        Self::new().attr("content", content)
    }

    /// A listing row with the given id and one anchor per href.
    pub fn row(id: &str, hrefs: &[&str]) -> Self {
        hrefs
            .iter()
            .fold(Self::new().attr("id", id), |row, href| {
                row.child("a", FakeElement::new().attr("href", href))
            })
    }
}

#[async_trait]
impl PageElement for FakeElement {
    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(self.attrs.get(name).cloned())
    }

    async fn outer_html(&self) -> Result<String> {
        Ok(self.outer_html.clone())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Self>> {
        Ok(self.children.get(selector).cloned().unwrap_or_default())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeDocument {
    elements: HashMap<String, Vec<FakeElement>>,
    batches: Vec<Vec<FakeElement>>,
    stalled: bool,
}

impl FakeDocument {
    /// A document with a `<body>`, i.e. one that finishes loading.
    pub fn new() -> Self {
        Self::default().element("body", FakeElement::new())
    }

    /// A document whose body never renders.
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn element(mut self, selector: &str, element: FakeElement) -> Self {
        self.elements.entry(selector.to_string()).or_default().push(element);
        self
    }

    /// Rows rendered together; the first batch is visible on load, each
    /// scroll reveals the next one.
    pub fn batch(mut self, rows: Vec<FakeElement>) -> Self {
        self.batches.push(rows);
        self
    }

    /// Rows are revealed on scroll but the height never changes.
    pub fn stalled(mut self) -> Self {
        self.stalled = true;
        self
    }

    pub fn channel(title: &str, image: &str) -> Self {
        Self::new()
            .element(crate::scrapers::channel::TITLE_META, FakeElement::meta(title))
            .element(crate::scrapers::channel::IMAGE_META, FakeElement::meta(image))
    }

    pub fn article(title: &str, date: &str, body_html: &str) -> Self {
        use crate::scrapers::article::{ARTICLE_BODY_SELECTOR, ARTICLE_ROOT_SELECTOR, DATE_META, TITLE_META};
        let root = FakeElement::new().child(ARTICLE_BODY_SELECTOR, FakeElement::new().html(body_html));
        Self::new()
            .element(TITLE_META, FakeElement::meta(title))
            .element(DATE_META, FakeElement::meta(date))
            .element(ARTICLE_ROOT_SELECTOR, root)
    }
}

#[derive(Debug, Default)]
pub struct Counters {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub scans: AtomicUsize,
    pub scrolls: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct FakeBrowser {
    documents: Arc<HashMap<String, FakeDocument>>,
    pub counters: Arc<Counters>,
}

impl FakeBrowser {
    pub fn new(documents: Vec<(&str, FakeDocument)>) -> Self {
        Self {
            documents: Arc::new(
                documents
                    .into_iter()
                    .map(|(url, doc)| (url.to_string(), doc))
                    .collect(),
            ),
            counters: Arc::default(),
        }
    }

    pub fn opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    pub fn scans(&self) -> usize {
        self.counters.scans.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    type Page = FakePage;

    async fn open_page(&self) -> Result<FakePage> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakePage {
            documents: Arc::clone(&self.documents),
            counters: Arc::clone(&self.counters),
            current: None,
            revealed: Mutex::new(0),
        })
    }
}

pub struct FakePage {
    documents: Arc<HashMap<String, FakeDocument>>,
    counters: Arc<Counters>,
    current: Option<FakeDocument>,
    revealed: Mutex<usize>,
}

impl FakePage {
    fn document(&self) -> Result<&FakeDocument> {
        self.current.as_ref().ok_or_else(|| anyhow!("no page loaded"))
    }

    fn revealed(&self) -> usize {
        *self.revealed.lock().unwrap()
    }
}

#[async_trait]
impl RenderedPage for FakePage {
    type Element = FakeElement;

    const POLL_INTERVAL: Duration = Duration::from_millis(1);

    async fn navigate(&mut self, url: &str) -> Result<()> {
        let doc = self
            .documents
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("net::ERR_NAME_NOT_RESOLVED at {url}"))?;
        *self.revealed.lock().unwrap() = doc.batches.len().min(1);
        self.current = Some(doc);
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value> {
        let doc = self.document()?;
        match script {
            SCROLL_HEIGHT_JS => {
                let rows = if doc.stalled { doc.batches.len().min(1) } else { self.revealed() };
                Ok(Value::from(BASE_HEIGHT + ROW_HEIGHT * rows as u64))
            }
            SCROLL_TO_BOTTOM_JS => {
                self.counters.scrolls.fetch_add(1, Ordering::SeqCst);
                let mut revealed = self.revealed.lock().unwrap();
                if *revealed < doc.batches.len() {
                    *revealed += 1;
                }
                Ok(Value::Null)
            }
            other => Err(anyhow!("unexpected script: {other}")),
        }
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<FakeElement>> {
        let doc = self.document()?;
        if selector == ROW_SELECTOR {
            self.counters.scans.fetch_add(1, Ordering::SeqCst);
            return Ok(doc.batches[..self.revealed()].concat());
        }
        Ok(doc.elements.get(selector).cloned().unwrap_or_default())
    }

    async fn close(self) -> Result<()> {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
