//! Data models for discovered channels and extracted articles.
//!
//! - [`CanonicalUrl`]: the identity of an article, `scheme://host/a/<id>`
//! - [`ChannelRecord`]: channel metadata plus the ordered article index
//! - [`ArticleRecord`]: one article's title, date and canonicalized body
//!
//! All three are built once and never mutated afterwards, so they serialize
//! straight to JSON for the `channel` and `article` commands.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

static ARTICLE_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/a/([^/?#]+)").unwrap());

/// An article URL reduced to `scheme://host[:port]/a/<opaque-id>`.
///
/// Query strings, fragments and any path segments after the id are dropped,
/// so two raw links to the same article compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalUrl(String);

impl CanonicalUrl {
    /// Normalize `raw` if it has the article-URL shape.
    ///
    /// # Arguments
    ///
    /// * `raw` - An `href` as found in the page, absolute or relative
    /// * `base` - The page URL relative links resolve against; `None` when
    ///   `raw` must already be absolute
    ///
    /// # Returns
    ///
    /// `Some` canonical URL keeping scheme, host, port and the id segment.
    /// `None` for anything that is not an `http(s)` link to `/a/<id>`,
    /// including links that fail to parse or resolve.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let url = CanonicalUrl::parse("https://dzen.ru/a/ID1?from=feed", None).unwrap();
    /// assert_eq!(url.as_str(), "https://dzen.ru/a/ID1");
    ///
    /// let base = Url::parse("https://dzen.ru/tourister?tab=articles").unwrap();
    /// assert_eq!(CanonicalUrl::parse("/a/ID2", Some(&base)).unwrap().as_str(), "https://dzen.ru/a/ID2");
    /// assert!(CanonicalUrl::parse("https://dzen.ru/video/watch/1", None).is_none());
    /// ```
    pub fn parse(raw: &str, base: Option<&Url>) -> Option<Self> {
        let url = match base {
            Some(base) => base.join(raw).ok()?,
            None => Url::parse(raw).ok()?,
        };
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        let host = url.host_str()?;
        let id = ARTICLE_PATH.captures(url.path())?.get(1)?.as_str();

        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        Some(CanonicalUrl(format!("{}://{}/a/{}", url.scheme(), authority, id)))
    }

    /// The canonical form as a string slice, e.g. for an RSS `<guid>` or a
    /// navigation target.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Channel metadata and its article index, in first-discovered order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecord {
    /// The articles-tab URL the crawl actually ran against.
    pub url: String,
    /// From `og:title`.
    pub title: String,
    /// From `og:image`; used as the feed's `<image>`.
    pub image_url: String,
    /// Empty when the channel publishes no description.
    pub description: String,
    /// Each canonical URL at most once.
    pub article_links: Vec<CanonicalUrl>,
}

/// A single extracted article.
///
/// Serializes as:
///
/// ```json
/// {
///   "source_url": "https://dzen.ru/a/Z9khBocwVgufmUKF",
///   "title": "Куда поехать весной",
///   "published_date": "2024-03-15",
///   "content_markup": "<div itemprop=\"articleBody\">…</div>"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// The canonical URL the article was loaded from.
    pub source_url: CanonicalUrl,
    /// From `og:title`.
    pub title: String,
    /// The calendar date of `datePublished`; the time part is discarded.
    pub published_date: NaiveDate,
    /// The article body with media blocks reduced to bare `<img>` elements.
    pub content_markup: String,
}
