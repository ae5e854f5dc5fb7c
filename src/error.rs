//! Error taxonomy for channel discovery and article extraction.
//!
//! Wait timeouts are not errors by themselves: the crawler reads them as an
//! unproductive cycle and the extractor folds them into
//! [`ScrapeError::ContentNotFound`]. Everything that does surface is one of
//! the variants below.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    /// Navigation or the first render did not finish within the bound.
    #[error("page failed to load: {url} ({reason})")]
    PageLoad { url: String, reason: String },

    /// A required page-level descriptor (title, image, date) is absent or unusable.
    #[error("required metadata `{descriptor}` missing on {url}")]
    MetadataMissing { descriptor: &'static str, url: String },

    /// The article content subtree never appeared.
    #[error("article content not found on {url}")]
    ContentNotFound { url: String },

    /// The browser backend failed for a reason other than a timeout.
    #[error("browser error: {0}")]
    Browser(#[from] anyhow::Error),

    #[error("feed assembly failed: {0}")]
    Feed(anyhow::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ScrapeError {
    pub fn page_load(url: &str, reason: impl ToString) -> Self {
        ScrapeError::PageLoad {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn metadata_missing(descriptor: &'static str, url: &str) -> Self {
        ScrapeError::MetadataMissing {
            descriptor,
            url: url.to_string(),
        }
    }

    pub fn content_not_found(url: &str) -> Self {
        ScrapeError::ContentNotFound {
            url: url.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_missing_message_names_descriptor() {
        let err = ScrapeError::metadata_missing("og:image", "https://dzen.ru/tourister");
        assert_eq!(
            err.to_string(),
            "required metadata `og:image` missing on https://dzen.ru/tourister"
        );
    }

    #[test]
    fn test_browser_error_from_anyhow() {
        let err: ScrapeError = anyhow::anyhow!("tab crashed").into();
        assert!(matches!(err, ScrapeError::Browser(_)));
        assert_eq!(err.to_string(), "browser error: tab crashed");
    }
}
