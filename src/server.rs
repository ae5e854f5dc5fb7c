//! HTTP endpoint serving feeds on demand.
//!
//! `GET /?url=<channel>[&limit=N]` crawls the channel and answers with the
//! RSS document. Channel-level failures become a plain-text 500; articles
//! that fail to extract are silently left out of the feed.

use crate::browser::Browser;
use crate::config::CrawlSettings;
use crate::feed::build_feed;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Shared state behind every request.
///
/// One browser process serves all requests; each request opens its own
/// sessions on it. `settings` is the resolved crawl configuration, copied
/// per request so `limit` can be overridden without touching other requests.
pub struct AppState<B> {
    pub browser: Arc<B>,
    pub settings: Arc<CrawlSettings>,
}

impl<B> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            browser: Arc::clone(&self.browser),
            settings: Arc::clone(&self.settings),
        }
    }
}

/// Query string of `GET /`.
#[derive(Debug, Deserialize)]
pub struct FeedParams {
    url: Option<String>,
    limit: Option<usize>,
}

/// Build the application router.
///
/// # Routes
///
/// * `GET /?url=<channel>[&limit=N]` - the channel's RSS feed
/// * `GET /health` - liveness check, always `ok`
///
/// # Examples
///
/// ```ignore
/// let app = router(AppState {
///     browser: Arc::new(ChromiumBrowser::launch().await?),
///     settings: Arc::new(CrawlSettings::default()),
/// });
/// ```
pub fn router<B: Browser + 'static>(state: AppState<B>) -> Router {
    Router::new()
        .route("/", get(rss_feed::<B>))
        .route("/health", get(health))
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
///
/// # Errors
///
/// Returns an error if `addr` cannot be bound or the server loop fails.
pub async fn serve<B: Browser + 'static>(addr: &str, state: AppState<B>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Feed server listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

fn plain(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

/// Serve the feed for `?url=` as `application/rss+xml`.
///
/// A missing or blank `url` is a plain-text 400. Channel-level failures are a
/// plain-text 500 carrying the error message.
#[instrument(level = "info", skip_all, fields(url = ?params.url))]
async fn rss_feed<B: Browser + 'static>(State(state): State<AppState<B>>, Query(params): Query<FeedParams>) -> Response {
    let Some(channel_url) = params.url.filter(|u| !u.trim().is_empty()) else {
        return plain(StatusCode::BAD_REQUEST, "Error: Missing 'url' parameter".to_string());
    };

    let mut settings = (*state.settings).clone();
    if params.limit.is_some() {
        settings.article_limit = params.limit;
    }

    match build_feed(state.browser.as_ref(), &channel_url, &settings).await {
        Ok(xml) => ([(header::CONTENT_TYPE, "application/rss+xml; charset=utf-8")], xml).into_response(),
        Err(e) => {
            error!(%channel_url, error = %e, "Feed build failed");
            plain(StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e))
        }
    }
}
