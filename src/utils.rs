//! Small helpers shared by the commands and the HTTP endpoint.
//!
//! - Channel URL normalization to the articles tab
//! - String truncation for log previews
//! - Output directory validation

use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Point a channel URL at its articles tab.
///
/// Dzen channel pages default to a mixed feed; `tab=articles` restricts the
/// listing to articles. The parameter is appended only when missing.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(articles_tab_url("https://dzen.ru/tourister"), "https://dzen.ru/tourister?tab=articles");
/// assert_eq!(articles_tab_url("https://dzen.ru/id/5a?lang=ru"), "https://dzen.ru/id/5a?lang=ru&tab=articles");
/// ```
pub fn articles_tab_url(channel_url: &str) -> String {
    let channel_url = channel_url.trim();
    if channel_url.contains("tab=articles") {
        channel_url.to_string()
    } else if channel_url.contains('?') {
        format!("{}&tab=articles", channel_url)
    } else {
        format!("{}?tab=articles", channel_url)
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` bytes (backing off to a char boundary) with
/// `"…(+N bytes)"` appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Ensure the directory that will hold `file_path` exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %file_path))]
pub async fn ensure_writable_parent(file_path: &str) -> Result<(), Box<dyn Error>> {
    let dir = Path::new(file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    fs::create_dir_all(dir).await?;
    let probe_path = dir.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!(dir = %dir.display(), "Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
