//! JSON output for the `channel` and `article` commands.
//!
//! Records are pretty-printed. With no output path they go to stdout so the
//! commands compose with `jq`.

use serde::Serialize;
use std::error::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, instrument};

/// Serialize `record` to `path`, or to stdout when `path` is `None`.
///
/// Parent directories are created as needed.
#[instrument(level = "info", skip_all, fields(path = ?path))]
pub async fn write_record<T: Serialize>(record: &T, path: Option<&str>) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(record)?;

    let Some(path) = path else {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(json.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
        return Ok(());
    };

    if let Some(parent) = std::path::Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create JSON dir");
            return Err(e.into());
        }
    }

    fs::write(path, json).await?;
    info!(%path, "Wrote JSON record");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CanonicalUrl, ChannelRecord};

    #[tokio::test]
    async fn test_write_record_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/channel.json");
        let record = ChannelRecord {
            url: "https://dzen.ru/tourister?tab=articles".into(),
            title: "Tourister".into(),
            image_url: "img.jpg".into(),
            description: String::new(),
            article_links: vec![CanonicalUrl::parse("https://dzen.ru/a/X?y=1", None).unwrap()],
        };

        write_record(&record, Some(path.to_str().unwrap())).await.unwrap();

        let back: ChannelRecord = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, record);
        assert!(std::fs::read_to_string(&path).unwrap().contains("\"https://dzen.ru/a/X\""));
    }
}
