//! Bounded download of a remote snapshot.

use crate::config::CloneConfig;
use crate::core::{CloneError, Result};
use crate::snapshot::{Snapshot, decode};
use reqwest::Client;
use tracing::{Instrument, Level, event, info_span};

/// Downloads and decodes a snapshot. Nothing is written anywhere.
pub async fn fetch_snapshot(url: &str, config: &CloneConfig) -> Result<Snapshot> {
    let bytes = fetch_bytes(url, config).await?;
    decode(&bytes)
}

/// Downloads `url`, rejecting bodies over `config.max_snapshot_bytes`.
pub async fn fetch_bytes(url: &str, config: &CloneConfig) -> Result<Vec<u8>> {
    let span = info_span!("siteclone.fetch", url = %url);
    download(url, config).instrument(span).await
}

async fn download(url: &str, config: &CloneConfig) -> Result<Vec<u8>> {
    let limit = config.max_snapshot_bytes;
    let client = Client::builder().timeout(config.fetch_timeout).build()?;
    let mut response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(CloneError::Fetch(format!(
            "{} returned {}",
            url,
            response.status()
        )));
    }

    if let Some(declared) = response.content_length() {
        check_size(usize::try_from(declared).unwrap_or(usize::MAX), limit)?;
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        check_size(body.len() + chunk.len(), limit)?;
        body.extend_from_slice(&chunk);
    }

    event!(Level::DEBUG, bytes = body.len(), "snapshot downloaded");
    Ok(body)
}

fn check_size(size: usize, limit: usize) -> Result<()> {
    if size > limit {
        return Err(CloneError::PayloadTooLarge { size, limit });
    }
    Ok(())
}
