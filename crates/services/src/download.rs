//! Streaming HTTP downloads with percentage progress.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Called with `(bytes_received, content_length)` after every chunk
pub type ByteProgress<'a> = &'a mut (dyn FnMut(u64, Option<u64>) + Send);

/// Something that can put the bytes behind a URL into a file
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Returns the number of bytes written.
    async fn fetch(&self, url: &str, dest: &Path, progress: ByteProgress<'_>) -> Result<u64>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("zhenxun-gui/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path, progress: ByteProgress<'_>) -> Result<u64> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("HTTP {} - {}", status.as_u16(), url);
        }

        let total = response.content_length().filter(|len| *len > 0);
        if total.is_none() {
            warn!("No content length for {}, progress will not be reported", url);
        }

        let mut file = File::create(dest)
            .await
            .with_context(|| format!("Failed to create {}", dest.display()))?;
        let mut stream = response.bytes_stream();
        let mut received: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Download interrupted")?;
            file.write_all(&chunk)
                .await
                .with_context(|| format!("Failed to write {}", dest.display()))?;
            received += chunk.len() as u64;
            progress(received, total);
        }

        file.flush().await?;
        debug!("Downloaded {} bytes to {}", received, dest.display());
        Ok(received)
    }
}

/// Whole-percent progress, or `None` when the size is unknown.
pub fn progress_percent(received: u64, total: Option<u64>) -> Option<u8> {
    match total {
        Some(total) if total > 0 => {
            let pct = (received.saturating_mul(100) / total).min(100);
            Some(pct as u8)
        }
        _ => None,
    }
}

/// Turns byte counts into percentages that only move forward.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    last: Option<u8>,
}

impl ProgressTracker {
    /// Returns a value only when it is higher than the last one reported.
    pub fn observe(&mut self, received: u64, total: Option<u64>) -> Option<u8> {
        let pct = progress_percent(received, total)?;
        match self.last {
            Some(last) if pct <= last => None,
            _ => {
                self.last = Some(pct);
                Some(pct)
            }
        }
    }

    pub fn last(&self) -> Option<u8> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_bounds() {
        assert_eq!(progress_percent(0, Some(200)), Some(0));
        assert_eq!(progress_percent(100, Some(200)), Some(50));
        assert_eq!(progress_percent(250, Some(200)), Some(100));
        assert_eq!(progress_percent(10, None), None);
        assert_eq!(progress_percent(10, Some(0)), None);
    }

    #[test]
    fn test_tracker_is_monotonic() {
        let mut tracker = ProgressTracker::default();
        let reported: Vec<u8> = [0u64, 10, 10, 5, 55, 100, 120]
            .iter()
            .filter_map(|&n| tracker.observe(n, Some(100)))
            .collect();
        assert_eq!(reported, vec![0, 10, 55, 100]);
        assert_eq!(tracker.last(), Some(100));
    }

    #[test]
    fn test_tracker_silent_without_length() {
        let mut tracker = ProgressTracker::default();
        assert_eq!(tracker.observe(4096, None), None);
        assert_eq!(tracker.last(), None);
    }
}
