//! HTTP source download.

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use std::fs;
use std::path::Path;
use std::time::Duration;

use super::SourceFetcher;

/// Downloads files over HTTP/HTTPS.
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Create a fetcher with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("ec-provision/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, timeout })
    }

    /// Get the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl SourceFetcher for HttpFetcher {
    fn fetch_to(&self, url: &str, dest: &Path) -> Result<u64> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Request to {} failed", url))?;

        if !response.status().is_success() {
            bail!("HTTP {} fetching {}", response.status(), url);
        }

        let body = response
            .bytes()
            .with_context(|| format!("Reading body of {} failed", url))?;
        fs::write(dest, &body).with_context(|| format!("Writing {} failed", dest.display()))?;
        Ok(body.len() as u64)
    }
}
