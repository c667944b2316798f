//! Upstream source download.
//!
//! [`SourceFetcher`] is the seam between the pipeline and the network;
//! [`HttpFetcher`] is the real implementation and [`MockFetcher`] records
//! requests for tests.

pub mod http;

use std::fs;
use std::path::Path;
use std::sync::Mutex;

pub use http::HttpFetcher;

/// Downloads a single file.
pub trait SourceFetcher: Send + Sync {
    /// Download `url` into `dest`, returning the number of bytes written.
    fn fetch_to(&self, url: &str, dest: &Path) -> anyhow::Result<u64>;
}

/// Test fetcher that serves fixed content (or fails) and records URLs.
pub struct MockFetcher {
    content: Option<String>,
    requests: Mutex<Vec<String>>,
}

impl MockFetcher {
    /// Serve `content` for every URL.
    pub fn serving(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fail every request.
    pub fn failing() -> Self {
        Self {
            content: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// URLs requested so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl SourceFetcher for MockFetcher {
    fn fetch_to(&self, url: &str, dest: &Path) -> anyhow::Result<u64> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        match &self.content {
            Some(content) => {
                fs::write(dest, content)?;
                Ok(content.len() as u64)
            }
            None => anyhow::bail!("HTTP 404 fetching {}", url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn mock_serves_and_records() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("ec_sys.c");
        let fetcher = MockFetcher::serving("int main;");

        let size = fetcher.fetch_to("https://example.test/ec_sys.c", &dest).unwrap();

        assert_eq!(size, 9);
        assert_eq!(fetcher.requests(), vec!["https://example.test/ec_sys.c"]);
        assert_eq!(fs::read_to_string(dest).unwrap(), "int main;");
    }

    #[test]
    fn failing_mock_errors() {
        let temp = TempDir::new().unwrap();
        let fetcher = MockFetcher::failing();
        assert!(fetcher
            .fetch_to("https://example.test/x.c", &temp.path().join("x.c"))
            .is_err());
        assert_eq!(fetcher.requests().len(), 1);
    }
}
