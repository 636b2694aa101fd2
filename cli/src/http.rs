//! Image fetching over HTTP for the CLI.

use std::time::Duration;

use research_export::{Error, ImageSource, LocalImageSource, Result};

/// Fetches `http(s)://` images with a blocking client and hands everything
/// else to a [`LocalImageSource`].
pub struct HttpImageSource {
    client: reqwest::blocking::Client,
    local: LocalImageSource,
}

impl HttpImageSource {
    /// Create a source with a per-request timeout.
    pub fn new(local: LocalImageSource, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("research-export/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::ImageFetch(e.to_string()))?;

        Ok(Self { client, local })
    }
}

impl ImageSource for HttpImageSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let lower = url.trim().to_ascii_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return self.local.fetch(url);
        }

        log::debug!("Fetching image {}", url);
        let response = self
            .client
            .get(url.trim())
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::ImageFetch(format!("{}: {}", url, e)))?;

        let bytes = response
            .bytes()
            .map_err(|e| Error::ImageFetch(format!("{}: {}", url, e)))?;
        Ok(bytes.to_vec())
    }
}
