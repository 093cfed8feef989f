use crate::error::{Result, ScraperError};
use crate::ports::PageFetcher;
use async_trait::async_trait;
use reqwest::header::USER_AGENT;

const AGENT: &str = concat!("venue_harvester/", env!("CARGO_PKG_VERSION"));

/// Plain reqwest-backed page fetcher. Non-success responses become errors
/// so callers decide whether a failed fetch aborts or degrades.
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl Default for ReqwestFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl PageFetcher for ReqwestFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).header(USER_AGENT, AGENT).send().await?;
        if !resp.status().is_success() {
            return Err(ScraperError::Status {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }
        Ok(resp.text().await?)
    }
}
