use std::time::Instant;

use async_trait::async_trait;
use tracing::debug;

use crate::config::Settings;
use crate::error::FetchError;

/// A fetched HTML page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after following redirects.
    pub final_url: String,
    pub body: String,
}

/// Outbound GET used by the search and answer stages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// reqwest-backed fetcher. Redirects are followed so the final URL shows them.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(HttpFetcher { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let start = Instant::now();
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let final_url = response.url().to_string();
        let body = response.text().await?;
        debug!(
            url,
            final_url = %final_url,
            bytes = body.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Fetched page"
        );

        Ok(FetchedPage { final_url, body })
    }
}
