use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::types::ScraperConfig;
use crate::error::{CraigslistError, Result};
use crate::ports::page_source::{FetchedPage, PageSource};

/// Plain GET client for marketplace pages. One request per call, no retries.
pub struct CraigslistScraper {
    http: Client,
}

impl CraigslistScraper {
    pub fn new(config: &ScraperConfig) -> std::result::Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self { http })
    }
}

#[async_trait]
impl PageSource for CraigslistScraper {
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage> {
        debug!(url, "Fetching page");

        let response = self.http.get(url).send().await.map_err(|e| {
            warn!(error = %e, url, "HTTP request failed");
            CraigslistError::Http(e)
        })?;

        let status = response.status().as_u16();
        if status != 200 {
            warn!(status, url, "Non-200 response");
            return Ok(FetchedPage {
                status,
                body: String::new(),
            });
        }

        let body = response.text().await.map_err(CraigslistError::Http)?;
        debug!(url, bytes = body.len(), "Page downloaded");
        Ok(FetchedPage { status, body })
    }
}
