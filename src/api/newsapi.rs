use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::api::types::parse_articles;
use crate::api::NewsSource;
use crate::config::NewsConfig;
use crate::error::{Error, Result};
use crate::metrics;
use crate::models::NewsItem;

/// Client for the newsapi.org `everything` search.
#[derive(Debug, Clone)]
pub struct NewsApiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl NewsApiClient {
    pub fn new(config: &NewsConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<NewsItem>> {
        let url = format!("{}/everything", self.base_url);
        let page_size = limit.to_string();
        // The key is left out of the log line.
        debug!("Fetching news for {:?} from {}", query, url);

        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("pageSize", page_size.as_str()), ("apiKey", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "news API returned status {}",
                status
            )));
        }

        let body: Value = serde_json::from_str(&response.text().await?)?;
        let items = parse_articles(&body, limit);
        if items.is_empty() {
            debug!("No articles found in news data");
        }
        Ok(items)
    }
}

#[async_trait]
impl NewsSource for NewsApiClient {
    async fn fetch_latest_news(&self, query: &str, limit: usize) -> Vec<NewsItem> {
        if limit == 0 {
            return Vec::new();
        }
        match self.search(query, limit).await {
            Ok(items) => items,
            Err(e) => {
                metrics::record_upstream_error("news");
                error!("Error fetching latest news: {}", e);
                Vec::new()
            }
        }
    }
}
