use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::api::types::{parse_token_snapshot, parse_trades};
use crate::api::MetricsSource;
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::metrics;
use crate::models::{TokenSnapshot, Trade};

/// Client for the Moonshot token and trades endpoints.
#[derive(Debug, Clone)]
pub struct MoonshotClient {
    client: Client,
    base_url: String,
    chain_id: String,
}

impl MoonshotClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            chain_id: config.chain_id.clone(),
        })
    }

    pub fn token_url(&self, token_address: &str) -> String {
        format!("{}/token/v1/{}/{}", self.base_url, self.chain_id, token_address)
    }

    pub fn trades_url(&self, token_address: &str) -> String {
        format!("{}/trades/v1/latest/{}/{}", self.base_url, self.chain_id, token_address)
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(|e| {
            metrics::record_upstream_error("moonshot");
            error!("Request to {} failed: {}", url, e);
            Error::UpstreamUnavailable(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            metrics::record_upstream_error("moonshot");
            let error_msg = format!("{} returned status {}", url, status);
            error!("{}", error_msg);
            return Err(Error::UpstreamUnavailable(error_msg));
        }

        // Truncated transfer: upstream failure. Complete non-JSON body: malformed.
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            metrics::record_upstream_error("moonshot");
            error!("Failed to parse response from {}: {}", url, e);
            Error::MalformedResponse(e.to_string())
        })
    }
}

#[async_trait]
impl MetricsSource for MoonshotClient {
    async fn fetch_token_snapshot(&self, token_address: &str) -> Result<TokenSnapshot> {
        let body = self.get_json(&self.token_url(token_address)).await?;
        let snapshot = parse_token_snapshot(&body, token_address);
        info!(
            "Fetched token data for {} ({}): price ${}",
            snapshot.name, snapshot.symbol, snapshot.price_usd
        );
        Ok(snapshot)
    }

    async fn fetch_latest_trades(&self, token_address: &str) -> Result<Vec<Trade>> {
        let body = self.get_json(&self.trades_url(token_address)).await?;
        let trades = parse_trades(&body);
        debug!("Fetched {} trades for {}", trades.len(), token_address);
        Ok(trades)
    }
}
