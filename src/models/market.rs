use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use super::NOT_AVAILABLE;

/// Value of a metric over the four rolling windows reported upstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Windowed {
    pub h24: f64,
    pub h6: f64,
    pub h1: f64,
    pub m5: f64,
}

/// Point-in-time read of token metrics. Fields are not guaranteed to be
/// consistent with each other if upstream changed mid-request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSnapshot {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub price_usd: f64,
    pub market_cap: f64,
    pub volume: Windowed,
    pub price_change: Windowed,
    /// Kept as text: upstream sends either a number or a label such as "1B".
    pub total_supply: String,
    pub liquidity: f64,
    pub banner_url: String,
    pub token_url: String,
    pub website_url: String,
    pub creator: String,
    pub fetched_at: DateTime<Utc>,
}

impl TokenSnapshot {
    /// Snapshot carrying only the address, every other field at its default.
    pub fn bare(address: &str) -> Self {
        Self {
            address: address.to_string(),
            name: NOT_AVAILABLE.to_string(),
            symbol: NOT_AVAILABLE.to_string(),
            price_usd: 0.0,
            market_cap: 0.0,
            volume: Windowed::default(),
            price_change: Windowed::default(),
            total_supply: NOT_AVAILABLE.to_string(),
            liquidity: 0.0,
            banner_url: String::new(),
            token_url: String::new(),
            website_url: String::new(),
            creator: String::new(),
            fetched_at: Utc::now(),
        }
    }

    pub fn has_banner(&self) -> bool {
        !self.banner_url.trim().is_empty()
    }
}
