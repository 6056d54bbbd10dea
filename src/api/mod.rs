use async_trait::async_trait;

use crate::error::Result;
use crate::models::{NewsItem, TokenSnapshot, Trade};

pub mod moonshot;
pub mod newsapi;
pub mod types;

pub use moonshot::MoonshotClient;
pub use newsapi::NewsApiClient;

/// Source of token metrics and recent trades.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn fetch_token_snapshot(&self, token_address: &str) -> Result<TokenSnapshot>;
    async fn fetch_latest_trades(&self, token_address: &str) -> Result<Vec<Trade>>;
}

/// Source of news articles. Failures surface as an empty list, never an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch_latest_news(&self, query: &str, limit: usize) -> Vec<NewsItem>;
}
