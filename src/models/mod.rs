use serde::{Deserialize, Serialize};
use std::fmt;

pub mod market;

pub use market::{TokenSnapshot, Windowed};

/// Stand-in for any string field absent from an upstream response.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeKind {
    Buy,
    Sell,
    Other(String),
}

impl TradeKind {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "buy" => TradeKind::Buy,
            "sell" => TradeKind::Sell,
            _ => TradeKind::Other(raw.to_string()),
        }
    }
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeKind::Buy => f.write_str("buy"),
            TradeKind::Sell => f.write_str("sell"),
            TradeKind::Other(raw) => f.write_str(raw),
        }
    }
}

/// A single trade as reported by the trades endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub block_number: Option<u64>,
    /// Unix seconds. Trades without one can't be ordered and are never announced.
    pub block_timestamp: Option<i64>,
    pub pair_id: String,
    pub maker: String,
    pub amount0: Option<f64>,
    pub amount1: Option<f64>,
    pub price_usd: Option<f64>,
    pub volume_usd: Option<f64>,
    pub kind: TradeKind,
    pub txn_id: String,
}

impl Trade {
    pub fn is_buy(&self) -> bool {
        self.kind == TradeKind::Buy
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub description: String,
    pub url: String,
}
