#![allow(dead_code)]

use async_trait::async_trait;
use headroom_bot::config::{ApiConfig, Config, NewsConfig, PollerConfig, TelegramConfig};
use headroom_bot::models::{TokenSnapshot, Trade};
use headroom_bot::telegram::Notifier;
use std::sync::Mutex;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN_ADDRESS: &str = "HeadRoom111111111111111111111111111111111111";

/// Response with a JSON content type regardless of what `body` holds.
pub fn json_response(status: u16, body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(body.into(), "application/json")
}

/// Serves `body` with `status` for GET `route`. Unmatched paths get a 404.
pub async fn mount(server: &MockServer, route: &str, status: u16, body: impl Into<String>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(json_response(status, body))
        .mount(server)
        .await;
}

/// Request paths (with query string) the server has seen, in arrival order.
pub async fn request_targets(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| match request.url.query() {
            Some(query) => format!("{}?{}", request.url.path(), query),
            None => request.url.path().to_string(),
        })
        .collect()
}

pub fn token_path() -> String {
    format!("/token/v1/solana/{}", TOKEN_ADDRESS)
}

pub fn trades_path() -> String {
    format!("/trades/v1/latest/solana/{}", TOKEN_ADDRESS)
}

pub fn token_json() -> String {
    serde_json::json!({
        "baseToken": { "name": "Headroom", "symbol": "HEADROOM" },
        "priceUsd": "0.00012345",
        "marketCap": 1234567.0,
        "volume": {
            "h24": { "total": 45000.4 }, "h6": { "total": 9000 },
            "h1": { "total": 1500 }, "m5": { "total": 12.5 }
        },
        "priceChange": { "h24": 12.5, "h6": -2.25, "h1": 0.5, "m5": 0 },
        "liquidity": { "h24": { "total": 30500 } },
        "totalSupply": "1000000000",
        "profile": { "banner": "https://cdn.example/banner.png", "links": ["https://headroom.example"] },
        "url": "https://moonshot.example/headroom"
    })
    .to_string()
}

pub fn trade_json(kind: &str, ts: i64, txn: &str) -> serde_json::Value {
    serde_json::json!({
        "blockNumber": 250000000 + ts,
        "blockTimestamp": ts,
        "pairId": "pair-1",
        "amount0": "150000",
        "amount1": "0.25",
        "priceUsd": "0.00012",
        "volumeUsd": 18.0,
        "type": kind,
        "maker": "Maker1111111111111111111111111111111111111",
        "txnId": txn
    })
}

pub fn api_config(base_url: &str) -> ApiConfig {
    ApiConfig {
        base_url: base_url.to_string(),
        chain_id: "solana".to_string(),
        token_address: TOKEN_ADDRESS.to_string(),
        request_timeout_secs: 2,
    }
}

pub fn news_config(base_url: &str) -> NewsConfig {
    NewsConfig {
        api_key: "test-key".to_string(),
        base_url: base_url.to_string(),
        query: "memecoin".to_string(),
        limit: 3,
    }
}

pub fn test_config(base_url: &str) -> Config {
    Config {
        telegram: TelegramConfig {
            bot_token: "123456:test".to_string(),
            chat_id: "-100123".to_string(),
            ..TelegramConfig::default()
        },
        api: api_config(base_url),
        news: news_config(base_url),
        poller: PollerConfig::default(),
    }
}

/// Notifier that remembers what it would have sent.
#[derive(Default)]
pub struct RecordingNotifier {
    pub alerts: Mutex<Vec<(Trade, TokenSnapshot)>>,
    pub announcements: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn alerted_txns(&self) -> Vec<String> {
        self.alerts
            .lock()
            .unwrap()
            .iter()
            .map(|(trade, _)| trade.txn_id.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, trade: &Trade, token: &TokenSnapshot) {
        self.alerts
            .lock()
            .unwrap()
            .push((trade.clone(), token.clone()));
    }

    async fn announce(&self, text: &str) {
        self.announcements.lock().unwrap().push(text.to_string());
    }
}
