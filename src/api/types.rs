//! Lenient mapping from upstream JSON to the crate's models.
//!
//! Only a non-JSON body is an error. Absent or mistyped keys fall back to
//! 0.0 for numbers and [`NOT_AVAILABLE`] for strings.

use chrono::Utc;
use serde_json::Value;

use crate::models::{NewsItem, TokenSnapshot, Trade, TradeKind, Windowed, NOT_AVAILABLE};

/// Walks `path` through nested objects.
fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |node, key| node.get(*key))
}

/// Numbers may arrive as JSON numbers or as numeric strings.
fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn f64_at(value: &Value, path: &[&str]) -> f64 {
    opt_f64_at(value, path).unwrap_or(0.0)
}

pub(crate) fn opt_f64_at(value: &Value, path: &[&str]) -> Option<f64> {
    lookup(value, path).and_then(as_f64)
}

pub(crate) fn text_at(value: &Value, path: &[&str], default: &str) -> String {
    lookup(value, path)
        .and_then(as_text)
        .unwrap_or_else(|| default.to_string())
}

fn windowed(value: &Value, root: &str, leaf: Option<&str>) -> Windowed {
    let at = |window: &str| match leaf {
        Some(leaf) => f64_at(value, &[root, window, leaf]),
        None => f64_at(value, &[root, window]),
    };
    Windowed {
        h24: at("h24"),
        h6: at("h6"),
        h1: at("h1"),
        m5: at("m5"),
    }
}

/// `profile.links` is a list of either plain URLs or `{ "url": ... }` objects.
fn first_link(value: &Value) -> String {
    lookup(value, &["profile", "links"])
        .and_then(Value::as_array)
        .and_then(|links| links.first())
        .and_then(|link| as_text(link).or_else(|| link.get("url").and_then(as_text)))
        .unwrap_or_default()
}

pub fn parse_token_snapshot(body: &Value, address: &str) -> TokenSnapshot {
    TokenSnapshot {
        address: address.to_string(),
        name: text_at(body, &["baseToken", "name"], NOT_AVAILABLE),
        symbol: text_at(body, &["baseToken", "symbol"], NOT_AVAILABLE),
        price_usd: f64_at(body, &["priceUsd"]),
        market_cap: f64_at(body, &["marketCap"]),
        volume: windowed(body, "volume", Some("total")),
        price_change: windowed(body, "priceChange", None),
        total_supply: text_at(body, &["totalSupply"], NOT_AVAILABLE),
        liquidity: f64_at(body, &["liquidity", "h24", "total"]),
        banner_url: text_at(body, &["profile", "banner"], ""),
        token_url: text_at(body, &["url"], ""),
        website_url: first_link(body),
        creator: text_at(body, &["moonshot", "creator"], ""),
        fetched_at: Utc::now(),
    }
}

pub fn parse_trade(entry: &Value) -> Trade {
    Trade {
        block_number: lookup(entry, &["blockNumber"])
            .and_then(as_i64)
            .and_then(|n| u64::try_from(n).ok()),
        block_timestamp: lookup(entry, &["blockTimestamp"]).and_then(as_i64),
        pair_id: text_at(entry, &["pairId"], NOT_AVAILABLE),
        maker: text_at(entry, &["maker"], NOT_AVAILABLE),
        amount0: opt_f64_at(entry, &["amount0"]),
        amount1: opt_f64_at(entry, &["amount1"]),
        price_usd: opt_f64_at(entry, &["priceUsd"]),
        volume_usd: opt_f64_at(entry, &["volumeUsd"]),
        kind: TradeKind::parse(&text_at(entry, &["type"], NOT_AVAILABLE)),
        txn_id: text_at(entry, &["txnId"], NOT_AVAILABLE),
    }
}

/// Accepts a bare array or `{ "data": [...] }`. Any other shape is an empty list.
pub fn parse_trades(body: &Value) -> Vec<Trade> {
    let entries = match body {
        Value::Array(entries) => entries.as_slice(),
        Value::Object(_) => body
            .get("data")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => &[],
    };
    entries.iter().filter(|e| e.is_object()).map(parse_trade).collect()
}

pub fn parse_articles(body: &Value, limit: usize) -> Vec<NewsItem> {
    body.get("articles")
        .and_then(Value::as_array)
        .map(|articles| {
            articles
                .iter()
                .take(limit)
                .map(|article| NewsItem {
                    title: text_at(article, &["title"], NOT_AVAILABLE),
                    description: text_at(article, &["description"], ""),
                    url: text_at(article, &["url"], NOT_AVAILABLE),
                })
                .collect()
        })
        .unwrap_or_default()
}
