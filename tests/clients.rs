mod common;

use common::*;
use headroom_bot::api::{MetricsSource, MoonshotClient, NewsApiClient, NewsSource};
use headroom_bot::error::Error;
use headroom_bot::models::{TradeKind, NOT_AVAILABLE};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer};

#[tokio::test]
async fn test_token_snapshot_over_http() {
    let server = MockServer::start().await;
    mount(&server, &token_path(), 200, token_json()).await;
    let client = MoonshotClient::new(&api_config(&server.uri())).unwrap();

    let snapshot = client.fetch_token_snapshot(TOKEN_ADDRESS).await.unwrap();
    assert_eq!(snapshot.name, "Headroom");
    assert_eq!(snapshot.symbol, "HEADROOM");
    assert_eq!(snapshot.market_cap, 1234567.0);
    assert_eq!(snapshot.volume.m5, 12.5);
    assert_eq!(snapshot.price_change.h6, -2.25);
    assert_eq!(snapshot.liquidity, 30500.0);
    assert_eq!(snapshot.website_url, "https://headroom.example");
    assert_eq!(request_targets(&server).await, vec![token_path()]);
}

#[tokio::test]
async fn test_server_error_is_upstream_unavailable() {
    let server = MockServer::start().await;
    mount(&server, &token_path(), 500, "{\"error\":\"boom\"}").await;
    let client = MoonshotClient::new(&api_config(&server.uri())).unwrap();

    let err = client.fetch_token_snapshot(TOKEN_ADDRESS).await.unwrap_err();
    assert!(matches!(err, Error::UpstreamUnavailable(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let server = MockServer::start().await;
    mount(&server, &trades_path(), 200, "<html>gateway</html>").await;
    let client = MoonshotClient::new(&api_config(&server.uri())).unwrap();

    let err = client.fetch_latest_trades(TOKEN_ADDRESS).await.unwrap_err();
    assert!(matches!(err, Error::MalformedResponse(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_empty_object_is_a_default_snapshot_not_an_error() {
    let server = MockServer::start().await;
    mount(&server, &token_path(), 200, "{}").await;
    let client = MoonshotClient::new(&api_config(&server.uri())).unwrap();

    let snapshot = client.fetch_token_snapshot(TOKEN_ADDRESS).await.unwrap();
    assert_eq!(snapshot.name, NOT_AVAILABLE);
    assert_eq!(snapshot.market_cap, 0.0);
}

#[tokio::test]
async fn test_trades_in_data_wrapper() {
    let body = json!({ "data": [
        trade_json("buy", 1700000100, "tx-b"),
        trade_json("sell", 1700000050, "tx-s")
    ]});
    let server = MockServer::start().await;
    mount(&server, &trades_path(), 200, body.to_string()).await;
    let client = MoonshotClient::new(&api_config(&server.uri())).unwrap();

    let trades = client.fetch_latest_trades(TOKEN_ADDRESS).await.unwrap();
    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].kind, TradeKind::Buy);
    assert_eq!(trades[0].amount0, Some(150000.0));
    assert_eq!(trades[1].kind, TradeKind::Sell);
}

#[tokio::test]
async fn test_connection_refused_is_upstream_unavailable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = MoonshotClient::new(&api_config(&base_url)).unwrap();
    let err = client.fetch_latest_trades(TOKEN_ADDRESS).await.unwrap_err();
    assert!(matches!(err, Error::UpstreamUnavailable(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_stalled_upstream_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(token_path()))
        .respond_with(json_response(200, token_json()).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;
    let mut config = api_config(&server.uri());
    config.request_timeout_secs = 1;
    let client = MoonshotClient::new(&config).unwrap();

    let result = tokio::time::timeout(
        Duration::from_secs(10),
        client.fetch_token_snapshot(TOKEN_ADDRESS),
    )
    .await
    .expect("request timeout should fire before the test timeout");
    assert!(matches!(result, Err(Error::UpstreamUnavailable(_))));
}

#[tokio::test]
async fn test_news_items_and_query() {
    let body = json!({ "status": "ok", "articles": [
        { "title": "A", "description": "first", "url": "https://n/a" },
        { "title": "B", "description": null, "url": "https://n/b" },
        { "title": "C", "description": "third", "url": "https://n/c" },
        { "title": "D", "description": "fourth", "url": "https://n/d" }
    ]});
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/everything"))
        .and(query_param("q", "memecoin"))
        .and(query_param("pageSize", "3"))
        .and(query_param("apiKey", "test-key"))
        .respond_with(json_response(200, body.to_string()))
        .expect(1)
        .mount(&server)
        .await;
    let client = NewsApiClient::new(&news_config(&server.uri()), Duration::from_secs(2)).unwrap();

    let items = client.fetch_latest_news("memecoin", 3).await;
    assert_eq!(items.len(), 3);
    assert_eq!(items[1].title, "B");
    assert_eq!(items[1].description, "");
    server.verify().await;
}

#[tokio::test]
async fn test_news_failures_become_empty_list() {
    let server = MockServer::start().await;
    mount(&server, "/everything", 401, "{\"status\":\"error\"}").await;
    let client = NewsApiClient::new(&news_config(&server.uri()), Duration::from_secs(2)).unwrap();
    assert!(client.fetch_latest_news("memecoin", 3).await.is_empty());

    let server = MockServer::start().await;
    mount(&server, "/everything", 200, "not json").await;
    let client = NewsApiClient::new(&news_config(&server.uri()), Duration::from_secs(2)).unwrap();
    assert!(client.fetch_latest_news("memecoin", 3).await.is_empty());

    let server = MockServer::start().await;
    mount(&server, "/everything", 200, "{\"articles\":[]}").await;
    let client = NewsApiClient::new(&news_config(&server.uri()), Duration::from_secs(2)).unwrap();
    assert!(client.fetch_latest_news("memecoin", 3).await.is_empty());
}

#[test]
fn test_news_unreachable_host_blocking() {
    tokio_test::block_on(async {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = NewsApiClient::new(&news_config(&base_url), Duration::from_secs(2)).unwrap();
        assert!(client.fetch_latest_news("memecoin", 3).await.is_empty());
    });
}
