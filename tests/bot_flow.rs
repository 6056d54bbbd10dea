mod common;

use common::*;
use headroom_bot::api::{MetricsSource, MoonshotClient, NewsApiClient, NewsSource};
use headroom_bot::poller::{TickOutcome, WatermarkPoller};
use headroom_bot::telegram::{Command, CommandDispatcher, Reply};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::MockServer;

fn dispatcher_for(base_url: &str, notifier: Arc<RecordingNotifier>) -> CommandDispatcher {
    let config = test_config(base_url);
    let metrics: Arc<dyn MetricsSource> = Arc::new(MoonshotClient::new(&config.api).unwrap());
    let news: Arc<dyn NewsSource> =
        Arc::new(NewsApiClient::new(&config.news, Duration::from_secs(2)).unwrap());
    CommandDispatcher::new(
        metrics,
        news,
        notifier,
        config.api.token_address.clone(),
        config.news.clone(),
    )
}

#[tokio::test]
async fn test_marketcap_command_against_live_client() {
    let server = MockServer::start().await;
    mount(&server, &token_path(), 200, token_json()).await;
    let dispatcher = dispatcher_for(&server.uri(), Arc::new(RecordingNotifier::default()));

    let replies = dispatcher.handle(Command::MarketCap).await;
    assert_eq!(replies.len(), 1);
    assert!(replies[0].text().ends_with("Market Cap: $1,234,567"));
}

#[tokio::test]
async fn test_headroom_survives_http_500() {
    let server = MockServer::start().await;
    mount(&server, &token_path(), 500, "{}").await;
    let dispatcher = dispatcher_for(&server.uri(), Arc::new(RecordingNotifier::default()));

    let replies = dispatcher.handle(Command::Headroom).await;
    assert_eq!(
        replies,
        vec![Reply::Text(
            "An error occurred while fetching headroom information.".to_string()
        )]
    );
    // the dispatcher is still usable afterwards
    let replies = dispatcher.handle(Command::Whales).await;
    assert_eq!(replies[0].text(), "Feature coming soon!");
}

#[tokio::test]
async fn test_headroom_full_reply() {
    let server = MockServer::start().await;
    mount(&server, &token_path(), 200, token_json()).await;
    let dispatcher = dispatcher_for(&server.uri(), Arc::new(RecordingNotifier::default()));

    let replies = dispatcher.handle(Command::Headroom).await;
    assert_eq!(replies[0], Reply::Photo("https://cdn.example/banner.png".to_string()));
    let body = replies[1].text();
    assert!(body.contains("Volume 24h: $45,000 6h: $9,000 1h: $1,500 5m: $13"));
    assert!(body.contains("Change 24h: 12.50% 6h: -2.25% 1h: 0.50% 5m: 0.00%"));
    assert!(body.contains("Total Supply: 1000000000"));
    assert!(body.contains("Liquidity: $30,500"));
    assert!(body.contains("<a href=\"https://headroom.example\">Website</a>"));
}

#[tokio::test]
async fn test_news_with_no_articles() {
    let server = MockServer::start().await;
    mount(&server, "/everything", 200, "{\"articles\":[]}").await;
    let dispatcher = dispatcher_for(&server.uri(), Arc::new(RecordingNotifier::default()));

    let replies = dispatcher.handle(Command::News).await;
    assert_eq!(
        replies,
        vec![Reply::Text("No news available at the moment.".to_string())]
    );
}

#[tokio::test]
async fn test_start_announces_through_notifier() {
    let notifier = Arc::new(RecordingNotifier::default());
    let dispatcher = dispatcher_for("http://127.0.0.1:9", notifier.clone());

    dispatcher.handle(Command::Start).await;
    assert_eq!(
        notifier.announcements.lock().unwrap().clone(),
        vec!["Bot has started and is ready to receive commands.".to_string()]
    );
}

#[tokio::test]
async fn test_poller_announces_newest_buy_with_token_context() {
    let trades = json!([
        trade_json("sell", 1700000300, "tx-sell"),
        trade_json("buy", 1700000200, "tx-new"),
        trade_json("buy", 1700000100, "tx-old")
    ]);
    let server = MockServer::start().await;
    mount(&server, &trades_path(), 200, trades.to_string()).await;
    mount(&server, &token_path(), 200, token_json()).await;

    let config = test_config(&server.uri());
    let notifier = Arc::new(RecordingNotifier::default());
    let mut poller = WatermarkPoller::new(
        Arc::new(MoonshotClient::new(&config.api).unwrap()),
        notifier.clone(),
        config.api.token_address.clone(),
        config.poller.clone(),
    );

    assert_eq!(poller.tick().await, TickOutcome::Notified(1));
    assert_eq!(poller.tick().await, TickOutcome::Idle);
    assert_eq!(poller.watermark(), Some(1700000200));
    assert_eq!(notifier.alerted_txns(), vec!["tx-new"]);

    let alerts = notifier.alerts.lock().unwrap();
    assert_eq!(alerts[0].1.name, "Headroom");
}

#[tokio::test]
async fn test_poller_keeps_going_when_trades_endpoint_fails() {
    let server = MockServer::start().await;
    mount(&server, &trades_path(), 503, "{}").await;
    let config = test_config(&server.uri());
    let notifier = Arc::new(RecordingNotifier::default());
    let mut poller = WatermarkPoller::new(
        Arc::new(MoonshotClient::new(&config.api).unwrap()),
        notifier.clone(),
        config.api.token_address.clone(),
        config.poller.clone(),
    );
    let state = poller.subscribe();

    for _ in 0..3 {
        assert_eq!(poller.tick().await, TickOutcome::FetchFailed);
    }
    assert_eq!(state.borrow().consecutive_failures, 3);
    assert_eq!(poller.watermark(), None);
    assert!(notifier.alerted_txns().is_empty());
}
