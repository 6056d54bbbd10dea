use log::{error, info};
use std::sync::Arc;
use teloxide::utils::command::BotCommands;
use teloxide::utils::html::escape;

use crate::api::{MetricsSource, NewsSource};
use crate::config::NewsConfig;
use crate::metrics;
use crate::models::{TokenSnapshot, Trade};
use crate::telegram::{html, Notifier};
use crate::utils::format::{format_usd, or_not_available};

const NEWS_REPLY_LIMIT: usize = 3;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "Digital howdy! Beep boop!")]
    Start,
    #[command(description = "List of commands. Help is here!")]
    Help,
    #[command(description = "HEADROOM token info. Get the skinny!")]
    Headroom,
    #[command(description = "Latest news. Extra, extra!")]
    News,
    #[command(description = "Current token price. Cha-ching!")]
    Price,
    #[command(description = "Future subscription awesomeness. Stay tuned!")]
    Subscribe,
    #[command(description = "Latest transactions. Splash!")]
    Transactions,
    #[command(description = "Market cap means big bucks?")]
    MarketCap,
    #[command(description = "24-hour volume. Big leagues!")]
    Volume24h,
    #[command(description = "24-hour price change. Rollercoaster!")]
    Change24h,
    #[command(description = "Large transactions. Whale watching!")]
    Whales,
    #[command(description = "Token price chart. Highs, lows, drama!")]
    Chart(String),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Help => "help",
            Command::Headroom => "headroom",
            Command::News => "news",
            Command::Price => "price",
            Command::Subscribe => "subscribe",
            Command::Transactions => "transactions",
            Command::MarketCap => "marketcap",
            Command::Volume24h => "volume24h",
            Command::Change24h => "change24h",
            Command::Whales => "whales",
            Command::Chart(_) => "chart",
        }
    }
}

/// What a handler wants sent back to the requesting chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Html(String),
    Photo(String),
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Text(s) | Reply::Html(s) | Reply::Photo(s) => s,
        }
    }
}

fn fetch_error(what: &str) -> Reply {
    Reply::Text(format!("An error occurred while fetching {}.", what))
}

pub fn help_text() -> String {
    "/start - Digital howdy! Beep boop!\n\
    /headroom - HEADROOM token info. Get the skinny!\n\
    /news - Latest news. Extra, extra!\n\
    /price - Current token price. Cha-ching!\n\
    /subscribe - Future subscription awesomeness. Stay tuned!\n\
    /transactions - Latest transactions. Splash!\n\
    /marketcap - Market cap means big bucks?\n\
    /volume24h - 24-hour volume. Big leagues!\n\
    /change24h - 24-hour price change. Rollercoaster!\n\
    /help - List of commands. Help is here!\n\
    /whales - Large transactions. Whale watching!\n\
    /chart [token_symbol] - Token price chart. Highs, lows, drama!"
        .to_string()
}

fn link_or_na(url: &str, label: &str) -> String {
    html::link(url, label).unwrap_or_else(|| format!("{}: N/A", label))
}

pub fn format_headroom(token: &TokenSnapshot) -> String {
    format!(
        "🌐 Token: {} ({})\n\
        {}\n\
        💸 Market Cap: {}\n\
        🔄 Volume 24h: {} 6h: {} 1h: {} 5m: {}\n\
        📈 Change 24h: {:.2}% 6h: {:.2}% 1h: {:.2}% 5m: {:.2}%\n\
        🏦 Total Supply: {} 💧 Liquidity: {}\n\
        🌙 {} 🌐 {}",
        escape(&token.name),
        escape(&token.symbol),
        escape(&token.address),
        format_usd(token.market_cap),
        format_usd(token.volume.h24),
        format_usd(token.volume.h6),
        format_usd(token.volume.h1),
        format_usd(token.volume.m5),
        token.price_change.h24,
        token.price_change.h6,
        token.price_change.h1,
        token.price_change.m5,
        escape(&token.total_supply),
        format_usd(token.liquidity),
        link_or_na(&token.token_url, "Moonshot"),
        link_or_na(&token.website_url, "Website"),
    )
}

pub fn format_transaction(trade: &Trade) -> String {
    format!(
        "Latest Transaction:\n\
        🕒 Block Number: {}\n\
        📅 Timestamp: {}\n\
        🔄 Pair ID: {}\n\
        💰 Amount0: {}\n\
        💰 Amount1: {}\n\
        💲 Price (USD): {}\n\
        📊 Volume (USD): {}\n\
        🔄 Type: {}\n\
        👤 Maker: {}\n\
        🔗 Transaction ID: {}",
        or_not_available(trade.block_number),
        or_not_available(trade.block_timestamp),
        trade.pair_id,
        or_not_available(trade.amount0),
        or_not_available(trade.amount1),
        or_not_available(trade.price_usd),
        or_not_available(trade.volume_usd),
        trade.kind,
        trade.maker,
        trade.txn_id,
    )
}

/// Maps each command to its reply. Stateless: every call goes to the
/// sources afresh, and no failure escapes as an error.
pub struct CommandDispatcher {
    metrics: Arc<dyn MetricsSource>,
    news: Arc<dyn NewsSource>,
    notifier: Arc<dyn Notifier>,
    token_address: String,
    news_config: NewsConfig,
}

impl CommandDispatcher {
    pub fn new(
        metrics: Arc<dyn MetricsSource>,
        news: Arc<dyn NewsSource>,
        notifier: Arc<dyn Notifier>,
        token_address: String,
        news_config: NewsConfig,
    ) -> Self {
        Self {
            metrics,
            news,
            notifier,
            token_address,
            news_config,
        }
    }

    async fn snapshot(&self, command: &str) -> Option<TokenSnapshot> {
        match self.metrics.fetch_token_snapshot(&self.token_address).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                error!("Error in {} command: {}", command, e);
                None
            }
        }
    }

    pub async fn handle(&self, command: Command) -> Vec<Reply> {
        metrics::record_command(command.name());
        match command {
            Command::Start => {
                self.notifier
                    .announce("Bot has started and is ready to receive commands.")
                    .await;
                vec![Reply::Text(
                    "Welcome to Glitchbot! Use /help to see available commands.".to_string(),
                )]
            }
            Command::Help => vec![Reply::Text(help_text())],
            Command::Headroom => match self.snapshot("headroom").await {
                Some(token) => {
                    let mut replies = Vec::with_capacity(2);
                    if token.has_banner() {
                        replies.push(Reply::Photo(token.banner_url.clone()));
                    }
                    replies.push(Reply::Html(format_headroom(&token)));
                    info!("Displayed HEADROOM token information.");
                    replies
                }
                None => vec![fetch_error("headroom information")],
            },
            Command::News => {
                let limit = self.news_config.limit.min(NEWS_REPLY_LIMIT);
                let items = self.news.fetch_latest_news(&self.news_config.query, limit).await;
                if items.is_empty() {
                    return vec![Reply::Text("No news available at the moment.".to_string())];
                }
                let message = items
                    .iter()
                    .take(NEWS_REPLY_LIMIT)
                    .map(|item| {
                        let title = escape(&item.title);
                        let heading = html::link(&item.url, &title).unwrap_or(title);
                        format!("📰 {}\n{}", heading, escape(&item.description))
                    })
                    .collect::<Vec<_>>()
                    .join("\n\n");
                vec![Reply::Html(message)]
            }
            Command::Price => match self.snapshot("price").await {
                Some(token) => vec![Reply::Text(format!(
                    "💲 Current Price: ${:.4}",
                    token.price_usd
                ))],
                None => vec![fetch_error("the current price")],
            },
            Command::Subscribe => {
                vec![Reply::Text("Subscription feature coming soon!".to_string())]
            }
            Command::Transactions => {
                match self.metrics.fetch_latest_trades(&self.token_address).await {
                    Ok(trades) => match trades.first() {
                        Some(trade) => vec![Reply::Text(format_transaction(trade))],
                        None => vec![Reply::Text("No recent transactions found.".to_string())],
                    },
                    Err(e) => {
                        error!("Error in transactions command: {}", e);
                        vec![fetch_error("transactions information")]
                    }
                }
            }
            Command::MarketCap => match self.snapshot("marketcap").await {
                Some(token) => vec![Reply::Text(format!(
                    "💸 Market Cap: {}",
                    format_usd(token.market_cap)
                ))],
                None => vec![fetch_error("the market cap")],
            },
            Command::Volume24h => match self.snapshot("volume24h").await {
                Some(token) => vec![Reply::Text(format!(
                    "🔄 Volume 24h: {}",
                    format_usd(token.volume.h24)
                ))],
                None => vec![fetch_error("the 24h volume")],
            },
            Command::Change24h => match self.snapshot("change24h").await {
                Some(token) => vec![Reply::Text(format!(
                    "📈 Change 24h: {:.2}%",
                    token.price_change.h24
                ))],
                None => vec![fetch_error("the 24h change")],
            },
            Command::Whales => vec![Reply::Text("Feature coming soon!".to_string())],
            Command::Chart(args) => {
                let symbol = args.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
                if symbol.is_empty() {
                    vec![Reply::Text(
                        "Please specify a token symbol. Usage: /chart [token_symbol]".to_string(),
                    )]
                } else {
                    vec![Reply::Text(format!(
                        "Token price chart for {}. Highs, lows, drama!",
                        symbol
                    ))]
                }
            }
        }
    }
}
