use async_trait::async_trait;
use chrono::DateTime;
use log::{error, info, warn};
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode};
use teloxide::utils::html::escape;

use crate::config::TelegramConfig;
use crate::error::{Error, Result};
use crate::metrics;
use crate::models::{TokenSnapshot, Trade, NOT_AVAILABLE};
use crate::telegram::html::{self, link};
use crate::utils::format::{format_thousands, truncate_address};

/// Pushes messages to the one configured chat. Failures are logged and
/// never returned. An alert Telegram can't parse is resent once as plain text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, trade: &Trade, token: &TokenSnapshot);
    async fn announce(&self, text: &str);
}

/// HTML body of a new-buy alert.
pub fn format_buy_alert(trade: &Trade, token: &TokenSnapshot, explorer_url: &str) -> String {
    let symbol = if token.symbol == NOT_AVAILABLE {
        "tokens".to_string()
    } else {
        format!("${}", escape(&token.symbol))
    };
    let mut spent = trade
        .volume_usd
        .map(|v| format!("${:.2}", v))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    if let Some(sol) = trade.amount1 {
        spent.push_str(&format!(" ({:.4} SOL)", sol));
    }
    let purchased = trade
        .amount0
        .map(format_thousands)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let price = trade
        .price_usd
        .map(|p| format!("${:.8}", p))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let when = trade
        .block_timestamp
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let wallet = if trade.maker == NOT_AVAILABLE {
        NOT_AVAILABLE.to_string()
    } else {
        let explorer = format!("{}/{}", explorer_url.trim_end_matches('/'), trade.maker);
        link(&explorer, &escape(&truncate_address(&trade.maker, 6)))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    };

    let mut message = format!(
        "🗣 <b>{} BUY!</b>\n\n\
        💵 Spent: {}\n\
        👤 Wallet: {}\n\
        💰 {} Purchased: {}\n\
        💲 Price: {}\n\
        🕒 {}",
        escape(&token.name),
        spent,
        wallet,
        symbol,
        purchased,
        price,
        when,
    );

    let links: Vec<String> = [
        link(&token.token_url, "Moonshot").map(|l| format!("🌙 {}", l)),
        link(&token.website_url, "Website").map(|l| format!("🌐 {}", l)),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !links.is_empty() {
        message.push('\n');
        message.push_str(&links.join(" "));
    }
    message
}

pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
    image_url: Option<String>,
    explorer_url: String,
}

impl TelegramNotifier {
    pub fn new(bot: Bot, chat_id: i64, config: &TelegramConfig) -> Self {
        Self {
            bot,
            chat_id: ChatId(chat_id),
            image_url: config.image_url.clone().filter(|u| !u.trim().is_empty()),
            explorer_url: config.explorer_url.clone(),
        }
    }

    async fn send_alert(&self, text: String, as_html: bool) -> Result<()> {
        if let Some(image) = &self.image_url {
            let url = reqwest::Url::parse(image)
                .map_err(|e| Error::Config(format!("invalid image_url {}: {}", image, e)))?;
            let mut request = self.bot.send_photo(self.chat_id, InputFile::url(url)).caption(text);
            if as_html {
                request = request.parse_mode(ParseMode::Html);
            }
            request.await?;
        } else {
            let mut request = self.bot.send_message(self.chat_id, text);
            if as_html {
                request = request.parse_mode(ParseMode::Html);
            }
            request.await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, trade: &Trade, token: &TokenSnapshot) {
        let text = format_buy_alert(trade, token, &self.explorer_url);
        let sent = match self.send_alert(text.clone(), true).await {
            Err(e) => {
                warn!("HTML alert for {} rejected ({}), resending as plain text", trade.txn_id, e);
                self.send_alert(html::to_plain(&text), false).await
            }
            ok => ok,
        };
        match sent {
            Ok(()) => {
                metrics::record_notification(true);
                info!("Notification sent for new buy transaction {}", trade.txn_id);
            }
            Err(e) => {
                metrics::record_notification(false);
                error!("Error sending buy notification for {}: {}", trade.txn_id, e);
            }
        }
    }

    async fn announce(&self, text: &str) {
        match self.bot.send_message(self.chat_id, text).await {
            Ok(_) => info!("Sent message to group: {}", text),
            Err(e) => error!("Error sending message to group: {}", e),
        }
    }
}
