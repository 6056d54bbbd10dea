use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use teloxide::Bot;

use headroom_bot::api::{MetricsSource, MoonshotClient, NewsApiClient, NewsSource};
use headroom_bot::cli::Cli;
use headroom_bot::config::Config;
use headroom_bot::logging;
use headroom_bot::metrics;
use headroom_bot::poller::WatermarkPoller;
use headroom_bot::telegram::{CommandDispatcher, Notifier, TelegramBot, TelegramNotifier};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.debug, cli.log_file.as_deref()).context("failed to initialise logging")?;

    info!("Starting HEADROOM bot...");

    let config = if cli.config.exists() {
        Config::load(&cli.config)
            .with_context(|| format!("failed to load configuration from {:?}", cli.config))?
    } else {
        warn!("{:?} not found, configuring from environment only", cli.config);
        Config::from_env()
    };
    config.validate().context("invalid configuration")?;
    let chat_id = config.chat_id()?;
    info!(
        "Configuration loaded: token {} on {}",
        config.api.token_address, config.api.chain_id
    );

    metrics::init().context("failed to register metrics")?;
    if let Some(addr) = cli.metrics_addr {
        tokio::spawn(async move {
            if let Err(e) = metrics::serve(addr).await {
                error!("Metrics exporter error: {}", e);
            }
        });
    }

    let timeout = Duration::from_secs(config.api.request_timeout_secs);
    let metrics_source: Arc<dyn MetricsSource> = Arc::new(MoonshotClient::new(&config.api)?);
    let news_source: Arc<dyn NewsSource> = Arc::new(NewsApiClient::new(&config.news, timeout)?);

    let bot = Bot::new(&config.telegram.bot_token);
    let notifier: Arc<dyn Notifier> =
        Arc::new(TelegramNotifier::new(bot.clone(), chat_id, &config.telegram));

    let poller = if cli.no_poller || !config.telegram.enable_notifications {
        info!("Buy notifications disabled");
        None
    } else {
        let poller = WatermarkPoller::new(
            metrics_source.clone(),
            notifier.clone(),
            config.api.token_address.clone(),
            config.poller.clone(),
        );
        Some(poller.start())
    };

    let dispatcher = CommandDispatcher::new(
        metrics_source,
        news_source,
        notifier,
        config.api.token_address.clone(),
        config.news.clone(),
    );
    let telegram = Arc::new(TelegramBot::new(bot, dispatcher));
    let bot_task = tokio::spawn(async move {
        if let Err(e) = telegram.start().await {
            error!("Telegram bot error: {}", e);
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    if let Some(handle) = poller {
        let state_rx = handle.subscribe();
        handle.stop().await;
        let state = state_rx.borrow().clone();
        info!(
            "Poller stopped at watermark {:?} after {} notifications",
            state.watermark, state.notifications_sent
        );
    }
    bot_task.abort();

    info!("Shutting down...");
    Ok(())
}
