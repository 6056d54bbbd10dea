//! Background poller that announces new buy trades exactly once.
//!
//! The poller owns the watermark (timestamp of the newest announced buy) and
//! the last token snapshot it fetched. Other tasks only ever see copies,
//! published through a `watch` channel after every tick.

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use crate::api::MetricsSource;
use crate::config::{AnnouncePolicy, PollerConfig};
use crate::metrics;
use crate::models::{TokenSnapshot, Trade};
use crate::telegram::Notifier;

pub mod backoff;

pub use backoff::Backoff;

/// Timestamp of the newest announced buy. Never moves backwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Watermark(Option<i64>);

impl Watermark {
    pub fn get(&self) -> Option<i64> {
        self.0
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    /// Moves the watermark to `timestamp` if that is newer. Returns whether it moved.
    pub fn advance(&mut self, timestamp: i64) -> bool {
        match self.0 {
            Some(current) if timestamp <= current => false,
            _ => {
                self.0 = Some(timestamp);
                true
            }
        }
    }
}

/// Buys that should be announced given the current watermark.
///
/// With the watermark unset only the single newest buy is returned, so a
/// fresh process never replays the backlog. Trades without a timestamp are
/// ignored. Among equal timestamps the earliest listed trade wins.
pub fn select_new_buys<'a>(
    trades: &'a [Trade],
    watermark: Watermark,
    policy: AnnouncePolicy,
) -> Vec<&'a Trade> {
    let mut fresh: Vec<&Trade> = trades
        .iter()
        .filter(|t| t.is_buy())
        .filter(|t| match (t.block_timestamp, watermark.get()) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(ts), Some(mark)) => ts > mark,
        })
        .collect();

    if policy == AnnouncePolicy::EveryNewBuy && watermark.is_set() {
        fresh.sort_by_key(|t| t.block_timestamp);
        return fresh;
    }

    fresh
        .into_iter()
        .reduce(|best, t| if t.block_timestamp > best.block_timestamp { t } else { best })
        .into_iter()
        .collect()
}

/// Read-only view of the poller, published after every tick.
#[derive(Debug, Clone, Default)]
pub struct PollerState {
    pub watermark: Option<i64>,
    pub last_snapshot: Option<TokenSnapshot>,
    pub consecutive_failures: u32,
    pub last_success: Option<DateTime<Utc>>,
    pub notifications_sent: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// This many buys were handed to the notifier.
    Notified(usize),
    /// Fetch succeeded but there was nothing new.
    Idle,
    /// First poll with `skip_initial_backlog`: watermark set, nothing sent.
    Seeded(i64),
    FetchFailed,
}

pub struct WatermarkPoller {
    source: Arc<dyn MetricsSource>,
    notifier: Arc<dyn Notifier>,
    token_address: String,
    config: PollerConfig,
    backoff: Backoff,
    watermark: Watermark,
    seeded: bool,
    consecutive_failures: u32,
    last_success: Option<DateTime<Utc>>,
    last_snapshot: Option<TokenSnapshot>,
    notifications_sent: u64,
    state: watch::Sender<PollerState>,
}

impl WatermarkPoller {
    pub fn new(
        source: Arc<dyn MetricsSource>,
        notifier: Arc<dyn Notifier>,
        token_address: String,
        config: PollerConfig,
    ) -> Self {
        let backoff = Backoff::new(config.interval(), config.max_backoff(), config.jitter());
        let (state, _) = watch::channel(PollerState::default());
        Self {
            source,
            notifier,
            token_address,
            config,
            backoff,
            watermark: Watermark::default(),
            seeded: false,
            consecutive_failures: 0,
            last_success: None,
            last_snapshot: None,
            notifications_sent: 0,
            state,
        }
    }

    pub fn watermark(&self) -> Option<i64> {
        self.watermark.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollerState> {
        self.state.subscribe()
    }

    fn publish(&self) {
        self.state.send_replace(PollerState {
            watermark: self.watermark.get(),
            last_snapshot: self.last_snapshot.clone(),
            consecutive_failures: self.consecutive_failures,
            last_success: self.last_success,
            notifications_sent: self.notifications_sent,
        });
    }

    /// Token details for an alert: fresh if possible, otherwise the last good
    /// snapshot, otherwise just the address.
    async fn token_context(&mut self) -> TokenSnapshot {
        match self.source.fetch_token_snapshot(&self.token_address).await {
            Ok(snapshot) => {
                self.last_snapshot = Some(snapshot.clone());
                snapshot
            }
            Err(e) => {
                warn!("Using cached token context, fetch failed: {}", e);
                self.last_snapshot
                    .clone()
                    .unwrap_or_else(|| TokenSnapshot::bare(&self.token_address))
            }
        }
    }

    /// One poll: fetch trades, announce what is new, advance the watermark.
    pub async fn tick(&mut self) -> TickOutcome {
        metrics::record_tick();
        debug!("Fetching latest trades for {}", self.token_address);

        let trades = match self.source.fetch_latest_trades(&self.token_address).await {
            Ok(trades) => trades,
            Err(e) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                metrics::record_fetch_failure();
                error!(
                    "Error fetching latest trades ({} consecutive): {}",
                    self.consecutive_failures, e
                );
                self.publish();
                return TickOutcome::FetchFailed;
            }
        };

        self.consecutive_failures = 0;
        self.last_success = Some(Utc::now());
        for trade in trades.iter().filter(|t| t.block_timestamp.is_none()) {
            warn!("Trade {} missing blockTimestamp, skipping", trade.txn_id);
        }

        let first_poll = !self.seeded;
        self.seeded = true;

        let selected = select_new_buys(&trades, self.watermark, self.config.announce);
        if selected.is_empty() {
            self.publish();
            return TickOutcome::Idle;
        }

        if first_poll && self.config.skip_initial_backlog {
            if let Some(newest) = selected.iter().filter_map(|t| t.block_timestamp).max() {
                self.watermark.advance(newest);
                metrics::record_watermark(newest);
                info!("Watermark seeded at {} without announcing backlog", newest);
                self.publish();
                return TickOutcome::Seeded(newest);
            }
        }

        let context = self.token_context().await;
        let mut notified = 0;
        for trade in selected {
            let Some(timestamp) = trade.block_timestamp else {
                continue;
            };
            info!("New buy transaction found: {} at {}", trade.txn_id, timestamp);
            self.notifier.notify(trade, &context).await;
            self.watermark.advance(timestamp);
            metrics::record_watermark(timestamp);
            self.notifications_sent += 1;
            notified += 1;
        }

        self.publish();
        TickOutcome::Notified(notified)
    }

    /// Spawns the poll loop. The first poll runs immediately.
    pub fn start(mut self) -> PollerHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let state = self.subscribe();

        let join = tokio::spawn(async move {
            info!(
                "Watermark poller started for {} (interval {:?})",
                self.token_address,
                self.config.interval()
            );
            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    outcome = self.tick() => debug!("Poll finished: {:?}", outcome),
                }

                let delay = self.backoff.next_delay(self.consecutive_failures);
                if self.consecutive_failures > 0 {
                    warn!("Backing off for {:?} before next poll", delay);
                }
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            info!("Watermark poller stopped");
        });

        PollerHandle {
            shutdown: Some(shutdown_tx),
            join,
            state,
        }
    }
}

/// Owner of a running poller. Dropping it also stops the loop.
pub struct PollerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
    state: watch::Receiver<PollerState>,
}

impl PollerHandle {
    pub fn state(&self) -> PollerState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollerState> {
        self.state.clone()
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.join).await {
            error!("Poller task ended abnormally: {}", e);
        }
    }
}
