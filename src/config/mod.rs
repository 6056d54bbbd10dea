use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub poller: PollerConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Destination for buy alerts and group announcements.
    pub chat_id: String,
    pub enable_notifications: bool,
    /// Sent as a photo with the buy alert as caption when set.
    pub image_url: Option<String>,
    pub explorer_url: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            enable_notifications: true,
            image_url: None,
            explorer_url: "https://solanabeach.io/address".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub chain_id: String,
    pub token_address: String,
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.moonshot.cc".to_string(),
            chain_id: "solana".to_string(),
            token_address: String::new(),
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct NewsConfig {
    pub api_key: String,
    pub base_url: String,
    pub query: String,
    pub limit: usize,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://newsapi.org/v2".to_string(),
            query: "memecoin".to_string(),
            limit: 3,
        }
    }
}

/// Which new buys a single poll announces.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnnouncePolicy {
    /// Only the newest buy; older new buys in the same batch are skipped.
    #[default]
    LatestOnly,
    /// Every buy newer than the watermark, oldest first.
    EveryNewBuy,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PollerConfig {
    pub interval_secs: u64,
    pub max_backoff_secs: u64,
    pub jitter_ms: u64,
    pub announce: AnnouncePolicy,
    /// Seed the watermark on the first successful poll without announcing.
    pub skip_initial_backlog: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            max_backoff_secs: 600,
            jitter_ms: 5_000,
            announce: AnnouncePolicy::LatestOnly,
            skip_initial_backlog: false,
        }
    }
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs)
    }

    pub fn jitter(&self) -> Duration {
        Duration::from_millis(self.jitter_ms)
    }
}

impl Config {
    /// Reads a TOML file, then lets the environment override secrets and ids.
    pub fn load(path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&config_str)?;
        config.apply_env(|key| env::var(key).ok());
        Ok(config)
    }

    /// Builds a configuration from defaults and environment variables only.
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env(|key| env::var(key).ok());
        config
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str =
            toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, config_str)?;
        Ok(())
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty("TELEGRAM_TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Some(chat_id) = non_empty("TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = chat_id;
        }
        if let Some(address) = non_empty("TOKEN_ADDRESS") {
            self.api.token_address = address;
        }
        if let Some(base) = non_empty("MOONSHOT_API_BASE") {
            self.api.base_url = base;
        }
        if let Some(chain) = non_empty("CHAIN_ID") {
            self.api.chain_id = chain;
        }
        if let Some(key) = non_empty("NEWS_TOKEN").or_else(|| non_empty("NEWS_API_KEY")) {
            self.news.api_key = key;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            return Err(Error::Config("telegram.bot_token is empty".into()));
        }
        self.chat_id()?;
        if self.api.token_address.trim().is_empty() {
            return Err(Error::Config("api.token_address is empty".into()));
        }
        if self.poller.interval_secs == 0 {
            return Err(Error::Config("poller.interval_secs must be positive".into()));
        }
        if self.api.request_timeout_secs == 0 {
            return Err(Error::Config("api.request_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn chat_id(&self) -> Result<i64> {
        self.telegram
            .chat_id
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("invalid telegram.chat_id: {:?}", self.telegram.chat_id)))
    }
}
