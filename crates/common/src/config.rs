use std::time::Duration;

use serde::Deserialize;

/// Telegram credentials, sourced from the process environment.
/// Only the confirmer process needs these. Missing variables cause an
/// immediate panic with a clear message.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

impl TelegramConfig {
    /// Load credentials from environment variables. Loads `.env` if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        Self {
            bot_token: required_env("TELEGRAM_TOKEN"),
            chat_id: required_env("TELEGRAM_CHAT_ID"),
        }
    }
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        panic!("Required environment variable '{key}' is not set. Check your .env file.")
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Non-secret parameters shared by both processes (TOML).
///
/// Example `config/signals.toml`:
/// ```toml
/// pairs = ["BTC/USDT", "ETH/USDT"]
/// timeframe = "1d"
/// mailbox_path = "pairs.json"
///
/// [scanner]
/// sample_interval_secs = 60
/// refresh_secs = 600
///
/// [confirmer]
/// poll_secs = 60
/// ema_fast = 50
/// ema_slow = 200
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SignalConfig {
    /// Trading pairs in ccxt notation, e.g. "BTC/USDT".
    pub pairs: Vec<String>,
    /// Candle timeframe used by both indicators.
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    /// Path of the shared mailbox document.
    #[serde(default = "default_mailbox_path")]
    pub mailbox_path: String,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub confirmer: ConfirmerConfig,
}

impl SignalConfig {
    pub const DEFAULT_PATH: &'static str = "config/signals.toml";

    /// Config file path, overridable via SIGNAL_CONFIG_PATH.
    pub fn path_from_env() -> String {
        let _ = dotenvy::dotenv();
        optional_env("SIGNAL_CONFIG_PATH").unwrap_or_else(|| Self::DEFAULT_PATH.to_string())
    }

    /// Load from a TOML file. Exits process on error.
    pub fn load(path: &str) -> Self {
        let content = std::fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("Failed to read signal config at '{path}': {e}"));
        toml::from_str(&content)
            .unwrap_or_else(|e| panic!("Failed to parse signal config at '{path}': {e}"))
    }
}

fn default_timeframe() -> String {
    "1d".to_string()
}

fn default_mailbox_path() -> String {
    "pairs.json".to_string()
}

/// Trend scanner timing and indicator parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Spacing between the three trend samples.
    pub sample_interval_secs: u64,
    /// Super-cycle length: universe reset + mailbox clear cadence.
    pub refresh_secs: u64,
    pub stoch_rsi_window: usize,
    pub stoch_rsi_smooth: usize,
    /// Candle history fetched per sample; sampling fails below this.
    pub candle_limit: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            sample_interval_secs: 60,
            refresh_secs: 600,
            stoch_rsi_window: 14,
            stoch_rsi_smooth: 3,
            candle_limit: 200,
        }
    }
}

impl ScannerConfig {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(self.sample_interval_secs)
    }

    pub fn refresh(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }
}

/// Confirmation engine timing and EMA parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConfirmerConfig {
    /// Mailbox polling interval.
    pub poll_secs: u64,
    /// Full-reset cadence for the holding set and mailbox snapshot.
    pub refresh_secs: u64,
    pub ema_fast: usize,
    pub ema_slow: usize,
    /// Candle history fetched per evaluation; evaluation fails below this.
    pub candle_limit: usize,
}

impl Default for ConfirmerConfig {
    fn default() -> Self {
        Self {
            poll_secs: 60,
            refresh_secs: 600,
            ema_fast: 50,
            ema_slow: 200,
            candle_limit: 200,
        }
    }
}

impl ConfirmerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_secs)
    }

    pub fn refresh(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }
}
