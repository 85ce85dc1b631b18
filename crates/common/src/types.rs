use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV candle from the exchange. Series are always oldest-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Confirmed side of a signal. A held pair has no direction yet, so `Hold`
/// is deliberately not a variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

impl Direction {
    /// Notification text for an entry signal, e.g. "BTC/USDT: Enter long position".
    pub fn entry_message(&self, pair: &str) -> String {
        match self {
            Direction::Long => format!("{pair}: Enter long position"),
            Direction::Short => format!("{pair}: Enter short position"),
        }
    }
}
