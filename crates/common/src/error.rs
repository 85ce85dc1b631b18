use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Network or exchange-side failure while fetching market data.
    #[error("Provider error: {0}")]
    Provider(String),

    /// The exchange returned fewer candles than the caller asked for.
    #[error("Insufficient data for {pair}: got {got} candles, need {need}")]
    InsufficientData {
        pair: String,
        got: usize,
        need: usize,
    },

    /// Missing or malformed mailbox document. Always recoverable — the
    /// reader retries on the next poll.
    #[error("Mailbox read error: {0}")]
    Mailbox(String),

    /// Indicator arithmetic could not produce a value from the given series.
    #[error("Computation error: {0}")]
    Computation(String),

    /// Notification not accepted by the delivery channel.
    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
