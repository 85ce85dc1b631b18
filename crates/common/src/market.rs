use async_trait::async_trait;

use crate::{Candle, Result};

/// Abstraction over the exchange's public market-data endpoints.
///
/// `BybitClient` implements this for production. Both engines hold a
/// `dyn MarketData` and never talk to the exchange any other way, so tests
/// can substitute scripted data.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Fetch at least `limit` OHLCV candles for `pair` at `timeframe`,
    /// oldest first. Fails with `Error::InsufficientData` when the exchange
    /// has fewer rows than requested.
    async fn ohlcv(&self, pair: &str, timeframe: &str, limit: usize) -> Result<Vec<Candle>>;

    /// Latest traded price for `pair`.
    async fn last_price(&self, pair: &str) -> Result<f64>;
}
