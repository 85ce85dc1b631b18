use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use common::{config::ScannerConfig, Error, MarketData, Result};
use indicators::StochRsi;

/// Produces one trend-indicator sample for a pair.
///
/// The scanner only sees `Option<f64>`: implementations log their own
/// failures and degrade to `None`, never propagate.
#[async_trait]
pub trait TrendSource: Send + Sync {
    async fn sample(&self, pair: &str) -> Option<f64>;
}

/// StochRSI %K over exchange klines, scaled to 0–100 and rounded to three
/// decimals.
pub struct StochRsiSource {
    market: Arc<dyn MarketData>,
    indicator: StochRsi,
    timeframe: String,
    candle_limit: usize,
}

impl StochRsiSource {
    pub fn new(market: Arc<dyn MarketData>, cfg: &ScannerConfig, timeframe: impl Into<String>) -> Self {
        Self {
            market,
            indicator: StochRsi::new(cfg.stoch_rsi_window, cfg.stoch_rsi_smooth),
            timeframe: timeframe.into(),
            candle_limit: cfg.candle_limit.max(1),
        }
    }

    async fn compute(&self, pair: &str) -> Result<f64> {
        let limit = self.candle_limit.max(self.indicator.min_closes());
        let candles = self.market.ohlcv(pair, &self.timeframe, limit).await?;
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

        let k = self
            .indicator
            .k(&closes)
            .ok_or_else(|| Error::Computation(format!("StochRSI undefined for {pair}")))?;
        Ok((k * 100.0 * 1000.0).round() / 1000.0)
    }
}

#[async_trait]
impl TrendSource for StochRsiSource {
    async fn sample(&self, pair: &str) -> Option<f64> {
        match self.compute(pair).await {
            Ok(value) => {
                debug!(pair = %pair, value, "Trend sample");
                Some(value)
            }
            Err(e) => {
                warn!(pair = %pair, error = %e, "Trend sample failed");
                None
            }
        }
    }
}
