use std::sync::Arc;

use async_trait::async_trait;

use common::{config::ConfirmerConfig, Error, MarketData, Result};
use indicators::Ema;

/// Live price and the two EMAs it is checked against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub price: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
}

impl Evaluation {
    /// Price above both moving averages.
    pub fn confirms_long(&self) -> bool {
        self.price > self.ema_fast && self.price > self.ema_slow
    }

    /// Price below both moving averages.
    pub fn confirms_short(&self) -> bool {
        self.price < self.ema_fast && self.price < self.ema_slow
    }
}

/// Produces the EMA evaluation for one pair. Failures carry the reason
/// (provider, data insufficiency, computation); the engine logs and skips.
#[async_trait]
pub trait PairEvaluator: Send + Sync {
    async fn evaluate(&self, pair: &str) -> Result<Evaluation>;
}

/// Fetches candle history plus the live last-price and computes the
/// fast/slow EMAs with the live price appended as the forming candle.
pub struct EmaEvaluator {
    market: Arc<dyn MarketData>,
    fast: Ema,
    slow: Ema,
    timeframe: String,
    candle_limit: usize,
}

impl EmaEvaluator {
    pub fn new(
        market: Arc<dyn MarketData>,
        cfg: &ConfirmerConfig,
        timeframe: impl Into<String>,
    ) -> Self {
        Self {
            market,
            fast: Ema::new(cfg.ema_fast),
            slow: Ema::new(cfg.ema_slow),
            timeframe: timeframe.into(),
            candle_limit: cfg.candle_limit,
        }
    }
}

#[async_trait]
impl PairEvaluator for EmaEvaluator {
    async fn evaluate(&self, pair: &str) -> Result<Evaluation> {
        let candles = self
            .market
            .ohlcv(pair, &self.timeframe, self.candle_limit)
            .await?;
        let price = self.market.last_price(pair).await?;

        let mut closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        closes.push(price);

        let ema_fast = self.fast.compute(&closes).ok_or_else(|| {
            Error::Computation(format!("EMA{} undefined for {pair}", self.fast.window))
        })?;
        let ema_slow = self.slow.compute(&closes).ok_or_else(|| {
            Error::Computation(format!("EMA{} undefined for {pair}", self.slow.window))
        })?;

        Ok(Evaluation {
            price,
            ema_fast,
            ema_slow,
        })
    }
}
