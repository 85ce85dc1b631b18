/// Stochastic RSI indicator (%K).
///
/// Computes a Wilder-smoothed RSI series, applies a stochastic oscillator
/// over a trailing `window` of RSI values, then smooths the result with an
/// SMA of `smooth` values. Output is in [0, 1].
///
/// Returns `None` until `min_closes()` values are available, and for
/// degenerate series where the RSI range is flat (the stochastic would
/// divide by zero).
#[derive(Debug, Clone)]
pub struct StochRsi {
    pub window: usize,
    pub smooth: usize,
}

impl StochRsi {
    pub fn new(window: usize, smooth: usize) -> Self {
        assert!(window >= 2, "StochRSI window must be >= 2");
        assert!(smooth >= 1, "StochRSI smoothing must be >= 1");
        Self { window, smooth }
    }

    /// Minimum number of closes needed for one %K value: `window` closes to
    /// seed the RSI, `window` RSI values for the stochastic, `smooth` for
    /// the SMA.
    pub fn min_closes(&self) -> usize {
        2 * self.window + self.smooth - 1
    }

    /// Compute %K at the tail of a slice of close prices (oldest first).
    pub fn k(&self, closes: &[f64]) -> Option<f64> {
        if closes.len() < self.min_closes() {
            return None;
        }

        let rsi = self.rsi_series(closes);

        // Stochastic of RSI for the last `smooth` positions only.
        let mut stoch = Vec::with_capacity(self.smooth);
        for i in rsi.len() - self.smooth..rsi.len() {
            let win = &rsi[i + 1 - self.window..=i];
            let min = win.iter().copied().fold(f64::INFINITY, f64::min);
            let max = win.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if max - min == 0.0 {
                return None; // flat RSI window, %K undefined
            }
            stoch.push((rsi[i] - min) / (max - min));
        }

        Some(stoch.iter().sum::<f64>() / self.smooth as f64)
    }

    /// Wilder-smoothed RSI over the whole series. One value per close from
    /// index `window` onward.
    fn rsi_series(&self, closes: &[f64]) -> Vec<f64> {
        let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
        let initial = &changes[..self.window];

        let mut avg_gain =
            initial.iter().filter(|&&c| c > 0.0).sum::<f64>() / self.window as f64;
        let mut avg_loss = initial.iter().filter(|&&c| c < 0.0).map(|c| c.abs()).sum::<f64>()
            / self.window as f64;

        let mut series = Vec::with_capacity(changes.len() - self.window + 1);
        series.push(rsi_value(avg_gain, avg_loss));

        for &change in &changes[self.window..] {
            let gain = if change > 0.0 { change } else { 0.0 };
            let loss = if change < 0.0 { change.abs() } else { 0.0 };
            avg_gain = (avg_gain * (self.window - 1) as f64 + gain) / self.window as f64;
            avg_loss = (avg_loss * (self.window - 1) as f64 + loss) / self.window as f64;
            series.push(rsi_value(avg_gain, avg_loss));
        }
        series
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}
