/// EMA (Exponential Moving Average) indicator.
///
/// Seeds with the SMA of the first `window` values, then applies the
/// standard recursion with k = 2 / (window + 1) over the remainder.
/// Returns `None` until at least `window` values are available.
#[derive(Debug, Clone)]
pub struct Ema {
    pub window: usize,
}

impl Ema {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "EMA window must be >= 1");
        Self { window }
    }

    /// Compute the EMA at the tail of a slice of close prices (oldest first).
    /// Returns `None` if there are fewer than `window` values.
    pub fn compute(&self, closes: &[f64]) -> Option<f64> {
        if closes.len() < self.window {
            return None;
        }

        let k = 2.0 / (self.window as f64 + 1.0);
        let mut ema = closes[..self.window].iter().sum::<f64>() / self.window as f64;
        for &price in &closes[self.window..] {
            ema = price * k + ema * (1.0 - k);
        }
        Some(ema)
    }
}
