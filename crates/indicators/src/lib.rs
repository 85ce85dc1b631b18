pub mod ema;
pub mod stoch_rsi;

pub use ema::Ema;
pub use stoch_rsi::StochRsi;
