pub mod scanner;
pub mod source;
pub mod state;
pub mod triple;

pub use scanner::TrendScanner;
pub use source::{StochRsiSource, TrendSource};
pub use state::ScannerState;
pub use triple::{Trend, TrendTriple};
