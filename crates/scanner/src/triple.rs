/// Trend classification of one pair for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Long,
    Short,
    Hold,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Long => write!(f, "long"),
            Trend::Short => write!(f, "short"),
            Trend::Hold => write!(f, "hold"),
        }
    }
}

/// Three trend-indicator samples taken at fixed intervals, in time order.
/// A sample is `None` when its fetch or computation failed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrendTriple {
    pub t1: Option<f64>,
    pub t2: Option<f64>,
    pub t3: Option<f64>,
}

impl TrendTriple {
    pub fn new(t1: Option<f64>, t2: Option<f64>, t3: Option<f64>) -> Self {
        Self { t1, t2, t3 }
    }

    /// All three samples present.
    pub fn complete(&self) -> bool {
        self.t1.is_some() && self.t2.is_some() && self.t3.is_some()
    }

    /// Strictly increasing → `Long`, strictly decreasing → `Short`,
    /// anything else (ties or any absent sample) → `Hold`.
    pub fn classify(&self) -> Trend {
        match (self.t1, self.t2, self.t3) {
            (Some(a), Some(b), Some(c)) if a < b && b < c => Trend::Long,
            (Some(a), Some(b), Some(c)) if a > b && b > c => Trend::Short,
            _ => Trend::Hold,
        }
    }
}
