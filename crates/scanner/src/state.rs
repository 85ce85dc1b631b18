use mailbox::CandidateLists;

use crate::triple::{Trend, TrendTriple};

/// Owned scanner state, mutated only through this API so the classification
/// flow is testable without the I/O loop.
#[derive(Debug, Default)]
pub struct ScannerState {
    /// Pairs not yet classified this super-cycle.
    universe: Vec<String>,
    /// Pairs whose last triple was ambiguous; re-tested until the refresh
    /// deadline.
    holding: Vec<String>,
    /// Pairs that produced an absent sample. Parked: removed from the
    /// universe and excluded from the reset union, so they are never
    /// retried. Matches the original behavior, odd as it is.
    missing: Vec<String>,
    /// Mirror of what has been published to the mailbox this super-cycle.
    candidates: CandidateLists,
}

impl ScannerState {
    pub fn new(pairs: Vec<String>) -> Self {
        let mut universe = Vec::with_capacity(pairs.len());
        for pair in pairs {
            if !universe.contains(&pair) {
                universe.push(pair);
            }
        }
        Self {
            universe,
            ..Self::default()
        }
    }

    pub fn universe(&self) -> &[String] {
        &self.universe
    }

    pub fn holding(&self) -> &[String] {
        &self.holding
    }

    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    pub fn candidates(&self) -> &CandidateLists {
        &self.candidates
    }

    /// Route one classified pair into its bucket. Returns the trend and
    /// whether the candidate lists changed (a new long/short confirmation
    /// that the caller must publish).
    pub fn apply(&mut self, pair: &str, triple: &TrendTriple) -> (Trend, bool) {
        remove(&mut self.universe, pair);

        if !triple.complete() {
            remove(&mut self.holding, pair);
            add_unique(&mut self.missing, pair);
            return (Trend::Hold, false);
        }

        let trend = triple.classify();
        let changed = match trend {
            Trend::Long => {
                remove(&mut self.holding, pair);
                self.candidates.add_long(pair)
            }
            Trend::Short => {
                remove(&mut self.holding, pair);
                self.candidates.add_short(pair)
            }
            Trend::Hold => {
                add_unique(&mut self.holding, pair);
                false
            }
        };
        (trend, changed)
    }

    /// Super-cycle boundary: the new universe is exactly the union of the
    /// published long candidates, short candidates, and the holding set —
    /// nothing dropped, nothing duplicated. Candidate and holding lists are
    /// cleared; missing-data pairs stay parked.
    pub fn reset(&mut self) {
        let mut universe = Vec::new();
        for pair in self
            .candidates
            .long_candidates
            .drain(..)
            .chain(self.candidates.short_candidates.drain(..))
            .chain(self.holding.drain(..))
        {
            if !universe.contains(&pair) {
                universe.push(pair);
            }
        }
        self.universe = universe;
    }
}

fn remove(list: &mut Vec<String>, pair: &str) {
    list.retain(|p| p != pair);
}

fn add_unique(list: &mut Vec<String>, pair: &str) {
    if !list.iter().any(|p| p == pair) {
        list.push(pair.to_string());
    }
}
