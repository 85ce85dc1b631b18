use mailbox::CandidateLists;

/// Owned confirmation-engine state: the last mailbox snapshot (for change
/// detection) and the holding set of pairs whose last EMA check was
/// inconclusive.
#[derive(Debug, Default)]
pub struct ConfirmState {
    previous: CandidateLists,
    holding: Vec<String>,
}

impl ConfirmState {
    pub fn previous(&self) -> &CandidateLists {
        &self.previous
    }

    pub fn holding(&self) -> &[String] {
        &self.holding
    }

    pub fn set_previous(&mut self, lists: CandidateLists) {
        self.previous = lists;
    }

    /// Park a pair for re-checking on later passes.
    pub fn hold(&mut self, pair: &str) {
        if !self.holding.iter().any(|p| p == pair) {
            self.holding.push(pair.to_string());
        }
    }

    /// Remove a confirmed pair from the holding set.
    pub fn release(&mut self, pair: &str) {
        self.holding.retain(|p| p != pair);
    }

    /// Full reset: forget the snapshot and the holding set, forcing the
    /// next changed mailbox read to reprocess everything from scratch.
    pub fn reset(&mut self) {
        self.previous = CandidateLists::default();
        self.holding.clear();
    }
}
