use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use common::{config::ScannerConfig, Result};
use mailbox::Mailbox;

use crate::source::TrendSource;
use crate::state::ScannerState;
use crate::triple::{Trend, TrendTriple};

/// Backoff after a failed cycle (mailbox I/O and other transient errors).
const CYCLE_BACKOFF: Duration = Duration::from_secs(60);

/// The trend scanner: classifies every pair in its universe with a
/// three-sample trend test, publishes confirmed pairs to the mailbox, and
/// re-tests ambiguous pairs until the refresh deadline, then starts over.
pub struct TrendScanner {
    source: Arc<dyn TrendSource>,
    mailbox: Mailbox,
    cfg: ScannerConfig,
    state: ScannerState,
}

impl TrendScanner {
    pub fn new(
        source: Arc<dyn TrendSource>,
        mailbox: Mailbox,
        cfg: ScannerConfig,
        pairs: Vec<String>,
    ) -> Self {
        Self {
            source,
            mailbox,
            cfg,
            state: ScannerState::new(pairs),
        }
    }

    /// Run the scanner forever. Only process termination stops it; cycle
    /// failures are logged and followed by a fixed backoff.
    pub async fn run(mut self) {
        info!(pairs = self.state.universe().len(), "Trend scanner running");
        loop {
            if let Err(e) = self.super_cycle().await {
                warn!(error = %e, "Scanner cycle failed, backing off");
                tokio::time::sleep(CYCLE_BACKOFF).await;
            }
        }
    }

    /// One super-cycle: a full pass over the universe, then repeated passes
    /// over the holding set until the refresh deadline (or the holding set
    /// drains), then a state reset and mailbox clear.
    async fn super_cycle(&mut self) -> Result<()> {
        let started = Instant::now();
        info!(universe = self.state.universe().len(), "Starting scan cycle");

        let universe = self.state.universe().to_vec();
        self.scan_round(&universe).await?;

        while started.elapsed() < self.cfg.refresh() && !self.state.holding().is_empty() {
            let holding = self.state.holding().to_vec();
            info!(held = holding.len(), "Re-testing held pairs");
            self.scan_round(&holding).await?;
            tokio::time::sleep(self.cfg.sample_interval()).await;
        }

        info!("Cycle complete, resetting universe and clearing mailbox");
        self.state.reset();
        self.mailbox.clear()?;
        Ok(())
    }

    /// Sample every pair at T1, T2 and T3 with a fixed sleep in between,
    /// then classify and publish.
    async fn scan_round(&mut self, pairs: &[String]) -> Result<()> {
        let t1 = self.sample_all(pairs).await;
        tokio::time::sleep(self.cfg.sample_interval()).await;
        let t2 = self.sample_all(pairs).await;
        tokio::time::sleep(self.cfg.sample_interval()).await;
        let t3 = self.sample_all(pairs).await;

        for pair in pairs {
            let triple = TrendTriple::new(
                t1.get(pair).copied().flatten(),
                t2.get(pair).copied().flatten(),
                t3.get(pair).copied().flatten(),
            );
            self.record(pair, &triple)?;
        }
        Ok(())
    }

    async fn sample_all(&self, pairs: &[String]) -> HashMap<String, Option<f64>> {
        let mut samples = HashMap::with_capacity(pairs.len());
        for pair in pairs {
            samples.insert(pair.clone(), self.source.sample(pair).await);
        }
        samples
    }

    /// Route one triple through the state machine and rewrite the mailbox
    /// when the candidate lists changed.
    fn record(&mut self, pair: &str, triple: &TrendTriple) -> Result<()> {
        if !triple.complete() {
            warn!(pair = %pair, "Missing trend data, parking pair");
            self.state.apply(pair, triple);
            return Ok(());
        }

        let (trend, changed) = self.state.apply(pair, triple);
        match trend {
            Trend::Long => info!(pair = %pair, ?triple, "Trend rising, entering long list"),
            Trend::Short => info!(pair = %pair, ?triple, "Trend falling, entering short list"),
            Trend::Hold => info!(pair = %pair, ?triple, "No clear trend, holding"),
        }

        if changed {
            self.mailbox.save(self.state.candidates())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use async_trait::async_trait;

    struct ScriptedSource {
        values: tokio::sync::Mutex<HashMap<String, VecDeque<Option<f64>>>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<(&str, Vec<Option<f64>>)>) -> Arc<Self> {
            let values = script
                .into_iter()
                .map(|(pair, vs)| (pair.to_string(), vs.into_iter().collect()))
                .collect();
            Arc::new(Self {
                values: tokio::sync::Mutex::new(values),
            })
        }
    }

    #[async_trait]
    impl TrendSource for ScriptedSource {
        async fn sample(&self, pair: &str) -> Option<f64> {
            self.values
                .lock()
                .await
                .get_mut(pair)
                .and_then(|q| q.pop_front())
                .flatten()
        }
    }

    fn temp_mailbox(name: &str) -> Mailbox {
        let mut path = std::env::temp_dir();
        path.push(format!("sigbot-scanner-{}-{name}.json", std::process::id()));
        let _ = std::fs::remove_file(&path);
        Mailbox::new(path)
    }

    fn make_scanner(
        name: &str,
        script: Vec<(&str, Vec<Option<f64>>)>,
        pairs: &[&str],
    ) -> (TrendScanner, Mailbox) {
        let mailbox = temp_mailbox(name);
        let read_side = temp_mailbox(name);
        let scanner = TrendScanner::new(
            ScriptedSource::new(script),
            mailbox,
            ScannerConfig::default(),
            pairs.iter().map(|p| p.to_string()).collect(),
        );
        (scanner, read_side)
    }

    #[tokio::test(start_paused = true)]
    async fn rising_triple_is_published_as_long_candidate() {
        let (mut scanner, mailbox) = make_scanner(
            "rising",
            vec![("ETH/USDT", vec![Some(20.0), Some(35.0), Some(50.0)])],
            &["ETH/USDT"],
        );

        let universe = scanner.state.universe().to_vec();
        scanner.scan_round(&universe).await.unwrap();

        let published = mailbox.load().unwrap();
        assert_eq!(published.long_candidates, vec!["ETH/USDT"]);
        assert!(published.short_candidates.is_empty());
        assert!(scanner.state.universe().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn held_pair_is_retried_and_confirmed_in_a_later_round() {
        let (mut scanner, mailbox) = make_scanner(
            "retry",
            vec![(
                "ADA/USDT",
                vec![
                    Some(50.0),
                    Some(40.0),
                    Some(60.0), // ambiguous, held
                    Some(10.0),
                    Some(20.0),
                    Some(30.0), // rising, confirmed
                ],
            )],
            &["ADA/USDT"],
        );

        let universe = scanner.state.universe().to_vec();
        scanner.scan_round(&universe).await.unwrap();
        assert_eq!(scanner.state.holding(), &["ADA/USDT".to_string()]);

        let holding = scanner.state.holding().to_vec();
        scanner.scan_round(&holding).await.unwrap();
        assert!(scanner.state.holding().is_empty());
        assert_eq!(mailbox.load().unwrap().long_candidates, vec!["ADA/USDT"]);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_sample_parks_pair_without_publishing() {
        let (mut scanner, mailbox) = make_scanner(
            "missing",
            vec![("TIA/USDT", vec![Some(20.0), None, Some(50.0)])],
            &["TIA/USDT"],
        );

        let universe = scanner.state.universe().to_vec();
        scanner.scan_round(&universe).await.unwrap();

        assert_eq!(scanner.state.missing(), &["TIA/USDT".to_string()]);
        assert!(scanner.state.holding().is_empty());
        // Nothing confirmed — the mailbox was never written.
        assert!(mailbox.load().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn super_cycle_runs_to_the_refresh_deadline_then_resets() {
        // Always-ambiguous script: the pair stays held, so the cycle keeps
        // re-testing it until the 600s deadline.
        let script: Vec<Option<f64>> = [Some(50.0), Some(40.0), Some(60.0)]
            .into_iter()
            .cycle()
            .take(30)
            .collect();
        let (mut scanner, mailbox) = make_scanner("deadline", vec![("BTC/USDT", script)], &["BTC/USDT"]);

        let started = Instant::now();
        scanner.super_cycle().await.unwrap();

        assert!(started.elapsed() >= scanner.cfg.refresh());
        // Reset re-queued the held pair and cleared the mailbox.
        assert_eq!(scanner.state.universe(), &["BTC/USDT".to_string()]);
        assert!(scanner.state.holding().is_empty());
        assert!(mailbox.load().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn super_cycle_ends_early_when_holding_drains() {
        let (mut scanner, mailbox) = make_scanner(
            "drained",
            vec![("SOL/USDT", vec![Some(10.0), Some(20.0), Some(30.0)])],
            &["SOL/USDT"],
        );

        let started = Instant::now();
        scanner.super_cycle().await.unwrap();

        // One scan round (two sample sleeps), no holding rounds.
        assert!(started.elapsed() < scanner.cfg.refresh());
        assert_eq!(scanner.state.universe(), &["SOL/USDT".to_string()]);
        assert!(mailbox.load().unwrap().is_empty());
    }
}
