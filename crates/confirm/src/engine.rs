use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use common::{config::ConfirmerConfig, Direction, Notify};
use mailbox::{CandidateLists, Mailbox};

use crate::evaluator::{Evaluation, PairEvaluator};
use crate::state::ConfirmState;

/// The confirmation engine: polls the mailbox for candidate lists, validates
/// each candidate and held pair against the EMA rule, and raises exactly one
/// notification per confirmed entry.
pub struct ConfirmEngine {
    evaluator: Arc<dyn PairEvaluator>,
    notifier: Arc<dyn Notify>,
    mailbox: Mailbox,
    cfg: ConfirmerConfig,
    state: ConfirmState,
    last_reset: Instant,
}

impl ConfirmEngine {
    pub fn new(
        evaluator: Arc<dyn PairEvaluator>,
        notifier: Arc<dyn Notify>,
        mailbox: Mailbox,
        cfg: ConfirmerConfig,
    ) -> Self {
        Self {
            evaluator,
            notifier,
            mailbox,
            cfg,
            state: ConfirmState::default(),
            last_reset: Instant::now(),
        }
    }

    /// Run the engine forever. Only process termination stops it; every
    /// failure inside a cycle is logged and retried on the next poll.
    pub async fn run(mut self) {
        info!("Confirmation engine running");
        loop {
            self.poll_once().await;
            tokio::time::sleep(self.cfg.poll_interval()).await;
        }
    }

    /// One polling cycle: full reset when due, then read the mailbox and run
    /// a confirmation pass if the candidate lists changed since last read.
    async fn poll_once(&mut self) {
        if self.last_reset.elapsed() >= self.cfg.refresh() {
            info!("Refresh due, clearing holding set and mailbox snapshot");
            self.state.reset();
            self.last_reset = Instant::now();
        }

        let current = match self.mailbox.load() {
            Ok(lists) => lists,
            Err(e) => {
                warn!(error = %e, "Mailbox read failed, retrying next cycle");
                return;
            }
        };

        if current == *self.state.previous() {
            debug!("No mailbox changes");
            return;
        }

        info!(
            longs = current.long_candidates.len(),
            shorts = current.short_candidates.len(),
            held = self.state.holding().len(),
            "Mailbox changed, running confirmation pass"
        );
        self.confirmation_pass(&current).await;
        self.state.set_previous(current);
    }

    /// Validate candidates and held pairs, in order: long candidates, short
    /// candidates, then a snapshot of the holding set.
    async fn confirmation_pass(&mut self, current: &CandidateLists) {
        for pair in &current.long_candidates {
            let Some(eval) = self.try_evaluate(pair).await else {
                continue;
            };
            if eval.confirms_long() {
                self.announce(pair, Direction::Long).await;
            } else {
                info!(pair = %pair, price = eval.price, "Long not confirmed, holding");
                self.state.hold(pair);
            }
        }

        for pair in &current.short_candidates {
            let Some(eval) = self.try_evaluate(pair).await else {
                continue;
            };
            if eval.confirms_short() {
                self.announce(pair, Direction::Short).await;
            } else {
                info!(pair = %pair, price = eval.price, "Short not confirmed, holding");
                self.state.hold(pair);
            }
        }

        // Snapshot the holding set first: confirmed pairs leave it while we
        // iterate, inconclusive ones stay for the next pass.
        for pair in self.state.holding().to_vec() {
            let Some(eval) = self.try_evaluate(&pair).await else {
                continue;
            };
            if eval.confirms_long() {
                self.announce(&pair, Direction::Long).await;
                self.state.release(&pair);
            } else if eval.confirms_short() {
                self.announce(&pair, Direction::Short).await;
                self.state.release(&pair);
            }
        }
    }

    async fn try_evaluate(&self, pair: &str) -> Option<Evaluation> {
        match self.evaluator.evaluate(pair).await {
            Ok(eval) => Some(eval),
            Err(e) => {
                warn!(pair = %pair, error = %e, "Evaluation failed, skipping pair");
                None
            }
        }
    }

    /// Raise the entry notification. The confirmation stands even when
    /// delivery fails — the notifier logs the failure and the pair is not
    /// re-queued for it.
    async fn announce(&self, pair: &str, direction: Direction) {
        info!(pair = %pair, direction = %direction, "Entry confirmed");
        if !self.notifier.notify(&direction.entry_message(pair)).await {
            warn!(pair = %pair, "Notification not delivered");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use common::{Error, Result};

    struct ScriptedEvaluator {
        evals: Mutex<HashMap<String, Evaluation>>,
    }

    impl ScriptedEvaluator {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                evals: Mutex::new(HashMap::new()),
            })
        }

        async fn set(&self, pair: &str, price: f64, ema_fast: f64, ema_slow: f64) {
            self.evals.lock().await.insert(
                pair.to_string(),
                Evaluation {
                    price,
                    ema_fast,
                    ema_slow,
                },
            );
        }
    }

    #[async_trait]
    impl PairEvaluator for ScriptedEvaluator {
        async fn evaluate(&self, pair: &str) -> Result<Evaluation> {
            self.evals
                .lock()
                .await
                .get(pair)
                .copied()
                .ok_or_else(|| Error::Provider(format!("no data for {pair}")))
        }
    }

    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
        deliver: bool,
    }

    impl RecordingNotifier {
        fn new(deliver: bool) -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                deliver,
            })
        }

        async fn messages(&self) -> Vec<String> {
            self.sent.lock().await.clone()
        }
    }

    #[async_trait]
    impl Notify for RecordingNotifier {
        async fn notify(&self, text: &str) -> bool {
            self.sent.lock().await.push(text.to_string());
            self.deliver
        }
    }

    fn temp_mailbox(name: &str) -> (Mailbox, Mailbox) {
        let mut path = std::env::temp_dir();
        path.push(format!("sigbot-confirm-{}-{name}.json", std::process::id()));
        let _ = std::fs::remove_file(&path);
        (Mailbox::new(path.clone()), Mailbox::new(path))
    }

    fn make_engine(
        name: &str,
    ) -> (
        ConfirmEngine,
        Arc<ScriptedEvaluator>,
        Arc<RecordingNotifier>,
        Mailbox,
    ) {
        let evaluator = ScriptedEvaluator::new();
        let notifier = RecordingNotifier::new(true);
        let (engine_side, writer_side) = temp_mailbox(name);
        let engine = ConfirmEngine::new(
            evaluator.clone(),
            notifier.clone(),
            engine_side,
            ConfirmerConfig::default(),
        );
        (engine, evaluator, notifier, writer_side)
    }

    fn longs(pairs: &[&str]) -> CandidateLists {
        let mut lists = CandidateLists::default();
        for pair in pairs {
            lists.add_long(pair);
        }
        lists
    }

    #[tokio::test(start_paused = true)]
    async fn confirmed_long_notifies_once_and_is_not_held() {
        let (mut engine, evaluator, notifier, writer) = make_engine("long-confirmed");
        evaluator.set("BTC/USDT", 105.0, 100.0, 98.0).await;
        writer.save(&longs(&["BTC/USDT"])).unwrap();

        engine.poll_once().await;

        assert_eq!(
            notifier.messages().await,
            vec!["BTC/USDT: Enter long position"]
        );
        assert!(engine.state.holding().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unconfirmed_long_is_held_without_notification() {
        let (mut engine, evaluator, notifier, writer) = make_engine("long-held");
        evaluator.set("BTC/USDT", 95.0, 100.0, 98.0).await;
        writer.save(&longs(&["BTC/USDT"])).unwrap();

        engine.poll_once().await;

        assert!(notifier.messages().await.is_empty());
        assert_eq!(engine.state.holding(), &["BTC/USDT".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_mailbox_does_not_rerun_the_pass() {
        let (mut engine, evaluator, notifier, writer) = make_engine("unchanged");
        evaluator.set("BTC/USDT", 105.0, 100.0, 98.0).await;
        writer.save(&longs(&["BTC/USDT"])).unwrap();

        engine.poll_once().await;
        engine.poll_once().await;
        engine.poll_once().await;

        assert_eq!(notifier.messages().await.len(), 1, "one pass, one alert");
    }

    #[tokio::test(start_paused = true)]
    async fn held_pair_confirms_on_a_later_changed_read() {
        let (mut engine, evaluator, notifier, writer) = make_engine("held-confirms");
        evaluator.set("BTC/USDT", 95.0, 100.0, 98.0).await;
        writer.save(&longs(&["BTC/USDT"])).unwrap();
        engine.poll_once().await;
        assert!(notifier.messages().await.is_empty());

        // Scanner clears its super-cycle; price now clears both EMAs. The
        // changed (now empty) mailbox triggers a pass over the holding set.
        evaluator.set("BTC/USDT", 105.0, 100.0, 98.0).await;
        writer.clear().unwrap();
        engine.poll_once().await;

        assert_eq!(
            notifier.messages().await,
            vec!["BTC/USDT: Enter long position"]
        );
        assert!(engine.state.holding().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn short_candidate_confirms_below_both_emas() {
        let (mut engine, evaluator, notifier, writer) = make_engine("short-confirmed");
        evaluator.set("XRP/USDT", 0.4, 0.5, 0.45).await;
        let mut lists = CandidateLists::default();
        lists.add_short("XRP/USDT");
        writer.save(&lists).unwrap();

        engine.poll_once().await;

        assert_eq!(
            notifier.messages().await,
            vec!["XRP/USDT: Enter short position"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_clears_holding_and_snapshot() {
        let (mut engine, evaluator, notifier, writer) = make_engine("refresh");
        evaluator.set("BTC/USDT", 95.0, 100.0, 98.0).await;
        writer.save(&longs(&["BTC/USDT"])).unwrap();
        engine.poll_once().await;
        assert_eq!(engine.state.holding().len(), 1);

        tokio::time::sleep(engine.cfg.refresh()).await;
        engine.poll_once().await;

        // Holding was cleared; the unchanged mailbox now counts as a fresh
        // change against the empty snapshot, so the pair was re-held by the
        // rerun pass rather than carried over.
        assert!(engine.state.previous() == &longs(&["BTC/USDT"]));
        assert_eq!(engine.state.holding(), &["BTC/USDT".to_string()]);
        assert!(notifier.messages().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_delivery_still_counts_as_confirmed() {
        let evaluator = ScriptedEvaluator::new();
        let notifier = RecordingNotifier::new(false);
        let (engine_side, writer) = temp_mailbox("failed-delivery");
        let mut engine = ConfirmEngine::new(
            evaluator.clone(),
            notifier.clone(),
            engine_side,
            ConfirmerConfig::default(),
        );

        evaluator.set("BTC/USDT", 105.0, 100.0, 98.0).await;
        writer.save(&longs(&["BTC/USDT"])).unwrap();
        engine.poll_once().await;

        assert_eq!(notifier.messages().await.len(), 1);
        assert!(
            engine.state.holding().is_empty(),
            "pair stays confirmed even though delivery failed"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn evaluation_failure_skips_the_pair_for_the_cycle() {
        let (mut engine, _evaluator, notifier, writer) = make_engine("eval-failure");
        // No evaluation scripted for the pair — every evaluate() errors.
        writer.save(&longs(&["GHOST/USDT"])).unwrap();

        engine.poll_once().await;

        assert!(notifier.messages().await.is_empty());
        assert!(engine.state.holding().is_empty(), "skipped, not held");
    }

    #[tokio::test(start_paused = true)]
    async fn missing_mailbox_is_a_recoverable_no_op() {
        let (mut engine, _evaluator, notifier, _writer) = make_engine("no-mailbox");
        engine.poll_once().await;
        assert!(notifier.messages().await.is_empty());
    }
}
