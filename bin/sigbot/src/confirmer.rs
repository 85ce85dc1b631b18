use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use common::{SignalConfig, TelegramConfig};
use confirm::{ConfirmEngine, EmaEvaluator};
use mailbox::Mailbox;
use market::BybitClient;
use notify::TelegramNotifier;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // Fail fast on missing credentials rather than sending into the void.
    let telegram = TelegramConfig::from_env();
    let cfg = SignalConfig::load(&SignalConfig::path_from_env());
    info!(
        timeframe = %cfg.timeframe,
        mailbox = %cfg.mailbox_path,
        ema_fast = cfg.confirmer.ema_fast,
        ema_slow = cfg.confirmer.ema_slow,
        "SigBot confirmation engine starting"
    );

    let market = Arc::new(BybitClient::new());
    let evaluator = Arc::new(EmaEvaluator::new(
        market,
        &cfg.confirmer,
        cfg.timeframe.clone(),
    ));
    let notifier = Arc::new(TelegramNotifier::new(&telegram));
    let mailbox = Mailbox::new(&cfg.mailbox_path);
    let engine = ConfirmEngine::new(evaluator, notifier, mailbox, cfg.confirmer.clone());

    tokio::select! {
        _ = engine.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting.");
        }
    }
}
