use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use common::SignalConfig;
use mailbox::Mailbox;
use market::BybitClient;
use scanner::{StochRsiSource, TrendScanner};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let cfg = SignalConfig::load(&SignalConfig::path_from_env());
    info!(
        pairs = cfg.pairs.len(),
        timeframe = %cfg.timeframe,
        mailbox = %cfg.mailbox_path,
        "SigBot trend scanner starting"
    );

    let market = Arc::new(BybitClient::new());
    let source = Arc::new(StochRsiSource::new(
        market,
        &cfg.scanner,
        cfg.timeframe.clone(),
    ));
    let mailbox = Mailbox::new(&cfg.mailbox_path);
    let scanner = TrendScanner::new(source, mailbox, cfg.scanner.clone(), cfg.pairs.clone());

    tokio::select! {
        _ = scanner.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting.");
        }
    }
}
