use anyhow::Result;
use chrono::Utc;
use signal_registry::{
    load_config, DemoFeed, RegistryConfig, SessionSummary, SignalFeed, SignalRegistry,
    TemplateFeed,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, Level};
use tracing_subscriber::fmt;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    fmt().with_max_level(Level::INFO).init();

    let config_path = std::env::var("SIGNAL_DESK_CONFIG")
        .unwrap_or_else(|_| "signal-desk.toml".to_string());

    let mut config = if Path::new(&config_path).exists() {
        load_config(&config_path)?
    } else {
        info!("No config at {}, using defaults", config_path);
        RegistryConfig::default()
    };
    config.apply_env_overrides();

    let timezone = config.timezone()?;

    let feed: Arc<dyn SignalFeed> = if config.debug_signals {
        info!("DEBUG_SIGNALS enabled, serving demo signals");
        Arc::new(DemoFeed::new(timezone))
    } else {
        let path = config
            .template_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("config/signals.txt"));
        Arc::new(TemplateFeed::from_path(path, timezone)?)
    };

    let mut registry = SignalRegistry::new(config, feed)?;

    // Ctrl-C aborts a slow load
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    info!("🚀 Starting Signal Desk");

    let now = Utc::now();
    registry.load_with_cancel(now, cancel_rx).await?;

    if let Some(date) = registry.trading_date() {
        info!("Signals for {} ({} total)", date, registry.len());
    }

    for signal in registry.signals() {
        let time = signal.date().with_timezone(&timezone).format("%H:%M");
        let core = &signal.signal;

        match registry.countdown_at(signal, now) {
            Some(left) => info!(
                "  {} {:<11} {:<3} {:<4} {:<11} locks in {}s",
                time,
                core.active,
                core.expiration,
                core.direction,
                signal.status,
                left.num_seconds()
            ),
            None => info!(
                "  {} {:<11} {:<3} {:<4} {:<11} locked",
                time, core.active, core.expiration, core.direction, signal.status
            ),
        }
    }

    let summary = SessionSummary::from_signals(registry.signals());
    info!(
        "Waiting: {}, Canceled: {}, Win/Loss: {}/{}, Net profit: {}",
        summary.count(common::SignalStatus::Waiting),
        summary.count(common::SignalStatus::Canceled),
        summary.wins,
        summary.losses,
        summary.net_profit
    );

    Ok(())
}
