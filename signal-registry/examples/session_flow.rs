// Example: Signal Session Flow
// Loads demo signals, walks a few through cancel/resume and settlement,
// then prints the session summary

use chrono::Utc;
use common::SignalStatus;
use rust_decimal_macros::dec;
use signal_registry::{DemoFeed, RegistryConfig, SessionSummary, SignalRegistry, SignalUpdate};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("=== Signal Registry - Session Flow Example ===\n");

    let now = Utc::now();
    let config = RegistryConfig::default();
    let feed = Arc::new(DemoFeed::anchored(now, config.timezone()?));
    let mut registry = SignalRegistry::new(config, feed)?;
    registry.load(now).await?;

    println!("Loaded {} signals", registry.len());

    let open: Vec<_> = registry
        .signals()
        .iter()
        .filter(|signal| registry.is_available_at(signal, now))
        .map(|signal| signal.id())
        .take(3)
        .collect();

    if let &[canceled, won, lost] = open.as_slice() {
        registry.update_signal(canceled, SignalUpdate::status(SignalStatus::Canceled))?;
        registry.update_signal(canceled, SignalUpdate::status(SignalStatus::Waiting))?;
        registry.update_signal(canceled, SignalUpdate::status(SignalStatus::Canceled))?;

        registry.update_signal(won, SignalUpdate::status(SignalStatus::InProgress))?;
        registry.update_signal(won, SignalUpdate::settled(SignalStatus::Win, 1, dec!(8.70)))?;

        registry.update_signal(lost, SignalUpdate::status(SignalStatus::InProgress))?;
        registry.update_signal(
            lost,
            SignalUpdate::settled(SignalStatus::Loss, 2, dec!(-21.00)).with_info("gale limit reached"),
        )?;
    }

    println!();
    for signal in registry.signals() {
        println!(
            "  {} {:<11} {:<3} {:<4} {:<11} available until {}",
            signal.date().format("%H:%M"),
            signal.signal.active,
            signal.signal.expiration,
            signal.signal.direction,
            signal.status,
            registry.available_date(signal).format("%H:%M:%S"),
        );
    }

    let summary = SessionSummary::from_signals(registry.signals());
    println!("\nWins: {}  Losses: {}  Net profit: ${}", summary.wins, summary.losses, summary.net_profit);
    if let Some(hit_rate) = summary.hit_rate {
        println!("Hit rate: {:.1}%", hit_rate * 100.0);
    }

    Ok(())
}
