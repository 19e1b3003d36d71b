// Session Summary
// Aggregate view of the day's signals for status displays

use common::{SignalStatus, SignalWithStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_signals: usize,
    pub by_status: HashMap<SignalStatus, usize>,
    pub wins: usize,
    pub losses: usize,
    /// wins / (wins + losses); `None` before the first settlement
    pub hit_rate: Option<f64>,
    pub net_profit: Decimal,
    pub martingales_used: u32,
}

impl SessionSummary {
    pub fn from_signals(signals: &[SignalWithStatus]) -> Self {
        let mut summary = SessionSummary {
            total_signals: signals.len(),
            ..Default::default()
        };

        for signal in signals {
            *summary.by_status.entry(signal.status).or_insert(0) += 1;

            match signal.status {
                SignalStatus::Win => summary.wins += 1,
                SignalStatus::Loss => summary.losses += 1,
                _ => {}
            }

            if let Some(result) = &signal.result {
                summary.net_profit += result.profit;
                summary.martingales_used += result.martingales;
            }
        }

        let settled = summary.wins + summary.losses;
        if settled > 0 {
            summary.hit_rate = Some(summary.wins as f64 / settled as f64);
        }

        summary
    }

    pub fn count(&self, status: SignalStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}
