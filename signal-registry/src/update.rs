// Partial Signal Updates
// Field-level override rules for changes coming from order-result integration

use common::{SignalResult, SignalStatus, SignalWithStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Partial change to the mutable part of a signal.
///
/// `None` leaves a field untouched. `result` merges per sub-field: only the
/// provided sub-fields overwrite, and a result created from a partial update
/// starts from zero martingales and zero profit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SignalStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultUpdate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub martingales: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit: Option<Decimal>,
}

impl SignalUpdate {
    pub fn status(status: SignalStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Settle the signal with a full result
    pub fn settled(status: SignalStatus, martingales: u32, profit: Decimal) -> Self {
        Self {
            status: Some(status),
            info: None,
            result: Some(ResultUpdate {
                martingales: Some(martingales),
                profit: Some(profit),
            }),
        }
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.info.is_none() && self.result.is_none()
    }

    /// Merged copy of `current`; `current` itself is not touched
    pub fn merge_into(&self, current: &SignalWithStatus) -> SignalWithStatus {
        let mut merged = current.clone();

        if let Some(status) = self.status {
            merged.status = status;
        }
        if let Some(info) = &self.info {
            merged.info = Some(info.clone());
        }
        if let Some(result) = &self.result {
            merged.result = Some(result.merge_into(merged.result.as_ref()));
        }

        merged
    }
}

impl ResultUpdate {
    pub fn merge_into(&self, current: Option<&SignalResult>) -> SignalResult {
        let mut merged = current.cloned().unwrap_or_default();

        if let Some(martingales) = self.martingales {
            merged.martingales = martingales;
        }
        if let Some(profit) = self.profit {
            merged.profit = profit;
        }

        merged
    }
}
