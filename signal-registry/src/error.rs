// Registry Errors
// Failures surfaced to callers of the signal registry; none are retried here

use chrono::NaiveDate;
use common::{SignalStatus, Uuid};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// The feed fetch for a trading day failed or timed out
    #[error("signal feed unavailable for {date}: {reason}")]
    FeedUnavailable { date: NaiveDate, reason: String },

    #[error("signal {0} not found")]
    SignalNotFound(Uuid),

    #[error("signal {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: Uuid,
        from: SignalStatus,
        to: SignalStatus,
    },

    #[error("invalid update for signal {id}: {reason}")]
    InvalidUpdate { id: Uuid, reason: String },

    #[error("signal load cancelled")]
    Cancelled,
}

pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
