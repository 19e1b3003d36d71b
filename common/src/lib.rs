//! Shared domain types for the signal desk
//!
//! Instruments, expiration buckets, directions and the signal records that the
//! registry owns. Wire names match the broker's symbols and the lower-case
//! identifiers used by the signal feed.

use anyhow::{anyhow, bail};
use chrono::{DateTime, Duration, DurationRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use uuid::Uuid;

macro_rules! actives {
    ($($variant:ident => $wire:literal),+ $(,)?) => {
        /// Instrument supported by the broker
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum Active {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl Active {
            /// Every supported instrument, in declaration order
            pub const ALL: &'static [Active] = &[$(Active::$variant),+];

            /// Broker symbol, e.g. `EURUSD` or `EURUSD-OTC`
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Active::$variant => $wire,)+
                }
            }
        }

        impl FromStr for Active {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> anyhow::Result<Self> {
                match s {
                    $($wire => Ok(Active::$variant),)+
                    other => Err(anyhow!("Unsupported active: {}", other)),
                }
            }
        }
    };
}

actives! {
    EurUsd => "EURUSD",
    EurGbp => "EURGBP",
    GbpJpy => "GBPJPY",
    EurJpy => "EURJPY",
    GbpUsd => "GBPUSD",
    UsdJpy => "USDJPY",
    AudCad => "AUDCAD",
    NzdUsd => "NZDUSD",
    UsdRub => "USDRUB",
    UsdChf => "USDCHF",
    XauUsd => "XAUUSD",
    XagUsd => "XAGUSD",
    AudUsd => "AUDUSD",
    UsdCad => "USDCAD",
    AudJpy => "AUDJPY",
    GbpCad => "GBPCAD",
    GbpChf => "GBPCHF",
    GbpAud => "GBPAUD",
    EurCad => "EURCAD",
    ChfJpy => "CHFJPY",
    CadChf => "CADCHF",
    EurAud => "EURAUD",
    AudChf => "AUDCHF",
    AudNzd => "AUDNZD",
    CadJpy => "CADJPY",
    EurChf => "EURCHF",
    GbpNzd => "GBPNZD",
    NzdCad => "NZDCAD",
    NzdJpy => "NZDJPY",
    NzdChf => "NZDCHF",
    EurNzd => "EURNZD",
    UsdNok => "USDNOK",
    UsdSek => "USDSEK",
    UsdTry => "USDTRY",
    UsdBrl => "USDBRL",
    UsdMxn => "USDMXN",
    EurUsdOtc => "EURUSD-OTC",
    EurGbpOtc => "EURGBP-OTC",
    UsdChfOtc => "USDCHF-OTC",
    EurJpyOtc => "EURJPY-OTC",
    NzdUsdOtc => "NZDUSD-OTC",
    GbpUsdOtc => "GBPUSD-OTC",
    GbpJpyOtc => "GBPJPY-OTC",
    UsdJpyOtc => "USDJPY-OTC",
    AudCadOtc => "AUDCAD-OTC",
    BtcUsd => "BTCUSD",
    EthUsd => "ETHUSD",
    LtcUsd => "LTCUSD",
    XrpUsd => "XRPUSD",
    Us30 => "US30",
    UsNdaq100 => "USNDAQ100",
    UsSpx500 => "USSPX500",
    Germany30 => "GERMANY30",
    Uk100 => "UK100",
    Japan225 => "JAPAN225",
}

impl Active {
    /// Over-the-counter (weekend) variant of an instrument
    pub fn is_otc(&self) -> bool {
        self.as_str().ends_with("-OTC")
    }
}

impl fmt::Display for Active {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Expiration bucket of a binary/digital option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expiration {
    M1,
    M5,
    M15,
    M30,
    H1,
}

impl Expiration {
    pub fn as_str(&self) -> &'static str {
        match self {
            Expiration::M1 => "m1",
            Expiration::M5 => "m5",
            Expiration::M15 => "m15",
            Expiration::M30 => "m30",
            Expiration::H1 => "h1",
        }
    }

    /// Length of the expiration period
    pub fn duration(&self) -> Duration {
        match self {
            Expiration::M1 => Duration::minutes(1),
            Expiration::M5 => Duration::minutes(5),
            Expiration::M15 => Duration::minutes(15),
            Expiration::M30 => Duration::minutes(30),
            Expiration::H1 => Duration::hours(1),
        }
    }
}

impl FromStr for Expiration {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "m1" => Ok(Expiration::M1),
            "m5" => Ok(Expiration::M5),
            "m15" => Ok(Expiration::M15),
            "m30" => Ok(Expiration::M30),
            "h1" => Ok(Expiration::H1),
            _ => bail!("Unknown expiration: {}", s),
        }
    }
}

impl fmt::Display for Expiration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Option direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Call,
    Put,
}

impl FromStr for Direction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "call" => Ok(Direction::Call),
            "put" => Ok(Direction::Put),
            _ => bail!("Unknown direction: {}", s),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Call => f.pad("call"),
            Direction::Put => f.pad("put"),
        }
    }
}

/// Scheduled trade signal as produced by the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: Uuid,
    pub active: Active,
    /// Scheduled execution instant
    pub date: DateTime<Utc>,
    pub expiration: Expiration,
    pub direction: Direction,
}

impl Signal {
    pub fn new(
        active: Active,
        date: DateTime<Utc>,
        expiration: Expiration,
        direction: Direction,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            active,
            date: truncate_to_minute(date),
            expiration,
            direction,
        }
    }

    /// Instant at which the option opened on this signal expires
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.date + self.expiration.duration()
    }
}

/// Drop seconds and sub-second precision
pub fn truncate_to_minute(date: DateTime<Utc>) -> DateTime<Utc> {
    date.duration_trunc(Duration::minutes(1)).unwrap_or(date)
}

/// Lifecycle status of a signal within a trading day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    Waiting,
    Canceled,
    Expired,
    InProgress,
    Win,
    Loss,
}

impl SignalStatus {
    pub const ALL: [SignalStatus; 6] = [
        SignalStatus::Waiting,
        SignalStatus::Canceled,
        SignalStatus::Expired,
        SignalStatus::InProgress,
        SignalStatus::Win,
        SignalStatus::Loss,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalStatus::Waiting => "waiting",
            SignalStatus::Canceled => "canceled",
            SignalStatus::Expired => "expired",
            SignalStatus::InProgress => "in_progress",
            SignalStatus::Win => "win",
            SignalStatus::Loss => "loss",
        }
    }

    /// Whether the signal has left the user-actionable states
    pub fn has_result(&self) -> bool {
        !matches!(self, SignalStatus::Waiting | SignalStatus::Canceled)
    }

    /// Whether the status carries a settled outcome
    pub fn is_settled(&self) -> bool {
        matches!(self, SignalStatus::Win | SignalStatus::Loss)
    }

    /// Allowed moves within a trading day. Settlement goes through
    /// `in_progress`; resume (`canceled -> waiting`) is the only backward move.
    pub fn can_transition_to(&self, next: SignalStatus) -> bool {
        use SignalStatus::*;

        if *self == next {
            return true;
        }

        matches!(
            (*self, next),
            (Waiting, Canceled)
                | (Waiting, InProgress)
                | (Waiting, Expired)
                | (InProgress, Win)
                | (InProgress, Loss)
                | (Canceled, Waiting)
        )
    }
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SignalStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        SignalStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| anyhow!("Unknown signal status: {}", s))
    }
}

/// Settled outcome of an order placed on a signal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalResult {
    /// Number of martingale re-entries used
    pub martingales: u32,
    pub profit: Decimal,
}

/// Signal plus the mutable state tracked by the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalWithStatus {
    #[serde(flatten)]
    pub signal: Signal,
    pub status: SignalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<SignalResult>,
}

impl SignalWithStatus {
    /// Fresh entry in the `waiting` state
    pub fn waiting(signal: Signal) -> Self {
        Self {
            signal,
            status: SignalStatus::Waiting,
            info: None,
            result: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.signal.id
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.signal.date
    }
}

impl From<Signal> for SignalWithStatus {
    fn from(signal: Signal) -> Self {
        Self::waiting(signal)
    }
}
