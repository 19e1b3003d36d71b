// Signal Feeds
// Sources of daily signal sets consumed by the registry

use crate::template::{parse_template, TemplateLine};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use common::{truncate_to_minute, Active, Direction, Expiration, Signal};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::debug;

/// Source of the signals scheduled for a trading day
#[async_trait::async_trait]
pub trait SignalFeed: Send + Sync {
    /// Fetch the signals for a calendar date in trading-local time
    async fn fetch_signals(&self, date: NaiveDate) -> Result<Vec<Signal>>;

    /// Name used in logs
    fn name(&self) -> &str;
}

/// Push event from a live feed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum FeedEvent {
    /// Freshly published signals
    New(Vec<Signal>),
    /// Corrected core fields of a published signal
    Update(Signal),
}

/// Feed that stamps a fixed day template onto whichever date is requested
pub struct TemplateFeed {
    lines: Vec<TemplateLine>,
    timezone: Tz,
}

impl TemplateFeed {
    pub fn new(template: &str, timezone: Tz) -> Result<Self> {
        let lines = parse_template(template)?;
        debug!("Parsed signal template with {} lines", lines.len());
        Ok(Self { lines, timezone })
    }

    pub fn from_path(path: impl AsRef<Path>, timezone: Tz) -> Result<Self> {
        let path = path.as_ref();
        let template = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read signal template {}", path.display()))?;
        Self::new(&template, timezone)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[async_trait::async_trait]
impl SignalFeed for TemplateFeed {
    async fn fetch_signals(&self, date: NaiveDate) -> Result<Vec<Signal>> {
        self.lines
            .iter()
            .map(|line| line.to_signal(date, self.timezone))
            .collect()
    }

    fn name(&self) -> &str {
        "template"
    }
}

/// Direction pattern of the demo m5 ladder, one entry per five minutes
static DEMO_DIRECTIONS: [Direction; 13] = [
    Direction::Call,
    Direction::Call,
    Direction::Put,
    Direction::Call,
    Direction::Put,
    Direction::Call,
    Direction::Put,
    Direction::Call,
    Direction::Put,
    Direction::Put,
    Direction::Call,
    Direction::Put,
    Direction::Call,
];

/// Generated signals around the current hour, for exercising the client
/// without a real feed. The hour is the trading timezone's wall-clock hour.
pub struct DemoFeed {
    anchor: Option<DateTime<Utc>>,
    timezone: Tz,
}

impl DemoFeed {
    /// Anchored to the wall clock at fetch time
    pub fn new(timezone: Tz) -> Self {
        Self {
            anchor: None,
            timezone,
        }
    }

    /// Anchored to a fixed instant
    pub fn anchored(at: DateTime<Utc>, timezone: Tz) -> Self {
        Self {
            anchor: Some(at),
            timezone,
        }
    }

    fn generate(&self, now: DateTime<Utc>) -> Vec<Signal> {
        let local = now.with_timezone(&self.timezone);
        let into_hour = Duration::minutes(local.minute() as i64)
            + Duration::seconds(local.second() as i64)
            + Duration::nanoseconds(local.nanosecond() as i64);
        let hour_start = now - into_hour;

        let ladder = |active: Active| {
            DEMO_DIRECTIONS
                .iter()
                .enumerate()
                .map(move |(step, direction)| {
                    let date = hour_start + Duration::minutes(5 * step as i64);
                    Signal::new(active, date, Expiration::M5, *direction)
                })
        };

        let mut signals: Vec<Signal> = ladder(Active::EurUsdOtc).collect();
        signals.push(Signal::new(
            Active::EurUsdOtc,
            truncate_to_minute(now + Duration::minutes(60)),
            Expiration::M1,
            Direction::Put,
        ));
        signals.extend(ladder(Active::EurUsd));
        signals
    }
}

#[async_trait::async_trait]
impl SignalFeed for DemoFeed {
    async fn fetch_signals(&self, _date: NaiveDate) -> Result<Vec<Signal>> {
        Ok(self.generate(self.anchor.unwrap_or_else(Utc::now)))
    }

    fn name(&self) -> &str {
        "demo"
    }
}

/// In-memory feed keyed by date
#[derive(Default)]
pub struct StaticFeed {
    days: HashMap<NaiveDate, Vec<Signal>>,
    failing: HashSet<NaiveDate>,
    delay: Option<std::time::Duration>,
    fetched: Mutex<Vec<NaiveDate>>,
}

impl StaticFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `signals` for `date`
    pub fn with_day(mut self, date: NaiveDate, signals: Vec<Signal>) -> Self {
        self.days.insert(date, signals);
        self
    }

    /// Fail every fetch for `date`
    pub fn failing_on(mut self, date: NaiveDate) -> Self {
        self.failing.insert(date);
        self
    }

    /// Sleep before answering each fetch
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Dates requested so far, in order
    pub async fn fetched_dates(&self) -> Vec<NaiveDate> {
        self.fetched.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl SignalFeed for StaticFeed {
    async fn fetch_signals(&self, date: NaiveDate) -> Result<Vec<Signal>> {
        self.fetched.lock().await.push(date);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.contains(&date) {
            bail!("no connection to signal source");
        }

        Ok(self.days.get(&date).cloned().unwrap_or_default())
    }

    fn name(&self) -> &str {
        "static"
    }
}
