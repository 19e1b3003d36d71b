// Signal Templates
// Parses the `EXPIRATION;HH:MM;ACTIVE;DIRECTION` day template into signals

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use common::{Active, Direction, Expiration, Signal};

/// One template line, independent of the calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateLine {
    pub expiration: Expiration,
    /// Scheduled time in the trading timezone
    pub time: NaiveTime,
    pub active: Active,
    pub direction: Direction,
}

impl TemplateLine {
    /// Materialize the line on a trading day.
    ///
    /// An ambiguous local time takes its earlier instant. A time skipped by a
    /// daylight-saving jump is moved forward by the usual one-hour gap.
    pub fn to_signal(&self, date: NaiveDate, tz: Tz) -> Result<Signal> {
        let local = date.and_time(self.time);
        let instant = match tz.from_local_datetime(&local) {
            LocalResult::Single(instant) => instant,
            LocalResult::Ambiguous(earliest, _) => earliest,
            LocalResult::None => tz
                .from_local_datetime(&(local + Duration::hours(1)))
                .earliest()
                .ok_or_else(|| anyhow!("{} does not exist in {}", local, tz))?,
        };

        Ok(Signal::new(
            self.active,
            instant.with_timezone(&Utc),
            self.expiration,
            self.direction,
        ))
    }
}

impl std::str::FromStr for TemplateLine {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let values: Vec<&str> = line.split(';').map(str::trim).collect();
        if values.len() != 4 {
            bail!("expected 4 fields, found {}", values.len());
        }

        let time = NaiveTime::parse_from_str(values[1], "%H:%M")
            .with_context(|| format!("invalid time '{}'", values[1]))?;

        Ok(Self {
            expiration: values[0].parse()?,
            time,
            active: values[2].parse()?,
            // feeds decorate directions with emoji selectors and the like
            direction: values[3]
                .trim_matches(|c: char| !c.is_ascii_alphanumeric())
                .parse()?,
        })
    }
}

/// Parse every non-blank line of a template
pub fn parse_template(text: &str) -> Result<Vec<TemplateLine>> {
    text.lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(number, line)| {
            line.parse::<TemplateLine>()
                .with_context(|| format!("template line {}: '{}'", number, line))
        })
        .collect()
}
