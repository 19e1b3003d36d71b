//! Signal registry configuration

use anyhow::Context;
use chrono::Duration;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Longest accepted availability cutoff (one day)
pub const MAX_AVAILABILITY_CUTOFF_SECS: i64 = 86_400;

/// Registry and feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// IANA timezone in which trading days are counted
    #[serde(default = "default_trading_timezone")]
    pub trading_timezone: String,

    /// Seconds before the scheduled instant after which a signal is locked
    #[serde(default = "default_availability_cutoff_secs")]
    pub availability_cutoff_secs: i64,

    /// Upper bound on a single feed fetch (seconds)
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Reject status changes outside the daily lifecycle
    #[serde(default = "default_enforce_transitions")]
    pub enforce_transitions: bool,

    /// Serve generated demo signals instead of the template feed
    #[serde(default)]
    pub debug_signals: bool,

    /// Signal template file used by the template feed
    #[serde(default)]
    pub template_path: Option<PathBuf>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            trading_timezone: default_trading_timezone(),
            availability_cutoff_secs: default_availability_cutoff_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            enforce_transitions: default_enforce_transitions(),
            debug_signals: false,
            template_path: None,
        }
    }
}

fn default_trading_timezone() -> String {
    "America/Sao_Paulo".to_string()
}

fn default_availability_cutoff_secs() -> i64 {
    20
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_enforce_transitions() -> bool {
    true
}

impl RegistryConfig {
    /// Parsed trading timezone
    pub fn timezone(&self) -> anyhow::Result<Tz> {
        self.trading_timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Invalid trading timezone '{}': {}", self.trading_timezone, e))
    }

    /// Cutoff as a duration, saturating when the field is out of range
    pub fn availability_cutoff(&self) -> Duration {
        let saturated = if self.availability_cutoff_secs < 0 {
            Duration::MIN
        } else {
            Duration::MAX
        };
        Duration::try_seconds(self.availability_cutoff_secs).unwrap_or(saturated)
    }

    pub fn fetch_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> anyhow::Result<()> {
        self.timezone()?;
        if self.availability_cutoff_secs < 0 {
            anyhow::bail!("availability_cutoff_secs must not be negative");
        }
        if self.availability_cutoff_secs > MAX_AVAILABILITY_CUTOFF_SECS {
            anyhow::bail!(
                "availability_cutoff_secs must be at most {} (got {})",
                MAX_AVAILABILITY_CUTOFF_SECS,
                self.availability_cutoff_secs
            );
        }
        if self.fetch_timeout_secs == 0 {
            anyhow::bail!("fetch_timeout_secs must be positive");
        }
        Ok(())
    }

    /// Apply `DEBUG_SIGNALS=true` from the environment
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("DEBUG_SIGNALS") {
            self.debug_signals = value == "true";
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> anyhow::Result<RegistryConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path))?;
    let config: RegistryConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path))?;
    config.validate()?;
    Ok(config)
}

/// Save configuration to TOML file
pub fn save_config(config: &RegistryConfig, path: &str) -> anyhow::Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Create a default configuration file template
pub fn create_config_template(path: &str) -> anyhow::Result<()> {
    let template = "# Signal Desk Configuration

# Timezone in which trading days start and end
trading_timezone = \"America/Sao_Paulo\"

# Signals lock this many seconds before their scheduled instant
availability_cutoff_secs = 20

# Give up on a feed fetch after this many seconds
fetch_timeout_secs = 10

# Reject status changes outside the daily lifecycle
enforce_transitions = true

# Generate demo signals around the current hour (overridden by DEBUG_SIGNALS)
debug_signals = false

# One signal per line: EXPIRATION;HH:MM;ACTIVE;DIRECTION
template_path = \"config/signals.txt\"
";

    std::fs::write(path, template)?;
    Ok(())
}
