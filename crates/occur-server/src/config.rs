use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use occur_core::clock::{CalendarClock, MonthOverflow};
use occur_core::error::CoreError;
use occur_core::recurrence::{Expander, SeekStrategy};
use occur_core::service::RangeQueryService;
use occur_core::timezone::validate_timezone;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::cli::Cli;

/// Prefix of environment variables overriding the configuration file.
pub const ENV_PREFIX: &str = "OCCUR_";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub events_path: PathBuf,
    pub log_level: String,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            events_path: PathBuf::from("events.json"),
            log_level: "info".to_string(),
            calendar: CalendarConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

/// How recurring series are expanded
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CalendarConfig {
    /// IANA timezone in which calendar steps are taken
    pub timezone: String,
    pub month_overflow: MonthOverflow,
    pub seek: SeekStrategy,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            timezone: detect_system_timezone(),
            month_overflow: MonthOverflow::default(),
            seek: SeekStrategy::default(),
        }
    }
}

impl CalendarConfig {
    /// Builds the query service described by this section.
    pub fn service(&self) -> Result<RangeQueryService, CoreError> {
        let timezone = validate_timezone(&self.timezone)?;
        let clock = CalendarClock::new(timezone, self.month_overflow);
        Ok(RangeQueryService::with_expander(
            Expander::new(clock).with_seek(self.seek),
        ))
    }
}

/// Request limits enforced at the HTTP boundary
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct LimitsConfig {
    /// Widest window `/occurrences` accepts
    pub max_window_days: u32,
    /// Upper bound on `limit` for `/events/{id}/upcoming`
    pub max_upcoming: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_window_days: 366,
            max_upcoming: 100,
        }
    }
}

impl Config {
    /// Defaults, then the TOML file, then `OCCUR_` environment variables
    /// (`__` separates nested keys), then command-line flags.
    pub fn figment(cli: &Cli) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(&cli.config))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        if let Some(addr) = cli.listen_addr {
            figment = figment.merge(Serialized::default("listen_addr", addr));
        }
        if let Some(path) = &cli.events {
            figment = figment.merge(Serialized::default("events_path", path));
        }

        figment
    }

    pub fn load(cli: &Cli) -> Result<Self, figment::Error> {
        Self::figment(cli).extract()
    }
}

/// Detects the system timezone, falling back to UTC if detection fails
pub fn detect_system_timezone() -> String {
    // Method 1: Check TZ environment variable
    if let Ok(tz) = std::env::var("TZ") {
        if validate_timezone(&tz).is_ok() {
            return tz;
        }
    }

    // Method 2: Try to read from /etc/timezone (Linux)
    #[cfg(target_os = "linux")]
    {
        if let Ok(tz) = std::fs::read_to_string("/etc/timezone") {
            let tz = tz.trim();
            if validate_timezone(tz).is_ok() {
                return tz.to_string();
            }
        }
    }

    // Method 3: Ask the platform
    if let Ok(local_tz) = iana_time_zone::get_timezone() {
        if validate_timezone(&local_tz).is_ok() {
            return local_tz;
        }
    }

    "UTC".to_string()
}
