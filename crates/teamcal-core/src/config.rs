use anyhow::Result;
use config::Config;
use serde::Deserialize;

use crate::context::UserContext;
use crate::error::{CoreError, CoreResult};

pub const DEFAULT_PRODID: &str = "-//TeamCal//TeamCal Event Core//EN";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub calendar: CalendarConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarConfig {
    /// Domain appended to generated event UIDs (`<id>@<domain>`).
    pub domain: String,
    /// PRODID written into exported calendars.
    pub prodid: String,
    /// IANA time zone used when a request carries no user time zone.
    pub timezone: String,
}

impl CalendarConfig {
    /// ## Summary
    /// Builds the request context used when no acting user supplies one.
    ///
    /// ## Errors
    /// Returns `CoreError::UnknownTimeZone` if `timezone` is not an IANA zone name.
    pub fn default_context(&self) -> CoreResult<UserContext> {
        let timezone = self
            .timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| CoreError::UnknownTimeZone(self.timezone.clone()))?;
        Ok(UserContext::new(timezone))
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            domain: "localhost".to_string(),
            prodid: DEFAULT_PRODID.to_string(),
            timezone: "UTC".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Settings {
    /// ## Summary
    /// Loads configuration from `.env` file and environment variables into a `Settings`.
    /// Environment variables take precedence over `config.toml` values.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Ok(Config::builder()
            .set_default("calendar.domain", "localhost")?
            .set_default("calendar.prodid", DEFAULT_PRODID)?
            .set_default("calendar.timezone", "UTC")?
            .set_default("logging.level", "info")?
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            // Env
            .add_source(
                config::Environment::default()
                    .convert_case(config::Case::Snake)
                    .separator("_")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}
