//! Explicit per-request context.
//!
//! Everything that depends on the acting user's time zone or locale takes a
//! `&UserContext` argument instead of reading ambient state.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    timezone: Tz,
    locale: Option<String>,
}

impl UserContext {
    #[must_use]
    pub const fn new(timezone: Tz) -> Self {
        Self {
            timezone,
            locale: None,
        }
    }

    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    #[must_use]
    pub const fn timezone(&self) -> Tz {
        self.timezone
    }

    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Converts a UTC instant into the user's wall-clock time.
    #[must_use]
    pub fn to_local(&self, instant: DateTime<Utc>) -> DateTime<Tz> {
        instant.with_timezone(&self.timezone)
    }
}

impl Default for UserContext {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}
