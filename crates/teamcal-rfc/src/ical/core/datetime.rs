//! iCalendar DATE and DATE-TIME value types (RFC 5545 §3.3.4, §3.3.5).

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// DATE value (RFC 5545 §3.3.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Date {
    pub year: u16,
    /// Month (1-12).
    pub month: u8,
    /// Day of month (1-31).
    pub day: u8,
}

impl Date {
    #[must_use]
    pub const fn new(year: u16, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    /// Returns the calendar date, or `None` if the fields do not form a valid date.
    #[must_use]
    pub fn to_naive(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )
    }

    /// Returns midnight UTC of this date.
    #[must_use]
    pub fn to_utc_midnight(self) -> Option<chrono::DateTime<Utc>> {
        self.to_naive()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "calendar years in iCalendar data are four digits, month and day are bounded by chrono"
    )]
    pub fn from_naive(date: NaiveDate) -> Self {
        Self {
            year: date.year() as u16,
            month: date.month() as u8,
            day: date.day() as u8,
        }
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}{:02}", self.year, self.month, self.day)
    }
}

/// Form of a DATE-TIME value (RFC 5545 §3.3.5).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DateTimeForm {
    /// Wall-clock time without zone, e.g. `19980118T230000`.
    Floating,
    /// Absolute instant, e.g. `19980119T070000Z`.
    Utc,
    /// Local time in a named zone, e.g. `TZID=Europe/Berlin:19980119T020000`.
    Zoned { tzid: String },
}

/// DATE-TIME value (RFC 5545 §3.3.5).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub form: DateTimeForm,
}

impl DateTime {
    #[must_use]
    pub const fn utc(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            form: DateTimeForm::Utc,
        }
    }

    #[must_use]
    pub const fn floating(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            form: DateTimeForm::Floating,
        }
    }

    #[must_use]
    pub fn zoned(naive: NaiveDateTime, tzid: impl Into<String>) -> Self {
        let mut value = Self::from_naive(naive);
        value.form = DateTimeForm::Zoned { tzid: tzid.into() };
        value
    }

    /// Builds a UTC DATE-TIME from an instant, dropping sub-second precision.
    #[must_use]
    pub fn from_utc(instant: chrono::DateTime<Utc>) -> Self {
        let mut value = Self::from_naive(instant.naive_utc());
        value.form = DateTimeForm::Utc;
        value
    }

    #[must_use]
    pub const fn is_utc(&self) -> bool {
        matches!(self.form, DateTimeForm::Utc)
    }

    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        match &self.form {
            DateTimeForm::Zoned { tzid } => Some(tzid),
            DateTimeForm::Floating | DateTimeForm::Utc => None,
        }
    }

    #[must_use]
    pub const fn date(&self) -> super::Date {
        super::Date::new(self.year, self.month, self.day)
    }

    /// Returns the wall-clock fields, or `None` if they are out of range.
    #[must_use]
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        self.date().to_naive()?.and_hms_opt(
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second),
        )
    }

    /// ## Summary
    /// Resolves this value to a UTC instant.
    ///
    /// UTC values convert directly, zoned values use their TZID, floating
    /// values (and zoned values with an unknown TZID) are interpreted in
    /// `floating_zone`. Ambiguous local times pick the earlier instant.
    #[must_use]
    pub fn to_utc(&self, floating_zone: Tz) -> Option<chrono::DateTime<Utc>> {
        let naive = self.to_naive()?;
        let zone = match &self.form {
            DateTimeForm::Utc => return Some(naive.and_utc()),
            DateTimeForm::Zoned { tzid } => tzid.parse::<Tz>().unwrap_or_else(|_| {
                tracing::warn!(tzid = %tzid, "Unknown TZID, falling back to floating zone");
                floating_zone
            }),
            DateTimeForm::Floating => floating_zone,
        };
        zone.from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
    }

    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "chrono bounds every field; years in iCalendar data are four digits"
    )]
    fn from_naive(naive: NaiveDateTime) -> Self {
        Self {
            year: naive.year() as u16,
            month: naive.month() as u8,
            day: naive.day() as u8,
            hour: naive.hour() as u8,
            minute: naive.minute() as u8,
            second: naive.second() as u8,
            form: DateTimeForm::Floating,
        }
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}{:02}{:02}T{:02}{:02}{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )?;
        if self.is_utc() {
            f.write_str("Z")?;
        }
        Ok(())
    }
}
