//! Typed property values (RFC 5545 §3.3).

use super::{Date, DateTime, RRule};

/// Parsed value of a property. The raw text is kept on [`super::Property`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// BINARY, already base64-decoded.
    Binary(Vec<u8>),
    /// CAL-ADDRESS, kept verbatim (e.g. `MAILTO:alice@example.com`).
    CalAddress(String),
    Date(Date),
    DateTime(DateTime),
    /// Comma-separated DATE list (EXDATE/RDATE with `VALUE=DATE`).
    DateList(Vec<Date>),
    /// Comma-separated DATE-TIME list (EXDATE/RDATE).
    DateTimeList(Vec<DateTime>),
    Duration(chrono::TimeDelta),
    Integer(i32),
    Recur(Box<RRule>),
    /// TEXT, unescaped.
    Text(String),
    Uri(String),
    /// Anything not interpreted by this crate.
    Unknown(String),
}

impl Value {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::CalAddress(s) | Self::Uri(s) | Self::Unknown(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_datetime(&self) -> Option<&DateTime> {
        match self {
            Self::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_date(&self) -> Option<&Date> {
        match self {
            Self::Date(d) => Some(d),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_integer(&self) -> Option<i32> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_rrule(&self) -> Option<&RRule> {
        match self {
            Self::Recur(rule) => Some(rule),
            _ => None,
        }
    }
}
