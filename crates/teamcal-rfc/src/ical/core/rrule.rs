//! iCalendar RRULE value type (RFC 5545 §3.3.10).

use std::fmt;

use super::{Date, DateTime};
use crate::error::{RfcError, RfcResult};

/// Recurrence frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Secondly,
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Secondly => "SECONDLY",
            Self::Minutely => "MINUTELY",
            Self::Hourly => "HOURLY",
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }

    /// Parses a frequency name (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "SECONDLY" => Self::Secondly,
            "MINUTELY" => Self::Minutely,
            "HOURLY" => Self::Hourly,
            "DAILY" => Self::Daily,
            "WEEKLY" => Self::Weekly,
            "MONTHLY" => Self::Monthly,
            "YEARLY" => Self::Yearly,
            _ => return None,
        })
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Day of the week, Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// Returns the two-letter abbreviation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "MO",
            Self::Tuesday => "TU",
            Self::Wednesday => "WE",
            Self::Thursday => "TH",
            Self::Friday => "FR",
            Self::Saturday => "SA",
            Self::Sunday => "SU",
        }
    }

    /// Parses a two-letter abbreviation (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "MO" => Self::Monday,
            "TU" => Self::Tuesday,
            "WE" => Self::Wednesday,
            "TH" => Self::Thursday,
            "FR" => Self::Friday,
            "SA" => Self::Saturday,
            "SU" => Self::Sunday,
            _ => return None,
        })
    }

    /// All weekdays, Monday through Sunday.
    #[must_use]
    pub const fn all() -> [Self; 7] {
        [
            Self::Monday,
            Self::Tuesday,
            Self::Wednesday,
            Self::Thursday,
            Self::Friday,
            Self::Saturday,
            Self::Sunday,
        ]
    }

    /// Zero-based position in the Monday-first week.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Monday => 0,
            Self::Tuesday => 1,
            Self::Wednesday => 2,
            Self::Thursday => 3,
            Self::Friday => 4,
            Self::Saturday => 5,
            Self::Sunday => 6,
        }
    }

    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        Some(match index {
            0 => Self::Monday,
            1 => Self::Tuesday,
            2 => Self::Wednesday,
            3 => Self::Thursday,
            4 => Self::Friday,
            5 => Self::Saturday,
            6 => Self::Sunday,
            _ => return None,
        })
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// BYDAY entry: a weekday with an optional ordinal (`MO`, `2TU`, `-1FR`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekdayNum {
    /// Occurrence within the period (-53..=53, never 0).
    pub ordinal: Option<i8>,
    pub weekday: Weekday,
}

impl WeekdayNum {
    #[must_use]
    pub const fn every(weekday: Weekday) -> Self {
        Self {
            ordinal: None,
            weekday,
        }
    }

    /// Creates an ordinal weekday; an ordinal of 0 means "every".
    #[must_use]
    pub const fn nth(ordinal: i8, weekday: Weekday) -> Self {
        Self {
            ordinal: if ordinal == 0 { None } else { Some(ordinal) },
            weekday,
        }
    }

    /// Ordinal offset, 0 when the entry applies to every such weekday.
    #[must_use]
    pub fn offset(self) -> i8 {
        self.ordinal.unwrap_or(0)
    }
}

impl fmt::Display for WeekdayNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(n) = self.ordinal {
            write!(f, "{n}")?;
        }
        write!(f, "{}", self.weekday)
    }
}

/// UNTIL bound: a DATE or a DATE-TIME.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RRuleUntil {
    Date(Date),
    DateTime(DateTime),
}

impl RRuleUntil {
    /// Resolves the bound to an instant; dates map to UTC midnight.
    #[must_use]
    pub fn to_utc(&self, floating_zone: chrono_tz::Tz) -> Option<chrono::DateTime<chrono::Utc>> {
        match self {
            Self::Date(date) => date.to_utc_midnight(),
            Self::DateTime(dt) => dt.to_utc(floating_zone),
        }
    }
}

impl fmt::Display for RRuleUntil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{d}"),
            Self::DateTime(dt) => write!(f, "{dt}"),
        }
    }
}

/// Recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RRule {
    pub freq: Option<Frequency>,
    /// Defaults to 1 when absent.
    pub interval: Option<u32>,
    /// Mutually exclusive with `count`.
    pub until: Option<RRuleUntil>,
    pub count: Option<u32>,
    pub wkst: Option<Weekday>,
    pub by_second: Vec<u8>,
    pub by_minute: Vec<u8>,
    pub by_hour: Vec<u8>,
    pub by_day: Vec<WeekdayNum>,
    pub by_monthday: Vec<i8>,
    pub by_yearday: Vec<i16>,
    pub by_weekno: Vec<i8>,
    pub by_month: Vec<u8>,
    pub by_setpos: Vec<i16>,
}

impl RRule {
    #[must_use]
    pub fn with_frequency(freq: Frequency) -> Self {
        Self {
            freq: Some(freq),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn daily() -> Self {
        Self::with_frequency(Frequency::Daily)
    }

    #[must_use]
    pub fn weekly() -> Self {
        Self::with_frequency(Frequency::Weekly)
    }

    #[must_use]
    pub fn monthly() -> Self {
        Self::with_frequency(Frequency::Monthly)
    }

    #[must_use]
    pub fn yearly() -> Self {
        Self::with_frequency(Frequency::Yearly)
    }

    #[must_use]
    pub fn with_interval(mut self, interval: u32) -> Self {
        self.interval = Some(interval);
        self
    }

    #[must_use]
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self.until = None;
        self
    }

    #[must_use]
    pub fn with_until(mut self, until: RRuleUntil) -> Self {
        self.until = Some(until);
        self.count = None;
        self
    }

    #[must_use]
    pub fn with_by_day(mut self, days: Vec<WeekdayNum>) -> Self {
        self.by_day = days;
        self
    }

    #[must_use]
    pub fn with_by_monthday(mut self, days: Vec<i8>) -> Self {
        self.by_monthday = days;
        self
    }

    #[must_use]
    pub fn with_by_month(mut self, months: Vec<u8>) -> Self {
        self.by_month = months;
        self
    }

    /// Effective interval (absent or 0 reads as 1).
    #[must_use]
    pub fn effective_interval(&self) -> u32 {
        match self.interval {
            Some(0) | None => 1,
            Some(n) => n,
        }
    }

    /// ## Summary
    /// Checks the rule parts against their RFC 5545 ranges.
    ///
    /// ## Errors
    /// Returns `RfcError::ValidationError` naming the first offending part.
    pub fn validate(&self) -> RfcResult<()> {
        let fail = |msg: &str| Err(RfcError::ValidationError(format!("RRULE {msg}")));

        if self.freq.is_none() {
            return fail("has no FREQ");
        }
        if self.interval == Some(0) {
            return fail("has INTERVAL=0");
        }
        if self.until.is_some() && self.count.is_some() {
            return fail("has both UNTIL and COUNT");
        }
        if self.by_monthday.iter().any(|d| *d == 0 || !(-31..=31).contains(d)) {
            return fail("has a BYMONTHDAY outside -31..=31");
        }
        if self.by_month.iter().any(|m| !(1..=12).contains(m)) {
            return fail("has a BYMONTH outside 1..=12");
        }
        if self.by_setpos.iter().any(|p| *p == 0 || !(-366..=366).contains(p)) {
            return fail("has a BYSETPOS outside -366..=366");
        }
        Ok(())
    }
}

fn push_list<T: fmt::Display>(parts: &mut Vec<String>, name: &str, values: &[T]) {
    if values.is_empty() {
        return;
    }
    let joined = values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    parts.push(format!("{name}={joined}"));
}

impl fmt::Display for RRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        if let Some(freq) = self.freq {
            parts.push(format!("FREQ={freq}"));
        }
        if let Some(interval) = self.interval
            && interval != 1
        {
            parts.push(format!("INTERVAL={interval}"));
        }
        if let Some(ref until) = self.until {
            parts.push(format!("UNTIL={until}"));
        }
        if let Some(count) = self.count {
            parts.push(format!("COUNT={count}"));
        }
        if let Some(wkst) = self.wkst {
            parts.push(format!("WKST={wkst}"));
        }

        push_list(&mut parts, "BYSECOND", &self.by_second);
        push_list(&mut parts, "BYMINUTE", &self.by_minute);
        push_list(&mut parts, "BYHOUR", &self.by_hour);
        push_list(&mut parts, "BYDAY", &self.by_day);
        push_list(&mut parts, "BYMONTHDAY", &self.by_monthday);
        push_list(&mut parts, "BYYEARDAY", &self.by_yearday);
        push_list(&mut parts, "BYWEEKNO", &self.by_weekno);
        push_list(&mut parts, "BYMONTH", &self.by_month);
        push_list(&mut parts, "BYSETPOS", &self.by_setpos);

        f.write_str(&parts.join(";"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_weekly_byday() {
        let rule = RRule::weekly().with_by_day(vec![
            WeekdayNum::every(Weekday::Monday),
            WeekdayNum::every(Weekday::Wednesday),
        ]);
        assert_eq!(rule.to_string(), "FREQ=WEEKLY;BYDAY=MO,WE");
    }

    #[test]
    fn display_omits_default_interval() {
        assert_eq!(RRule::daily().with_interval(1).to_string(), "FREQ=DAILY");
        assert_eq!(
            RRule::daily().with_interval(3).to_string(),
            "FREQ=DAILY;INTERVAL=3"
        );
    }

    #[test]
    fn display_monthly_nth_with_until() {
        let rule = RRule::monthly()
            .with_by_day(vec![WeekdayNum::nth(2, Weekday::Tuesday)])
            .with_until(RRuleUntil::DateTime(DateTime::utc(2024, 3, 14, 22, 59, 59)));
        assert_eq!(
            rule.to_string(),
            "FREQ=MONTHLY;UNTIL=20240314T225959Z;BYDAY=2TU"
        );
    }

    #[test]
    fn validate_rejects_out_of_range_parts() {
        assert!(RRule::weekly().validate().is_ok());
        assert!(RRule::default().validate().is_err());
        assert!(RRule::daily().with_interval(0).validate().is_err());
        assert!(RRule::monthly().with_by_monthday(vec![32]).validate().is_err());
        assert!(RRule::yearly().with_by_month(vec![0]).validate().is_err());

        let mut both = RRule::daily().with_count(2);
        both.until = Some(RRuleUntil::Date(Date::new(2024, 1, 1)));
        assert!(both.validate().is_err());
    }

    #[test]
    fn count_and_until_are_exclusive() {
        let rule = RRule::daily()
            .with_until(RRuleUntil::Date(Date::new(2024, 1, 1)))
            .with_count(4);
        assert!(rule.until.is_none());
        assert_eq!(rule.count, Some(4));
    }

    #[test]
    fn nth_zero_means_every() {
        assert_eq!(WeekdayNum::nth(0, Weekday::Friday), WeekdayNum::every(Weekday::Friday));
        assert_eq!(WeekdayNum::nth(-1, Weekday::Friday).to_string(), "-1FR");
    }

    #[test]
    fn weekday_index_round_trips() {
        for day in Weekday::all() {
            assert_eq!(Weekday::from_index(day.index()), Some(day));
        }
        assert_eq!(Weekday::parse("su"), Some(Weekday::Sunday));
        assert_eq!(Weekday::from(chrono::Weekday::Wed), Weekday::Wednesday);
    }
}
