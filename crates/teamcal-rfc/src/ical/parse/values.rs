//! Value parsers for the iCalendar types used by event exchange (RFC 5545 §3.3).

use std::str::FromStr;

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::ical::core::{Date, DateTime, DateTimeForm, Frequency, RRule, RRuleUntil, Weekday, WeekdayNum};

fn digits<T: FromStr>(s: &str, range: std::ops::Range<usize>) -> Option<T> {
    let part = s.get(range)?;
    if part.bytes().all(|b| b.is_ascii_digit()) {
        part.parse().ok()
    } else {
        None
    }
}

/// ## Summary
/// Parses a DATE value (`YYYYMMDD`).
///
/// ## Errors
/// Returns `InvalidDate` if the text is not eight digits forming a real date.
pub fn parse_date(s: &str, line: usize, col: usize) -> ParseResult<Date> {
    let invalid = || ParseError::new(ParseErrorKind::InvalidDate, line, col).with_context(s.to_string());
    if s.len() != 8 {
        return Err(invalid());
    }
    let date = Date::new(
        digits(s, 0..4).ok_or_else(invalid)?,
        digits(s, 4..6).ok_or_else(invalid)?,
        digits(s, 6..8).ok_or_else(invalid)?,
    );
    date.to_naive().ok_or_else(invalid)?;
    Ok(date)
}

/// ## Summary
/// Parses a DATE-TIME value (`YYYYMMDDTHHMMSS[Z]`).
///
/// A trailing `Z` yields a UTC value, otherwise `tzid` (if given) yields a
/// zoned value and its absence a floating one.
///
/// ## Errors
/// Returns `InvalidDateTime` if the text is malformed or out of range.
pub fn parse_datetime(s: &str, tzid: Option<&str>, line: usize, col: usize) -> ParseResult<DateTime> {
    let invalid =
        || ParseError::new(ParseErrorKind::InvalidDateTime, line, col).with_context(s.to_string());

    let (body, utc) = match s.strip_suffix('Z') {
        Some(body) => (body, true),
        None => (s, false),
    };
    if body.len() != 15 || body.as_bytes()[8] != b'T' {
        return Err(invalid());
    }

    let form = match (utc, tzid) {
        (true, _) => DateTimeForm::Utc,
        (false, Some(tzid)) => DateTimeForm::Zoned {
            tzid: tzid.to_string(),
        },
        (false, None) => DateTimeForm::Floating,
    };
    let value = DateTime {
        year: digits(body, 0..4).ok_or_else(invalid)?,
        month: digits(body, 4..6).ok_or_else(invalid)?,
        day: digits(body, 6..8).ok_or_else(invalid)?,
        hour: digits(body, 9..11).ok_or_else(invalid)?,
        minute: digits(body, 11..13).ok_or_else(invalid)?,
        second: digits(body, 13..15).ok_or_else(invalid)?,
        form,
    };
    value.to_naive().ok_or_else(invalid)?;
    Ok(value)
}

/// ## Summary
/// Parses a comma-separated DATE list.
///
/// ## Errors
/// Returns `InvalidDate` for the first malformed entry.
pub fn parse_date_list(s: &str, line: usize, col: usize) -> ParseResult<Vec<Date>> {
    s.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| parse_date(part.trim(), line, col))
        .collect()
}

/// ## Summary
/// Parses a comma-separated DATE-TIME list sharing one optional TZID.
///
/// ## Errors
/// Returns `InvalidDateTime` for the first malformed entry.
pub fn parse_datetime_list(
    s: &str,
    tzid: Option<&str>,
    line: usize,
    col: usize,
) -> ParseResult<Vec<DateTime>> {
    s.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| parse_datetime(part.trim(), tzid, line, col))
        .collect()
}

/// ## Summary
/// Parses a DURATION value (`[+-]P[nW]` or `[+-]P[nD][T[nH][nM][nS]]`).
///
/// ## Errors
/// Returns `InvalidDuration` if the text does not follow RFC 5545 §3.3.6.
pub fn parse_duration(s: &str, line: usize, col: usize) -> ParseResult<chrono::TimeDelta> {
    let invalid =
        || ParseError::new(ParseErrorKind::InvalidDuration, line, col).with_context(s.to_string());

    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let rest = rest.strip_prefix('P').ok_or_else(invalid)?;
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut seconds: i64 = 0;
    let mut number = String::new();
    let mut in_time = false;
    let mut seen_unit = false;
    for c in rest.chars() {
        match c {
            '0'..='9' => number.push(c),
            'T' if !in_time && number.is_empty() => in_time = true,
            'W' | 'D' | 'H' | 'M' | 'S' => {
                let n: i64 = number.parse().map_err(|_| invalid())?;
                number.clear();
                let unit = match (c, in_time) {
                    ('W', false) => 7 * 86_400,
                    ('D', false) => 86_400,
                    ('H', true) => 3_600,
                    ('M', true) => 60,
                    ('S', true) => 1,
                    _ => return Err(invalid()),
                };
                seconds += n * unit;
                seen_unit = true;
            }
            _ => return Err(invalid()),
        }
    }
    if !number.is_empty() || !seen_unit {
        return Err(invalid());
    }

    let delta = chrono::TimeDelta::seconds(seconds);
    Ok(if negative { -delta } else { delta })
}

/// ## Summary
/// Parses an INTEGER value.
///
/// ## Errors
/// Returns `InvalidInteger` if the text is not a signed 32-bit integer.
pub fn parse_integer(s: &str, line: usize, col: usize) -> ParseResult<i32> {
    s.trim()
        .parse()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidInteger, line, col).with_context(s.to_string()))
}

/// ## Summary
/// Parses a RECUR value such as `FREQ=MONTHLY;BYDAY=2TU;UNTIL=20240314T225959Z`.
///
/// Unknown rule parts are ignored.
///
/// ## Errors
/// Returns an error for malformed parts, an unknown frequency or weekday,
/// or when both UNTIL and COUNT are present.
pub fn parse_rrule(s: &str, line: usize, col: usize) -> ParseResult<RRule> {
    let mut rule = RRule::default();
    let invalid = || ParseError::new(ParseErrorKind::InvalidRRule, line, col).with_context(s.to_string());

    for part in s.split(';').filter(|p| !p.is_empty()) {
        let (key, value) = part.split_once('=').ok_or_else(invalid)?;
        match key.to_ascii_uppercase().as_str() {
            "FREQ" => {
                rule.freq = Some(Frequency::parse(value).ok_or_else(|| {
                    ParseError::new(ParseErrorKind::InvalidFrequency, line, col)
                        .with_context(value.to_string())
                })?);
            }
            "INTERVAL" => rule.interval = Some(value.parse().map_err(|_| invalid())?),
            "COUNT" => rule.count = Some(value.parse().map_err(|_| invalid())?),
            "UNTIL" => {
                rule.until = Some(if value.contains('T') {
                    RRuleUntil::DateTime(parse_datetime(value, None, line, col)?)
                } else {
                    RRuleUntil::Date(parse_date(value, line, col)?)
                });
            }
            "WKST" => rule.wkst = Some(parse_weekday(value, line, col)?),
            "BYSECOND" => rule.by_second = parse_list(value).ok_or_else(invalid)?,
            "BYMINUTE" => rule.by_minute = parse_list(value).ok_or_else(invalid)?,
            "BYHOUR" => rule.by_hour = parse_list(value).ok_or_else(invalid)?,
            "BYDAY" => {
                rule.by_day = value
                    .split(',')
                    .map(|token| parse_weekday_num(token, line, col))
                    .collect::<ParseResult<_>>()?;
            }
            "BYMONTHDAY" => rule.by_monthday = parse_list(value).ok_or_else(invalid)?,
            "BYYEARDAY" => rule.by_yearday = parse_list(value).ok_or_else(invalid)?,
            "BYWEEKNO" => rule.by_weekno = parse_list(value).ok_or_else(invalid)?,
            "BYMONTH" => rule.by_month = parse_list(value).ok_or_else(invalid)?,
            "BYSETPOS" => rule.by_setpos = parse_list(value).ok_or_else(invalid)?,
            other => tracing::trace!(part = %other, "Ignoring unknown RRULE part"),
        }
    }

    if rule.until.is_some() && rule.count.is_some() {
        return Err(ParseError::new(ParseErrorKind::UntilCountConflict, line, col));
    }
    Ok(rule)
}

fn parse_list<T: FromStr>(s: &str) -> Option<Vec<T>> {
    s.split(',').map(|v| v.trim().parse().ok()).collect()
}

fn parse_weekday(s: &str, line: usize, col: usize) -> ParseResult<Weekday> {
    Weekday::parse(s.trim()).ok_or_else(|| {
        ParseError::new(ParseErrorKind::InvalidWeekday, line, col).with_context(s.to_string())
    })
}

/// Parses `MO`, `2TU`, `+1WE` or `-1FR`.
fn parse_weekday_num(s: &str, line: usize, col: usize) -> ParseResult<WeekdayNum> {
    let s = s.trim();
    let split = s
        .len()
        .checked_sub(2)
        .filter(|&i| s.is_char_boundary(i))
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidWeekday, line, col))?;
    let (ordinal, day) = s.split_at(split);
    let weekday = parse_weekday(day, line, col)?;
    if ordinal.is_empty() {
        return Ok(WeekdayNum::every(weekday));
    }
    let ordinal: i8 = ordinal.trim_start_matches('+').parse().map_err(|_| {
        ParseError::new(ParseErrorKind::InvalidRRule, line, col).with_context(s.to_string())
    })?;
    if ordinal == 0 || !(-53..=53).contains(&ordinal) {
        return Err(ParseError::new(ParseErrorKind::InvalidRRule, line, col).with_context(s.to_string()));
    }
    Ok(WeekdayNum::nth(ordinal, weekday))
}

/// Unescapes a TEXT value (`\\`, `\,`, `\;`, `\n`, `\N`).
#[must_use]
pub fn unescape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(escaped @ (',' | ';' | '\\')) => out.push(escaped),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
