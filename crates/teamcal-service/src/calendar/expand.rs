//! Expansion of a recurring master into its occurrences.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use chrono_tz::Tz;
use rrule::{RRule, Unvalidated};
use teamcal_rfc::ical::core::{DateTime as IcalDateTime, RRuleUntil};
use teamcal_rfc::ical::parse::parse_date;

use crate::calendar::event::{CalEvent, ics_date_token, parse_date_token};

/// Upper bound of occurrences produced for one master.
pub const MAX_OCCURRENCES: u16 = 1000;

enum ExDate {
    Day(NaiveDate),
    Instant(DateTime<Utc>),
}

fn ex_dates(event: &CalEvent) -> Vec<ExDate> {
    event
        .recurrence_ex_date
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter_map(|token| {
            if token.len() == 8 {
                parse_date(token, 1, 1)
                    .ok()
                    .and_then(|d| d.to_naive())
                    .map(ExDate::Day)
            } else {
                parse_date_token(token).map(ExDate::Instant)
            }
        })
        .collect()
}

/// Rule text for the `rrule` crate; UNTIL always becomes a UTC date-time.
fn rule_text(event: &CalEvent) -> Option<String> {
    let mut rule = event.recurrence_object()?;
    if let Some(until) = &rule.until {
        let instant = match until {
            // Inclusive: the whole last day counts.
            RRuleUntil::Date(date) => {
                date.to_utc_midnight()? + TimeDelta::days(1) - TimeDelta::seconds(1)
            }
            RRuleUntil::DateTime(dt) => dt.to_utc(chrono_tz::UTC)?,
        };
        rule.until = Some(RRuleUntil::DateTime(IcalDateTime::from_utc(instant)));
    }
    Some(rule.to_string())
}

/// ## Summary
/// Expands a recurring master into occurrences overlapping `[from, to]`.
///
/// Timed series recur in `zone`, all-day series in UTC. Each occurrence is
/// a copy of the master shifted to its start, keeping the master's id, with
/// its RECURRENCE-ID token set and no rule of its own. Excluded dates are
/// dropped. A rule the `rrule` crate rejects yields no occurrences.
#[tracing::instrument(skip(master), fields(uid = ?master.uid))]
pub fn expand_occurrences(
    master: &CalEvent,
    zone: Tz,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Vec<CalEvent> {
    let (Some(start), Some(text)) = (master.start_date, rule_text(master)) else {
        return Vec::new();
    };
    let duration = master.end_date.map_or(TimeDelta::zero(), |end| end - start);
    let zone = if master.all_day { chrono_tz::UTC } else { zone };
    let rrule_zone = rrule::Tz::Tz(zone);

    let rule = match text.parse::<RRule<Unvalidated>>() {
        Ok(rule) => rule,
        Err(e) => {
            tracing::warn!(rule = %text, error = %e, "Unparsable recurrence rule");
            return Vec::new();
        }
    };
    let mut set = match rule.build(start.with_timezone(&rrule_zone)) {
        Ok(set) => set,
        Err(e) => {
            tracing::warn!(rule = %text, error = %e, "Invalid recurrence rule");
            return Vec::new();
        }
    };
    if let Some(from) = from {
        let inclusive = from - duration - TimeDelta::seconds(1);
        set = set.after(inclusive.with_timezone(&rrule_zone));
    }
    if let Some(to) = to {
        set = set.before(to.with_timezone(&rrule_zone));
    }

    let result = set.all(MAX_OCCURRENCES);
    if result.limited {
        tracing::debug!(limit = MAX_OCCURRENCES, "Occurrence expansion truncated");
    }

    let excluded = ex_dates(master);
    result
        .dates
        .into_iter()
        .map(|occurrence| occurrence.with_timezone(&Utc))
        .filter(|occurrence| {
            let day = occurrence.with_timezone(&zone).date_naive();
            !excluded.iter().any(|ex| match ex {
                ExDate::Day(date) => *date == day,
                ExDate::Instant(instant) => instant == occurrence,
            })
        })
        .filter(|occurrence| {
            from.is_none_or(|from| *occurrence + duration >= from)
                && to.is_none_or(|to| *occurrence <= to)
        })
        .map(|occurrence| occurrence_of(master, occurrence, duration))
        .collect()
}

fn occurrence_of(master: &CalEvent, start: DateTime<Utc>, duration: TimeDelta) -> CalEvent {
    CalEvent {
        start_date: Some(start),
        end_date: Some(start + duration),
        recurrence_reference_id: Some(ics_date_token(start, master.all_day)),
        recurrence_rule: None,
        recurrence_ex_date: None,
        recurrence_until: None,
        ..master.clone()
    }
}
