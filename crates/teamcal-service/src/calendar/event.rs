//! In-memory calendar event.
//!
//! A `CalEvent` is decoded from the stored ICS payload on every read and
//! encoded again before every write; it is never the persisted row itself.

use chrono::{DateTime, NaiveTime, SubsecRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use teamcal_rfc::ical::core::{Date, DateTime as IcalDateTime, RRule};
use teamcal_rfc::ical::parse::{parse_date, parse_datetime, parse_rrule};

use crate::error::{ServiceError, ServiceResult};

/// PARTSTAT given to attendees that arrive without one.
pub const DEFAULT_ATTENDEE_STATUS: &str = "NEEDS-ACTION";

/// Minimum duration of a timed event.
const MIN_TIMED_DURATION: TimeDelta = TimeDelta::seconds(60);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Attendee {
    /// Stable ordinal within the event, starting at 1.
    pub number: Option<u16>,
    /// Calendar address, usually `mailto:...`.
    pub address: Option<String>,
    pub common_name: Option<String>,
    /// PARTSTAT value.
    pub status: Option<String>,
    pub role: Option<String>,
}

impl Attendee {
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_common_name(mut self, name: impl Into<String>) -> Self {
        self.common_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Lowercased e-mail without the `mailto:` scheme.
    #[must_use]
    pub fn email(&self) -> Option<String> {
        let address = self.address.as_deref()?.trim();
        let email = address
            .get(..7)
            .filter(|scheme| scheme.eq_ignore_ascii_case("mailto:"))
            .map_or(address, |_| &address[7..]);
        Some(email.to_ascii_lowercase())
    }
}

impl PartialEq for Attendee {
    fn eq(&self, other: &Self) -> bool {
        self.number == other.number
            && self.email() == other.email()
            && self.common_name == other.common_name
            && self.status == other.status
            && self.role == other.role
    }
}

impl Eq for Attendee {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: Option<String>,
    /// FMTTYPE media type.
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalEvent {
    pub id: Option<i64>,
    pub calendar_id: Option<i64>,
    pub uid: Option<String>,
    pub subject: Option<String>,
    pub location: Option<String>,
    pub note: Option<String>,
    pub all_day: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub organizer: Option<String>,
    /// Organizer parameters as written in ICS, e.g. `CN="Alice"`.
    pub organizer_additional_params: Option<String>,
    pub sequence: Option<i32>,
    pub dt_stamp: Option<DateTime<Utc>>,
    /// RRULE value without the `RRULE:` prefix.
    pub recurrence_rule: Option<String>,
    /// Comma-joined EXDATE tokens.
    pub recurrence_ex_date: Option<String>,
    /// RECURRENCE-ID token of an overridden occurrence.
    pub recurrence_reference_id: Option<String>,
    pub recurrence_until: Option<DateTime<Utc>>,
    pub attendees: Vec<Attendee>,
    pub attachments: Vec<Attachment>,
    /// `Some(false)`: the schedule is owned by an external organizer.
    pub ownership: Option<bool>,
    pub deleted: bool,
    /// Row version the event was read at.
    pub version: i64,
    pub last_update: Option<DateTime<Utc>>,
}

/// Formats an instant as an EXDATE / RECURRENCE-ID token.
#[must_use]
pub fn ics_date_token(instant: DateTime<Utc>, all_day: bool) -> String {
    if all_day {
        Date::from_naive(instant.date_naive()).to_string()
    } else {
        IcalDateTime::from_utc(instant).to_string()
    }
}

/// Parses an EXDATE token back to an instant; dates map to UTC midnight.
#[must_use]
pub fn parse_date_token(token: &str) -> Option<DateTime<Utc>> {
    let token = token.trim();
    if token.len() == 8 {
        parse_date(token, 1, 1).ok()?.to_utc_midnight()
    } else {
        parse_datetime(token, None, 1, 1).ok()?.to_utc(chrono_tz::UTC)
    }
}

/// Drops sub-second precision, which iCalendar cannot carry.
#[must_use]
pub fn whole_seconds(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.trunc_subsecs(0)
}

/// Snaps an instant to midnight UTC of its UTC calendar day.
#[must_use]
pub fn utc_midnight(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.date_naive().and_time(NaiveTime::MIN).and_utc()
}

fn same_set<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len() && a.iter().all(|x| b.contains(x)) && b.iter().all(|x| a.contains(x))
}

impl CalEvent {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn has_recurrence(&self) -> bool {
        self.recurrence_rule
            .as_deref()
            .is_some_and(|rule| !rule.trim().is_empty())
    }

    /// Parsed recurrence rule; a malformed stored rule reads as none.
    #[must_use]
    pub fn recurrence_object(&self) -> Option<RRule> {
        let text = self.recurrence_rule.as_deref()?.trim();
        if text.is_empty() {
            return None;
        }
        parse_rrule(text, 1, 1)
            .inspect_err(|e| tracing::warn!(uid = ?self.uid, error = %e, "Ignoring malformed RRULE"))
            .ok()
    }

    /// Exclusion dates as instants; unparsable tokens are skipped.
    #[must_use]
    pub fn recurrence_ex_dates(&self) -> Vec<DateTime<Utc>> {
        self.recurrence_ex_date
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .filter(|token| !token.trim().is_empty())
            .filter_map(parse_date_token)
            .collect()
    }

    /// Appends an exclusion date unless it is already listed.
    pub fn add_recurrence_ex_date(&mut self, date: DateTime<Utc>) -> &mut Self {
        let token = ics_date_token(date, self.all_day);
        self.add_recurrence_ex_date_token(&token)
    }

    pub(crate) fn add_recurrence_ex_date_token(&mut self, token: &str) -> &mut Self {
        match self.recurrence_ex_date.as_mut() {
            Some(existing) if !existing.is_empty() => {
                // Substring match, as stored lists are plain comma-joined text.
                if !existing.contains(token) {
                    existing.push(',');
                    existing.push_str(token);
                }
            }
            _ => self.recurrence_ex_date = Some(token.to_string()),
        }
        self
    }

    /// ## Summary
    /// Sets the rule directly; the until bound is taken from its UNTIL.
    ///
    /// ## Errors
    /// Returns an error if the rule parts are out of range.
    pub fn set_recurrence_rule(&mut self, rule: Option<RRule>) -> ServiceResult<&mut Self> {
        let Some(rule) = rule else {
            self.recurrence_rule = None;
            self.recurrence_until = None;
            return Ok(self);
        };
        rule.validate()?;
        self.recurrence_until = rule
            .until
            .as_ref()
            .and_then(|until| until.to_utc(chrono_tz::UTC));
        self.recurrence_rule = Some(rule.to_string());
        Ok(self)
    }

    /// ## Summary
    /// Reports whether a semantically meaningful field differs from
    /// `previous`.
    ///
    /// Sequence, dtStamp and bookkeeping columns are ignored. Empty attendee
    /// and attachment sets compare equal to each other.
    #[must_use]
    pub fn must_inc_sequence(&self, previous: &Self) -> bool {
        self.all_day != previous.all_day
            || self.end_date != previous.end_date
            || self.location != previous.location
            || self.note != previous.note
            || self.recurrence_ex_date != previous.recurrence_ex_date
            || self.recurrence_rule != previous.recurrence_rule
            || self.recurrence_until != previous.recurrence_until
            || self.organizer != previous.organizer
            || self.organizer_additional_params != previous.organizer_additional_params
            || self.start_date != previous.start_date
            || self.subject != previous.subject
            || !same_set(&self.attendees, &previous.attendees)
            || !same_set(&self.attachments, &previous.attachments)
    }

    /// ## Summary
    /// Applies the sequence rule against the stored state.
    ///
    /// Events not owned by this calendar never change. Otherwise, when a
    /// meaningful field changed, the sequence advances (starting at 0) and
    /// dtStamp is refreshed unless the caller already moved it.
    ///
    /// Returns whether the sequence was bumped.
    pub fn apply_change(&mut self, previous: &Self, now: DateTime<Utc>) -> bool {
        if self.ownership == Some(false) {
            tracing::debug!(uid = ?self.uid, "Event not owned, keeping sequence");
            return false;
        }
        if !self.must_inc_sequence(previous) {
            return false;
        }

        self.sequence = Some(self.sequence.map_or(0, |seq| seq.saturating_add(1)));
        if self.dt_stamp.is_none() || self.dt_stamp == previous.dt_stamp {
            self.dt_stamp = Some(now);
        }
        tracing::debug!(uid = ?self.uid, sequence = ?self.sequence, "Sequence incremented");
        true
    }

    /// Truncates the instants written to iCalendar to whole seconds.
    pub fn truncate_to_seconds(&mut self) {
        for instant in [
            &mut self.start_date,
            &mut self.end_date,
            &mut self.dt_stamp,
            &mut self.recurrence_until,
        ] {
            *instant = instant.map(whole_seconds);
        }
    }

    /// Snaps start and end of an all-day event to midnight UTC of their own days.
    pub fn normalize_all_day(&mut self) {
        if !self.all_day {
            return;
        }
        self.start_date = self.start_date.map(utc_midnight);
        self.end_date = self.end_date.map(utc_midnight);
    }

    /// ## Summary
    /// Checks start/end ordering and the minimum duration.
    ///
    /// ## Errors
    /// Returns `ServiceError::Validation` with the duration message key when
    /// a date is missing, an all-day event ends before it starts, or a timed
    /// event lasts less than 60 seconds.
    pub fn validate(&self) -> ServiceResult<()> {
        let start = self.start_date.ok_or(ServiceError::duration("startDate"))?;
        let end = self.end_date.ok_or(ServiceError::duration("endDate"))?;

        let too_short = if self.all_day {
            end < start
        } else {
            end - start < MIN_TIMED_DURATION
        };
        if too_short {
            return Err(ServiceError::duration("endDate"));
        }
        Ok(())
    }

    /// Adds an attendee numbered one above the highest existing number.
    pub fn add_attendee(&mut self, mut attendee: Attendee) -> &mut Self {
        attendee.number = Some(self.next_attendee_number());
        self.attendees.push(attendee);
        self
    }

    /// Numbers attendees that have none yet, above the current maximum.
    pub fn number_attendees(&mut self) -> &mut Self {
        let mut next = self.next_attendee_number();
        for attendee in self.attendees.iter_mut().filter(|a| a.number.is_none()) {
            attendee.number = Some(next);
            next = next.saturating_add(1);
        }
        self
    }

    fn next_attendee_number(&self) -> u16 {
        self.attendees
            .iter()
            .filter_map(|a| a.number)
            .max()
            .map_or(1, |max| max.saturating_add(1))
    }

    /// ## Summary
    /// Reconciles the attendee list with the stored one, matched by e-mail.
    ///
    /// Retained attendees keep their stored number; new attendees get the
    /// default status and numbers above every stored and current number, so
    /// numbers of removed attendees are not reused. Returns the removed
    /// attendees.
    pub fn merge_attendees(&mut self, previous: &[Attendee]) -> Vec<Attendee> {
        let mut next = previous
            .iter()
            .chain(self.attendees.iter())
            .filter_map(|a| a.number)
            .max()
            .unwrap_or(0);

        for attendee in &mut self.attendees {
            let stored = attendee
                .email()
                .and_then(|email| previous.iter().find(|p| p.email().as_ref() == Some(&email)));
            match stored {
                Some(stored) => attendee.number = stored.number,
                None => {
                    next = next.saturating_add(1);
                    attendee.number = Some(next);
                    if attendee.status.is_none() {
                        attendee.status = Some(DEFAULT_ATTENDEE_STATUS.to_string());
                    }
                }
            }
        }

        let removed: Vec<Attendee> = previous
            .iter()
            .filter(|p| {
                let email = p.email();
                !self.attendees.iter().any(|a| a.email() == email)
            })
            .cloned()
            .collect();
        if !removed.is_empty() {
            tracing::debug!(uid = ?self.uid, removed = removed.len(), "Attendees removed");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, minute, second).unwrap()
    }

    fn sample() -> CalEvent {
        CalEvent {
            uid: Some("u-1@localhost".to_string()),
            subject: Some("Standup".to_string()),
            location: Some("Room 1".to_string()),
            start_date: Some(at(15, 9, 0, 0)),
            end_date: Some(at(15, 9, 30, 0)),
            sequence: Some(2),
            dt_stamp: Some(at(1, 8, 0, 0)),
            ..CalEvent::default()
        }
    }

    #[test]
    fn identical_copy_needs_no_bump() {
        let event = sample();
        assert!(!event.must_inc_sequence(&event.clone()));
    }

    #[test]
    fn subject_change_needs_bump_but_bookkeeping_does_not() {
        let event = sample();
        let mut renamed = event.clone();
        renamed.subject = Some("Retro".to_string());
        assert!(renamed.must_inc_sequence(&event));

        let mut restamped = event.clone();
        restamped.sequence = Some(9);
        restamped.dt_stamp = Some(at(2, 0, 0, 0));
        restamped.version = 4;
        assert!(!restamped.must_inc_sequence(&event));
    }

    #[test]
    fn attendee_sets_compare_as_sets() {
        let mut a = sample();
        a.attendees = vec![
            Attendee::new("mailto:bob@example.com"),
            Attendee::new("mailto:eve@example.com"),
        ];
        let mut b = sample();
        b.attendees = vec![
            Attendee::new("MAILTO:eve@example.com"),
            Attendee::new("mailto:Bob@example.com"),
        ];
        assert!(!a.must_inc_sequence(&b));

        b.attendees.pop();
        assert!(a.must_inc_sequence(&b));
    }

    #[test]
    fn apply_change_bumps_and_refreshes_stamp() {
        let previous = sample();
        let mut edited = previous.clone();
        edited.location = Some("Room 2".to_string());

        let now = at(20, 12, 0, 0);
        assert!(edited.apply_change(&previous, now));
        assert_eq!(edited.sequence, Some(3));
        assert_eq!(edited.dt_stamp, Some(now));
    }

    #[test]
    fn apply_change_keeps_newer_caller_stamp() {
        let previous = sample();
        let mut edited = previous.clone();
        edited.note = Some("agenda".to_string());
        edited.sequence = None;
        edited.dt_stamp = Some(at(19, 0, 0, 0));

        assert!(edited.apply_change(&previous, at(20, 12, 0, 0)));
        assert_eq!(edited.sequence, Some(0));
        assert_eq!(edited.dt_stamp, Some(at(19, 0, 0, 0)));
    }

    #[test]
    fn counters_saturate() {
        let previous = sample();
        let mut edited = previous.clone();
        edited.sequence = Some(i32::MAX);
        edited.subject = Some("changed".to_string());
        assert!(edited.apply_change(&previous, at(20, 12, 0, 0)));
        assert_eq!(edited.sequence, Some(i32::MAX));

        let mut event = sample();
        event.add_attendee(Attendee::new("mailto:a@x"));
        event.attendees[0].number = Some(u16::MAX);
        event.add_attendee(Attendee::new("mailto:b@x"));
        event.attendees.push(Attendee::new("mailto:c@x"));
        event.number_attendees();
        assert!(event.attendees.iter().all(|a| a.number == Some(u16::MAX)));

        let mut merged = sample();
        merged.attendees = vec![Attendee::new("mailto:new@x")];
        merged.merge_attendees(&event.attendees);
        assert_eq!(merged.attendees[0].number, Some(u16::MAX));
    }

    #[test]
    fn instants_lose_sub_seconds() {
        let mut event = sample();
        event.start_date = Some(at(15, 9, 0, 0) + TimeDelta::milliseconds(900));
        event.end_date = Some(at(15, 9, 30, 0) + TimeDelta::nanoseconds(1));
        event.dt_stamp = Some(at(1, 8, 0, 0) + TimeDelta::microseconds(5));
        event.truncate_to_seconds();
        assert_eq!(event, sample());
    }

    #[test]
    fn foreign_event_never_bumps() {
        let previous = sample();
        let mut edited = previous.clone();
        edited.ownership = Some(false);
        edited.subject = Some("changed".to_string());
        edited.start_date = Some(at(16, 9, 0, 0));
        edited.end_date = Some(at(16, 10, 0, 0));

        assert!(!edited.apply_change(&previous, at(20, 12, 0, 0)));
        assert_eq!(edited.sequence, Some(2));
        assert_eq!(edited.dt_stamp, previous.dt_stamp);
    }

    #[test]
    fn ex_dates_are_deduplicated() {
        let mut event = sample();
        event.add_recurrence_ex_date(at(15, 9, 0, 0));
        event.add_recurrence_ex_date(at(22, 9, 0, 0));
        event.add_recurrence_ex_date(at(15, 9, 0, 0));
        assert_eq!(
            event.recurrence_ex_date.as_deref(),
            Some("20240315T090000Z,20240322T090000Z")
        );
        assert_eq!(
            event.recurrence_ex_dates(),
            vec![at(15, 9, 0, 0), at(22, 9, 0, 0)]
        );

        let mut all_day = CalEvent {
            all_day: true,
            ..CalEvent::default()
        };
        all_day.add_recurrence_ex_date(at(15, 9, 0, 0));
        assert_eq!(all_day.recurrence_ex_date.as_deref(), Some("20240315"));
    }

    #[test]
    fn set_recurrence_rule_takes_until_from_rule() {
        use teamcal_rfc::ical::core::RRuleUntil;

        let mut event = sample();
        let rule = RRule::daily().with_until(RRuleUntil::DateTime(IcalDateTime::utc(
            2024, 3, 31, 21, 59, 59,
        )));
        event.set_recurrence_rule(Some(rule)).unwrap();
        assert!(event.has_recurrence());
        assert_eq!(event.recurrence_until, Some(at(31, 21, 59, 59)));

        event.set_recurrence_rule(None).unwrap();
        assert!(!event.has_recurrence());
        assert!(event.recurrence_until.is_none());

        assert!(event.set_recurrence_rule(Some(RRule::default())).is_err());
    }

    #[test]
    fn all_day_validation() {
        let mut event = CalEvent {
            all_day: true,
            start_date: Some(Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap()),
            end_date: Some(Utc.with_ymd_and_hms(2024, 1, 9, 0, 0, 0).unwrap()),
            ..CalEvent::default()
        };
        assert!(matches!(
            event.validate(),
            Err(ServiceError::Validation { field: "endDate", .. })
        ));

        event.end_date = event.start_date;
        assert!(event.validate().is_ok());
    }

    #[test]
    fn timed_events_need_a_minute() {
        let mut event = sample();
        event.end_date = Some(at(15, 9, 0, 59));
        assert!(event.validate().is_err());
        event.end_date = Some(at(15, 9, 1, 0));
        assert!(event.validate().is_ok());
    }

    #[test]
    fn all_day_dates_snap_independently() {
        let mut event = CalEvent {
            all_day: true,
            start_date: Some(at(10, 13, 0, 0)),
            end_date: Some(at(12, 7, 0, 0)),
            ..CalEvent::default()
        };
        event.normalize_all_day();
        assert_eq!(event.start_date, Some(at(10, 0, 0, 0)));
        assert_eq!(event.end_date, Some(at(12, 0, 0, 0)));
    }

    #[test]
    fn attendee_numbers_follow_the_maximum() {
        let mut event = sample();
        event.add_attendee(Attendee::new("mailto:a@x"));
        event.attendees[0].number = Some(4);
        event.add_attendee(Attendee::new("mailto:b@x"));
        let numbers: Vec<_> = event.attendees.iter().map(|a| a.number).collect();
        assert_eq!(numbers, vec![Some(4), Some(5)]);

        event.attendees.push(Attendee::new("mailto:c@x"));
        event.attendees.insert(0, Attendee::new("mailto:d@x"));
        event.number_attendees();
        let numbers: Vec<_> = event.attendees.iter().map(|a| a.number).collect();
        assert_eq!(numbers, vec![Some(6), Some(4), Some(5), Some(7)]);
    }

    #[test]
    fn merge_keeps_numbers_and_reports_removed() {
        let mut stored = sample();
        stored.add_attendee(Attendee::new("mailto:bob@example.com"));
        stored.add_attendee(Attendee::new("mailto:eve@example.com"));
        stored.add_attendee(Attendee::new("mailto:max@example.com"));

        let mut edited = sample();
        edited.attendees = vec![
            Attendee::new("MAILTO:max@example.com"),
            Attendee::new("mailto:new@example.com"),
        ];
        let removed = edited.merge_attendees(&stored.attendees);

        assert_eq!(edited.attendees[0].number, Some(3));
        assert_eq!(edited.attendees[1].number, Some(4));
        assert_eq!(
            edited.attendees[1].status.as_deref(),
            Some(DEFAULT_ATTENDEE_STATUS)
        );
        let gone: Vec<_> = removed.iter().filter_map(Attendee::email).collect();
        assert_eq!(gone, vec!["bob@example.com", "eve@example.com"]);
    }
}
