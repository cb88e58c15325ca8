//! `CalEvent` to and from iCalendar text.
//!
//! All-day DTEND is exclusive on the wire and inclusive on `CalEvent`.
//! RRULE, EXDATE and RECURRENCE-ID are carried as ICS tokens in both
//! directions.

use chrono::{DateTime, TimeDelta, Utc};
use teamcal_rfc::ical::core::{Date, DateTime as IcalDateTime};
use teamcal_rfc::ical::{Component, ICalendar, Parameter, Property, Value, parse, serialize};

use crate::calendar::event::{Attachment, Attendee, CalEvent};
use crate::error::{ServiceError, ServiceResult};

/// Attendee parameter carrying the stable attendee number.
pub const ATTENDEE_NUMBER_PARAM: &str = "X-TEAMCAL-NUMBER";
/// Attachment parameter carrying the original file name.
pub const FILENAME_PARAM: &str = "X-FILENAME";

/// ## Summary
/// Decodes every VEVENT of a feed.
///
/// ## Errors
/// Returns an error if the text is not a well-formed VCALENDAR. Events that
/// fail to decode are skipped with a warning.
#[tracing::instrument(skip(ics), fields(len = ics.len()))]
pub fn decode_events(ics: &str) -> ServiceResult<Vec<CalEvent>> {
    let calendar = parse(ics)?;
    Ok(decode_calendar_events(&calendar))
}

/// Decodes the first VEVENT; `None` when the text holds no decodable event.
#[must_use]
pub fn decode_event(ics: &str) -> Option<CalEvent> {
    match decode_events(ics) {
        Ok(events) => events.into_iter().next(),
        Err(e) => {
            tracing::warn!(error = %e, "No event extractable from ICS data");
            None
        }
    }
}

#[must_use]
pub fn decode_calendar_events(calendar: &ICalendar) -> Vec<CalEvent> {
    calendar
        .events()
        .into_iter()
        .filter_map(|component| {
            decode_component(component)
                .inspect_err(|e| {
                    tracing::warn!(uid = ?component.uid(), error = %e, "Skipping undecodable VEVENT");
                })
                .ok()
        })
        .collect()
}

fn text(component: &Component, name: &str) -> Option<String> {
    component
        .get_property(name)
        .and_then(Property::as_text)
        .map(String::from)
}

fn invalid(name: &str, value: impl std::fmt::Display) -> ServiceError {
    ServiceError::ParseError(format!("{name} has an invalid value: {value}"))
}

fn date_instant(name: &str, date: Date) -> ServiceResult<DateTime<Utc>> {
    date.to_utc_midnight().ok_or_else(|| invalid(name, date))
}

fn datetime_instant(name: &str, dt: &IcalDateTime) -> ServiceResult<DateTime<Utc>> {
    dt.to_utc(chrono_tz::UTC).ok_or_else(|| invalid(name, dt))
}

/// Reads a date or date-time property; the flag tells whether it was a date.
fn instant(component: &Component, name: &str) -> ServiceResult<Option<(DateTime<Utc>, bool)>> {
    let Some(prop) = component.get_property(name) else {
        return Ok(None);
    };
    match &prop.value {
        Value::Date(date) => Ok(Some((date_instant(name, *date)?, true))),
        Value::DateTime(dt) => Ok(Some((datetime_instant(name, dt)?, false))),
        other => Err(invalid(name, format!("{other:?}"))),
    }
}

/// Date tokens as stored in `CalEvent`: dates stay dates, date-times go UTC.
fn date_tokens(name: &str, value: &Value) -> ServiceResult<Vec<String>> {
    match value {
        Value::Date(date) => Ok(vec![date.to_string()]),
        Value::DateList(dates) => Ok(dates.iter().map(ToString::to_string).collect()),
        Value::DateTime(dt) => Ok(vec![utc_token(name, dt)?]),
        Value::DateTimeList(list) => list.iter().map(|dt| utc_token(name, dt)).collect(),
        Value::Unknown(raw) | Value::Text(raw) => Ok(raw
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect()),
        other => Err(invalid(name, format!("{other:?}"))),
    }
}

fn utc_token(name: &str, dt: &IcalDateTime) -> ServiceResult<String> {
    if dt.is_utc() {
        return Ok(dt.to_string());
    }
    Ok(IcalDateTime::from_utc(datetime_instant(name, dt)?).to_string())
}

fn decode_attendee(prop: &Property) -> Attendee {
    Attendee {
        number: prop
            .get_param_value(ATTENDEE_NUMBER_PARAM)
            .and_then(|n| n.trim().parse().ok()),
        address: prop.as_text().map(String::from),
        common_name: prop.get_param_value("CN").map(String::from),
        status: prop.get_param_value("PARTSTAT").map(String::from),
        role: prop.get_param_value("ROLE").map(String::from),
    }
}

/// ## Summary
/// Decodes one VEVENT component.
///
/// Missing optional properties decode to `None`. A date-valued DTSTART
/// marks the event all-day; its exclusive DTEND moves back one day. Without
/// DTEND the end is DTSTART plus DURATION, or DTSTART itself.
///
/// ## Errors
/// Returns `ServiceError::ParseError` for dates that do not exist and for
/// date properties holding the wrong value type.
pub fn decode_component(component: &Component) -> ServiceResult<CalEvent> {
    let mut event = CalEvent {
        uid: component.uid().map(String::from),
        subject: text(component, "SUMMARY"),
        location: text(component, "LOCATION"),
        note: text(component, "DESCRIPTION"),
        ..CalEvent::default()
    };

    if let Some((start, all_day)) = instant(component, "DTSTART")? {
        event.start_date = Some(start);
        event.all_day = all_day;
    }
    event.end_date = match instant(component, "DTEND")? {
        Some((end, true)) => {
            let inclusive = end - TimeDelta::days(1);
            Some(event.start_date.map_or(inclusive, |start| inclusive.max(start)))
        }
        Some((end, false)) => Some(end),
        None => {
            let duration = component.get_property("DURATION").and_then(|p| match p.value {
                Value::Duration(d) => Some(d),
                _ => None,
            });
            event.start_date.map(|start| start + duration.unwrap_or_default())
        }
    };
    event.dt_stamp = instant(component, "DTSTAMP")?.map(|(at, _)| at);
    event.sequence = component.get_property("SEQUENCE").and_then(Property::as_integer);

    if let Some(organizer) = component.get_property("ORGANIZER") {
        event.organizer = organizer.as_text().map(String::from);
        if !organizer.params.is_empty() {
            event.organizer_additional_params = Some(organizer.params_text());
        }
    }

    if let Some(prop) = component.get_property("RRULE") {
        match &prop.value {
            Value::Recur(rule) => {
                event.recurrence_until =
                    rule.until.as_ref().and_then(|until| until.to_utc(chrono_tz::UTC));
                event.recurrence_rule = Some(rule.to_string());
            }
            other => event.recurrence_rule = other.as_text().map(String::from),
        }
    }

    let mut ex_dates = Vec::new();
    for prop in component.get_properties("EXDATE") {
        ex_dates.extend(date_tokens("EXDATE", &prop.value)?);
    }
    if !ex_dates.is_empty() {
        event.recurrence_ex_date = Some(ex_dates.join(","));
    }
    if let Some(prop) = component.get_property("RECURRENCE-ID") {
        event.recurrence_reference_id = date_tokens("RECURRENCE-ID", &prop.value)?.into_iter().next();
    }

    event.attendees = component
        .get_properties("ATTENDEE")
        .into_iter()
        .map(decode_attendee)
        .collect();
    event.attachments = component
        .get_properties("ATTACH")
        .into_iter()
        .filter_map(|prop| match &prop.value {
            Value::Binary(data) => Some(Attachment {
                filename: prop.get_param_value(FILENAME_PARAM).map(String::from),
                content_type: prop.get_param_value("FMTTYPE").map(String::from),
                data: data.clone(),
            }),
            _ => {
                tracing::debug!(uid = ?event.uid, "Skipping URI attachment");
                None
            }
        })
        .collect();

    Ok(event)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn date_property(name: &str, at: DateTime<Utc>, all_day: bool) -> Property {
    if all_day {
        Property::date(name, Date::from_naive(at.date_naive()))
    } else {
        Property::datetime(name, IcalDateTime::from_utc(at))
    }
}

/// Raw token property, typed as DATE when the tokens are dates.
fn token_property(name: &str, tokens: &str, all_day: bool) -> Property {
    let prop = Property::raw(name, tokens);
    let first = tokens.split(',').next().unwrap_or_default().trim();
    if all_day || first.len() == 8 {
        prop.with_param(Parameter::value_type("DATE"))
    } else {
        prop
    }
}

fn encode_attendee(attendee: &Attendee) -> Option<Property> {
    let address = attendee.address.as_deref()?;
    let mut prop = Property::cal_address("ATTENDEE", address);
    if let Some(cn) = &attendee.common_name {
        prop.set_param(Parameter::cn(cn));
    }
    if let Some(status) = &attendee.status {
        prop.set_param(Parameter::partstat(status));
    }
    if let Some(role) = &attendee.role {
        prop.set_param(Parameter::role(role));
    }
    if let Some(number) = attendee.number {
        prop.set_param(Parameter::new(ATTENDEE_NUMBER_PARAM, number.to_string()));
    }
    Some(prop)
}

fn encode_attachment(attachment: &Attachment) -> Property {
    let mut prop = Property::new("ATTACH", Value::Binary(attachment.data.clone()))
        .with_param(Parameter::new("ENCODING", "BASE64"))
        .with_param(Parameter::value_type("BINARY"));
    if let Some(content_type) = &attachment.content_type {
        prop.set_param(Parameter::fmttype(content_type));
    }
    if let Some(filename) = &attachment.filename {
        prop.set_param(Parameter::new(FILENAME_PARAM, filename));
    }
    prop
}

/// ## Summary
/// Encodes one event as a VEVENT component.
///
/// Unset fields produce no property. Organizer parameters that do not
/// parse are dropped with a warning.
#[must_use]
pub fn encode_event(event: &CalEvent) -> Component {
    let mut vevent = Component::event();
    if let Some(uid) = &event.uid {
        vevent.add_property(Property::text("UID", uid));
    }
    if let Some(stamp) = event.dt_stamp {
        vevent.add_property(Property::datetime("DTSTAMP", IcalDateTime::from_utc(stamp)));
    }
    if let Some(start) = event.start_date {
        vevent.add_property(date_property("DTSTART", start, event.all_day));
    }
    if let Some(end) = event.end_date {
        // Exclusive on the wire.
        let end = if event.all_day { end + TimeDelta::days(1) } else { end };
        vevent.add_property(date_property("DTEND", end, event.all_day));
    }
    if let Some(rule) = non_blank(event.recurrence_rule.as_deref()) {
        vevent.add_property(Property::raw("RRULE", rule));
    }
    if let Some(tokens) = non_blank(event.recurrence_ex_date.as_deref()) {
        vevent.add_property(token_property("EXDATE", tokens, event.all_day));
    }
    if let Some(token) = non_blank(event.recurrence_reference_id.as_deref()) {
        vevent.add_property(token_property("RECURRENCE-ID", token, event.all_day));
    }

    for (name, value) in [
        ("SUMMARY", &event.subject),
        ("DESCRIPTION", &event.note),
        ("LOCATION", &event.location),
    ] {
        if let Some(value) = value {
            vevent.add_property(Property::text(name, value));
        }
    }

    if let Some(organizer) = event.organizer.as_deref().filter(|o| !o.is_empty()) {
        let prop = Property::cal_address("ORGANIZER", organizer);
        let prop = match event.organizer_additional_params.as_deref() {
            Some(raw) => prop.clone().with_raw_params(raw).unwrap_or_else(|e| {
                tracing::warn!(uid = ?event.uid, error = %e, "Dropping malformed organizer parameters");
                prop
            }),
            None => prop,
        };
        vevent.add_property(prop);
    }

    for prop in event.attendees.iter().filter_map(encode_attendee) {
        vevent.add_property(prop);
    }
    for attachment in &event.attachments {
        vevent.add_property(encode_attachment(attachment));
    }
    if let Some(sequence) = event.sequence {
        vevent.add_property(Property::integer("SEQUENCE", sequence));
    }
    vevent
}

/// Builds a VCALENDAR holding one VEVENT per event.
#[must_use]
pub fn build_calendar(events: &[CalEvent], method: Option<&str>, prodid: &str) -> ICalendar {
    let mut calendar = ICalendar::new(prodid);
    if let Some(method) = method {
        calendar = calendar.with_method(method);
    }
    for event in events {
        calendar.add_event(encode_event(event));
    }
    calendar
}

/// Serialized form of [`build_calendar`].
#[must_use]
pub fn encode_calendar(events: &[CalEvent], method: Option<&str>, prodid: &str) -> String {
    serialize(&build_calendar(events, method, prodid))
}
