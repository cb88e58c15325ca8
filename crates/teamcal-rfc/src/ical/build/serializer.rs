//! iCalendar serializer (RFC 5545).

use base64::{Engine as _, engine::general_purpose::STANDARD};

use super::escape::escape_text;
use super::fold::fold_line;
use crate::ical::core::{Component, ComponentKind, ICalendar, Property, Value};

const CALENDAR_ORDER: &[&str] = &["VERSION", "PRODID", "CALSCALE", "METHOD"];

const EVENT_ORDER: &[&str] = &[
    "UID",
    "DTSTAMP",
    "DTSTART",
    "DTEND",
    "DURATION",
    "RRULE",
    "RDATE",
    "EXDATE",
    "RECURRENCE-ID",
    "SUMMARY",
    "DESCRIPTION",
    "LOCATION",
    "GEO",
    "CLASS",
    "STATUS",
    "TRANSP",
    "ORGANIZER",
    "ATTENDEE",
    "ATTACH",
    "CREATED",
    "LAST-MODIFIED",
    "SEQUENCE",
];

/// Serializes a calendar to CRLF-terminated, folded text.
#[must_use]
pub fn serialize(ical: &ICalendar) -> String {
    serialize_component(&ical.root)
}

/// ## Summary
/// Serializes a component and its children.
///
/// Known properties of VCALENDAR and VEVENT come first in a fixed order;
/// the rest follow in insertion order. Children keep insertion order.
#[must_use]
pub fn serialize_component(component: &Component) -> String {
    let mut out = fold_line(&format!("BEGIN:{}", component.name));

    let order = match component.kind {
        ComponentKind::Calendar => CALENDAR_ORDER,
        ComponentKind::Event | ComponentKind::Todo | ComponentKind::Journal => EVENT_ORDER,
        _ => &[],
    };
    for prop in ordered(&component.properties, order) {
        out.push_str(&serialize_property(prop));
    }
    for child in &component.children {
        out.push_str(&serialize_component(child));
    }

    out.push_str(&fold_line(&format!("END:{}", component.name)));
    out
}

fn ordered<'a>(props: &'a [Property], order: &[&str]) -> Vec<&'a Property> {
    let rank = |prop: &Property| {
        order
            .iter()
            .position(|name| prop.name.eq_ignore_ascii_case(name))
            .unwrap_or(order.len())
    };
    let mut sorted: Vec<&Property> = props.iter().collect();
    // Stable sort keeps insertion order within the same rank.
    sorted.sort_by_key(|prop| rank(prop));
    sorted
}

/// Serializes one property as a folded content line.
#[must_use]
pub fn serialize_property(prop: &Property) -> String {
    let mut line = prop.name.clone();
    if !prop.params.is_empty() {
        line.push(';');
        line.push_str(&prop.params_text());
    }
    line.push(':');
    line.push_str(&format_value(&prop.value));
    fold_line(&line)
}

fn join<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Binary(bytes) => STANDARD.encode(bytes),
        Value::CalAddress(s) | Value::Uri(s) | Value::Unknown(s) => s.clone(),
        Value::Date(d) => d.to_string(),
        Value::DateTime(dt) => dt.to_string(),
        Value::DateList(dates) => join(dates),
        Value::DateTimeList(times) => join(times),
        Value::Duration(delta) => format_duration(*delta),
        Value::Integer(i) => i.to_string(),
        Value::Recur(rule) => rule.to_string(),
        Value::Text(s) => escape_text(s),
    }
}

/// Formats a DURATION (`P2W`, `P1DT2H`, `-PT15M`, `PT0S`).
#[must_use]
pub fn format_duration(delta: chrono::TimeDelta) -> String {
    let sign = if delta < chrono::TimeDelta::zero() { "-" } else { "" };
    let total = delta.num_seconds().unsigned_abs();
    if total == 0 {
        return "PT0S".to_string();
    }
    if total % (7 * 86_400) == 0 {
        return format!("{sign}P{}W", total / (7 * 86_400));
    }

    let days = total / 86_400;
    let hours = total % 86_400 / 3_600;
    let minutes = total % 3_600 / 60;
    let seconds = total % 60;

    let mut out = format!("{sign}P");
    if days > 0 {
        out.push_str(&format!("{days}D"));
    }
    if hours + minutes + seconds > 0 {
        out.push('T');
        for (amount, unit) in [(hours, 'H'), (minutes, 'M'), (seconds, 'S')] {
            if amount > 0 {
                out.push_str(&format!("{amount}{unit}"));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ical::core::{Date, DateTime, Parameter, RRule};

    #[test]
    fn event_properties_follow_canonical_order() {
        let mut cal = ICalendar::new("-//Test//EN");
        let mut event = Component::event();
        event.add_property(Property::text("SUMMARY", "Standup"));
        event.add_property(Property::text("X-TEAMCAL-NOTE", "x"));
        event.add_property(Property::datetime("DTSTART", DateTime::utc(2024, 3, 15, 9, 0, 0)));
        event.add_property(Property::text("UID", "u-1"));
        cal.add_event(event);

        let text = serialize(&cal);
        assert_eq!(
            text,
            "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Test//EN\r\nBEGIN:VEVENT\r\n\
UID:u-1\r\nDTSTART:20240315T090000Z\r\nSUMMARY:Standup\r\nX-TEAMCAL-NOTE:x\r\n\
END:VEVENT\r\nEND:VCALENDAR\r\n"
        );
    }

    #[test]
    fn values_are_formatted_by_type() {
        let organizer = Property::cal_address("ORGANIZER", "MAILTO:alice@example.com")
            .with_param(Parameter::cn("Alice Balder, Example Inc."));
        assert_eq!(
            serialize_property(&organizer),
            "ORGANIZER;CN=\"Alice Balder, Example Inc.\":MAILTO:alice@example.com\r\n"
        );

        let exdate = Property::new(
            "EXDATE",
            Value::DateList(vec![Date::new(2024, 3, 15), Date::new(2024, 3, 22)]),
        )
        .with_param(Parameter::value_type("DATE"));
        assert_eq!(
            serialize_property(&exdate),
            "EXDATE;VALUE=DATE:20240315,20240322\r\n"
        );

        assert_eq!(
            serialize_property(&Property::recur(RRule::daily().with_count(3))),
            "RRULE:FREQ=DAILY;COUNT=3\r\n"
        );
        assert_eq!(
            serialize_property(&Property::new("ATTACH", Value::Binary(b"hello".to_vec()))),
            "ATTACH:aGVsbG8=\r\n"
        );
        assert_eq!(
            serialize_property(&Property::text("DESCRIPTION", "a;b,c")),
            "DESCRIPTION:a\\;b\\,c\r\n"
        );
    }

    #[test]
    fn parsed_parameters_are_written_as_read() {
        let cal = crate::ical::parse(
            "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:u\r\n\
ORGANIZER;cn=\"Alice\";role=CHAIR:mailto:a@example.com\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n",
        )
        .unwrap();
        let organizer = cal.events()[0].get_property("ORGANIZER").unwrap().clone();
        assert_eq!(organizer.raw_params.as_deref(), Some("cn=\"Alice\";role=CHAIR"));
        assert_eq!(
            serialize_property(&organizer),
            "ORGANIZER;cn=\"Alice\";role=CHAIR:mailto:a@example.com\r\n"
        );

        let mut changed = organizer;
        changed.set_param(Parameter::role("CHAIR"));
        assert_eq!(
            serialize_property(&changed),
            "ORGANIZER;CN=Alice;ROLE=CHAIR:mailto:a@example.com\r\n"
        );
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(chrono::TimeDelta::days(14)), "P2W");
        assert_eq!(
            format_duration(chrono::TimeDelta::hours(26)),
            "P1DT2H"
        );
        assert_eq!(format_duration(-chrono::TimeDelta::minutes(15)), "-PT15M");
        assert_eq!(format_duration(chrono::TimeDelta::zero()), "PT0S");
    }
}
