//! Parse and serialize together.

use crate::ical::core::{Date, DateTime, RRuleUntil, Value};
use crate::ical::{parse, serialize};

const RECURRING: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//TeamCal//TeamCal Event Core//EN\r\n\
METHOD:REQUEST\r\n\
BEGIN:VEVENT\r\n\
UID:series-1@teamcal.local\r\n\
DTSTAMP:20240301T080000Z\r\n\
DTSTART;TZID=Europe/Berlin:20240304T090000\r\n\
DTEND;TZID=Europe/Berlin:20240304T093000\r\n\
RRULE:FREQ=WEEKLY;UNTIL=20240331T215959Z;BYDAY=MO,WE\r\n\
EXDATE:20240306T080000Z\r\n\
SUMMARY:Standup\\, daily\r\n\
ORGANIZER;CN=\"Alice Balder, Example Inc.\":MAILTO:alice@example.com\r\n\
ATTENDEE;CN=Bob;PARTSTAT=ACCEPTED;ROLE=REQ-PARTICIPANT:mailto:bob@example.com\r\n\
SEQUENCE:2\r\n\
X-TEAMCAL-NOTE:kept verbatim\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

#[test_log::test]
fn canonical_document_round_trips_unchanged() {
    let cal = parse(RECURRING).unwrap();
    assert_eq!(serialize(&cal), RECURRING);
}

#[test_log::test]
fn reparse_keeps_typed_values() {
    let cal = parse(RECURRING).unwrap();
    let again = parse(&serialize(&cal)).unwrap();
    assert_eq!(cal, again);

    let event = again.events()[0];
    let start = event.get_property("DTSTART").unwrap().as_datetime().unwrap();
    assert_eq!(start.tzid(), Some("Europe/Berlin"));

    let rule = event.get_property("RRULE").unwrap().value.as_rrule().unwrap();
    assert_eq!(
        rule.until,
        Some(RRuleUntil::DateTime(DateTime::utc(2024, 3, 31, 21, 59, 59)))
    );
    assert_eq!(event.summary(), Some("Standup, daily"));
}

#[test_log::test]
fn long_lines_fold_and_unfold() {
    let description = "Lorem ipsum dolor sit amet, ".repeat(10);
    let input = format!(
        "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:x\r\nDTSTART;VALUE=DATE:20240101\r\n\
DESCRIPTION:{}\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n",
        description.replace(',', "\\,")
    );
    let cal = parse(&input).unwrap();
    let text = serialize(&cal);
    assert!(text.split("\r\n").all(|l| l.len() <= 75));

    let again = parse(&text).unwrap();
    let event = again.events()[0];
    assert_eq!(
        event.get_property("DESCRIPTION").and_then(|p| p.as_text()),
        Some(description.as_str())
    );
    assert_eq!(
        event.get_property("DTSTART").unwrap().value,
        Value::Date(Date::new(2024, 1, 1))
    );
}
