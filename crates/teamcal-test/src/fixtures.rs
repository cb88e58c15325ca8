use chrono::{DateTime, TimeZone, Utc};
use teamcal_core::context::UserContext;
use teamcal_core::uid::EventUidGenerator;

/// Calendar every fixture is imported into.
pub const CALENDAR_ID: i64 = 1;

/// A Berlin standup (Mondays and Wednesdays in March 2024) with one moved
/// occurrence, plus an all-day offsite.
pub const TEAM_FEED: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Example Corp//Team Calendar//EN\r\n\
METHOD:REQUEST\r\n\
BEGIN:VEVENT\r\n\
UID:standup@example.com\r\n\
DTSTAMP:20240301T080000Z\r\n\
DTSTART;TZID=Europe/Berlin:20240304T090000\r\n\
DTEND;TZID=Europe/Berlin:20240304T091500\r\n\
RRULE:FREQ=WEEKLY;BYDAY=MO,WE;UNTIL=20240327T225959Z\r\n\
SUMMARY:Standup\r\n\
LOCATION:Room 4\r\n\
ORGANIZER;CN=Alice:mailto:alice@example.com\r\n\
ATTENDEE;CN=Bob;PARTSTAT=ACCEPTED:mailto:bob@example.com\r\n\
ATTENDEE;CN=Carol:mailto:carol@example.com\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:standup@example.com\r\n\
DTSTAMP:20240301T080000Z\r\n\
RECURRENCE-ID;TZID=Europe/Berlin:20240313T090000\r\n\
DTSTART;TZID=Europe/Berlin:20240313T110000\r\n\
DTEND;TZID=Europe/Berlin:20240313T111500\r\n\
SUMMARY:Standup (moved)\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:offsite@example.com\r\n\
DTSTAMP:20240301T080000Z\r\n\
DTSTART;VALUE=DATE:20240321\r\n\
DTEND;VALUE=DATE:20240323\r\n\
SUMMARY:Team offsite\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

/// Cancels the offsite of [`TEAM_FEED`].
pub const CANCEL_OFFSITE: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Example Corp//Team Calendar//EN\r\n\
METHOD:CANCEL\r\n\
BEGIN:VEVENT\r\n\
UID:offsite@example.com\r\n\
DTSTAMP:20240305T080000Z\r\n\
DTSTART;VALUE=DATE:20240321\r\n\
DTEND;VALUE=DATE:20240323\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

#[must_use]
pub fn berlin() -> UserContext {
    UserContext::new(chrono_tz::Europe::Berlin)
}

#[must_use]
pub fn uid_generator() -> EventUidGenerator {
    EventUidGenerator::new("teamcal.test")
}

/// UTC instant in March 2024.
///
/// # Panics
/// Panics on an invalid day or time.
#[must_use]
pub fn march(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, minute, 0)
        .single()
        .unwrap_or_else(|| panic!("invalid instant 2024-03-{day} {hour}:{minute}"))
}
