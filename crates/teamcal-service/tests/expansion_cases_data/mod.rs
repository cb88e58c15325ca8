use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use teamcal_service::calendar::event::CalEvent;

pub struct ExpansionCase {
    pub name: &'static str,
    pub start: &'static str,
    pub minutes: i64,
    pub all_day: bool,
    pub rule: &'static str,
    pub ex_dates: Option<&'static str>,
    pub zone: Tz,
    pub from: Option<&'static str>,
    pub to: Option<&'static str>,
    pub expected: &'static [&'static str],
}

impl ExpansionCase {
    pub fn master(&self) -> CalEvent {
        let start = parse_rfc3339(self.start);
        CalEvent {
            calendar_id: Some(1),
            uid: Some(format!("{}@cases.local", self.name)),
            subject: Some(self.name.to_string()),
            all_day: self.all_day,
            start_date: Some(start),
            end_date: Some(start + TimeDelta::minutes(self.minutes)),
            recurrence_rule: Some(self.rule.to_string()),
            recurrence_ex_date: self.ex_dates.map(str::to_string),
            ..CalEvent::default()
        }
    }

    pub fn range(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        (self.from.map(parse_rfc3339), self.to.map(parse_rfc3339))
    }
}

#[expect(clippy::too_many_lines)]
pub fn expansion_cases() -> Vec<ExpansionCase> {
    vec![
        ExpansionCase {
            name: "daily_count",
            start: "2024-03-04T08:00:00Z",
            minutes: 60,
            all_day: false,
            rule: "FREQ=DAILY;COUNT=3",
            ex_dates: None,
            zone: chrono_tz::UTC,
            from: None,
            to: None,
            expected: &[
                "2024-03-04T08:00:00+00:00",
                "2024-03-05T08:00:00+00:00",
                "2024-03-06T08:00:00+00:00",
            ],
        },
        ExpansionCase {
            name: "weekly_two_days",
            start: "2024-03-04T08:00:00Z",
            minutes: 30,
            all_day: false,
            rule: "FREQ=WEEKLY;COUNT=4;BYDAY=MO,WE",
            ex_dates: None,
            zone: chrono_tz::UTC,
            from: None,
            to: None,
            expected: &[
                "2024-03-04T08:00:00+00:00",
                "2024-03-06T08:00:00+00:00",
                "2024-03-11T08:00:00+00:00",
                "2024-03-13T08:00:00+00:00",
            ],
        },
        ExpansionCase {
            name: "every_other_day",
            start: "2024-03-04T08:00:00Z",
            minutes: 60,
            all_day: false,
            rule: "FREQ=DAILY;INTERVAL=2;COUNT=3",
            ex_dates: None,
            zone: chrono_tz::UTC,
            from: None,
            to: None,
            expected: &[
                "2024-03-04T08:00:00+00:00",
                "2024-03-06T08:00:00+00:00",
                "2024-03-08T08:00:00+00:00",
            ],
        },
        ExpansionCase {
            name: "monthly_second_tuesday",
            start: "2024-01-09T10:00:00Z",
            minutes: 60,
            all_day: false,
            rule: "FREQ=MONTHLY;COUNT=3;BYDAY=2TU",
            ex_dates: None,
            zone: chrono_tz::UTC,
            from: None,
            to: None,
            expected: &[
                "2024-01-09T10:00:00+00:00",
                "2024-02-13T10:00:00+00:00",
                "2024-03-12T10:00:00+00:00",
            ],
        },
        ExpansionCase {
            name: "monthly_last_weekday",
            start: "2024-01-31T12:00:00Z",
            minutes: 15,
            all_day: false,
            rule: "FREQ=MONTHLY;COUNT=2;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-1",
            ex_dates: None,
            zone: chrono_tz::UTC,
            from: None,
            to: None,
            expected: &["2024-01-31T12:00:00+00:00", "2024-02-29T12:00:00+00:00"],
        },
        ExpansionCase {
            name: "yearly",
            start: "2024-06-01T09:00:00Z",
            minutes: 60,
            all_day: false,
            rule: "FREQ=YEARLY;COUNT=2",
            ex_dates: None,
            zone: chrono_tz::UTC,
            from: None,
            to: None,
            expected: &["2024-06-01T09:00:00+00:00", "2025-06-01T09:00:00+00:00"],
        },
        ExpansionCase {
            name: "excluded_instant",
            start: "2024-03-04T08:00:00Z",
            minutes: 60,
            all_day: false,
            rule: "FREQ=DAILY;COUNT=4",
            ex_dates: Some("20240305T080000Z"),
            zone: chrono_tz::UTC,
            from: None,
            to: None,
            expected: &[
                "2024-03-04T08:00:00+00:00",
                "2024-03-06T08:00:00+00:00",
                "2024-03-07T08:00:00+00:00",
            ],
        },
        ExpansionCase {
            name: "berlin_across_dst",
            start: "2024-03-25T08:00:00Z",
            minutes: 60,
            all_day: false,
            rule: "FREQ=WEEKLY;UNTIL=20240401T215959Z;BYDAY=MO",
            ex_dates: None,
            zone: chrono_tz::Europe::Berlin,
            from: None,
            to: None,
            expected: &["2024-03-25T08:00:00+00:00", "2024-04-01T07:00:00+00:00"],
        },
        ExpansionCase {
            name: "range_window",
            start: "2024-03-04T08:00:00Z",
            minutes: 60,
            all_day: false,
            rule: "FREQ=DAILY;COUNT=10",
            ex_dates: None,
            zone: chrono_tz::UTC,
            from: Some("2024-03-06T00:00:00Z"),
            to: Some("2024-03-08T00:00:00Z"),
            expected: &["2024-03-06T08:00:00+00:00", "2024-03-07T08:00:00+00:00"],
        },
        ExpansionCase {
            name: "all_day_until",
            start: "2024-01-01T00:00:00Z",
            minutes: 0,
            all_day: true,
            rule: "FREQ=DAILY;UNTIL=20240103",
            ex_dates: Some("20240102"),
            zone: chrono_tz::Asia::Tokyo,
            from: None,
            to: None,
            expected: &["2024-01-01T00:00:00+00:00", "2024-01-03T00:00:00+00:00"],
        },
    ]
}

pub fn assert_occurrences(case: &ExpansionCase, occurrences: &[CalEvent]) {
    let mut actual: Vec<i64> = occurrences
        .iter()
        .filter_map(|event| event.start_date)
        .map(|start| start.timestamp())
        .collect();
    actual.sort_unstable();

    let expected: Vec<i64> = case
        .expected
        .iter()
        .map(|value| parse_rfc3339(value).timestamp())
        .collect();
    assert_eq!(actual, expected, "Case {} did not match", case.name);
}

fn parse_rfc3339(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .unwrap_or_else(|err| panic!("Failed to parse rfc3339 value {value}: {err}"))
        .with_timezone(&Utc)
}
