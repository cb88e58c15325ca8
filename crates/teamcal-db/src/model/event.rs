use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted calendar event row.
///
/// The event itself lives in `ics_data`; the other columns are denormalized
/// copies used for lookup, range queries and optimistic versioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalEventRecord {
    /// `None` until the record is first saved.
    pub id: Option<i64>,
    pub calendar_id: i64,
    pub uid: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub all_day: bool,
    /// `Some(false)` marks an externally organized event.
    pub ownership: Option<bool>,
    pub deleted: bool,
    /// Row version, bumped by every update.
    pub version: i64,
    pub last_update: Option<DateTime<Utc>>,
    /// RRULE value of a recurring master, without the `RRULE:` prefix.
    pub recurrence_rule: Option<String>,
    pub recurrence_until: Option<DateTime<Utc>>,
    /// Serialized VCALENDAR holding exactly one VEVENT.
    pub ics_data: String,
}

impl CalEventRecord {
    #[must_use]
    pub const fn is_new(&self) -> bool {
        self.id.is_none()
    }

    #[must_use]
    pub fn has_recurrence(&self) -> bool {
        self.recurrence_rule
            .as_deref()
            .is_some_and(|rule| !rule.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> CalEventRecord {
        CalEventRecord {
            id: None,
            calendar_id: 1,
            uid: "a@localhost".to_string(),
            start_date: Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap(),
            all_day: false,
            ownership: None,
            deleted: false,
            version: 0,
            last_update: None,
            recurrence_rule: Some("  ".to_string()),
            recurrence_until: None,
            ics_data: String::new(),
        }
    }

    #[test]
    fn blank_rule_is_not_recurring() {
        let mut rec = record();
        assert!(rec.is_new());
        assert!(!rec.has_recurrence());
        rec.recurrence_rule = Some("FREQ=DAILY".to_string());
        assert!(rec.has_recurrence());
    }

    #[test]
    fn serializes_as_json() {
        let rec = record();
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["uid"], "a@localhost");
        assert_eq!(json["id"], serde_json::Value::Null);
        let back: CalEventRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, rec);
    }
}
