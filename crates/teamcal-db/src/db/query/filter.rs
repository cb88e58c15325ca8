//! Event range filter.
//!
//! All-day events are stored at UTC midnight, so a requested range is
//! widened by one day on both sides before matching. Callers remove the
//! extra hits that fall outside the range they asked for.

use chrono::{DateTime, TimeDelta, Utc};

use crate::model::event::CalEventRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Empty matches every calendar.
    pub calendar_ids: Vec<i64>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Restrict to recurring masters.
    pub only_recurrence: bool,
    pub include_deleted: bool,
}

impl EventFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn for_calendar(calendar_id: i64) -> Self {
        Self {
            calendar_ids: vec![calendar_id],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_calendars(mut self, calendar_ids: Vec<i64>) -> Self {
        self.calendar_ids = calendar_ids;
        self
    }

    #[must_use]
    pub const fn with_range(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    #[must_use]
    pub const fn with_end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    #[must_use]
    pub const fn recurring_only(mut self) -> Self {
        self.only_recurrence = true;
        self
    }

    #[must_use]
    pub const fn with_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    /// The range actually queried, one day wider on each side.
    #[must_use]
    pub fn widened_range(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        (
            self.start.map(|s| s - TimeDelta::days(1)),
            self.end.map(|e| e + TimeDelta::days(1)),
        )
    }

    /// ## Summary
    /// Tests one record against the filter.
    ///
    /// Plain events match when their start or end lies in the widened range,
    /// or when they span it entirely. Recurring masters (with
    /// `only_recurrence`) match when they start before the range ends and
    /// their until bound, if any, is not before the range starts. With only
    /// an end bound, anything starting before it matches.
    #[must_use]
    pub fn matches(&self, record: &CalEventRecord) -> bool {
        if record.deleted && !self.include_deleted {
            return false;
        }
        if !self.calendar_ids.is_empty() && !self.calendar_ids.contains(&record.calendar_id) {
            return false;
        }

        let (from, to) = self.widened_range();

        if self.only_recurrence {
            if !record.has_recurrence() {
                return false;
            }
            let started = to.is_none_or(|to| record.start_date <= to);
            let open = match (from, record.recurrence_until) {
                (Some(from), Some(until)) => until >= from,
                _ => true,
            };
            return started && open;
        }

        match (from, to) {
            (Some(from), Some(to)) => {
                let within = |t: DateTime<Utc>| from <= t && t <= to;
                within(record.start_date)
                    || within(record.end_date)
                    || (record.start_date <= from && record.end_date >= to)
            }
            (None, Some(to)) => record.start_date <= to,
            _ => true,
        }
    }
}

/// Orders records by start date, latest first.
pub fn sort_by_start_desc(records: &mut [CalEventRecord]) {
    records.sort_by_key(|record| std::cmp::Reverse(record.start_date));
}
