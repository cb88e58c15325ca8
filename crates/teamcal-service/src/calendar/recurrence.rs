//! Selector form of a recurrence rule, as edited in the calendar UI.

use chrono::{DateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use teamcal_rfc::ical::core::{
    Date, DateTime as IcalDateTime, Frequency, RRule, RRuleUntil, Weekday, WeekdayNum,
};

use crate::calendar::event::CalEvent;
use crate::error::ServiceResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecurrenceFrequency {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrenceFrequency {
    const fn to_rfc(self) -> Option<Frequency> {
        match self {
            Self::None => None,
            Self::Daily => Some(Frequency::Daily),
            Self::Weekly => Some(Frequency::Weekly),
            Self::Monthly => Some(Frequency::Monthly),
            Self::Yearly => Some(Frequency::Yearly),
        }
    }

    const fn from_rfc(freq: Option<Frequency>) -> Self {
        match freq {
            Some(Frequency::Daily) => Self::Daily,
            Some(Frequency::Weekly) => Self::Weekly,
            Some(Frequency::Monthly) => Self::Monthly,
            Some(Frequency::Yearly) => Self::Yearly,
            _ => Self::None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecurrenceMonthMode {
    #[default]
    None,
    /// Listed days of the month.
    Each,
    /// Nth weekday of the month.
    AtThe,
}

/// Ordinal half of an "at the Nth weekday" selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FrequencyModeOne {
    #[default]
    First,
    Second,
    Third,
    Fourth,
    Fifth,
    Last,
}

impl FrequencyModeOne {
    #[must_use]
    pub const fn offset(self) -> i8 {
        match self {
            Self::First => 1,
            Self::Second => 2,
            Self::Third => 3,
            Self::Fourth => 4,
            Self::Fifth => 5,
            Self::Last => -1,
        }
    }

    /// Unknown offsets, including 0, read as `First`.
    #[must_use]
    pub const fn from_offset(offset: i16) -> Self {
        match offset {
            2 => Self::Second,
            3 => Self::Third,
            4 => Self::Fourth,
            5 => Self::Fifth,
            -1 => Self::Last,
            _ => Self::First,
        }
    }
}

/// Weekday half of an "at the Nth weekday" selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FrequencyModeTwo {
    #[default]
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
    Day,
    Weekday,
    WeekendDay,
}

impl FrequencyModeTwo {
    #[must_use]
    pub fn days(self) -> Vec<Weekday> {
        match self {
            Self::Monday => vec![Weekday::Monday],
            Self::Tuesday => vec![Weekday::Tuesday],
            Self::Wednesday => vec![Weekday::Wednesday],
            Self::Thursday => vec![Weekday::Thursday],
            Self::Friday => vec![Weekday::Friday],
            Self::Saturday => vec![Weekday::Saturday],
            Self::Sunday => vec![Weekday::Sunday],
            Self::Day => Weekday::all().to_vec(),
            Self::Weekday => Weekday::all()[..5].to_vec(),
            Self::WeekendDay => vec![Weekday::Saturday, Weekday::Sunday],
        }
    }

    const fn from_weekday(day: Weekday) -> Self {
        match day {
            Weekday::Monday => Self::Monday,
            Weekday::Tuesday => Self::Tuesday,
            Weekday::Wednesday => Self::Wednesday,
            Weekday::Thursday => Self::Thursday,
            Weekday::Friday => Self::Friday,
            Weekday::Saturday => Self::Saturday,
            Weekday::Sunday => Self::Sunday,
        }
    }

    /// Reads a BYDAY list back; lists matching no group give their first day.
    #[must_use]
    pub fn from_days(days: &[WeekdayNum]) -> Self {
        let mut set = [false; 7];
        for day in days {
            set[day.weekday.index()] = true;
        }
        let count = set.iter().filter(|d| **d).count();
        match (count, days.first()) {
            (7, _) => Self::Day,
            (5, _) if set[..5].iter().all(|d| *d) => Self::Weekday,
            (2, _) if set[5] && set[6] => Self::WeekendDay,
            (_, Some(first)) => Self::from_weekday(first.weekday),
            (_, None) => Self::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceData {
    pub frequency: RecurrenceFrequency,
    pub interval: u32,
    /// Monday first.
    pub weekdays: [bool; 7],
    pub monthdays: [bool; 31],
    pub months: [bool; 12],
    pub month_mode: RecurrenceMonthMode,
    pub mode_one_month: FrequencyModeOne,
    pub mode_two_month: FrequencyModeTwo,
    pub mode_one_year: FrequencyModeOne,
    pub mode_two_year: FrequencyModeTwo,
    /// Yearly rule also restricted to the Nth weekday.
    pub year_mode: bool,
    /// UTC midnight of the last day for all-day events.
    pub until: Option<DateTime<Utc>>,
    pub customized: bool,
    pub timezone: Tz,
}

impl RecurrenceData {
    #[must_use]
    pub fn new(timezone: Tz) -> Self {
        Self {
            frequency: RecurrenceFrequency::None,
            interval: 1,
            weekdays: [false; 7],
            monthdays: [false; 31],
            months: [false; 12],
            month_mode: RecurrenceMonthMode::None,
            mode_one_month: FrequencyModeOne::default(),
            mode_two_month: FrequencyModeTwo::default(),
            mode_one_year: FrequencyModeOne::default(),
            mode_two_year: FrequencyModeTwo::default(),
            year_mode: false,
            until: None,
            customized: false,
            timezone,
        }
    }

    #[must_use]
    pub const fn with_frequency(mut self, frequency: RecurrenceFrequency) -> Self {
        self.frequency = frequency;
        self
    }

    /// Sets a custom interval; marks the data as customized.
    #[must_use]
    pub const fn with_interval(mut self, interval: u32) -> Self {
        self.interval = interval;
        self.customized = true;
        self
    }

    #[must_use]
    pub const fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    #[must_use]
    pub fn with_weekdays(mut self, days: &[Weekday]) -> Self {
        for day in days {
            self.weekdays[day.index()] = true;
        }
        self
    }
}

impl Default for RecurrenceData {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

fn at_the(offset: i8, selector: FrequencyModeTwo) -> Vec<WeekdayNum> {
    selector
        .days()
        .into_iter()
        .map(|day| WeekdayNum::nth(offset, day))
        .collect()
}

fn selected<const N: usize>(set: &[bool; N]) -> impl Iterator<Item = usize> + '_ {
    set.iter()
        .enumerate()
        .filter(|(_, on)| **on)
        .map(|(i, _)| i + 1)
}

/// Offset of a BYDAY list: a lone entry carries its own, a longer list
/// takes the first BYSETPOS.
fn day_list_offset(rule: &RRule) -> i16 {
    match (rule.by_day.as_slice(), rule.by_setpos.first()) {
        ([single], _) => i16::from(single.offset()),
        ([_, _, ..], Some(pos)) => *pos,
        _ => 0,
    }
}

/// Last second of the until day in `zone`, as a UTC instant.
#[must_use]
pub fn fix_until(until: DateTime<Utc>, zone: Tz) -> DateTime<Utc> {
    let naive = until
        .date_naive()
        .and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN));
    zone.from_local_datetime(&naive)
        .earliest()
        .map_or_else(|| naive.and_utc(), |local| local.with_timezone(&Utc))
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    reason = "indices come from fixed-size day and month selectors"
)]
fn build_rule(data: &RecurrenceData, freq: Frequency) -> RRule {
    let interval = if data.customized { data.interval } else { 1 };
    let mut rule = RRule::with_frequency(freq).with_interval(interval);

    match data.frequency {
        RecurrenceFrequency::Weekly => {
            rule.by_day = selected(&data.weekdays)
                .filter_map(|i| Weekday::from_index(i - 1))
                .map(WeekdayNum::every)
                .collect();
        }
        RecurrenceFrequency::Monthly => match data.month_mode {
            RecurrenceMonthMode::Each => {
                rule.by_monthday = selected(&data.monthdays).map(|d| d as i8).collect();
            }
            RecurrenceMonthMode::AtThe => {
                rule.by_day = at_the(data.mode_one_month.offset(), data.mode_two_month);
            }
            RecurrenceMonthMode::None => {}
        },
        RecurrenceFrequency::Yearly => {
            rule.by_month = selected(&data.months).map(|m| m as u8).collect();
            if data.year_mode {
                rule.by_day = at_the(data.mode_one_year.offset(), data.mode_two_year);
            }
        }
        RecurrenceFrequency::Daily | RecurrenceFrequency::None => {}
    }
    rule
}

impl CalEvent {
    /// ## Summary
    /// Replaces the recurrence rule with one built from selector data.
    ///
    /// Frequency `None` clears the rule and the until bound. For timed
    /// events the until bound moves to 23:59:59 of its day in the data's
    /// timezone; all-day events keep the bare date.
    ///
    /// ## Errors
    /// Returns an error if the resulting rule is invalid (e.g. interval 0).
    #[tracing::instrument(skip(self, data), fields(uid = ?self.uid, frequency = ?data.frequency))]
    pub fn set_recurrence(&mut self, data: &RecurrenceData) -> ServiceResult<&mut Self> {
        let Some(freq) = data.frequency.to_rfc() else {
            self.recurrence_rule = None;
            self.recurrence_until = None;
            return Ok(self);
        };

        let mut rule = build_rule(data, freq);
        self.recurrence_until = match data.until {
            Some(until) if self.all_day => {
                rule.until = Some(RRuleUntil::Date(Date::from_naive(until.date_naive())));
                Some(until)
            }
            Some(until) => {
                let fixed = fix_until(until, data.timezone);
                rule.until = Some(RRuleUntil::DateTime(IcalDateTime::from_utc(fixed)));
                Some(fixed)
            }
            None => None,
        };

        rule.validate()?;
        self.recurrence_rule = Some(rule.to_string());
        Ok(self)
    }

    /// ## Summary
    /// Reads the recurrence rule back into selector form.
    ///
    /// The until bound of a timed event becomes the local date of its last
    /// possible occurrence in `timezone`, at UTC midnight.
    #[must_use]
    pub fn get_recurrence_data(&self, timezone: Tz) -> RecurrenceData {
        let mut data = RecurrenceData::new(timezone);
        let Some(rule) = self.recurrence_object() else {
            return data;
        };

        data.interval = rule.effective_interval();
        data.until = self.recurrence_until.map(|until| {
            if self.all_day {
                until
            } else {
                last_occurrence_day(until, self.start_date, timezone)
            }
        });
        data.frequency = RecurrenceFrequency::from_rfc(rule.freq);

        match data.frequency {
            RecurrenceFrequency::Weekly => {
                for day in &rule.by_day {
                    data.customized = true;
                    data.weekdays[day.weekday.index()] = true;
                }
            }
            RecurrenceFrequency::Monthly => {
                data.month_mode = RecurrenceMonthMode::None;
                for day in &rule.by_monthday {
                    let Some(slot) = usize::try_from(*day)
                        .ok()
                        .and_then(|d| d.checked_sub(1))
                        .filter(|i| *i < 31)
                    else {
                        continue;
                    };
                    data.customized = true;
                    data.month_mode = RecurrenceMonthMode::Each;
                    data.monthdays[slot] = true;
                }
                if !rule.by_day.is_empty() {
                    data.customized = true;
                    data.month_mode = RecurrenceMonthMode::AtThe;
                    data.mode_one_month = FrequencyModeOne::from_offset(day_list_offset(&rule));
                    data.mode_two_month = FrequencyModeTwo::from_days(&rule.by_day);
                }
            }
            RecurrenceFrequency::Yearly => {
                for month in &rule.by_month {
                    if let Some(slot) = usize::from(*month).checked_sub(1).filter(|i| *i < 12) {
                        data.customized = true;
                        data.months[slot] = true;
                    }
                }
                if !rule.by_day.is_empty() {
                    data.customized = true;
                    data.year_mode = true;
                    data.mode_one_year = FrequencyModeOne::from_offset(day_list_offset(&rule));
                    data.mode_two_year = FrequencyModeTwo::from_days(&rule.by_day);
                }
            }
            RecurrenceFrequency::Daily | RecurrenceFrequency::None => {}
        }
        data
    }
}

fn last_occurrence_day(
    until: DateTime<Utc>,
    start: Option<DateTime<Utc>>,
    zone: Tz,
) -> DateTime<Utc> {
    let local_until = until.with_timezone(&zone);
    let time = start.map_or(NaiveTime::MIN, |s| s.with_timezone(&zone).time());

    let mut last = zone
        .from_local_datetime(&local_until.date_naive().and_time(time))
        .earliest()
        .map_or(until, |local| local.with_timezone(&Utc));
    if last > until {
        last -= TimeDelta::days(1);
    }

    last.with_timezone(&zone)
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_utc()
}
