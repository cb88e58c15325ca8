//! Save, update and delete of events, including partial edits of a series.
//!
//! FUTURE and SINGLE edits never rewrite the selected occurrence in place:
//! the master is truncated or gains an exclusion date, and the edited
//! occurrence is stored as a new event of its own.

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use chrono_tz::Tz;
use teamcal_core::context::UserContext;
use teamcal_core::types::SeriesModificationMode;
use teamcal_core::uid::EventUidGenerator;
use teamcal_db::db::EventStore;
use teamcal_rfc::ical::core::{Date, DateTime as IcalDateTime, RRuleUntil};

use crate::calendar::event::{CalEvent, whole_seconds};
use crate::calendar::mapping::{from_record, to_record};
use crate::calendar::recurrence::fix_until;
use crate::calendar::service::query::load_event;
use crate::error::{ServiceError, ServiceResult};

/// One edit or delete request: the event, the part of its series it
/// applies to, and the occurrence the user picked.
#[derive(Debug, Clone)]
pub struct SeriesEdit {
    pub event: CalEvent,
    pub mode: SeriesModificationMode,
    pub selected_occurrence: Option<DateTime<Utc>>,
}

impl SeriesEdit {
    #[must_use]
    pub const fn all(event: CalEvent) -> Self {
        Self {
            event,
            mode: SeriesModificationMode::All,
            selected_occurrence: None,
        }
    }

    #[must_use]
    pub const fn future(event: CalEvent, selected: DateTime<Utc>) -> Self {
        Self {
            event,
            mode: SeriesModificationMode::Future,
            selected_occurrence: Some(selected),
        }
    }

    #[must_use]
    pub const fn single(event: CalEvent, selected: DateTime<Utc>) -> Self {
        Self {
            event,
            mode: SeriesModificationMode::Single,
            selected_occurrence: Some(selected),
        }
    }

    /// Mode actually applied: partial modes need a selected occurrence.
    fn effective_mode(&self) -> (SeriesModificationMode, Option<DateTime<Utc>>) {
        match (self.mode, self.selected_occurrence) {
            (SeriesModificationMode::All, _) | (_, None) => (SeriesModificationMode::All, None),
            (mode, Some(selected)) => (mode, Some(selected)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesOutcome {
    /// The stored edited event; a new row for FUTURE and SINGLE edits.
    pub event: CalEvent,
    /// The rewritten master of a FUTURE or SINGLE edit.
    pub master: Option<CalEvent>,
}

/// Last day a truncated series may still occur on: the day before the
/// selected occurrence.
#[must_use]
pub fn get_until_date(selected: DateTime<Utc>) -> DateTime<Utc> {
    selected - TimeDelta::hours(24)
}

/// Rewrites the master's rule to end the day before `selected`, at the end
/// of that day in `zone`.
fn truncate_series(master: &mut CalEvent, selected: DateTime<Utc>, zone: Tz) -> ServiceResult<()> {
    let rule = master
        .recurrence_object()
        .ok_or(ServiceError::InvariantViolation("master has no recurrence rule"))?;

    let until = get_until_date(selected);
    let bound = if master.all_day {
        RRuleUntil::Date(Date::from_naive(until.date_naive()))
    } else {
        let local_day = until
            .with_timezone(&zone)
            .date_naive()
            .and_time(NaiveTime::MIN)
            .and_utc();
        RRuleUntil::DateTime(IcalDateTime::from_utc(fix_until(local_day, zone)))
    };
    master.set_recurrence_rule(Some(rule.with_until(bound)))?;
    Ok(())
}

/// Whether a truncated master has no occurrence left.
fn series_exhausted(master: &CalEvent) -> bool {
    match (master.recurrence_until, master.start_date) {
        (Some(until), Some(start)) => until < start,
        _ => false,
    }
}

pub(crate) fn prepare(event: &mut CalEvent) -> ServiceResult<()> {
    event.truncate_to_seconds();
    event.normalize_all_day();
    event.validate()
}

pub(crate) async fn insert<S: EventStore>(
    store: &S,
    uids: &EventUidGenerator,
    mut event: CalEvent,
) -> ServiceResult<CalEvent> {
    if event.uid.as_deref().is_none_or(|uid| uid.trim().is_empty()) {
        event.uid = Some(uids.generate());
    }
    event.id = None;
    event.version = 0;
    event.sequence.get_or_insert(0);
    event.dt_stamp.get_or_insert_with(|| whole_seconds(Utc::now()));
    event.number_attendees();

    let saved = store.save(to_record(&event)?).await?;
    tracing::debug!(id = ?saved.id, uid = %saved.uid, "Event saved");
    from_record(&saved)
}

async fn store_update<S: EventStore>(store: &S, event: &CalEvent) -> ServiceResult<CalEvent> {
    let updated = store.update(to_record(event)?).await?;
    from_record(&updated)
}

async fn load_stored<S: EventStore>(store: &S, event: &CalEvent) -> ServiceResult<CalEvent> {
    let id = event
        .id
        .ok_or(ServiceError::InvariantViolation("event has no id"))?;
    load_event(store, id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("event {id}")))
}

/// ## Summary
/// Stores a brand-new event.
///
/// All-day dates are snapped to UTC midnight before validation. A blank uid
/// is replaced by a generated one; sequence starts at 0.
///
/// ## Errors
/// Returns `ServiceError::Validation` for bad durations and store errors.
#[tracing::instrument(skip(store, uids, event), fields(uid = ?event.uid))]
pub async fn save_event<S: EventStore>(
    store: &S,
    uids: &EventUidGenerator,
    mut event: CalEvent,
) -> ServiceResult<CalEvent> {
    prepare(&mut event)?;
    insert(store, uids, event).await
}

/// ## Summary
/// Applies an edit to a stored event.
///
/// - `All`: the event is updated in place; the sequence advances when a
///   meaningful field changed and attendee numbers are reconciled.
/// - `Future`: the master's rule ends the day before the selected
///   occurrence; the edited event becomes a new series of its own.
/// - `Single`: the selected occurrence is excluded from the master; the
///   edited event becomes a new event without a rule.
///
/// A partial mode without a selected occurrence, or on an event without a
/// rule, is applied as `All`.
///
/// ## Errors
/// Returns `NotFound` if the stored event is gone, `Conflict` if it changed
/// since it was read, and `Validation` for bad durations.
#[tracing::instrument(skip(store, ctx, uids, edit), fields(id = ?edit.event.id, mode = %edit.mode))]
pub async fn update_event<S: EventStore>(
    store: &S,
    ctx: &UserContext,
    uids: &EventUidGenerator,
    edit: SeriesEdit,
) -> ServiceResult<SeriesOutcome> {
    let (mode, selected) = edit.effective_mode();
    let mut event = edit.event;
    prepare(&mut event)?;

    let stored = load_stored(store, &event).await?;
    let now = whole_seconds(Utc::now());

    let selected = match selected {
        Some(selected) if stored.has_recurrence() => selected,
        _ => {
            event.merge_attendees(&stored.attendees);
            event.apply_change(&stored, now);
            let event = store_update(store, &event).await?;
            tracing::debug!(sequence = ?event.sequence, "Event updated");
            return Ok(SeriesOutcome {
                event,
                master: None,
            });
        }
    };

    let mut master = stored.clone();
    master.version = event.version;
    if mode == SeriesModificationMode::Future {
        truncate_series(&mut master, selected, ctx.timezone())?;
        if series_exhausted(&master) {
            master.deleted = true;
            tracing::debug!(id = ?master.id, "Series replaced from its first occurrence");
        }
    } else {
        master.add_recurrence_ex_date(selected);
        event.recurrence_rule = None;
        event.recurrence_until = None;
        event.recurrence_ex_date = None;
    }
    master.apply_change(&stored, now);
    let master = store_update(store, &master).await?;

    event.uid = None;
    event.sequence = None;
    event.dt_stamp = Some(now);
    event.recurrence_reference_id = None;
    let event = insert(store, uids, event).await?;

    tracing::debug!(master = ?master.id, new = ?event.id, "Series split");
    Ok(SeriesOutcome {
        event,
        master: Some(master),
    })
}

/// ## Summary
/// Deletes an event or part of a series.
///
/// `All` marks the row deleted. `Future` ends the master the day before the
/// selected occurrence, deleting it outright when nothing would remain.
/// `Single` excludes the selected occurrence. No tombstone is stored for a
/// removed occurrence. Returns the rewritten master, if any.
///
/// ## Errors
/// Returns `NotFound` if the stored event is gone and `Conflict` if it
/// changed since it was read.
#[tracing::instrument(skip(store, ctx, edit), fields(id = ?edit.event.id, mode = %edit.mode))]
pub async fn delete_event<S: EventStore>(
    store: &S,
    ctx: &UserContext,
    edit: SeriesEdit,
) -> ServiceResult<Option<CalEvent>> {
    let (mode, selected) = edit.effective_mode();
    let stored = load_stored(store, &edit.event).await?;
    let id = stored
        .id
        .ok_or(ServiceError::InvariantViolation("stored event has no id"))?;

    let selected = match selected {
        Some(selected) if stored.has_recurrence() => selected,
        _ => {
            store.mark_deleted(id).await?;
            tracing::debug!(id, "Event deleted");
            return Ok(None);
        }
    };

    let mut master = stored.clone();
    master.version = edit.event.version;
    if mode == SeriesModificationMode::Future {
        truncate_series(&mut master, selected, ctx.timezone())?;
        if series_exhausted(&master) {
            store.mark_deleted(id).await?;
            tracing::debug!(id, "Series deleted from its first occurrence");
            return Ok(None);
        }
    } else {
        master.add_recurrence_ex_date(selected);
    }
    master.apply_change(&stored, whole_seconds(Utc::now()));
    let master = store_update(store, &master).await?;
    Ok(Some(master))
}
