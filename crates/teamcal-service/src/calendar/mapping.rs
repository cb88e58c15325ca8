//! One-directional mapping between `CalEvent` and the persisted row.

use teamcal_core::config::DEFAULT_PRODID;
use teamcal_db::model::event::CalEventRecord;

use crate::calendar::codec::{decode_event, encode_calendar};
use crate::calendar::event::CalEvent;
use crate::error::{ServiceError, ServiceResult};

/// ## Summary
/// Builds the row for an event: the denormalized columns plus a one-event
/// VCALENDAR payload.
///
/// ## Errors
/// Returns `ServiceError::InvariantViolation` when calendar, uid, start or
/// end are missing.
pub fn to_record(event: &CalEvent) -> ServiceResult<CalEventRecord> {
    let calendar_id = event
        .calendar_id
        .ok_or(ServiceError::InvariantViolation("event has no calendar"))?;
    let uid = event
        .uid
        .clone()
        .filter(|uid| !uid.trim().is_empty())
        .ok_or(ServiceError::InvariantViolation("event has no uid"))?;
    let start_date = event
        .start_date
        .ok_or(ServiceError::InvariantViolation("event has no start date"))?;
    let end_date = event
        .end_date
        .ok_or(ServiceError::InvariantViolation("event has no end date"))?;

    Ok(CalEventRecord {
        id: event.id,
        calendar_id,
        uid,
        start_date,
        end_date,
        all_day: event.all_day,
        ownership: event.ownership,
        deleted: event.deleted,
        version: event.version,
        last_update: event.last_update,
        recurrence_rule: event
            .recurrence_rule
            .clone()
            .filter(|rule| !rule.trim().is_empty()),
        recurrence_until: event.recurrence_until,
        ics_data: encode_calendar(std::slice::from_ref(event), None, DEFAULT_PRODID),
    })
}

/// ## Summary
/// Decodes a row's payload and overlays the row's own columns.
///
/// ## Errors
/// Returns `ServiceError::ParseError` if the payload holds no event.
pub fn from_record(record: &CalEventRecord) -> ServiceResult<CalEvent> {
    let mut event = decode_event(&record.ics_data).ok_or_else(|| {
        ServiceError::ParseError(format!("record {:?} holds no event", record.id))
    })?;

    event.id = record.id;
    event.calendar_id = Some(record.calendar_id);
    event.ownership = record.ownership;
    event.deleted = record.deleted;
    event.version = record.version;
    event.last_update = record.last_update;
    Ok(event)
}
