//! Event lookup and listing.

use std::collections::HashSet;

use teamcal_core::context::UserContext;
use teamcal_db::db::EventStore;
use teamcal_db::db::query::EventFilter;
use teamcal_db::model::event::CalEventRecord;

use crate::calendar::event::CalEvent;
use crate::calendar::expand::expand_occurrences;
use crate::calendar::mapping::from_record;
use crate::error::ServiceResult;

/// ## Summary
/// Loads one event by row id.
///
/// ## Errors
/// Returns an error if the store fails or the payload cannot be decoded.
pub async fn load_event<S: EventStore>(store: &S, id: i64) -> ServiceResult<Option<CalEvent>> {
    store
        .load_by_id(id)
        .await?
        .as_ref()
        .map(from_record)
        .transpose()
}

/// ## Summary
/// Finds the single event with `uid`, optionally restricted to a calendar.
///
/// Missing or ambiguous results and store errors read as `None`.
#[tracing::instrument(skip(store))]
pub async fn get_by_uid<S: EventStore>(
    store: &S,
    calendar_id: Option<i64>,
    uid: &str,
    exclude_deleted: bool,
) -> Option<CalEvent> {
    let records = match store.find_by_uid(calendar_id, uid, exclude_deleted).await {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(error = %e, "Event lookup by uid failed");
            return None;
        }
    };

    match records.as_slice() {
        [] => None,
        [record] => from_record(record)
            .inspect_err(|e| tracing::warn!(error = %e, "Stored event is undecodable"))
            .ok(),
        more => {
            tracing::warn!(count = more.len(), "Event uid is not unique");
            None
        }
    }
}

fn decode_all(records: &[CalEventRecord]) -> Vec<CalEvent> {
    records
        .iter()
        .filter_map(|record| {
            from_record(record)
                .inspect_err(|e| {
                    tracing::warn!(id = ?record.id, error = %e, "Skipping undecodable event");
                })
                .ok()
        })
        .collect()
}

/// ## Summary
/// Lists the events of a filter, latest start first.
///
/// Plain events come from the range query. Recurring masters are looked up
/// separately; with `expand` they are replaced by their occurrences inside
/// the requested range, in the acting user's timezone.
///
/// ## Errors
/// Returns an error if the store fails.
#[tracing::instrument(skip(store, ctx, filter), fields(calendars = ?filter.calendar_ids))]
pub async fn event_list<S: EventStore>(
    store: &S,
    ctx: &UserContext,
    filter: &EventFilter,
    expand: bool,
) -> ServiceResult<Vec<CalEvent>> {
    let plain = store.list(filter).await?;
    let mut events = decode_all(
        &plain
            .into_iter()
            .filter(|record| !record.has_recurrence())
            .collect::<Vec<_>>(),
    );

    let masters = decode_all(&store.list(&filter.clone().recurring_only()).await?);
    for master in masters {
        if expand {
            events.extend(expand_occurrences(
                &master,
                ctx.timezone(),
                filter.start,
                filter.end,
            ));
        } else {
            events.push(master);
        }
    }

    let mut seen = HashSet::new();
    events.retain(|event| seen.insert((event.id, event.recurrence_reference_id.clone())));
    events.sort_by_key(|event| std::cmp::Reverse(event.start_date));

    tracing::debug!(count = events.len(), "Listed events");
    Ok(events)
}
