//! Import of iCalendar feeds into a calendar.
//!
//! A feed is read into handles, validated against the store, then
//! persisted. Single events and recurring series are handled separately;
//! overrides of a series (events carrying a RECURRENCE-ID) are stored as
//! events of their own and excluded from the master.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;
use teamcal_core::uid::EventUidGenerator;
use teamcal_db::db::EventStore;
use teamcal_rfc::ical::parse;
use thiserror::Error;

use crate::calendar::codec::decode_calendar_events;
use crate::calendar::event::{CalEvent, whole_seconds};
use crate::calendar::mapping::to_record;
use crate::calendar::service::query::{get_by_uid, load_event};
use crate::calendar::service::series::{insert, prepare};
use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HandleMethod {
    AddUpdate,
    Cancel,
}

impl HandleMethod {
    /// ## Summary
    /// Resolves the method of a feed.
    ///
    /// A known iTIP method in the feed wins over the expected one; methods
    /// that carry no change (REFRESH, COUNTER, DECLINE-COUNTER, REPLY) or are
    /// unknown fall back to `expected`.
    #[must_use]
    pub fn resolve(feed: Option<&str>, expected: Option<Self>) -> Option<Self> {
        let from_feed = feed.and_then(|method| match method.trim().to_ascii_uppercase().as_str() {
            "CANCEL" => Some(Self::Cancel),
            "REQUEST" | "ADD" | "PUBLISH" => Some(Self::AddUpdate),
            "REFRESH" | "COUNTER" | "DECLINE-COUNTER" | "REPLY" => None,
            other => {
                tracing::warn!(method = %other, "Unknown method in iCalendar feed");
                None
            }
        });

        if feed.is_none() && expected.is_none() {
            tracing::warn!("No method expected and the feed declares none");
        }
        if let (Some(expected), Some(found)) = (expected, from_feed)
            && expected != found
        {
            tracing::warn!(?expected, ?found, "Expected method overridden by the feed");
        }
        from_feed.or(expected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HandleError {
    #[error("no calendar specified")]
    CalendarNotSpecified,
    #[error("no method selected")]
    NoMethodSelected,
    #[error("main event of the recurring series is missing")]
    MainRecurringEventMissing,
    #[error("stored event is newer than the imported one")]
    Outdated,
    #[error("event to delete not found")]
    EventToDeleteNotFound,
}

#[derive(Debug, Clone)]
pub struct EventHandle {
    pub event: Option<CalEvent>,
    pub calendar_id: Option<i64>,
    pub method: Option<HandleMethod>,
    /// Stored counterpart found during validation.
    pub event_in_db: Option<CalEvent>,
    pub errors: Vec<HandleError>,
    pub warnings: Vec<HandleError>,
}

impl EventHandle {
    #[must_use]
    pub const fn new(
        event: Option<CalEvent>,
        calendar_id: Option<i64>,
        method: Option<HandleMethod>,
    ) -> Self {
        Self {
            event,
            calendar_id,
            method,
            event_in_db: None,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_valid(&self, ignore_warnings: bool) -> bool {
        self.errors.is_empty() && (ignore_warnings || self.warnings.is_empty())
    }
}

/// A series: its master (if the feed had one) and its overrides.
#[derive(Debug, Clone)]
pub struct RecurringEventHandle {
    pub handle: EventHandle,
    pub related: Vec<EventHandle>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub saved: usize,
    pub updated: usize,
    pub deleted: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default)]
pub struct IcsImport {
    calendar_id: Option<i64>,
    singles: Vec<EventHandle>,
    recurring: BTreeMap<String, RecurringEventHandle>,
}

impl IcsImport {
    #[must_use]
    pub fn new(calendar_id: Option<i64>) -> Self {
        Self {
            calendar_id,
            ..Self::default()
        }
    }

    /// ## Summary
    /// Reads a feed into handles.
    ///
    /// Events without rule and RECURRENCE-ID are single events; the others
    /// are grouped by UID into series.
    ///
    /// ## Errors
    /// Returns an error if the feed is not a well-formed VCALENDAR.
    #[tracing::instrument(skip(self, ics), fields(calendar_id = ?self.calendar_id))]
    pub fn read(&mut self, ics: &str, expected: Option<HandleMethod>) -> ServiceResult<()> {
        let calendar = parse(ics)?;
        let events = decode_calendar_events(&calendar);
        if events.is_empty() {
            tracing::debug!("Feed holds no events");
            return Ok(());
        }

        let method = HandleMethod::resolve(calendar.method(), expected);
        for event in events {
            let is_override = event.recurrence_reference_id.is_some();
            if !event.has_recurrence() && !is_override {
                self.singles
                    .push(EventHandle::new(Some(event), self.calendar_id, method));
                continue;
            }

            let uid = event.uid.clone().unwrap_or_default();
            let series = self
                .recurring
                .entry(uid)
                .or_insert_with(|| RecurringEventHandle {
                    handle: EventHandle::new(None, self.calendar_id, method),
                    related: Vec::new(),
                });
            if is_override {
                series
                    .related
                    .push(EventHandle::new(Some(event), self.calendar_id, method));
            } else {
                series.handle.event = Some(event);
            }
        }

        tracing::debug!(
            singles = self.singles.len(),
            series = self.recurring.len(),
            "Feed read"
        );
        Ok(())
    }

    /// ## Summary
    /// Checks every handle against the store.
    ///
    /// Overrides lose their UID first; they are stored as new events.
    /// Returns whether no handle has errors.
    #[tracing::instrument(skip(self, store), fields(calendar_id = ?self.calendar_id))]
    pub async fn validate<S: EventStore>(&mut self, store: &S) -> bool {
        let mut ok = true;
        for handle in &mut self.singles {
            validate_handle(store, handle).await;
            ok &= handle.errors.is_empty();
        }
        for series in self.recurring.values_mut() {
            validate_handle(store, &mut series.handle).await;
            ok &= series.handle.errors.is_empty();
            for related in &mut series.related {
                if let Some(event) = related.event.as_mut() {
                    event.uid = None;
                }
                validate_handle(store, related).await;
            }
        }
        ok
    }

    /// ## Summary
    /// Stores every valid handle.
    ///
    /// Failures are logged and counted; the remaining handles are still
    /// processed. An override's occurrence is excluded from its master only
    /// once the override itself is stored.
    #[tracing::instrument(skip(self, store, uids), fields(calendar_id = ?self.calendar_id))]
    pub async fn persist<S: EventStore>(
        &mut self,
        store: &S,
        uids: &EventUidGenerator,
        ignore_warnings: bool,
    ) -> ImportSummary {
        let mut summary = ImportSummary::default();
        for handle in &self.singles {
            persist_handle(store, uids, handle, ignore_warnings, &mut summary).await;
        }

        for series in self.recurring.values_mut() {
            for related in &series.related {
                if !persist_handle(store, uids, related, ignore_warnings, &mut summary).await {
                    continue;
                }
                let token = related
                    .event
                    .as_ref()
                    .and_then(|e| e.recurrence_reference_id.as_deref());
                if let (Some(master), Some(token)) = (series.handle.event.as_mut(), token) {
                    master.add_recurrence_ex_date_token(token);
                }
            }
            if series.handle.event.is_some() {
                persist_handle(store, uids, &series.handle, ignore_warnings, &mut summary).await;
            }
        }

        tracing::info!(?summary, "Import persisted");
        summary
    }

    #[must_use]
    pub fn is_valid(&self, ignore_warnings: bool) -> bool {
        self.handles().all(|handle| handle.is_valid(ignore_warnings))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.event_count() == 0
    }

    #[must_use]
    pub fn event_count(&self) -> usize {
        self.handles().filter(|handle| handle.event.is_some()).count()
    }

    /// First imported event, single events before series.
    #[must_use]
    pub fn first_event(&self) -> Option<&CalEvent> {
        self.singles
            .iter()
            .chain(self.recurring.values().map(|series| &series.handle))
            .find_map(|handle| handle.event.as_ref())
    }

    /// Every handle: single events, then masters with their overrides.
    pub fn handles(&self) -> impl Iterator<Item = &EventHandle> {
        self.singles.iter().chain(
            self.recurring
                .values()
                .flat_map(|series| std::iter::once(&series.handle).chain(series.related.iter())),
        )
    }
}

async fn validate_handle<S: EventStore>(store: &S, handle: &mut EventHandle) {
    handle.errors.clear();
    handle.warnings.clear();
    handle.event_in_db = None;

    let Some(calendar_id) = handle.calendar_id else {
        handle.errors.push(HandleError::CalendarNotSpecified);
        return;
    };
    let Some(method) = handle.method else {
        handle.errors.push(HandleError::NoMethodSelected);
        return;
    };
    let Some(event) = handle.event.as_ref() else {
        handle.warnings.push(HandleError::MainRecurringEventMissing);
        return;
    };
    let Some(uid) = event.uid.clone().filter(|uid| !uid.trim().is_empty()) else {
        return;
    };
    let imported_stamp = event.dt_stamp;

    match method {
        HandleMethod::AddUpdate => {
            let in_db = get_by_uid(store, Some(calendar_id), &uid, false).await;
            if let Some(stored) = in_db.as_ref().and_then(|e| e.dt_stamp)
                && let Some(imported) = imported_stamp
                && stored > imported
            {
                handle.warnings.push(HandleError::Outdated);
            }
            handle.event_in_db = in_db;
        }
        HandleMethod::Cancel => {
            let in_db = get_by_uid(store, Some(calendar_id), &uid, true).await;
            if in_db.is_none() {
                handle.warnings.push(HandleError::EventToDeleteNotFound);
            }
            handle.event_in_db = in_db;
        }
    }
}

/// Returns whether the handle's event was written.
async fn persist_handle<S: EventStore>(
    store: &S,
    uids: &EventUidGenerator,
    handle: &EventHandle,
    ignore_warnings: bool,
    summary: &mut ImportSummary,
) -> bool {
    if !handle.is_valid(ignore_warnings) {
        summary.skipped += 1;
        return false;
    }

    let result = match handle.method {
        Some(HandleMethod::AddUpdate) => save_or_update(store, uids, handle, summary).await,
        Some(HandleMethod::Cancel) => cancel(store, handle, summary).await,
        None => Ok(false),
    };
    result.unwrap_or_else(|e| {
        summary.failed += 1;
        tracing::error!(
            uid = ?handle.event.as_ref().and_then(|e| e.uid.as_deref()),
            error = %e,
            "Failed to persist imported event"
        );
        false
    })
}

async fn save_or_update<S: EventStore>(
    store: &S,
    uids: &EventUidGenerator,
    handle: &EventHandle,
    summary: &mut ImportSummary,
) -> ServiceResult<bool> {
    let Some(mut event) = handle.event.clone() else {
        return Ok(false);
    };
    event.calendar_id = handle.calendar_id;
    prepare(&mut event)?;

    let Some(in_db) = &handle.event_in_db else {
        insert(store, uids, event).await?;
        summary.saved += 1;
        return Ok(true);
    };

    let id = in_db
        .id
        .ok_or(ServiceError::InvariantViolation("stored event has no id"))?;
    event.id = Some(id);
    event.ownership = in_db.ownership;
    event.version = in_db.version;
    if in_db.deleted {
        store.undelete(id).await?;
        event.version = load_event(store, id)
            .await?
            .map_or(in_db.version, |restored| restored.version);
        tracing::debug!(id, "Restored deleted event");
    }
    event.deleted = false;
    event.merge_attendees(&in_db.attendees);
    event.apply_change(in_db, whole_seconds(Utc::now()));

    store.update(to_record(&event)?).await?;
    summary.updated += 1;
    Ok(true)
}

async fn cancel<S: EventStore>(
    store: &S,
    handle: &EventHandle,
    summary: &mut ImportSummary,
) -> ServiceResult<bool> {
    let Some(id) = handle.event_in_db.as_ref().and_then(|e| e.id) else {
        return Ok(false);
    };
    store.mark_deleted(id).await?;
    summary.deleted += 1;
    Ok(true)
}
