#![allow(clippy::expect_used, dead_code)]
//! Test helpers for integration tests.
//!
//! Every test builds its own in-memory store, so tests run in parallel
//! without shared state.

use teamcal_test::db::db::memory::MemoryEventStore;
use teamcal_test::fixtures::{CALENDAR_ID, TEAM_FEED, uid_generator};
use teamcal_test::service::calendar::event::CalEvent;
use teamcal_test::service::calendar::service::import::{IcsImport, ImportSummary};
use teamcal_test::service::calendar::service::query::get_by_uid;

pub const STANDUP: &str = "standup@example.com";
pub const OFFSITE: &str = "offsite@example.com";

/// ## Summary
/// Runs a full import of `ics` into `store`.
pub async fn import(store: &MemoryEventStore, ics: &str, ignore_warnings: bool) -> ImportSummary {
    let mut import = IcsImport::new(Some(CALENDAR_ID));
    import.read(ics, None).expect("feed should parse");
    import.validate(store).await;
    import.persist(store, &uid_generator(), ignore_warnings).await
}

/// A store holding [`TEAM_FEED`].
pub async fn team_store() -> MemoryEventStore {
    let store = MemoryEventStore::new();
    let summary = import(&store, TEAM_FEED, false).await;
    assert_eq!(summary.saved, 3, "team feed import: {summary:?}");
    store
}

pub async fn stored(store: &MemoryEventStore, uid: &str) -> CalEvent {
    get_by_uid(store, Some(CALENDAR_ID), uid, true)
        .await
        .unwrap_or_else(|| panic!("event {uid} should be stored"))
}

/// `(start, subject)` of each event, in list order.
pub fn timeline(events: &[CalEvent]) -> Vec<(chrono::DateTime<chrono::Utc>, String)> {
    events
        .iter()
        .filter_map(|event| Some((event.start_date?, event.subject.clone().unwrap_or_default())))
        .collect()
}
