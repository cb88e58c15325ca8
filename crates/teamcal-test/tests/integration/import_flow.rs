use teamcal_test::app::commands::Workbench;
use teamcal_test::core::config::CalendarConfig;
use teamcal_test::db::db::memory::MemoryEventStore;
use teamcal_test::db::db::query::EventFilter;
use teamcal_test::fixtures::{CALENDAR_ID, CANCEL_OFFSITE, TEAM_FEED, berlin, march};
use teamcal_test::service::calendar::service::import::HandleMethod;
use teamcal_test::service::calendar::service::query::{event_list, get_by_uid};

use super::helpers::{OFFSITE, STANDUP, import, stored, team_store, timeline};

/// ## Summary
/// A moved occurrence replaces the master's occurrence in expanded lists.
#[test_log::test(tokio::test)]
async fn imported_series_expands_around_override() {
    let store = team_store().await;
    let filter = EventFilter::for_calendar(CALENDAR_ID).with_range(march(11, 0, 0), march(15, 0, 0));

    let events = event_list(&store, &berlin(), &filter, true).await.unwrap();
    assert_eq!(
        timeline(&events),
        vec![
            (march(13, 10, 0), "Standup (moved)".to_string()),
            (march(11, 8, 0), "Standup".to_string()),
        ]
    );
    assert_eq!(
        events[1].recurrence_reference_id.as_deref(),
        Some("20240311T080000Z")
    );

    let all = event_list(&store, &berlin(), &EventFilter::for_calendar(CALENDAR_ID), false)
        .await
        .unwrap();
    let subjects: Vec<_> = all.iter().filter_map(|e| e.subject.as_deref()).collect();
    assert_eq!(subjects, vec!["Team offsite", "Standup (moved)", "Standup"]);
}

#[test_log::test(tokio::test)]
async fn imported_master_keeps_people_and_exclusions() {
    let store = team_store().await;
    let master = stored(&store, STANDUP).await;

    assert_eq!(master.recurrence_ex_date.as_deref(), Some("20240313T080000Z"));
    assert_eq!(master.start_date, Some(march(4, 8, 0)));
    assert_eq!(master.end_date, Some(march(4, 8, 15)));
    assert_eq!(master.organizer.as_deref(), Some("mailto:alice@example.com"));
    let numbers: Vec<_> = master.attendees.iter().map(|a| a.number).collect();
    assert_eq!(numbers, vec![Some(1), Some(2)]);

    let offsite = stored(&store, OFFSITE).await;
    assert!(offsite.all_day);
    assert_eq!(offsite.end_date, Some(march(22, 0, 0)));
}

#[test_log::test(tokio::test)]
async fn cancel_feed_deletes_event() {
    let store = team_store().await;
    let summary = import(&store, CANCEL_OFFSITE, false).await;
    assert_eq!(summary.deleted, 1);
    assert!(get_by_uid(&store, Some(CALENDAR_ID), OFFSITE, true).await.is_none());
    assert!(get_by_uid(&store, Some(CALENDAR_ID), OFFSITE, false).await.unwrap().deleted);

    // A second cancel finds nothing left to delete.
    let summary = import(&store, CANCEL_OFFSITE, false).await;
    assert_eq!(summary.deleted, 0);
    assert_eq!(summary.skipped, 1);
}

#[test_log::test(tokio::test)]
async fn reimport_restores_cancelled_event() {
    let store = team_store().await;
    import(&store, CANCEL_OFFSITE, false).await;

    let summary = import(&store, TEAM_FEED, false).await;
    assert_eq!(summary.updated, 2);
    let offsite = stored(&store, OFFSITE).await;
    assert!(!offsite.deleted);
}

/// ## Summary
/// Exported calendars import into an equivalent calendar.
#[test_log::test(tokio::test)]
async fn export_round_trips_through_import() {
    let calendar = CalendarConfig::default();
    let first = Workbench::new(&calendar, berlin());
    let report = first
        .import_str("team.ics", TEAM_FEED, CALENDAR_ID, None, false)
        .await
        .unwrap();
    assert_eq!(report.summary.saved, 3);

    let exported = first.export(Some("PUBLISH")).await;
    assert!(exported.contains("EXDATE:20240313T080000Z\r\n"));
    assert!(exported.contains("DTEND;VALUE=DATE:20240323\r\n"));

    let second = Workbench::new(&calendar, berlin());
    let report = second
        .import_str("export.ics", &exported, CALENDAR_ID, Some(HandleMethod::AddUpdate), true)
        .await
        .unwrap();
    assert_eq!(report.summary.saved, 3);

    let before = first
        .list(CALENDAR_ID, Some(march(1, 0, 0)), Some(march(31, 0, 0)), true)
        .await
        .unwrap();
    let after = second
        .list(CALENDAR_ID, Some(march(1, 0, 0)), Some(march(31, 0, 0)), true)
        .await
        .unwrap();
    assert_eq!(timeline(&before), timeline(&after));
    assert_eq!(before.len(), 9);
}

#[test_log::test(tokio::test)]
async fn empty_feed_imports_nothing() {
    let store = MemoryEventStore::new();
    let summary = import(
        &store,
        "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nEND:VCALENDAR\r\n",
        false,
    )
    .await;
    assert_eq!(summary, Default::default());
    assert!(store.is_empty().await);
}
