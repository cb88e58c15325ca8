use chrono::TimeDelta;
use teamcal_test::db::db::EventStore;
use teamcal_test::db::db::query::EventFilter;
use teamcal_test::fixtures::{CALENDAR_ID, berlin, march, uid_generator};
use teamcal_test::service::calendar::event::CalEvent;
use teamcal_test::service::calendar::service::query::{event_list, get_by_uid};
use teamcal_test::service::calendar::service::series::{SeriesEdit, delete_event, update_event};

use super::helpers::{STANDUP, stored, team_store, timeline};

fn standups(events: &[CalEvent]) -> Vec<(chrono::DateTime<chrono::Utc>, String)> {
    timeline(events)
        .into_iter()
        .filter(|(_, subject)| subject.starts_with("Standup"))
        .rev()
        .collect()
}

fn march_filter() -> EventFilter {
    EventFilter::for_calendar(CALENDAR_ID).with_range(march(1, 0, 0), march(31, 0, 0))
}

/// ## Summary
/// Editing "this and following" ends the old series the day before and
/// starts a new one at the selected occurrence.
#[test_log::test(tokio::test)]
async fn future_edit_splits_series() {
    let store = team_store().await;
    let master = stored(&store, STANDUP).await;

    let mut edited = master.clone();
    edited.subject = Some("Standup v2".to_string());
    edited.start_date = Some(march(18, 8, 0));
    edited.end_date = Some(march(18, 8, 15));
    let outcome = update_event(
        &store,
        &berlin(),
        &uid_generator(),
        SeriesEdit::future(edited, march(18, 8, 0)),
    )
    .await
    .unwrap();

    let old = outcome.master.unwrap();
    assert_eq!(
        old.recurrence_rule.as_deref(),
        Some("FREQ=WEEKLY;UNTIL=20240317T225959Z;BYDAY=MO,WE")
    );
    assert_eq!(old.sequence, Some(1));
    assert_ne!(outcome.event.uid, old.uid);
    assert_eq!(outcome.event.sequence, Some(0));

    let events = event_list(&store, &berlin(), &march_filter(), true).await.unwrap();
    let v1 = "Standup".to_string();
    let v2 = "Standup v2".to_string();
    assert_eq!(
        standups(&events),
        vec![
            (march(4, 8, 0), v1.clone()),
            (march(6, 8, 0), v1.clone()),
            (march(11, 8, 0), v1),
            (march(13, 10, 0), "Standup (moved)".to_string()),
            (march(18, 8, 0), v2.clone()),
            (march(20, 8, 0), v2.clone()),
            (march(25, 8, 0), v2.clone()),
            (march(27, 8, 0), v2),
        ]
    );
}

#[test_log::test(tokio::test)]
async fn single_edit_moves_one_occurrence() {
    let store = team_store().await;
    let master = stored(&store, STANDUP).await;

    let mut edited = master.clone();
    edited.subject = Some("Standup at noon".to_string());
    edited.start_date = Some(march(20, 11, 0));
    edited.end_date = Some(march(20, 11, 0) + TimeDelta::minutes(15));
    let outcome = update_event(
        &store,
        &berlin(),
        &uid_generator(),
        SeriesEdit::single(edited, march(20, 8, 0)),
    )
    .await
    .unwrap();

    assert!(!outcome.event.has_recurrence());
    let old = outcome.master.unwrap();
    assert_eq!(
        old.recurrence_ex_date.as_deref(),
        Some("20240313T080000Z,20240320T080000Z")
    );

    let filter = EventFilter::for_calendar(CALENDAR_ID).with_range(march(20, 0, 0), march(20, 23, 0));
    let events = event_list(&store, &berlin(), &filter, true).await.unwrap();
    assert_eq!(
        standups(&events),
        vec![(march(20, 11, 0), "Standup at noon".to_string())]
    );
}

#[test_log::test(tokio::test)]
async fn stale_series_edit_is_rejected() {
    let store = team_store().await;
    let master = stored(&store, STANDUP).await;

    let mut first = master.clone();
    first.location = Some("Room 5".to_string());
    update_event(&store, &berlin(), &uid_generator(), SeriesEdit::all(first))
        .await
        .unwrap();

    let mut second = master;
    second.subject = Some("Too late".to_string());
    let result = update_event(
        &store,
        &berlin(),
        &uid_generator(),
        SeriesEdit::future(second, march(18, 8, 0)),
    )
    .await;
    assert!(result.is_err());
    assert_eq!(stored(&store, STANDUP).await.subject.as_deref(), Some("Standup"));
}

#[test_log::test(tokio::test)]
async fn deletions_shrink_then_remove_series() {
    let store = team_store().await;
    let master = stored(&store, STANDUP).await;

    let master = delete_event(&store, &berlin(), SeriesEdit::single(master, march(6, 8, 0)))
        .await
        .unwrap()
        .unwrap();
    let master = delete_event(&store, &berlin(), SeriesEdit::future(master, march(25, 8, 0)))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        master.recurrence_until,
        Some(march(24, 22, 59) + TimeDelta::seconds(59))
    );

    let events = event_list(&store, &berlin(), &march_filter(), true).await.unwrap();
    let starts: Vec<_> = standups(&events).into_iter().map(|(start, _)| start).collect();
    assert_eq!(
        starts,
        vec![march(4, 8, 0), march(11, 8, 0), march(13, 10, 0), march(18, 8, 0), march(20, 8, 0)]
    );

    let id = master.id.unwrap();
    assert!(delete_event(&store, &berlin(), SeriesEdit::all(master)).await.unwrap().is_none());
    assert!(store.load_by_id(id).await.unwrap().unwrap().deleted);
    assert!(get_by_uid(&store, Some(CALENDAR_ID), STANDUP, true).await.is_none());

    // The moved occurrence is an event of its own and survives.
    let events = event_list(&store, &berlin(), &march_filter(), true).await.unwrap();
    assert_eq!(
        standups(&events),
        vec![(march(13, 10, 0), "Standup (moved)".to_string())]
    );
}
