use teamcal_test::core::context::UserContext;
use teamcal_test::db::db::memory::MemoryEventStore;
use teamcal_test::db::db::query::EventFilter;
use teamcal_test::fixtures::{CALENDAR_ID, uid_generator};
use teamcal_test::service::calendar::service::query::event_list;
use teamcal_test::service::calendar::service::series::save_event;

include!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../teamcal-service/tests/expansion_cases_data/mod.rs"
));

/// ## Summary
/// Shared expansion cases, stored first and then listed back.
#[test_log::test(tokio::test)]
async fn expansion_cases_through_store() {
    for case in expansion_cases() {
        let store = MemoryEventStore::new();
        save_event(&store, &uid_generator(), case.master())
            .await
            .unwrap_or_else(|e| panic!("Case {} failed to save: {e}", case.name));

        let mut filter = EventFilter::for_calendar(CALENDAR_ID);
        (filter.start, filter.end) = case.range();
        let events = event_list(&store, &UserContext::new(case.zone), &filter, true)
            .await
            .unwrap_or_else(|e| panic!("Case {} failed to list: {e}", case.name));
        assert_occurrences(&case, &events);
    }
}
