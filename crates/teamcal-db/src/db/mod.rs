use std::future::Future;

use crate::error::DbResult;
use crate::model::event::CalEventRecord;
use query::EventFilter;

pub mod memory;
pub mod query;

/// ## Summary
/// Entity access for persisted calendar events.
///
/// Callers hand in fully formed records with the ICS payload already
/// encoded. `update` enforces optimistic versioning: the record's `version`
/// must equal the stored one.
pub trait EventStore: Send + Sync {
    /// Returns the record with `id`, deleted or not.
    fn load_by_id(&self, id: i64) -> impl Future<Output = DbResult<Option<CalEventRecord>>> + Send;

    /// Inserts a new record and returns it with its assigned id.
    fn save(&self, record: CalEventRecord) -> impl Future<Output = DbResult<CalEventRecord>> + Send;

    /// Replaces a stored record and returns it with its bumped version.
    fn update(&self, record: CalEventRecord)
    -> impl Future<Output = DbResult<CalEventRecord>> + Send;

    fn mark_deleted(&self, id: i64) -> impl Future<Output = DbResult<()>> + Send;

    fn undelete(&self, id: i64) -> impl Future<Output = DbResult<()>> + Send;

    /// Returns every record with `uid`, optionally restricted to one calendar.
    fn find_by_uid(
        &self,
        calendar_id: Option<i64>,
        uid: &str,
        exclude_deleted: bool,
    ) -> impl Future<Output = DbResult<Vec<CalEventRecord>>> + Send;

    /// Returns the records matching `filter`, latest start first.
    fn list(
        &self,
        filter: &EventFilter,
    ) -> impl Future<Output = DbResult<Vec<CalEventRecord>>> + Send;
}
