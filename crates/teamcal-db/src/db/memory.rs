//! In-memory `EventStore` with optimistic row versioning.

use std::collections::BTreeMap;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::db::EventStore;
use crate::db::query::{EventFilter, sort_by_start_desc};
use crate::error::{DbError, DbResult};
use crate::model::event::CalEventRecord;

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    records: BTreeMap<i64, CalEventRecord>,
}

#[derive(Debug, Default)]
pub struct MemoryEventStore {
    state: RwLock<State>,
}

impl MemoryEventStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, including deleted ones.
    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot of every stored record in id order.
    pub async fn all(&self) -> Vec<CalEventRecord> {
        self.state.read().await.records.values().cloned().collect()
    }

    async fn set_deleted(&self, id: i64, deleted: bool) -> DbResult<()> {
        let mut state = self.state.write().await;
        let record = state.records.get_mut(&id).ok_or(DbError::NotFound(id))?;
        record.deleted = deleted;
        record.version += 1;
        record.last_update = Some(Utc::now());
        Ok(())
    }
}

impl EventStore for MemoryEventStore {
    async fn load_by_id(&self, id: i64) -> DbResult<Option<CalEventRecord>> {
        Ok(self.state.read().await.records.get(&id).cloned())
    }

    #[tracing::instrument(skip(self, record), fields(uid = %record.uid))]
    async fn save(&self, mut record: CalEventRecord) -> DbResult<CalEventRecord> {
        if let Some(id) = record.id {
            return Err(DbError::InvalidRecord(format!(
                "record {id} is already persisted"
            )));
        }

        let mut state = self.state.write().await;
        state.next_id += 1;
        let id = state.next_id;
        record.id = Some(id);
        record.version = 0;
        record.last_update = Some(Utc::now());
        state.records.insert(id, record.clone());

        tracing::debug!(id, "Event record saved");
        Ok(record)
    }

    #[tracing::instrument(skip(self, record), fields(id = ?record.id, version = record.version))]
    async fn update(&self, mut record: CalEventRecord) -> DbResult<CalEventRecord> {
        let id = record
            .id
            .ok_or_else(|| DbError::InvalidRecord("cannot update an unsaved record".to_string()))?;

        let mut state = self.state.write().await;
        let stored = state.records.get_mut(&id).ok_or(DbError::NotFound(id))?;
        if stored.version != record.version {
            tracing::warn!(id, stored = stored.version, "Rejecting stale update");
            return Err(DbError::VersionConflict {
                id,
                expected: record.version,
                stored: stored.version,
            });
        }

        record.version += 1;
        record.last_update = Some(Utc::now());
        *stored = record.clone();

        tracing::debug!(id, version = record.version, "Event record updated");
        Ok(record)
    }

    #[tracing::instrument(skip(self))]
    async fn mark_deleted(&self, id: i64) -> DbResult<()> {
        self.set_deleted(id, true).await
    }

    #[tracing::instrument(skip(self))]
    async fn undelete(&self, id: i64) -> DbResult<()> {
        self.set_deleted(id, false).await
    }

    async fn find_by_uid(
        &self,
        calendar_id: Option<i64>,
        uid: &str,
        exclude_deleted: bool,
    ) -> DbResult<Vec<CalEventRecord>> {
        let state = self.state.read().await;
        Ok(state
            .records
            .values()
            .filter(|r| r.uid == uid)
            .filter(|r| calendar_id.is_none_or(|cal| r.calendar_id == cal))
            .filter(|r| !(exclude_deleted && r.deleted))
            .cloned()
            .collect())
    }

    async fn list(&self, filter: &EventFilter) -> DbResult<Vec<CalEventRecord>> {
        let state = self.state.read().await;
        let mut records: Vec<CalEventRecord> = state
            .records
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        sort_by_start_desc(&mut records);
        Ok(records)
    }
}
