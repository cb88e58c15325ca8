//! Command implementations over an in-memory event store.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use teamcal_core::config::CalendarConfig;
use teamcal_core::context::UserContext;
use teamcal_core::uid::EventUidGenerator;
use teamcal_db::db::memory::MemoryEventStore;
use teamcal_db::db::query::EventFilter;
use teamcal_service::calendar::codec::encode_calendar;
use teamcal_service::calendar::event::CalEvent;
use teamcal_service::calendar::mapping::from_record;
use teamcal_service::calendar::recurrence::RecurrenceData;
use teamcal_service::calendar::service::import::{HandleMethod, IcsImport, ImportSummary};
use teamcal_service::calendar::service::query::event_list;

use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub file: String,
    pub summary: ImportSummary,
    /// `uid: problem` lines for handles that were not clean.
    pub problems: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SeriesRecurrence {
    pub uid: String,
    pub rule: String,
    pub recurrence: RecurrenceData,
}

pub struct Workbench {
    store: MemoryEventStore,
    uids: EventUidGenerator,
    ctx: UserContext,
    prodid: String,
}

impl Workbench {
    #[must_use]
    pub fn new(calendar: &CalendarConfig, ctx: UserContext) -> Self {
        Self {
            store: MemoryEventStore::new(),
            uids: EventUidGenerator::new(calendar.domain.clone()),
            ctx,
            prodid: calendar.prodid.clone(),
        }
    }

    /// ## Summary
    /// Imports one feed: read, validate, persist.
    ///
    /// ## Errors
    /// Returns an error if the feed cannot be parsed.
    #[tracing::instrument(skip(self, ics))]
    pub async fn import_str(
        &self,
        file: &str,
        ics: &str,
        calendar_id: i64,
        method: Option<HandleMethod>,
        ignore_warnings: bool,
    ) -> AppResult<ImportReport> {
        let mut import = IcsImport::new(Some(calendar_id));
        import.read(ics, method)?;
        if import.is_empty() {
            tracing::warn!(file, "Feed holds no events");
        }
        import.validate(&self.store).await;

        let problems = import
            .handles()
            .flat_map(|handle| {
                let uid = handle
                    .event
                    .as_ref()
                    .and_then(|e| e.uid.clone())
                    .unwrap_or_else(|| "-".to_string());
                handle
                    .errors
                    .iter()
                    .chain(handle.warnings.iter())
                    .map(move |problem| format!("{uid}: {problem}"))
            })
            .collect();

        let summary = import.persist(&self.store, &self.uids, ignore_warnings).await;
        Ok(ImportReport {
            file: file.to_string(),
            summary,
            problems,
        })
    }

    /// ## Errors
    /// Returns an error if the file cannot be read or parsed.
    pub async fn import_file(
        &self,
        path: &Path,
        calendar_id: i64,
        method: Option<HandleMethod>,
        ignore_warnings: bool,
    ) -> AppResult<ImportReport> {
        let file = path.display().to_string();
        let ics = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| AppError::Io {
                path: file.clone(),
                source,
            })?;
        self.import_str(&file, &ics, calendar_id, method, ignore_warnings)
            .await
    }

    /// ## Errors
    /// Returns an error if the store fails.
    pub async fn list(
        &self,
        calendar_id: i64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        expand: bool,
    ) -> AppResult<Vec<CalEvent>> {
        let mut filter = EventFilter::for_calendar(calendar_id);
        filter.start = from;
        filter.end = to;
        Ok(event_list(&self.store, &self.ctx, &filter, expand).await?)
    }

    /// Every live stored event, in id order.
    async fn stored_events(&self) -> Vec<CalEvent> {
        self.store
            .all()
            .await
            .iter()
            .filter(|record| !record.deleted)
            .filter_map(|record| {
                from_record(record)
                    .inspect_err(|e| tracing::warn!(id = ?record.id, error = %e, "Skipping event"))
                    .ok()
            })
            .collect()
    }

    pub async fn export(&self, method: Option<&str>) -> String {
        encode_calendar(&self.stored_events().await, method, &self.prodid)
    }

    pub async fn recurrences(&self) -> Vec<SeriesRecurrence> {
        self.stored_events()
            .await
            .into_iter()
            .filter(CalEvent::has_recurrence)
            .map(|event| SeriesRecurrence {
                recurrence: event.get_recurrence_data(self.ctx.timezone()),
                uid: event.uid.unwrap_or_default(),
                rule: event.recurrence_rule.unwrap_or_default(),
            })
            .collect()
    }
}
