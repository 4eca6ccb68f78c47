//! Storage for manually created workshops
//!
//! [`WorkshopStore`] is the storage contract: an insertion-ordered,
//! capacity-capped collection that evicts its oldest records first. Two
//! backends implement it:
//! - [`InMemoryWorkshopStore`]: a mutex-guarded `VecDeque` (the default)
//! - [`SqliteWorkshopStore`]: the same contract on a SQLite table
//!
//! [`WorkshopRegistry`] sits on top of any store and turns caller input
//! ([`NewWorkshop`]) into validated [`WorkshopRecord`]s.

mod memory;
mod sqlite;

pub use memory::InMemoryWorkshopStore;
pub use sqlite::SqliteWorkshopStore;

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use crate::analytics::{workshop_stats, WorkshopStats};
use crate::clock::{Clock, IdGenerator};
use crate::config::{Config, StoreBackend};
use crate::error::{Error, Result};
use crate::format::{format_duration_hours, parse_duration_hours};
use crate::types::{DurationInput, NewWorkshop, WorkshopRecord, WorkshopStatus};

/// Default number of manual records kept
pub const DEFAULT_WORKSHOP_CAPACITY: usize = 1000;

/// Insertion-ordered, capped storage of manual workshop records.
///
/// `append` evicts the oldest records once `capacity` is exceeded.
/// Eviction is routine and not an error.
pub trait WorkshopStore: Send + Sync {
    /// Append a record; returns how many old records were evicted
    fn append(&self, record: WorkshopRecord) -> Result<usize>;

    /// Snapshot of all records, oldest first
    fn list(&self) -> Result<Vec<WorkshopRecord>>;

    /// Drop up to `count` of the oldest records; returns how many were dropped
    fn evict_oldest(&self, count: usize) -> Result<usize>;

    /// Number of stored records
    fn len(&self) -> Result<usize>;

    /// Maximum number of records kept
    fn capacity(&self) -> usize;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// Open the store selected by `config.store.backend`.
pub fn open_store(config: &Config) -> Result<Arc<dyn WorkshopStore>> {
    let capacity = config.store.workshop_capacity;
    Ok(match config.store.backend {
        StoreBackend::Memory => Arc::new(InMemoryWorkshopStore::new(capacity)),
        StoreBackend::Sqlite => {
            let path = config.sqlite_path();
            tracing::info!(path = %path.display(), "Opening SQLite workshop store");
            Arc::new(SqliteWorkshopStore::open(&path, capacity)?)
        }
    })
}

/// Validating front door for manual workshop creation.
pub struct WorkshopRegistry {
    store: Arc<dyn WorkshopStore>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl WorkshopRegistry {
    pub fn new(
        store: Arc<dyn WorkshopStore>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self { store, clock, ids }
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<dyn WorkshopStore> {
        &self.store
    }

    /// Validate `input`, assign id and `createdAt`, and append it.
    ///
    /// A validation error leaves the store untouched.
    pub fn create(&self, input: NewWorkshop) -> Result<WorkshopRecord> {
        let now = self.clock.now();
        let record = self.build_record(input, now)?;
        let evicted = self.store.append(record.clone())?;
        tracing::info!(
            id = %record.id,
            title = %record.title,
            date = %record.date,
            evicted,
            "Workshop created"
        );
        Ok(record)
    }

    /// Stored manual records, oldest first
    pub fn list(&self) -> Result<Vec<WorkshopRecord>> {
        self.store.list()
    }

    /// Snapshot counts over the stored manual records
    pub fn counts(&self) -> Result<WorkshopStats> {
        Ok(workshop_stats(&self.store.list()?))
    }

    fn build_record(&self, input: NewWorkshop, now: DateTime<Utc>) -> Result<WorkshopRecord> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(Error::validation("title is required"));
        }

        let rating = input.rating.unwrap_or(0.0);
        if !rating.is_finite() || !(0.0..=5.0).contains(&rating) {
            return Err(Error::validation(format!(
                "rating must be between 0 and 5, got {}",
                rating
            )));
        }

        let duration = match input.duration {
            None => format_duration_hours(0.0),
            Some(DurationInput::Hours(hours)) => {
                if !hours.is_finite() || hours < 0.0 {
                    return Err(Error::validation(format!(
                        "duration must be a non-negative number of hours, got {}",
                        hours
                    )));
                }
                format_duration_hours(hours)
            }
            Some(DurationInput::Text(text)) => {
                let hours = parse_duration_hours(&text).ok_or_else(|| {
                    Error::validation(format!("unparseable duration: {:?}", text))
                })?;
                format_duration_hours(hours)
            }
        };

        let start_time = input
            .start_time
            .as_deref()
            .map(|raw| {
                DateTime::parse_from_rfc3339(raw.trim())
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| Error::validation(format!("invalid startTime {:?}: {}", raw, e)))
            })
            .transpose()?;

        let date = match input.date.as_deref() {
            Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|e| Error::validation(format!("invalid date {:?}: {}", raw, e)))?,
            None => start_time.unwrap_or(now).date_naive(),
        };

        Ok(WorkshopRecord {
            id: self.ids.next_id(),
            title: title.to_string(),
            students: input.students.unwrap_or(0),
            duration,
            rating,
            status: input.status.unwrap_or(WorkshopStatus::Scheduled),
            date,
            created_at: now,
            source: None,
            provenance: None,
        })
    }
}
