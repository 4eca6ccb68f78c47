//! In-process workshop store.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::WorkshopStore;
use crate::error::Result;
use crate::types::WorkshopRecord;

/// `VecDeque` behind a single mutex; append and truncate happen under one lock.
pub struct InMemoryWorkshopStore {
    records: Mutex<VecDeque<WorkshopRecord>>,
    capacity: usize,
}

impl InMemoryWorkshopStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    fn records(&self) -> MutexGuard<'_, VecDeque<WorkshopRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WorkshopStore for InMemoryWorkshopStore {
    fn append(&self, record: WorkshopRecord) -> Result<usize> {
        let mut records = self.records();
        records.push_back(record);
        let overflow = records.len().saturating_sub(self.capacity);
        records.drain(..overflow);
        if overflow > 0 {
            tracing::debug!(evicted = overflow, capacity = self.capacity, "Evicted oldest workshops");
        }
        Ok(overflow)
    }

    fn list(&self) -> Result<Vec<WorkshopRecord>> {
        Ok(self.records().iter().cloned().collect())
    }

    fn evict_oldest(&self, count: usize) -> Result<usize> {
        let mut records = self.records();
        let count = count.min(records.len());
        records.drain(..count);
        Ok(count)
    }

    fn len(&self) -> Result<usize> {
        Ok(self.records().len())
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WorkshopStatus;

    fn record(n: usize) -> WorkshopRecord {
        WorkshopRecord {
            id: format!("w{}", n),
            title: format!("Workshop {}", n),
            students: 0,
            duration: "1h".to_string(),
            rating: 0.0,
            status: WorkshopStatus::Scheduled,
            date: "2024-11-10".parse().unwrap(),
            created_at: "2024-11-01T00:00:00Z".parse().unwrap(),
            source: None,
            provenance: None,
        }
    }

    #[test]
    fn test_capacity_evicts_oldest_first() {
        let store = InMemoryWorkshopStore::new(1000);
        let mut evicted = 0;
        for n in 0..1001 {
            evicted += store.append(record(n)).unwrap();
        }
        let records = store.list().unwrap();
        assert_eq!(evicted, 1);
        assert_eq!(records.len(), 1000);
        assert_eq!(records[0].id, "w1");
        assert_eq!(records[999].id, "w1000");
    }

    #[test]
    fn test_evict_oldest() {
        let store = InMemoryWorkshopStore::new(10);
        for n in 0..3 {
            store.append(record(n)).unwrap();
        }
        assert_eq!(store.evict_oldest(2).unwrap(), 2);
        assert_eq!(store.list().unwrap()[0].id, "w2");
        assert_eq!(store.evict_oldest(5).unwrap(), 1);
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_list_is_a_snapshot() {
        let store = InMemoryWorkshopStore::new(10);
        store.append(record(0)).unwrap();
        let snapshot = store.list().unwrap();
        store.append(record(1)).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len().unwrap(), 2);
    }
}
