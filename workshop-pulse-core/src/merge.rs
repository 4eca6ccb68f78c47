//! Merging workshop lists from several sources.
//!
//! Records are "the same workshop" when they share a [`DedupKey`]. For each
//! key exactly one record survives:
//!
//! 1. a manual record (no `source`) beats a synced one, whatever the order;
//! 2. otherwise the first one seen wins.
//!
//! The survivor takes the position where its key first appeared, so a
//! manual record supplied after its synced twin replaces it in place.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::types::WorkshopRecord;

/// `(lowercased title, date)`
pub type DedupKey = (String, NaiveDate);

/// Identity key used to detect the same workshop across sources.
pub fn dedup_key(record: &WorkshopRecord) -> DedupKey {
    (record.title.to_lowercase(), record.date)
}

/// Flatten `lists` in order and deduplicate them.
///
/// Manual lists are conventionally supplied first, but the manual-wins rule
/// does not depend on it. With no lists the result is empty.
pub fn merge_workshops<I, L>(lists: I) -> Vec<WorkshopRecord>
where
    I: IntoIterator<Item = L>,
    L: IntoIterator<Item = WorkshopRecord>,
{
    let flattened: Vec<WorkshopRecord> = lists.into_iter().flatten().collect();
    let input_len = flattened.len();

    // Pass 1: pick the winner per key and remember where the key first showed up.
    let mut first_seen: Vec<DedupKey> = Vec::new();
    let mut winners: HashMap<DedupKey, WorkshopRecord> = HashMap::new();
    for record in flattened {
        let key = dedup_key(&record);
        match winners.get_mut(&key) {
            None => {
                first_seen.push(key.clone());
                winners.insert(key, record);
            }
            Some(current) => {
                if !current.is_manual() && record.is_manual() {
                    *current = record;
                }
            }
        }
    }

    // Pass 2: emit winners in first-occurrence order.
    let merged: Vec<WorkshopRecord> = first_seen
        .into_iter()
        .filter_map(|key| winners.remove(&key))
        .collect();

    tracing::debug!(
        input = input_len,
        merged = merged.len(),
        dropped = input_len - merged.len(),
        "Merged workshop lists"
    );

    merged
}
