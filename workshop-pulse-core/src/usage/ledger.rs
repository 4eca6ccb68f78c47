//! The AI usage ledger: a capped, insertion-ordered log of metered calls.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::pricing::PricingTable;
use super::stats::{compute_usage_stats, AiUsageFilter, AiUsageStats};
use crate::clock::{Clock, IdGenerator};
use crate::error::{Error, Result};
use crate::types::{AiUsageEntry, NewAiUsage};

/// Default number of entries kept
pub const DEFAULT_USAGE_CAPACITY: usize = 5000;

/// Model recorded when the caller does not name one
pub const UNKNOWN_MODEL: &str = "unknown";

pub struct AiUsageLedger {
    entries: Mutex<VecDeque<AiUsageEntry>>,
    capacity: usize,
    pricing: PricingTable,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl AiUsageLedger {
    pub fn new(
        capacity: usize,
        pricing: PricingTable,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
            pricing,
            clock,
            ids,
        }
    }

    fn entries(&self) -> MutexGuard<'_, VecDeque<AiUsageEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stored entries, hidden ones included
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validate and record one call.
    ///
    /// Assigns id and timestamp, fills `tokensUsed` and `cost` when omitted,
    /// and evicts the oldest entry once the ledger is full. A validation error
    /// records nothing.
    pub fn log(&self, usage: NewAiUsage) -> Result<AiUsageEntry> {
        let entry = self.build_entry(usage)?;

        let mut entries = self.entries();
        entries.push_back(entry.clone());
        let overflow = entries.len().saturating_sub(self.capacity);
        entries.drain(..overflow);
        drop(entries);

        if overflow > 0 {
            tracing::debug!(evicted = overflow, capacity = self.capacity, "Evicted oldest usage entries");
        }
        tracing::debug!(
            id = %entry.id,
            model = %entry.model,
            feature = %entry.feature,
            tokens = entry.tokens_used,
            cost = entry.cost,
            "AI usage logged"
        );
        Ok(entry)
    }

    /// Aggregate statistics, hidden entries excluded
    pub fn stats(&self, filter: &AiUsageFilter) -> AiUsageStats {
        let snapshot: Vec<AiUsageEntry> = self.entries().iter().cloned().collect();
        compute_usage_stats(&snapshot, filter, self.clock.now())
    }

    /// Up to `limit` matching entries, newest first, hidden entries excluded
    pub fn recent(&self, filter: &AiUsageFilter, limit: usize) -> Vec<AiUsageEntry> {
        self.entries()
            .iter()
            .rev()
            .filter(|e| !e.is_hidden() && filter.matches(e))
            .take(limit)
            .cloned()
            .collect()
    }

    fn build_entry(&self, usage: NewAiUsage) -> Result<AiUsageEntry> {
        let usage_type = usage.usage_type.trim();
        if usage_type.is_empty() {
            return Err(Error::validation("usage type is required"));
        }

        match (usage.success, &usage.error) {
            (true, Some(_)) => {
                return Err(Error::validation("successful usage must not carry an error"))
            }
            (false, None) => return Err(Error::validation("failed usage must carry an error")),
            _ => {}
        }

        let model = usage
            .model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(UNKNOWN_MODEL)
            .to_string();

        let prompt_tokens = usage.prompt_tokens.unwrap_or(0);
        let completion_tokens = usage.completion_tokens.unwrap_or(0);
        let tokens_used = match (usage.tokens_used, usage.prompt_tokens, usage.completion_tokens) {
            (None, _, _) => prompt_tokens.saturating_add(completion_tokens),
            (Some(total), Some(p), Some(c)) => {
                if total != p.saturating_add(c) {
                    tracing::warn!(
                        tokens_used = total,
                        prompt_tokens = p,
                        completion_tokens = c,
                        "tokensUsed differs from prompt + completion"
                    );
                }
                total
            }
            (Some(total), None, None) => {
                tracing::debug!(tokens_used = total, "Usage logged with total tokens only");
                total
            }
            (Some(total), _, _) => total,
        };

        let cost = match usage.cost {
            Some(cost) if !cost.is_finite() || cost < 0.0 => {
                return Err(Error::validation(format!(
                    "cost must be a non-negative number, got {}",
                    cost
                )))
            }
            Some(cost) => cost,
            None => self
                .pricing
                .calculate_cost(&model, prompt_tokens, completion_tokens),
        };

        let timestamp = self.clock.now();
        Ok(AiUsageEntry {
            id: self.ids.next_id(),
            timestamp,
            date: timestamp.date_naive(),
            usage_type: usage_type.to_string(),
            feature: usage.feature,
            model,
            prompt_tokens,
            completion_tokens,
            tokens_used,
            cost,
            response_time: usage.response_time.unwrap_or(0),
            success: usage.success,
            error: usage.error,
        })
    }
}
