//! Metered AI usage
//!
//! [`AiUsageLedger`] records calls, [`PricingTable`] prices them and
//! [`compute_usage_stats`] aggregates them. Entries tagged with the
//! `recommendations` feature are recorded but never reported.

pub mod ledger;
pub mod pricing;
pub mod stats;

pub use ledger::{AiUsageLedger, DEFAULT_USAGE_CAPACITY, UNKNOWN_MODEL};
pub use pricing::{calculate_ai_cost, ModelRate, PricingTable, DEFAULT_RATE};
pub use stats::{
    compute_usage_stats, weekly_usage_series, AiUsageFilter, AiUsageStats, DailyUsage,
    UsageTotals, UsageTrends,
};
