//! # workshop-pulse-core
//!
//! Core library for workshop-pulse - a workshop tracking dashboard.
//!
//! This library provides:
//! - Domain types for workshops and AI usage entries
//! - A capped workshop store (in memory or SQLite)
//! - Calendar event conversion and a Google Calendar client
//! - Merge/dedup of workshops across sources
//! - Workshop statistics, trends and chart series
//! - An AI usage ledger with model pricing
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! Workshops come from two sources:
//! - **Manual:** entered by a person, validated by [`WorkshopRegistry`] and
//!   kept in a [`WorkshopStore`]
//! - **Calendar:** fetched per request through a
//!   [`CalendarSource`](calendar::CalendarSource), converted and never stored
//!
//! [`DashboardService`] merges both and derives every statistic. Everything
//! downstream of the fetch is a pure function of the merged list and "now".
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use workshop_pulse_core::{
//!     open_store, AiUsageLedger, Config, DashboardRequest, DashboardService, SystemClock,
//!     UuidGenerator,
//! };
//!
//! # async fn run() -> workshop_pulse_core::Result<()> {
//! let config = Config::load()?;
//! let clock = Arc::new(SystemClock);
//! let ledger = AiUsageLedger::new(
//!     config.store.usage_capacity,
//!     config.pricing.table(),
//!     clock.clone(),
//!     Arc::new(UuidGenerator),
//! );
//! let service = DashboardService::new(
//!     open_store(&config)?,
//!     Arc::new(ledger),
//!     clock,
//!     config.calendar.clone(),
//! );
//! let stats = service.dashboard(&DashboardRequest::default()).await?;
//! println!("{} workshops", stats.workshops.total);
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use analytics::{
    compute_trend_stats, generate_time_chart_series, workshop_stats, ChartRange, TrendStats,
    WorkshopStats,
};
pub use calendar::convert_calendar_events;
pub use clock::{Clock, FixedClock, IdGenerator, SequentialIds, SystemClock, UuidGenerator};
pub use config::Config;
pub use dashboard::{DashboardRequest, DashboardService, DashboardStats};
pub use error::{Error, NetworkErrorKind, Result};
pub use merge::merge_workshops;
pub use retry::{retry_with_backoff, RetryPolicy};
pub use store::{open_store, InMemoryWorkshopStore, WorkshopRegistry, WorkshopStore};
pub use types::*;
pub use usage::{calculate_ai_cost, AiUsageFilter, AiUsageLedger, AiUsageStats, PricingTable};

// Public modules
pub mod analytics;
pub mod calendar;
pub mod clock;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod format;
pub mod logging;
pub mod merge;
pub mod retry;
pub mod store;
pub mod types;
pub mod usage;
