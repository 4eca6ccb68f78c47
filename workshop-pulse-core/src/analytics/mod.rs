//! Workshop analytics
//!
//! Everything here is a pure function of a workshop list and "now":
//! - [`workshop_stats`]: snapshot counts
//! - [`compute_trend_stats`]: last 30 days against the 30 before
//! - [`generate_time_chart_series`]: hours per day over a [`ChartRange`]
//!
//! Dates are bucketed in UTC.

pub mod chart;
pub mod workshops;

pub use chart::{generate_time_chart_series, ChartRange};
pub use workshops::{
    compute_trend_stats, trend_window_starts, workshop_stats, MetricTrend, TrendStats,
    WorkshopStats, TREND_WINDOW_DAYS,
};
