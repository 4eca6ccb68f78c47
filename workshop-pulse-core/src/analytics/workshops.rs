//! Snapshot and period-over-period workshop statistics.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::format::{round1, trend_percent};
use crate::types::{WorkshopRecord, WorkshopStatus};

/// Length of the current and previous trend windows, in days.
pub const TREND_WINDOW_DAYS: i64 = 30;

/// Point-in-time counts over a workshop list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkshopStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub scheduled: usize,
    pub total_students: u64,
    /// Mean rating over every record, 1 decimal; 0 for an empty list
    pub avg_rating: f64,
}

/// One metric compared across the two windows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricTrend {
    pub current: f64,
    pub previous: f64,
    /// Whole-percent change, see [`trend_percent`]
    pub trend: i64,
}

impl MetricTrend {
    pub fn new(current: f64, previous: f64) -> Self {
        Self {
            current,
            previous,
            trend: trend_percent(current, previous),
        }
    }
}

/// Workshop trends over the last 30 days against the 30 before.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendStats {
    pub workshops: MetricTrend,
    /// Average duration in hours
    pub avg_duration: MetricTrend,
    /// Completed workshops
    pub decks_created: MetricTrend,
}

/// Compute snapshot counts.
pub fn workshop_stats(workshops: &[WorkshopRecord]) -> WorkshopStats {
    let mut stats = WorkshopStats {
        total: workshops.len(),
        ..Default::default()
    };
    let mut rating_sum = 0.0;

    for workshop in workshops {
        match workshop.status {
            WorkshopStatus::Completed => stats.completed += 1,
            WorkshopStatus::InProgress => stats.in_progress += 1,
            WorkshopStatus::Scheduled => stats.scheduled += 1,
        }
        stats.total_students += u64::from(workshop.students);
        rating_sum += workshop.rating;
    }

    if !workshops.is_empty() {
        stats.avg_rating = round1(rating_sum / workshops.len() as f64);
    }
    stats
}

/// Window totals used by [`compute_trend_stats`].
#[derive(Debug, Default)]
struct WindowTotals {
    count: usize,
    completed: usize,
    duration_sum: f64,
    with_duration: usize,
}

impl WindowTotals {
    fn add(&mut self, workshop: &WorkshopRecord) {
        self.count += 1;
        if workshop.status == WorkshopStatus::Completed {
            self.completed += 1;
        }
        if let Some(hours) = workshop.duration_hours() {
            self.duration_sum += hours;
            self.with_duration += 1;
        }
    }

    fn avg_duration(&self) -> f64 {
        if self.with_duration == 0 {
            0.0
        } else {
            round1(self.duration_sum / self.with_duration as f64)
        }
    }
}

/// First day of the current and previous trend windows ending `today`.
///
/// The current window is today and the 29 days before; the previous window
/// is the 30 days before that.
pub fn trend_window_starts(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let current_start = today - Duration::days(TREND_WINDOW_DAYS - 1);
    (current_start, current_start - Duration::days(TREND_WINDOW_DAYS))
}

/// Compare the last 30 days (upcoming dates included) with the 30 before.
pub fn compute_trend_stats(workshops: &[WorkshopRecord], now: DateTime<Utc>) -> TrendStats {
    let (current_start, previous_start) = trend_window_starts(now.date_naive());

    let mut current = WindowTotals::default();
    let mut previous = WindowTotals::default();
    for workshop in workshops {
        if workshop.date >= current_start {
            current.add(workshop);
        } else if workshop.date >= previous_start {
            previous.add(workshop);
        }
    }

    tracing::trace!(
        current = current.count,
        previous = previous.count,
        "Computed workshop trend windows"
    );

    TrendStats {
        workshops: MetricTrend::new(current.count as f64, previous.count as f64),
        avg_duration: MetricTrend::new(current.avg_duration(), previous.avg_duration()),
        decks_created: MetricTrend::new(current.completed as f64, previous.completed as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, status: WorkshopStatus, duration: &str) -> WorkshopRecord {
        WorkshopRecord {
            id: format!("w-{}", date),
            title: "Workshop".to_string(),
            students: 5,
            duration: duration.to_string(),
            rating: 4.0,
            status,
            date: date.parse().unwrap(),
            created_at: "2024-01-01T00:00:00Z".parse().unwrap(),
            source: None,
            provenance: None,
        }
    }

    fn now() -> DateTime<Utc> {
        "2024-11-15T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_stats_empty_list() {
        let stats = workshop_stats(&[]);
        assert_eq!(stats, WorkshopStats::default());
        assert_eq!(stats.avg_rating, 0.0);
    }

    #[test]
    fn test_stats_counts_and_mean_rating() {
        let mut unrated = record("2024-11-10", WorkshopStatus::Scheduled, "1h");
        unrated.rating = 0.0;
        unrated.students = 3;
        let list = vec![
            record("2024-11-01", WorkshopStatus::Completed, "2h"),
            record("2024-11-02", WorkshopStatus::InProgress, "2h"),
            unrated,
        ];
        let stats = workshop_stats(&list);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.scheduled, 1);
        assert_eq!(stats.total_students, 13);
        assert_eq!(stats.avg_rating, 2.7);
    }

    #[test]
    fn test_trend_windows() {
        let list = vec![
            // current window, including an upcoming one
            record("2024-11-14", WorkshopStatus::Completed, "2h"),
            record("2024-10-17", WorkshopStatus::Completed, "3h"),
            record("2024-12-01", WorkshopStatus::Scheduled, "4h"),
            // previous window
            record("2024-10-16", WorkshopStatus::Completed, "1h"),
            record("2024-09-17", WorkshopStatus::Scheduled, "n/a"),
            // too old
            record("2024-09-16", WorkshopStatus::Completed, "9h"),
        ];
        let trends = compute_trend_stats(&list, now());

        assert_eq!(trends.workshops, MetricTrend::new(3.0, 2.0));
        assert_eq!(trends.workshops.trend, 50);
        assert_eq!(trends.avg_duration.current, 3.0);
        assert_eq!(trends.avg_duration.previous, 1.0);
        assert_eq!(trends.avg_duration.trend, 200);
        assert_eq!(trends.decks_created.current, 2.0);
        assert_eq!(trends.decks_created.previous, 1.0);
        assert_eq!(trends.decks_created.trend, 100);
    }

    #[test]
    fn test_window_starts_cover_equal_days() {
        let today = now().date_naive();
        let (current_start, previous_start) = trend_window_starts(today);
        assert_eq!(current_start.to_string(), "2024-10-17");
        assert_eq!(previous_start.to_string(), "2024-09-17");
        assert_eq!((today - current_start).num_days() + 1, TREND_WINDOW_DAYS);
        assert_eq!((current_start - previous_start).num_days(), TREND_WINDOW_DAYS);
    }

    #[test]
    fn test_steady_daily_activity_is_flat() {
        let today = now().date_naive();
        let list: Vec<_> = (0..=60)
            .map(|back| {
                let date = (today - Duration::days(back)).to_string();
                record(&date, WorkshopStatus::Completed, "2h")
            })
            .collect();
        let trends = compute_trend_stats(&list, now());

        assert_eq!(trends.workshops, MetricTrend::new(30.0, 30.0));
        assert_eq!(trends.workshops.trend, 0);
        assert_eq!(trends.decks_created.trend, 0);
        assert_eq!(trends.avg_duration.trend, 0);
    }

    #[test]
    fn test_trend_sentinels_with_empty_previous_window() {
        let list = vec![record("2024-11-14", WorkshopStatus::Scheduled, "2h")];
        let trends = compute_trend_stats(&list, now());
        assert_eq!(trends.workshops.trend, 100);
        assert_eq!(trends.decks_created.trend, 0);

        let empty = compute_trend_stats(&[], now());
        assert_eq!(empty.workshops.trend, 0);
        assert_eq!(empty.avg_duration.current, 0.0);
    }
}
