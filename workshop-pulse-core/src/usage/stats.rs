//! AI usage aggregation.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::{trend_window_starts, MetricTrend};
use crate::format::{round1, round_cost};
use crate::types::{AiUsageEntry, ChartPoint, ChartSeries};

/// Optional narrowing of a stats or log query. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiUsageFilter {
    #[serde(rename = "type")]
    pub usage_type: Option<String>,
    pub feature: Option<String>,
    pub model: Option<String>,
    pub success: Option<bool>,
    /// Inclusive
    pub start_date: Option<NaiveDate>,
    /// Inclusive
    pub end_date: Option<NaiveDate>,
}

impl AiUsageFilter {
    pub fn matches(&self, entry: &AiUsageEntry) -> bool {
        self.usage_type.as_ref().map_or(true, |t| *t == entry.usage_type)
            && self.feature.as_ref().map_or(true, |f| *f == entry.feature)
            && self.model.as_ref().map_or(true, |m| *m == entry.model)
            && self.success.map_or(true, |s| s == entry.success)
            && self.start_date.map_or(true, |d| entry.date >= d)
            && self.end_date.map_or(true, |d| entry.date <= d)
    }
}

/// Requests, tokens and cost summed over some set of entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageTotals {
    pub requests: usize,
    pub tokens: u64,
    pub cost: f64,
}

impl UsageTotals {
    fn add(&mut self, entry: &AiUsageEntry) {
        self.requests += 1;
        self.tokens = self.tokens.saturating_add(entry.tokens_used);
        self.cost += entry.cost;
    }

    fn rounded(mut self) -> Self {
        self.cost = round_cost(self.cost);
        self
    }
}

/// Totals for one UTC day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyUsage {
    pub date: NaiveDate,
    pub requests: usize,
    pub tokens: u64,
    pub cost: f64,
}

/// Usage over the last 30 days against the 30 before.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageTrends {
    pub requests: MetricTrend,
    pub tokens: MetricTrend,
    pub cost: MetricTrend,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiUsageStats {
    pub total_requests: usize,
    pub total_tokens: u64,
    pub total_cost: f64,
    /// Mean in milliseconds, rounded
    pub avg_response_time: u64,
    /// Percent of successful entries, 1 decimal; 0 when there are none
    pub success_rate: f64,
    pub by_type: BTreeMap<String, usize>,
    pub by_feature: BTreeMap<String, usize>,
    /// Sorted by date
    pub by_day: Vec<DailyUsage>,
    pub today: UsageTotals,
    /// Today and the 6 days before
    pub week: UsageTotals,
    /// Today and the 29 days before
    pub month: UsageTotals,
    pub trends: UsageTrends,
}

/// Aggregate `entries` matching `filter`, hidden entries excluded.
///
/// Rolling totals and trends are measured on each entry's `date`.
pub fn compute_usage_stats(
    entries: &[AiUsageEntry],
    filter: &AiUsageFilter,
    now: DateTime<Utc>,
) -> AiUsageStats {
    let today = now.date_naive();
    let week_start = today - Duration::days(6);
    let month_start = today - Duration::days(29);
    let (current_start, previous_start) = trend_window_starts(today);

    let mut stats = AiUsageStats::default();
    let mut overall = UsageTotals::default();
    let mut current = UsageTotals::default();
    let mut previous = UsageTotals::default();
    let mut response_time_sum = 0u64;
    let mut successes = 0usize;
    let mut by_day: BTreeMap<NaiveDate, UsageTotals> = BTreeMap::new();

    for entry in entries
        .iter()
        .filter(|e| !e.is_hidden() && filter.matches(e))
    {
        overall.add(entry);
        response_time_sum = response_time_sum.saturating_add(entry.response_time);
        if entry.success {
            successes += 1;
        }
        *stats.by_type.entry(entry.usage_type.clone()).or_insert(0) += 1;
        *stats.by_feature.entry(entry.feature.clone()).or_insert(0) += 1;
        by_day.entry(entry.date).or_default().add(entry);

        if entry.date == today {
            stats.today.add(entry);
        }
        if entry.date >= week_start {
            stats.week.add(entry);
        }
        if entry.date >= month_start {
            stats.month.add(entry);
        }
        if entry.date >= current_start {
            current.add(entry);
        } else if entry.date >= previous_start {
            previous.add(entry);
        }
    }

    stats.total_requests = overall.requests;
    stats.total_tokens = overall.tokens;
    stats.total_cost = round_cost(overall.cost);
    if overall.requests > 0 {
        let n = overall.requests as f64;
        stats.avg_response_time = (response_time_sum as f64 / n).round() as u64;
        stats.success_rate = round1(successes as f64 / n * 100.0);
    }
    stats.by_day = by_day
        .into_iter()
        .map(|(date, totals)| DailyUsage {
            date,
            requests: totals.requests,
            tokens: totals.tokens,
            cost: round_cost(totals.cost),
        })
        .collect();
    stats.today = std::mem::take(&mut stats.today).rounded();
    stats.week = std::mem::take(&mut stats.week).rounded();
    stats.month = std::mem::take(&mut stats.month).rounded();
    stats.trends = UsageTrends {
        requests: MetricTrend::new(current.requests as f64, previous.requests as f64),
        tokens: MetricTrend::new(current.tokens as f64, previous.tokens as f64),
        cost: MetricTrend::new(round_cost(current.cost), round_cost(previous.cost)),
    };
    stats
}

/// Requests in the last four 7-day windows ending today, as a percentage of
/// the busiest window.
///
/// Labelled `Week 1` (oldest) to `Week 4`. Empty when every window is zero.
pub fn weekly_usage_series(stats: &AiUsageStats, now: DateTime<Utc>) -> ChartSeries {
    const WEEKS: i64 = 4;
    let today = now.date_naive();

    let windows: Vec<usize> = (0..WEEKS)
        .map(|week| {
            let end = today - Duration::days(7 * (WEEKS - 1 - week));
            let start = end - Duration::days(6);
            stats
                .by_day
                .iter()
                .filter(|day| day.date >= start && day.date <= end)
                .map(|day| day.requests)
                .sum()
        })
        .collect();

    let max = windows.iter().copied().max().unwrap_or(0);
    if max == 0 {
        return Vec::new();
    }

    windows
        .into_iter()
        .enumerate()
        .map(|(i, requests)| {
            let pct = (requests as f64 / max as f64 * 100.0).round();
            ChartPoint::new(format!("Week {}", i + 1), pct)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        "2024-11-15T12:00:00Z".parse().unwrap()
    }

    fn entry(date: &str, feature: &str, success: bool) -> AiUsageEntry {
        let date: NaiveDate = date.parse().unwrap();
        AiUsageEntry {
            id: format!("u-{}-{}", date, feature),
            timestamp: date.and_hms_opt(9, 0, 0).unwrap().and_utc(),
            date,
            usage_type: "chat".to_string(),
            feature: feature.to_string(),
            model: "gpt-4".to_string(),
            prompt_tokens: 60,
            completion_tokens: 40,
            tokens_used: 100,
            cost: 0.01,
            response_time: if success { 300 } else { 100 },
            success,
            error: (!success).then(|| "boom".to_string()),
        }
    }

    #[test]
    fn test_empty_stats_use_sentinels() {
        let stats = compute_usage_stats(&[], &AiUsageFilter::default(), now());
        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.avg_response_time, 0);
        assert!(stats.by_day.is_empty());
        assert!(weekly_usage_series(&stats, now()).is_empty());
    }

    #[test]
    fn test_totals_breakdowns_and_rolling_windows() {
        let entries = vec![
            entry("2024-11-15", "assistant", true),
            entry("2024-11-15", "summaries", false),
            entry("2024-11-09", "assistant", true),
            entry("2024-11-08", "assistant", true),
            entry("2024-10-17", "assistant", true),
            entry("2024-10-16", "assistant", true),
            entry("2024-11-15", "recommendations", true),
        ];
        let stats = compute_usage_stats(&entries, &AiUsageFilter::default(), now());

        assert_eq!(stats.total_requests, 6);
        assert_eq!(stats.total_tokens, 600);
        assert_eq!(stats.total_cost, 0.06);
        assert_eq!(stats.avg_response_time, 267);
        assert_eq!(stats.success_rate, 83.3);
        assert_eq!(stats.by_feature.get("assistant"), Some(&5));
        assert!(!stats.by_feature.contains_key("recommendations"));
        assert_eq!(stats.by_type.get("chat"), Some(&6));

        assert_eq!(stats.today.requests, 2);
        assert_eq!(stats.week.requests, 3);
        assert_eq!(stats.month.requests, 5);

        let days: Vec<_> = stats.by_day.iter().map(|d| d.date.to_string()).collect();
        assert_eq!(
            days,
            vec!["2024-10-16", "2024-10-17", "2024-11-08", "2024-11-09", "2024-11-15"]
        );
        // 2024-10-16 is the first day of the previous window
        assert_eq!(stats.trends.requests.current, 5.0);
        assert_eq!(stats.trends.requests.previous, 1.0);
        assert_eq!(stats.trends.requests.trend, 400);
        assert_eq!(stats.trends.requests.current, stats.month.requests as f64);
    }

    #[test]
    fn test_filter_narrows_entries() {
        let entries = vec![
            entry("2024-11-15", "assistant", true),
            entry("2024-11-15", "summaries", false),
            entry("2024-11-01", "assistant", true),
        ];
        let failed = AiUsageFilter {
            success: Some(false),
            ..Default::default()
        };
        assert_eq!(compute_usage_stats(&entries, &failed, now()).total_requests, 1);

        let since = AiUsageFilter {
            feature: Some("assistant".to_string()),
            start_date: Some("2024-11-10".parse().unwrap()),
            ..Default::default()
        };
        assert_eq!(compute_usage_stats(&entries, &since, now()).total_requests, 1);
    }

    #[test]
    fn test_weekly_series_normalizes_to_busiest_week() {
        let entries = vec![
            entry("2024-11-15", "a", true),
            entry("2024-11-14", "a", true),
            entry("2024-11-09", "a", true),
            entry("2024-11-08", "a", true),
            entry("2024-11-08", "b", true),
            entry("2024-11-08", "c", true),
            entry("2024-11-08", "d", true),
            entry("2024-10-01", "a", true),
        ];
        let stats = compute_usage_stats(&entries, &AiUsageFilter::default(), now());
        let series = weekly_usage_series(&stats, now());
        assert_eq!(
            series,
            vec![
                ChartPoint::new("Week 1", 0.0),
                ChartPoint::new("Week 2", 0.0),
                ChartPoint::new("Week 3", 100.0),
                ChartPoint::new("Week 4", 75.0),
            ]
        );
    }
}
