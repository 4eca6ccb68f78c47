//! Dashboard aggregation
//!
//! One request reads the stored manual workshops, fetches calendar events
//! (retried with backoff, bounded by a timeout), merges both lists and
//! derives every statistic the dashboard shows. A failed or slow calendar
//! fetch degrades the answer to stored data plus a warning.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::analytics::{
    compute_trend_stats, generate_time_chart_series, workshop_stats, ChartRange, TrendStats,
    WorkshopStats,
};
use crate::calendar::{convert_calendar_events, CalendarSource, EventQuery};
use crate::clock::Clock;
use crate::config::CalendarConfig;
use crate::error::Result;
use crate::merge::merge_workshops;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::store::WorkshopStore;
use crate::types::{ChartSeries, WorkshopRecord};
use crate::usage::{weekly_usage_series, AiUsageFilter, AiUsageLedger, AiUsageStats};

/// Parameters of one dashboard request.
#[derive(Debug, Clone, Default)]
pub struct DashboardRequest {
    /// Calendar access token; without one the calendar is not queried
    pub access_token: Option<String>,
    /// Range of the workshop hours chart
    pub range: ChartRange,
    /// Budget for the whole calendar fetch; defaults to `calendar.timeout_secs`
    pub fetch_timeout: Option<Duration>,
}

/// Everything the dashboard shows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub workshops: WorkshopStats,
    pub trends: TrendStats,
    pub range: ChartRange,
    pub chart: ChartSeries,
    pub ai_usage: AiUsageStats,
    pub ai_weekly: ChartSeries,
    /// Stored manual records before merging
    pub manual_count: usize,
    /// Calendar-derived records before merging
    pub external_count: usize,
    /// Set when the calendar could not be read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

pub struct DashboardService {
    store: Arc<dyn WorkshopStore>,
    ledger: Arc<AiUsageLedger>,
    calendar: Option<Arc<dyn CalendarSource>>,
    clock: Arc<dyn Clock>,
    calendar_config: CalendarConfig,
    retry_policy: RetryPolicy,
}

impl DashboardService {
    pub fn new(
        store: Arc<dyn WorkshopStore>,
        ledger: Arc<AiUsageLedger>,
        clock: Arc<dyn Clock>,
        calendar_config: CalendarConfig,
    ) -> Self {
        let retry_policy = calendar_config.retry_policy();
        Self {
            store,
            ledger,
            calendar: None,
            clock,
            calendar_config,
            retry_policy,
        }
    }

    /// Query `source` whenever a request carries an access token
    pub fn with_calendar(mut self, source: Arc<dyn CalendarSource>) -> Self {
        self.calendar = Some(source);
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Build the dashboard.
    ///
    /// Only a failure to read the local store is an error; calendar failures
    /// are reported through [`DashboardStats::warning`].
    pub async fn dashboard(&self, request: &DashboardRequest) -> Result<DashboardStats> {
        let now = self.clock.now();
        let manual = self.store.list()?;

        let (external, warning) = match self.external_workshops(request).await {
            Ok(external) => (external, None),
            Err(message) => {
                tracing::warn!(warning = %message, "Dashboard degraded to stored workshops");
                (Vec::new(), Some(message))
            }
        };

        let manual_count = manual.len();
        let external_count = external.len();
        let merged = merge_workshops([manual, external]);

        let ai_usage = self.ledger.stats(&AiUsageFilter::default());
        let ai_weekly = weekly_usage_series(&ai_usage, now);

        tracing::info!(
            manual = manual_count,
            external = external_count,
            merged = merged.len(),
            range = %request.range,
            degraded = warning.is_some(),
            "Dashboard computed"
        );

        Ok(DashboardStats {
            workshops: workshop_stats(&merged),
            trends: compute_trend_stats(&merged, now),
            range: request.range,
            chart: generate_time_chart_series(&merged, request.range, now),
            ai_usage,
            ai_weekly,
            manual_count,
            external_count,
            warning,
        })
    }

    /// Fetch and convert calendar workshops; the error is the warning text.
    async fn external_workshops(
        &self,
        request: &DashboardRequest,
    ) -> std::result::Result<Vec<WorkshopRecord>, String> {
        let (Some(source), Some(token)) = (&self.calendar, request.access_token.as_deref()) else {
            return Ok(Vec::new());
        };

        let now = self.clock.now();
        let query = EventQuery::around(now, &self.calendar_config);
        let budget = request
            .fetch_timeout
            .unwrap_or_else(|| self.calendar_config.timeout());

        let fetch = retry_with_backoff(&self.retry_policy, || source.fetch_events(token, &query));
        match tokio::time::timeout(budget, fetch).await {
            Ok(Ok(events)) => Ok(convert_calendar_events(&events, now)),
            Ok(Err(e)) => Err(format!("calendar unavailable: {}", e)),
            Err(_) => Err(format!(
                "calendar fetch timed out after {}ms",
                budget.as_millis()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{RawCalendarEvent, StaticCalendarSource};
    use crate::clock::{FixedClock, SequentialIds};
    use crate::error::{Error, NetworkErrorKind};
    use crate::store::InMemoryWorkshopStore;
    use crate::usage::PricingTable;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock("2024-11-15T12:00:00Z".parse().unwrap()))
    }

    fn service() -> DashboardService {
        let ledger = AiUsageLedger::new(
            100,
            PricingTable::default(),
            clock(),
            Arc::new(SequentialIds::new("u")),
        );
        DashboardService::new(
            Arc::new(InMemoryWorkshopStore::new(100)),
            Arc::new(ledger),
            clock(),
            CalendarConfig::default(),
        )
    }

    fn workshop_event() -> RawCalendarEvent {
        serde_json::from_value(serde_json::json!({
            "id": "evt1",
            "summary": "Rust Workshop",
            "start": {"dateTime": "2024-11-14T09:00:00Z"},
            "end": {"dateTime": "2024-11-14T11:00:00Z"}
        }))
        .unwrap()
    }

    struct CountingSource {
        calls: AtomicU32,
    }

    #[async_trait]
    impl CalendarSource for CountingSource {
        async fn fetch_events(
            &self,
            _access_token: &str,
            _query: &EventQuery,
        ) -> Result<Vec<RawCalendarEvent>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::Network {
                kind: NetworkErrorKind::ConnectionRefused,
                message: "refused".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_without_token_calendar_is_skipped() {
        let service =
            service().with_calendar(Arc::new(StaticCalendarSource::new(vec![workshop_event()])));
        let stats = service.dashboard(&DashboardRequest::default()).await.unwrap();
        assert_eq!(stats.external_count, 0);
        assert!(stats.warning.is_none());
        assert_eq!(stats.chart.len(), 7);
    }

    #[tokio::test]
    async fn test_calendar_events_are_merged() {
        let service =
            service().with_calendar(Arc::new(StaticCalendarSource::new(vec![workshop_event()])));
        let request = DashboardRequest {
            access_token: Some("token".to_string()),
            ..Default::default()
        };
        let stats = service.dashboard(&request).await.unwrap();
        assert_eq!(stats.external_count, 1);
        assert_eq!(stats.workshops.total, 1);
        assert_eq!(stats.workshops.completed, 1);
        assert_eq!(stats.chart[5].value, 2.0);
    }

    #[tokio::test]
    async fn test_auth_failure_degrades_with_warning() {
        let service = service().with_calendar(Arc::new(StaticCalendarSource::failing(|| {
            Error::Auth("token revoked".to_string())
        })));
        let request = DashboardRequest {
            access_token: Some("token".to_string()),
            ..Default::default()
        };
        let stats = service.dashboard(&request).await.unwrap();
        assert_eq!(stats.external_count, 0);
        let warning = stats.warning.unwrap();
        assert!(warning.contains("token revoked"), "{}", warning);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_then_times_out() {
        let source = Arc::new(CountingSource {
            calls: AtomicU32::new(0),
        });
        let service = service().with_calendar(source.clone());
        let request = DashboardRequest {
            access_token: Some("token".to_string()),
            fetch_timeout: Some(Duration::from_millis(2500)),
            ..Default::default()
        };
        let stats = service.dashboard(&request).await.unwrap();
        assert!(stats.warning.unwrap().contains("timed out"));
        // attempts at 0ms and 1000ms; the 2000ms backoff outlives the budget
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_budget_exhausted_reports_last_error() {
        let source = Arc::new(CountingSource {
            calls: AtomicU32::new(0),
        });
        let service = service()
            .with_calendar(source.clone())
            .with_retry_policy(RetryPolicy {
                max_retries: 1,
                base_delay: Duration::from_millis(10),
            });
        let request = DashboardRequest {
            access_token: Some("token".to_string()),
            ..Default::default()
        };
        let stats = service.dashboard(&request).await.unwrap();
        assert!(stats.warning.unwrap().contains("connection refused"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }
}
