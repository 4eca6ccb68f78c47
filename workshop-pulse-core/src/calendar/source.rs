//! The calendar fetch seam.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use super::event::RawCalendarEvent;
use crate::config::CalendarConfig;
use crate::error::{Error, Result};

/// Window and size of one events request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub time_min: DateTime<Utc>,
    pub time_max: DateTime<Utc>,
    pub max_results: u32,
}

impl EventQuery {
    /// Window around `now` sized by the calendar config.
    pub fn around(now: DateTime<Utc>, config: &CalendarConfig) -> Self {
        Self {
            time_min: now - Duration::days(config.lookback_days),
            time_max: now + Duration::days(config.lookahead_days),
            max_results: config.max_results,
        }
    }
}

/// Something that can list calendar events for an access token.
///
/// Implementations report transport failures as [`Error::Network`], rejected
/// tokens as [`Error::Auth`] and other non-success answers as [`Error::Http`].
#[async_trait]
pub trait CalendarSource: Send + Sync {
    async fn fetch_events(
        &self,
        access_token: &str,
        query: &EventQuery,
    ) -> Result<Vec<RawCalendarEvent>>;
}

/// Serves a fixed list of events, or a fixed failure.
///
/// Used by the CLI `--events` flag and by tests.
pub struct StaticCalendarSource {
    events: Vec<RawCalendarEvent>,
    failure: Option<fn() -> Error>,
}

impl StaticCalendarSource {
    pub fn new(events: Vec<RawCalendarEvent>) -> Self {
        Self {
            events,
            failure: None,
        }
    }

    /// A source whose every fetch fails with `make_error()`.
    pub fn failing(make_error: fn() -> Error) -> Self {
        Self {
            events: Vec::new(),
            failure: Some(make_error),
        }
    }
}

#[async_trait]
impl CalendarSource for StaticCalendarSource {
    async fn fetch_events(
        &self,
        _access_token: &str,
        query: &EventQuery,
    ) -> Result<Vec<RawCalendarEvent>> {
        if let Some(make_error) = self.failure {
            return Err(make_error());
        }
        Ok(self
            .events
            .iter()
            .take(query.max_results as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_window_from_config() {
        let now: DateTime<Utc> = "2024-11-15T00:00:00Z".parse().unwrap();
        let query = EventQuery::around(now, &CalendarConfig::default());
        assert_eq!(query.time_min, now - Duration::days(60));
        assert_eq!(query.time_max, now + Duration::days(30));
        assert_eq!(query.max_results, 250);
    }

    #[tokio::test]
    async fn test_static_source_honors_max_results() {
        let source = StaticCalendarSource::new(vec![RawCalendarEvent::default(); 5]);
        let now = Utc::now();
        let query = EventQuery {
            time_min: now,
            time_max: now,
            max_results: 2,
        };
        assert_eq!(source.fetch_events("token", &query).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failing_source() {
        let source = StaticCalendarSource::failing(|| Error::Auth("revoked".to_string()));
        let query = EventQuery::around(Utc::now(), &CalendarConfig::default());
        assert!(matches!(
            source.fetch_events("token", &query).await,
            Err(Error::Auth(_))
        ));
    }
}
