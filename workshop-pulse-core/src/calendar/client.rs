//! HTTP client for the Google Calendar events API
//!
//! Only the `events.list` call is used. OAuth token exchange happens
//! elsewhere; this client takes a ready access token per call.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use serde::Deserialize;

use super::event::RawCalendarEvent;
use super::source::{CalendarSource, EventQuery};
use crate::config::CalendarConfig;
use crate::error::{Error, Result};

/// Response from GET /calendars/{id}/events
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventsResponse {
    #[serde(default)]
    items: Vec<RawCalendarEvent>,
}

/// Google Calendar implementation of [`CalendarSource`]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    events_url: String,
}

impl GoogleCalendarClient {
    /// Create a client from configuration
    ///
    /// The per-request timeout is the configured fetch budget; the dashboard
    /// additionally bounds the retried call as a whole.
    pub fn new(config: &CalendarConfig) -> Result<Self> {
        let base_url = config.api_base_url.trim_end_matches('/');
        if base_url.is_empty() {
            return Err(Error::Config(
                "calendar.api_base_url must not be empty".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            events_url: format!(
                "{}/calendars/{}/events",
                base_url,
                urlencoding::encode(&config.calendar_id)
            ),
        })
    }

    /// The events endpoint this client calls
    pub fn events_url(&self) -> &str {
        &self.events_url
    }
}

#[async_trait]
impl CalendarSource for GoogleCalendarClient {
    async fn fetch_events(
        &self,
        access_token: &str,
        query: &EventQuery,
    ) -> Result<Vec<RawCalendarEvent>> {
        if access_token.trim().is_empty() {
            return Err(Error::Auth("missing access token".to_string()));
        }

        let response = self
            .http_client
            .get(&self.events_url)
            .bearer_auth(access_token)
            .query(&[
                ("timeMin", query.time_min.to_rfc3339()),
                ("timeMax", query.time_max.to_rfc3339()),
                ("maxResults", query.max_results.to_string()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let body: EventsResponse = response.json().await?;
            tracing::debug!(events = body.items.len(), "Fetched calendar events");
            return Ok(body.items);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown".to_string());
        Err(status_error(status, error_text))
    }
}

/// Map a non-success status to the error taxonomy
fn status_error(status: StatusCode, body: String) -> Error {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::Auth(format!("calendar API rejected token ({}): {}", status, body))
        }
        _ => Error::Http {
            status: status.as_u16(),
            message: body,
        },
    }
}
