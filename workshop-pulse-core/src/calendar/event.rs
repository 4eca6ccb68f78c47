//! Raw and normalized calendar event shapes.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Event time as calendars send it: `{"dateTime": ...}`, `{"date": ...}`
/// or a bare string holding either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawEventTime {
    Object {
        #[serde(rename = "dateTime", default)]
        date_time: Option<String>,
        #[serde(default)]
        date: Option<String>,
    },
    Text(String),
}

/// Attendee entry; only its presence is counted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAttendee {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub response_status: Option<String>,
}

/// A calendar event exactly as fetched. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCalendarEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start: Option<RawEventTime>,
    #[serde(default)]
    pub end: Option<RawEventTime>,
    #[serde(default)]
    pub attendees: Option<Vec<RawAttendee>>,
    #[serde(default)]
    pub html_link: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Explicit tag, `"workshop"` marks an event regardless of its title
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// A normalized event time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTime {
    /// A precise instant
    At(DateTime<Utc>),
    /// A date-only (all-day) value
    AllDay(NaiveDate),
}

impl EventTime {
    /// Parse an RFC 3339 timestamp, a naive `YYYY-MM-DDTHH:MM:SS` (taken as
    /// UTC) or a `YYYY-MM-DD` date.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(EventTime::At(dt.with_timezone(&Utc)));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
            return Some(EventTime::At(naive.and_utc()));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .map(EventTime::AllDay)
    }

    fn from_raw(raw: &RawEventTime) -> Option<Self> {
        match raw {
            RawEventTime::Object { date_time, date } => date_time
                .as_deref()
                .and_then(Self::parse)
                .or_else(|| date.as_deref().and_then(Self::parse)),
            RawEventTime::Text(text) => Self::parse(text),
        }
    }

    /// The instant this time denotes; all-day values start at midnight UTC.
    pub fn instant(&self) -> DateTime<Utc> {
        match self {
            EventTime::At(dt) => *dt,
            EventTime::AllDay(date) => date.and_time(NaiveTime::MIN).and_utc(),
        }
    }
}

/// An event after boundary normalization.
///
/// `start` and `end` are always present: a missing start falls back to the
/// end, then to the fetch time; a missing end falls back to the start.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub attendee_count: u32,
    pub html_link: Option<String>,
    pub location: Option<String>,
    pub kind: Option<String>,
}

impl CalendarEvent {
    /// Normalize a raw event; unparseable times count as missing.
    pub fn normalize(raw: &RawCalendarEvent, now: DateTime<Utc>) -> Self {
        let start = raw.start.as_ref().and_then(EventTime::from_raw);
        let end = raw.end.as_ref().and_then(EventTime::from_raw);

        let start = start.or(end).map(|t| t.instant()).unwrap_or(now);
        let end = end.map(|t| t.instant()).unwrap_or(start);

        let title = [raw.summary.as_deref(), raw.title.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|t| !t.is_empty())
            .map(str::to_string);

        Self {
            id: raw.id.clone().filter(|id| !id.is_empty()),
            title,
            description: raw.description.clone(),
            start,
            end,
            attendee_count: raw
                .attendees
                .as_ref()
                .map(|a| a.len() as u32)
                .unwrap_or(0),
            html_link: raw.html_link.clone(),
            location: raw.location.clone(),
            kind: raw.kind.clone(),
        }
    }
}
