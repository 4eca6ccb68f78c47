//! Calendar events to workshop records.

use chrono::{DateTime, Utc};

use super::event::{CalendarEvent, RawCalendarEvent};
use crate::format::{format_duration_hours, round1};
use crate::types::{CalendarProvenance, WorkshopRecord, WorkshopStatus, GOOGLE_CALENDAR_SOURCE};

/// Namespace for synced record ids; manual ids are UUIDs and never carry it.
pub const CALENDAR_ID_PREFIX: &str = "gcal_";

/// Positional ids for events without one. Calendar event ids are base32hex,
/// so they never contain `_` and cannot collide with this.
const POSITIONAL_ID_PREFIX: &str = "gcal_idx_";

const WORKSHOP_KEYWORDS: &[&str] = &["workshop", "training", "session", "class"];
const UNTITLED: &str = "Untitled Workshop";

/// Whether an event looks like a teaching session.
///
/// Matches the keywords case-insensitively against title and description,
/// or an explicit `type: "workshop"` tag.
pub fn is_workshop_like(event: &CalendarEvent) -> bool {
    if event
        .kind
        .as_deref()
        .is_some_and(|kind| kind.eq_ignore_ascii_case("workshop"))
    {
        return true;
    }
    let haystacks = [event.title.as_deref(), event.description.as_deref()];
    haystacks.into_iter().flatten().any(|text| {
        let text = text.to_lowercase();
        WORKSHOP_KEYWORDS.iter().any(|keyword| text.contains(keyword))
    })
}

/// Convert raw events into ephemeral workshop records.
///
/// Never fails: events that are not workshop-like are dropped, and
/// malformed times fall back as described on [`CalendarEvent`].
pub fn convert_calendar_events(
    events: &[RawCalendarEvent],
    now: DateTime<Utc>,
) -> Vec<WorkshopRecord> {
    let records: Vec<WorkshopRecord> = events
        .iter()
        .enumerate()
        .map(|(index, raw)| (index, CalendarEvent::normalize(raw, now)))
        .filter(|(_, event)| is_workshop_like(event))
        .map(|(index, event)| to_record(index, event, now))
        .collect();

    tracing::debug!(
        events = events.len(),
        workshops = records.len(),
        "Converted calendar events"
    );

    records
}

fn to_record(index: usize, event: CalendarEvent, now: DateTime<Utc>) -> WorkshopRecord {
    let id = match &event.id {
        Some(id) => format!("{}{}", CALENDAR_ID_PREFIX, id),
        None => format!("{}{}", POSITIONAL_ID_PREFIX, index),
    };

    WorkshopRecord {
        id,
        title: event.title.clone().unwrap_or_else(|| UNTITLED.to_string()),
        students: event.attendee_count,
        duration: duration_label(&event),
        rating: 0.0,
        status: status_at(&event, now),
        date: event.start.date_naive(),
        created_at: event.start,
        source: Some(GOOGLE_CALENDAR_SOURCE.to_string()),
        provenance: Some(CalendarProvenance {
            event_id: event.id,
            html_link: event.html_link,
            location: event.location,
            description: event.description,
        }),
    }
}

fn duration_label(event: &CalendarEvent) -> String {
    let hours = (event.end - event.start).num_seconds() as f64 / 3600.0;
    let hours = round1(hours);
    if hours <= 0.0 {
        "1h".to_string()
    } else {
        format_duration_hours(hours)
    }
}

fn status_at(event: &CalendarEvent, now: DateTime<Utc>) -> WorkshopStatus {
    if now < event.start {
        WorkshopStatus::Scheduled
    } else if now <= event.end {
        WorkshopStatus::InProgress
    } else {
        WorkshopStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::event::{RawAttendee, RawEventTime};
    use chrono::NaiveDate;

    fn now() -> DateTime<Utc> {
        "2024-11-15T12:00:00Z".parse().unwrap()
    }

    fn timed(summary: &str, start: &str, end: &str) -> RawCalendarEvent {
        RawCalendarEvent {
            summary: Some(summary.to_string()),
            start: Some(RawEventTime::Object {
                date_time: Some(start.to_string()),
                date: None,
            }),
            end: Some(RawEventTime::Object {
                date_time: Some(end.to_string()),
                date: None,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_filters_non_workshop_events() {
        let events = vec![
            timed("Team standup", "2024-11-10T09:00:00Z", "2024-11-10T09:15:00Z"),
            timed("Python WORKSHOP", "2024-11-10T10:00:00Z", "2024-11-10T12:00:00Z"),
            RawCalendarEvent {
                description: Some("Intro training for new hires".to_string()),
                ..timed("Onboarding", "2024-11-11T10:00:00Z", "2024-11-11T11:00:00Z")
            },
            RawCalendarEvent {
                kind: Some("workshop".to_string()),
                ..timed("Office hours", "2024-11-12T10:00:00Z", "2024-11-12T11:00:00Z")
            },
        ];

        let records = convert_calendar_events(&events, now());
        let titles: Vec<_> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Python WORKSHOP", "Onboarding", "Office hours"]);
    }

    #[test]
    fn test_record_fields() {
        let mut event = timed("Rust class", "2024-11-10T09:00:00Z", "2024-11-10T13:30:00Z");
        event.id = Some("evt123".to_string());
        event.html_link = Some("https://calendar.example/evt123".to_string());
        event.location = Some("Room 4".to_string());
        event.attendees = Some(vec![RawAttendee::default(); 12]);

        let record = &convert_calendar_events(&[event], now())[0];
        assert_eq!(record.id, "gcal_evt123");
        assert_eq!(record.duration, "4.5h");
        assert_eq!(record.students, 12);
        assert_eq!(record.rating, 0.0);
        assert_eq!(record.status, WorkshopStatus::Completed);
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 11, 10).unwrap());
        assert_eq!(record.source.as_deref(), Some(GOOGLE_CALENDAR_SOURCE));

        let provenance = record.provenance.as_ref().unwrap();
        assert_eq!(provenance.event_id.as_deref(), Some("evt123"));
        assert_eq!(provenance.location.as_deref(), Some("Room 4"));
    }

    #[test]
    fn test_positional_id_when_event_has_none() {
        let events = vec![
            timed("Lunch", "2024-11-10T12:00:00Z", "2024-11-10T13:00:00Z"),
            timed("Data session", "2024-11-10T14:00:00Z", "2024-11-10T15:00:00Z"),
        ];
        let records = convert_calendar_events(&events, now());
        assert_eq!(records[0].id, "gcal_idx_1");
    }

    #[test]
    fn test_positional_id_does_not_collide_with_numeric_event_id() {
        let mut numbered = timed("SQL class", "2024-11-10T09:00:00Z", "2024-11-10T10:00:00Z");
        numbered.id = Some("1".to_string());
        let events = vec![
            numbered,
            timed("Data session", "2024-11-10T14:00:00Z", "2024-11-10T15:00:00Z"),
        ];

        let ids: Vec<_> = convert_calendar_events(&events, now())
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["gcal_1", "gcal_idx_1"]);
    }

    #[test]
    fn test_zero_length_event_shows_one_hour() {
        let events = vec![
            timed("Workshop", "2024-11-10T09:00:00Z", "2024-11-10T09:00:00Z"),
            timed("Workshop", "2024-11-10T09:00:00Z", "2024-11-10T08:00:00Z"),
        ];
        let records = convert_calendar_events(&events, now());
        assert_eq!(records[0].duration, "1h");
        assert_eq!(records[1].duration, "1h");
    }

    #[test]
    fn test_status_follows_now() {
        let events = vec![
            timed("Future workshop", "2024-11-20T09:00:00Z", "2024-11-20T10:00:00Z"),
            timed("Live workshop", "2024-11-15T11:00:00Z", "2024-11-15T13:00:00Z"),
            timed("Edge workshop", "2024-11-15T10:00:00Z", "2024-11-15T12:00:00Z"),
            timed("Past workshop", "2024-11-01T09:00:00Z", "2024-11-01T10:00:00Z"),
        ];
        let statuses: Vec<_> = convert_calendar_events(&events, now())
            .into_iter()
            .map(|r| r.status)
            .collect();
        assert_eq!(
            statuses,
            vec![
                WorkshopStatus::Scheduled,
                WorkshopStatus::InProgress,
                WorkshopStatus::InProgress,
                WorkshopStatus::Completed,
            ]
        );
    }

    #[test]
    fn test_all_day_event() {
        let event = RawCalendarEvent {
            summary: Some("Training day".to_string()),
            start: Some(RawEventTime::Text("2024-11-18".to_string())),
            end: Some(RawEventTime::Text("2024-11-19".to_string())),
            ..Default::default()
        };
        let record = &convert_calendar_events(&[event], now())[0];
        assert_eq!(record.duration, "24h");
        assert_eq!(record.status, WorkshopStatus::Scheduled);
        assert_eq!(record.title, "Training day");
    }

    #[test]
    fn test_untitled_workshop_from_description() {
        let event = RawCalendarEvent {
            description: Some("Hands-on session".to_string()),
            ..Default::default()
        };
        let record = &convert_calendar_events(&[event], now())[0];
        assert_eq!(record.title, "Untitled Workshop");
        assert_eq!(record.date, now().date_naive());
        assert_eq!(record.duration, "1h");
    }
}
