//! External calendar integration
//!
//! Calendar events reach the core through a [`CalendarSource`]. Their loosely
//! shaped JSON ([`RawCalendarEvent`]) is normalized once into
//! [`CalendarEvent`], and [`convert_calendar_events`] turns workshop-like
//! events into ephemeral [`WorkshopRecord`](crate::types::WorkshopRecord)s.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use workshop_pulse_core::calendar::{convert_calendar_events, RawCalendarEvent};
//!
//! let raw: Vec<RawCalendarEvent> = serde_json::from_str(r#"[
//!     {"id": "abc", "summary": "Rust Workshop", "start": {"dateTime": "2024-11-10T09:00:00Z"},
//!      "end": {"dateTime": "2024-11-10T12:30:00Z"}}
//! ]"#).unwrap();
//! let workshops = convert_calendar_events(&raw, chrono::Utc::now());
//! assert_eq!(workshops[0].duration, "3.5h");
//! ```

mod client;
mod convert;
mod event;
mod source;

pub use client::GoogleCalendarClient;
pub use convert::{convert_calendar_events, is_workshop_like, CALENDAR_ID_PREFIX};
pub use event::{CalendarEvent, EventTime, RawAttendee, RawCalendarEvent, RawEventTime};
pub use source::{CalendarSource, EventQuery, StaticCalendarSource};
