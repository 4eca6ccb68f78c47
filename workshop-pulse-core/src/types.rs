//! Core domain types for workshop-pulse
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Workshop** | A scheduled or completed teaching session, whatever its provenance |
//! | **Source** | Provenance tag; absent for manual records, `google_calendar` for synced ones |
//! | **Dedup key** | `(lowercased title, date)` identifying "the same" workshop across sources |
//! | **Usage entry** | One metered AI call recorded in the ledger |
//!
//! Every shape here serializes with camelCase field names, which is what the
//! CLI and any HTTP adapter exchange.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Source tag stamped on records synthesized from calendar events.
pub const GOOGLE_CALENDAR_SOURCE: &str = "google_calendar";

/// Usage feature that is tracked but hidden from every report.
pub const HIDDEN_USAGE_FEATURE: &str = "recommendations";

// ============================================
// Workshops
// ============================================

/// Lifecycle status of a workshop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkshopStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
}

impl WorkshopStatus {
    /// Returns the identifier used in storage
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkshopStatus::Scheduled => "scheduled",
            WorkshopStatus::InProgress => "in_progress",
            WorkshopStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for WorkshopStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for WorkshopStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(WorkshopStatus::Scheduled),
            "in_progress" => Ok(WorkshopStatus::InProgress),
            "completed" => Ok(WorkshopStatus::Completed),
            _ => Err(format!("unknown workshop status: {}", s)),
        }
    }
}

/// Original calendar metadata kept on a synced record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarProvenance {
    /// Event id in the originating calendar
    pub event_id: Option<String>,
    /// Link to the event in the calendar UI
    pub html_link: Option<String>,
    /// Free-form event location
    pub location: Option<String>,
    /// Event description
    pub description: Option<String>,
}

/// A workshop, either entered by hand or derived from a calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkshopRecord {
    /// Unique id; synced records are namespaced with `gcal_`
    pub id: String,
    pub title: String,
    pub students: u32,
    /// Hours with an `h` suffix, e.g. `"4.5h"`
    pub duration: String,
    /// 0 to 5, 0 when unknown
    pub rating: f64,
    pub status: WorkshopStatus,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    /// Provenance tag; `None` means manually created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Calendar metadata for synced records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<CalendarProvenance>,
}

impl WorkshopRecord {
    /// True for records a person entered (no provenance tag).
    pub fn is_manual(&self) -> bool {
        self.source.is_none()
    }

    /// Duration in hours, if the duration string parses.
    pub fn duration_hours(&self) -> Option<f64> {
        crate::format::parse_duration_hours(&self.duration)
    }
}

/// Duration as supplied by a caller: `"3h"`, `"2.5"` or `2.5`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DurationInput {
    Hours(f64),
    Text(String),
}

/// Caller input for a manually created workshop, validated by
/// [`WorkshopRegistry::create`](crate::store::WorkshopRegistry::create).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkshop {
    pub title: String,
    #[serde(default)]
    pub students: Option<u32>,
    #[serde(default)]
    pub duration: Option<DurationInput>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub status: Option<WorkshopStatus>,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub date: Option<String>,
    /// RFC 3339; used for `date` when that is absent
    #[serde(default)]
    pub start_time: Option<String>,
}

// ============================================
// AI usage
// ============================================

/// One metered AI call as stored in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiUsageEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// UTC date of `timestamp`; rolling totals are measured on this
    pub date: NaiveDate,
    /// Usage category, e.g. `chat`
    #[serde(rename = "type")]
    pub usage_type: String,
    /// Product feature tag
    pub feature: String,
    pub model: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub tokens_used: u64,
    /// USD
    pub cost: f64,
    /// Milliseconds
    pub response_time: u64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AiUsageEntry {
    /// Entries that are recorded but never reported.
    pub fn is_hidden(&self) -> bool {
        self.feature == HIDDEN_USAGE_FEATURE
    }
}

/// Caller input for [`AiUsageLedger::log`](crate::usage::AiUsageLedger::log).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAiUsage {
    #[serde(rename = "type")]
    pub usage_type: String,
    pub feature: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub prompt_tokens: Option<u64>,
    #[serde(default)]
    pub completion_tokens: Option<u64>,
    #[serde(default)]
    pub tokens_used: Option<u64>,
    /// Computed from the pricing table when omitted
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub response_time: Option<u64>,
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

fn default_success() -> bool {
    true
}

impl NewAiUsage {
    /// A successful call with known token counts.
    pub fn success(
        usage_type: &str,
        feature: &str,
        model: &str,
        prompt_tokens: u64,
        completion_tokens: u64,
    ) -> Self {
        Self {
            usage_type: usage_type.to_string(),
            feature: feature.to_string(),
            model: Some(model.to_string()),
            prompt_tokens: Some(prompt_tokens),
            completion_tokens: Some(completion_tokens),
            tokens_used: None,
            cost: None,
            response_time: None,
            success: true,
            error: None,
        }
    }

    /// A failed call carrying its error message.
    pub fn failure(usage_type: &str, feature: &str, model: &str, error: &str) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            ..Self::success(usage_type, feature, model, 0, 0)
        }
    }
}

// ============================================
// Charts
// ============================================

/// One bucket of a chart series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

impl ChartPoint {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Ordered list of chart buckets, oldest first.
pub type ChartSeries = Vec<ChartPoint>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            WorkshopStatus::Scheduled,
            WorkshopStatus::InProgress,
            WorkshopStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<WorkshopStatus>(), Ok(status));
        }
        assert!("cancelled".parse::<WorkshopStatus>().is_err());
    }

    #[test]
    fn test_record_serializes_camel_case_without_source() {
        let record = WorkshopRecord {
            id: "w1".to_string(),
            title: "Rust Basics".to_string(),
            students: 4,
            duration: "2h".to_string(),
            rating: 4.5,
            status: WorkshopStatus::InProgress,
            date: NaiveDate::from_ymd_opt(2024, 11, 10).unwrap(),
            created_at: "2024-11-01T10:00:00Z".parse().unwrap(),
            source: None,
            provenance: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["createdAt"], "2024-11-01T10:00:00Z");
        assert_eq!(json["status"], "in_progress");
        assert_eq!(json["date"], "2024-11-10");
        assert!(json.get("source").is_none());
    }

    #[test]
    fn test_new_usage_defaults_success() {
        let usage: NewAiUsage =
            serde_json::from_str(r#"{"type":"chat","feature":"assistant","tokensUsed":42}"#)
                .unwrap();
        assert!(usage.success);
        assert_eq!(usage.tokens_used, Some(42));
        assert!(usage.model.is_none());
    }

    #[test]
    fn test_duration_input_accepts_number_or_text() {
        let n: DurationInput = serde_json::from_str("2.5").unwrap();
        let t: DurationInput = serde_json::from_str(r#""3h""#).unwrap();
        assert_eq!(n, DurationInput::Hours(2.5));
        assert_eq!(t, DurationInput::Text("3h".to_string()));
    }
}
