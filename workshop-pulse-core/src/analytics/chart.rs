//! Day-bucketed chart series of workshop hours.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::format::round1;
use crate::types::{ChartPoint, ChartSeries, WorkshopRecord};

/// Named chart range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartRange {
    #[default]
    Week,
    Month,
    Year,
}

impl ChartRange {
    /// Number of days covered, today included
    pub fn days(&self) -> i64 {
        match self {
            ChartRange::Week => 7,
            ChartRange::Month => 30,
            ChartRange::Year => 365,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartRange::Week => "week",
            ChartRange::Month => "month",
            ChartRange::Year => "year",
        }
    }
}

impl std::fmt::Display for ChartRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ChartRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "week" => Ok(ChartRange::Week),
            "month" => Ok(ChartRange::Month),
            "year" => Ok(ChartRange::Year),
            _ => Err(format!("unknown chart range: {}", s)),
        }
    }
}

/// Sum duration hours per day over `range`, oldest day first.
///
/// `week` always yields seven points labelled by weekday, zero-filled.
/// `month` and `year` yield an empty series when no record falls in range;
/// otherwise every day of the range is present, labelled `%b %d`.
pub fn generate_time_chart_series(
    workshops: &[WorkshopRecord],
    range: ChartRange,
    now: DateTime<Utc>,
) -> ChartSeries {
    let today = now.date_naive();
    let first_day = today - Duration::days(range.days() - 1);

    let mut hours_by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    let mut in_range = 0usize;
    for workshop in workshops {
        if workshop.date < first_day || workshop.date > today {
            continue;
        }
        in_range += 1;
        *hours_by_day.entry(workshop.date).or_insert(0.0) +=
            workshop.duration_hours().unwrap_or(0.0);
    }

    if in_range == 0 && range != ChartRange::Week {
        return Vec::new();
    }

    let label_format = match range {
        ChartRange::Week => "%a",
        ChartRange::Month | ChartRange::Year => "%b %d",
    };

    first_day
        .iter_days()
        .take(range.days() as usize)
        .map(|day| {
            let hours = hours_by_day.get(&day).copied().unwrap_or(0.0);
            ChartPoint::new(day.format(label_format).to_string(), round1(hours))
        })
        .collect()
}
