//! Numeric and duration helpers shared by the aggregators.

/// Parse the leading number of a duration string such as `"4.5h"`.
///
/// Accepts an optional `h` suffix and surrounding whitespace. Returns `None`
/// when there is no leading number or the value is negative.
pub fn parse_duration_hours(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let numeric_len = trimmed
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || *c == '.' || (*i == 0 && *c == '-'))
        .map(|(i, c)| i + c.len_utf8())
        .last()?;
    let value: f64 = trimmed[..numeric_len].parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some(value)
}

/// Format hours the way records store them (`4.5` -> `"4.5h"`, `2.0` -> `"2h"`).
pub fn format_duration_hours(hours: f64) -> String {
    format!("{}h", round1(hours))
}

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round a USD amount to cents-of-cents (4 places) for display totals.
pub fn round_cost(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Period-over-period change in whole percent.
///
/// With no previous value the trend is 100 for any growth and 0 otherwise.
pub fn trend_percent(current: f64, previous: f64) -> i64 {
    if previous > 0.0 {
        (((current - previous) / previous) * 100.0).round() as i64
    } else if current > 0.0 {
        100
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_hours() {
        assert_eq!(parse_duration_hours("4.5h"), Some(4.5));
        assert_eq!(parse_duration_hours("2"), Some(2.0));
        assert_eq!(parse_duration_hours(" 3h "), Some(3.0));
        assert_eq!(parse_duration_hours("1.5 hours"), Some(1.5));
        assert_eq!(parse_duration_hours("h"), None);
        assert_eq!(parse_duration_hours(""), None);
        assert_eq!(parse_duration_hours("-2h"), None);
        assert_eq!(parse_duration_hours("abc"), None);
    }

    #[test]
    fn test_format_duration_hours() {
        assert_eq!(format_duration_hours(4.5), "4.5h");
        assert_eq!(format_duration_hours(2.0), "2h");
        assert_eq!(format_duration_hours(1.25), "1.3h");
    }

    #[test]
    fn test_trend_percent_sentinels() {
        assert_eq!(trend_percent(10.0, 0.0), 100);
        assert_eq!(trend_percent(0.0, 0.0), 0);
        assert_eq!(trend_percent(15.0, 10.0), 50);
        assert_eq!(trend_percent(5.0, 10.0), -50);
        assert_eq!(trend_percent(1.0, 3.0), -67);
    }
}
