//! Compact duration syntax for `!remind`: `30s`, `10m`, `2h`, `1d`, `1w`, or
//! combinations such as `1h30m`.

use chrono::Duration;
use once_cell::sync::Lazy;
use regex::Regex;

static FULL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d+[smhdw])+$").expect("Invalid regex"));
static PART_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)([smhdw])").expect("Invalid regex"));

/// Longest reminder we accept
pub const MAX_DURATION_DAYS: i64 = 365;

/// Parse a compact duration; `None` for malformed, zero or over-long input
pub fn parse_duration(input: &str) -> Option<Duration> {
    let input = input.trim().to_lowercase();
    if !FULL_PATTERN.is_match(&input) {
        return None;
    }

    let mut total_secs: i64 = 0;
    for cap in PART_PATTERN.captures_iter(&input) {
        let amount: i64 = cap[1].parse().ok()?;
        let unit_secs = match &cap[2] {
            "s" => 1,
            "m" => 60,
            "h" => 3_600,
            "d" => 86_400,
            _ => 604_800,
        };
        total_secs = total_secs.checked_add(amount.checked_mul(unit_secs)?)?;
    }

    if total_secs == 0 || total_secs > MAX_DURATION_DAYS * 86_400 {
        return None;
    }
    Some(Duration::seconds(total_secs))
}

/// Human readable form, largest units first: `1d 2h 5m`
pub fn format_duration(duration: Duration) -> String {
    let mut secs = duration.num_seconds().max(0);
    if secs == 0 {
        return "0s".to_string();
    }

    let mut parts = Vec::new();
    for (unit, label) in [(86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")] {
        if secs >= unit {
            parts.push(format!("{}{}", secs / unit, label));
            secs %= unit;
        }
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_units() {
        assert_eq!(parse_duration("10m"), Some(Duration::minutes(10)));
        assert_eq!(parse_duration("30s"), Some(Duration::seconds(30)));
        assert_eq!(parse_duration("2H"), Some(Duration::hours(2)));
        assert_eq!(parse_duration("1w"), Some(Duration::days(7)));
    }

    #[test]
    fn test_parse_combined() {
        assert_eq!(
            parse_duration("1h30m"),
            Some(Duration::minutes(90))
        );
        assert_eq!(
            parse_duration("1d2h3m4s"),
            Some(Duration::seconds(86_400 + 7_200 + 180 + 4))
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("10"), None);
        assert_eq!(parse_duration("m10"), None);
        assert_eq!(parse_duration("10 m"), None);
        assert_eq!(parse_duration("0m"), None);
        assert_eq!(parse_duration("366d"), None);
        assert_eq!(parse_duration("99999999999999999999s"), None);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::minutes(10)), "10m");
        assert_eq!(format_duration(Duration::seconds(90_061)), "1d 1h 1m 1s");
        assert_eq!(format_duration(Duration::zero()), "0s");
    }
}
