//! Time range parsing for metric queries
//!
//! Grammar accepted by [`parse_time_expression`]:
//!
//! ```text
//! expr     := relative | absolute
//! relative := <int> "h"          hours before now
//!           | <int> "d"          days before now
//! absolute := ISO-8601 timestamp, "Z" or explicit offset, or naive (taken as UTC)
//! ```
//!
//! End boundaries only accept the absolute form, see [`parse_absolute_time`].

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

use crate::error::{CoreError, Result};

/// Offsets without a colon, such as `+0000`, which RFC 3339 rejects
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a start-of-range expression relative to `now`.
///
/// ```rust
/// use chrono::{Duration, TimeZone, Utc};
/// use oci_mcp_core::time::parse_time_expression;
///
/// let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
/// assert_eq!(parse_time_expression("24h", now).unwrap(), now - Duration::hours(24));
/// assert_eq!(parse_time_expression("7d", now).unwrap(), now - Duration::days(7));
/// ```
pub fn parse_time_expression(expr: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let expr = expr.trim();

    if let Some(hours) = expr.strip_suffix('h') {
        let hours = parse_amount(expr, hours)?;
        return offset(expr, now, Duration::try_hours(hours));
    }

    if let Some(days) = expr.strip_suffix('d') {
        let days = parse_amount(expr, days)?;
        return offset(expr, now, Duration::try_days(days));
    }

    parse_absolute_time(expr)
}

/// Parse an absolute ISO-8601 timestamp.
///
/// A trailing `Z` is UTC; timestamps without an offset are taken as UTC.
pub fn parse_absolute_time(expr: &str) -> Result<DateTime<Utc>> {
    let expr = expr.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(expr) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(expr, format) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(expr, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(expr, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    Err(CoreError::MalformedInput(format!(
        "Invalid isoformat string: '{}'",
        expr
    )))
}

fn parse_amount(expr: &str, digits: &str) -> Result<i64> {
    digits.trim().parse::<i64>().map_err(|e| {
        CoreError::MalformedInput(format!("Invalid time expression '{}': {}", expr, e))
    })
}

fn offset(expr: &str, now: DateTime<Utc>, delta: Option<Duration>) -> Result<DateTime<Utc>> {
    delta
        .and_then(|delta| now.checked_sub_signed(delta))
        .ok_or_else(|| {
            CoreError::MalformedInput(format!("Time expression '{}' is out of range", expr))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_relative_hours() {
        let start = parse_time_expression("24h", now()).unwrap();
        assert_eq!(start, now() - Duration::hours(24));

        let start = parse_time_expression("1h", now()).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 6, 15, 8, 30, 0).unwrap());
    }

    #[test]
    fn test_relative_days() {
        let start = parse_time_expression("3d", now()).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 6, 12, 9, 30, 0).unwrap());
    }

    #[test]
    fn test_zero_offset_is_now() {
        assert_eq!(parse_time_expression("0h", now()).unwrap(), now());
    }

    #[test]
    fn test_absolute_with_z_suffix() {
        let start = parse_time_expression("2025-06-14T00:00:00Z", now()).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 6, 14, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_absolute_with_offset_normalized_to_utc() {
        let start = parse_time_expression("2025-06-14T02:00:00+02:00", now()).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 6, 14, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_absolute_with_basic_offset() {
        let start = parse_absolute_time("2025-01-01T00:00:00+0000").unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());

        let start = parse_absolute_time("2025-01-01T05:30:00.250+0530").unwrap();
        assert_eq!(
            start,
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::milliseconds(250)
        );
    }

    #[test]
    fn test_absolute_naive_is_utc() {
        let start = parse_absolute_time("2025-06-14T06:15:30").unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 6, 14, 6, 15, 30).unwrap());

        let start = parse_absolute_time("2025-06-14").unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 6, 14, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_malformed_numeric_offset() {
        let err = parse_time_expression("abch", now()).unwrap_err();
        assert!(matches!(err, CoreError::MalformedInput(_)));
        assert!(err.to_string().contains("abch"));
    }

    #[test]
    fn test_malformed_absolute() {
        let err = parse_time_expression("notatime", now()).unwrap_err();
        assert!(matches!(err, CoreError::MalformedInput(_)));
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn test_end_time_rejects_relative_form() {
        assert!(parse_absolute_time("1h").is_err());
    }

    #[test]
    fn test_out_of_range_offset() {
        let err = parse_time_expression("9999999999999d", now()).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }
}
