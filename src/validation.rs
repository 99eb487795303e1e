//! Field rules shared by the request types, in the shape `validator` expects for
//! `#[validate(custom(...))]` and `#[validate(regex(...))]`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use validator::ValidationError;

use crate::models::{TaskPriority, TaskStatus};

lazy_static::lazy_static! {
    pub static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

/// Rejects empty and whitespace-only strings.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

pub fn known_status(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<TaskStatus>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("unknown_status"))
}

pub fn known_priority(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<TaskPriority>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("unknown_priority"))
}

pub fn valid_due_date(value: &str) -> Result<(), ValidationError> {
    parse_due_date(value)
        .map(|_| ())
        .ok_or_else(|| ValidationError::new("invalid_date"))
}

/// Parses a due date given either as an RFC 3339 timestamp, a timestamp without
/// offset (taken as UTC) or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_due_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_blank() {
        assert!(not_blank("Buy milk").is_ok());
        assert!(not_blank("").is_err());
        assert!(not_blank("   \t").is_err());
    }

    #[test]
    fn test_email_regex() {
        assert!(EMAIL_REGEX.is_match("ada@example.com"));
        assert!(!EMAIL_REGEX.is_match("ada@example"));
        assert!(!EMAIL_REGEX.is_match("ada lovelace@example.com"));
        assert!(!EMAIL_REGEX.is_match("example.com"));
    }

    #[test]
    fn test_enum_labels() {
        assert!(known_status("in-progress").is_ok());
        assert!(known_status("archived").is_err());
        assert!(known_status("In-Progress").is_err());
        assert!(known_priority("high").is_ok());
        assert!(known_priority("urgent").is_err());
    }

    #[test]
    fn test_parse_due_date() {
        let midnight = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();
        assert_eq!(parse_due_date("2025-01-10"), Some(midnight));
        assert_eq!(parse_due_date("2025-01-10T00:00:00Z"), Some(midnight));
        assert_eq!(parse_due_date("2025-01-10T02:00:00+02:00"), Some(midnight));
        assert_eq!(
            parse_due_date("2025-01-10T09:30"),
            Some(Utc.with_ymd_and_hms(2025, 1, 10, 9, 30, 0).unwrap())
        );
        assert_eq!(parse_due_date("next tuesday"), None);
        assert_eq!(parse_due_date("2025-13-01"), None);
        assert!(valid_due_date("").is_err());
    }
}
