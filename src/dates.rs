use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DEFAULT_TASK_SPAN_DAYS: i64 = 7;

#[derive(Debug, Error, PartialEq)]
pub enum DateError {
    #[error("invalid {field}: '{value}' is not a date")]
    Unparsable { field: &'static str, value: String },
    #[error("invalid {field}: '{value}' must be in YYYY-MM-DD format")]
    NotStrict { field: &'static str, value: String },
}

fn strict_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static date pattern"))
}

/// True only for `YYYY-MM-DD` shaped strings. Shape only, `2024-13-45` passes.
pub fn is_strict_date(value: &str) -> bool {
    strict_pattern().is_match(value)
}

pub fn require_strict(field: &'static str, value: &str) -> Result<(), DateError> {
    if is_strict_date(value) {
        Ok(())
    } else {
        Err(DateError::NotStrict {
            field,
            value: value.to_string(),
        })
    }
}

/// Reads whatever the backend or a user typed into a calendar date.
///
/// Accepts a plain date, an RFC 3339 timestamp (taken in UTC) and a naive
/// `T`- or space-separated timestamp.
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, DATE_FORMAT) {
        return Some(date);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(value) {
        return Some(stamp.with_timezone(&Utc).date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|stamp| stamp.date())
}

pub fn normalize_date(value: &str) -> Option<String> {
    parse_calendar_date(value).map(|date| date.format(DATE_FORMAT).to_string())
}

pub fn normalize_field(field: &'static str, value: &str) -> Result<String, DateError> {
    normalize_date(value).ok_or_else(|| DateError::Unparsable {
        field,
        value: value.to_string(),
    })
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Start and end defaults for a new task: `today` and a week later.
pub fn default_range(today: NaiveDate) -> (String, String) {
    let end = today + Duration::days(DEFAULT_TASK_SPAN_DAYS);
    (
        today.format(DATE_FORMAT).to_string(),
        end.format(DATE_FORMAT).to_string(),
    )
}

/// `MM/DD/YYYY` for table cells; unreadable values are shown as-is.
pub fn display_date(value: &str) -> String {
    match parse_calendar_date(value) {
        Some(date) => date.format("%m/%d/%Y").to_string(),
        None => value.to_string(),
    }
}

/// Milliseconds since the epoch at UTC midnight of the date.
pub fn to_epoch_millis(value: &str) -> Option<i64> {
    let date = parse_calendar_date(value)?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight).timestamp_millis())
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn axis_label(millis: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(millis) {
        Some(stamp) => stamp.format("%m/%d").to_string(),
        None => String::new(),
    }
}
