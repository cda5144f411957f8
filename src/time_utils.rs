//! Time utility functions
//!
//! Submission timestamps arrive in several shapes: RFC 3339 with an offset,
//! naive ISO-8601 as written by the registration form handler, and the
//! `%Y-%m-%d %H:%M:%S` form used for contacts. Everything is normalised to
//! local naive date-times before bucketing.

use crate::error::{IntakeError, Result};
use chrono::{DateTime, Datelike, Days, Local, NaiveDate, NaiveDateTime};

/// Format used for registration `submitTime` and `updatedAt`.
pub const ISO_LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Format used for contact `submitTime`.
pub const CONTACT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
];

/// Parse a submission timestamp into local time.
///
/// Returns `None` for anything unrecognised; callers decide whether an
/// unparseable record is skipped or counted elsewhere.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse a `YYYY-MM-DD` date given by a user (query string or CLI flag).
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        IntakeError::InvalidInput(format!("Invalid date '{}', expected YYYY-MM-DD", raw))
    })
}

pub fn iso_local(now: DateTime<Local>) -> String {
    now.format(ISO_LOCAL_FORMAT).to_string()
}

pub fn contact_time(now: DateTime<Local>) -> String {
    now.format(CONTACT_TIME_FORMAT).to_string()
}

/// Monday of the week containing `day`.
pub fn week_start(day: NaiveDate) -> NaiveDate {
    let offset = day.weekday().num_days_from_monday();
    day - Days::new(u64::from(offset))
}

pub fn month_start(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}
