//! Calendar date parsing and rendering for exercise records.
//!
//! Accepted inputs cover what clients commonly send as a date: ISO dates
//! (`1990-01-01`, `1990-01`, `1990`), RFC 3339 timestamps, offset-less
//! date-times, and the rendered form itself (`Mon Jan 01 1990`). Dates without
//! a time of day resolve to UTC midnight. Rendering is always UTC.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

const DISPLAY_FORMAT: &str = "%a %b %d";

const NAIVE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const HUMAN_DATE_FORMATS: &[&str] = &[
    "%a %b %d %Y",
    "%b %d %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%B %d, %Y",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid date: {0:?}")]
pub struct InvalidDate(pub String);

/// Parses a client-supplied date string.
pub fn parse_date(raw: &str) -> Result<DateTime<Utc>, InvalidDate> {
    let value = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(start_of_day(date));
    }
    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Utc.from_utc_datetime(&parsed));
        }
    }
    if let Some(date) = parse_partial_iso(value) {
        return Ok(start_of_day(date));
    }
    for format in HUMAN_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Ok(start_of_day(date));
        }
    }

    Err(InvalidDate(raw.to_string()))
}

/// Interprets a numeric date as milliseconds since the Unix epoch.
pub fn from_epoch_millis(millis: f64) -> Result<DateTime<Utc>, InvalidDate> {
    if !millis.is_finite() {
        return Err(InvalidDate(millis.to_string()));
    }
    let whole = millis.trunc() as i64;
    DateTime::from_timestamp_millis(whole).ok_or_else(|| InvalidDate(millis.to_string()))
}

/// Renders a date as `Mon Jan 01 1990`. Years are padded to four digits and
/// only negative years carry a sign (`-0001`, `33658`).
pub fn to_date_string(date: &DateTime<Utc>) -> String {
    let year = date.year();
    let sign = if year < 0 { "-" } else { "" };
    format!(
        "{} {sign}{:04}",
        date.format(DISPLAY_FORMAT),
        year.unsigned_abs()
    )
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

/// `YYYY-MM` and `YYYY`.
fn parse_partial_iso(value: &str) -> Option<NaiveDate> {
    let (year, month) = match value.split_once('-') {
        Some((year, month)) => (year, Some(month)),
        None => (value, None),
    };
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let month: u32 = match month {
        Some(month) if month.len() == 2 && month.bytes().all(|b| b.is_ascii_digit()) => {
            month.parse().ok()?
        }
        Some(_) => return None,
        None => 1,
    };
    NaiveDate::from_ymd_opt(year, month, 1)
}
