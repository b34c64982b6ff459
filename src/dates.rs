//! Date parsing and formatting.
//!
//! Front matter dates are free-form strings. The accepted forms, tried in
//! order, are RFC 3339 (`2024-03-02T10:15:00+01:00`), `YYYY-MM-DD HH:MM:SS`
//! and plain `YYYY-MM-DD` (midnight UTC). Anything else is treated as
//! "no date" for ordering purposes and still shown verbatim on pages.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.to_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// RFC 2822 form used by feed `pubDate`.
pub fn to_rfc2822(dt: &DateTime<Utc>) -> String {
    dt.to_rfc2822()
}

/// `YYYY-MM-DD`, the form used by sitemap `lastmod`.
pub fn to_ymd(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d").to_string()
}
