//! Date helper functions

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

use crate::i18n::{Locale, PT_BR};

/// What an unparseable timestamp formats to
pub const INVALID_DATE: &str = "Invalid Date";

/// Offset-carrying layouts tried after RFC 3339. The CMS emits `+0000`.
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z"];

/// Naive layouts, read as UTC
const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse an ISO-8601 timestamp into a UTC instant
///
/// Accepts RFC 3339, `+hhmm` offsets, naive date-times (taken as UTC) and
/// bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_timestamp(date: &str) -> Option<DateTime<Utc>> {
    let date = date.trim();
    if date.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(date) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(date, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(date, format) {
            return Some(parsed.and_utc());
        }
    }

    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Format a timestamp for display using the default locale (pt-BR, UTC)
///
/// # Examples
/// ```ignore
/// format_date_to_view("2021-04-19T12:00:00Z") // -> "19 Abr 2021"
/// format_date_to_view("not-a-date")           // -> "Invalid Date"
/// ```
pub fn format_date_to_view(date: &str) -> String {
    format_date_with(date, &PT_BR, Tz::UTC)
}

/// Format a timestamp as `DD Mmm YYYY` in the given locale and time zone
pub fn format_date_with(date: &str, locale: &Locale, tz: Tz) -> String {
    match parse_timestamp(date) {
        Some(instant) => {
            let local = instant.with_timezone(&tz);
            format!(
                "{:02} {} {:04}",
                local.day(),
                locale.month_abbr(local.month()),
                local.year()
            )
        }
        None => INVALID_DATE.to_string(),
    }
}

/// Machine-readable value for a `<time datetime>` attribute
pub fn date_xml(date: &str) -> Option<String> {
    parse_timestamp(date).map(|d| d.format("%Y-%m-%dT%H:%M:%S%:z").to_string())
}
