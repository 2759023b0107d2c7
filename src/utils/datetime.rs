//! XMLTV datetime handling utilities
//!
//! XMLTV timestamps are a fixed-width `YYYYMMDDHHMMSS` prefix optionally
//! followed by a timezone offset such as `" +0100"`. The offset suffix is never
//! interpreted here: it is split off and carried verbatim so that generated
//! programmes reproduce exactly what the source document used.
//!
//! # Usage
//!
//! ```rust
//! use epg_merger::utils::datetime::DateTimeParser;
//!
//! let ts = DateTimeParser::parse_xmltv("20240101060000 +0000").unwrap();
//! assert_eq!(ts.offset.as_deref(), Some(" +0000"));
//! assert_eq!(DateTimeParser::format_xmltv(&ts.datetime, " +0000"), "20240101060000 +0000");
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// Width of the `YYYYMMDDHHMMSS` prefix
pub const XMLTV_DATETIME_WIDTH: usize = 14;

/// `chrono` format of the XMLTV datetime prefix
pub const XMLTV_DATETIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// Errors that can occur during datetime operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateTimeError {
    /// Invalid datetime format provided
    #[error("Invalid datetime format: '{input}' - expected YYYYMMDDHHMMSS followed by an optional offset")]
    InvalidFormat { input: String },

    /// Invalid calendar date provided
    #[error("Invalid date: '{input}' - expected YYYY-MM-DD")]
    InvalidDate { input: String },

    /// Timezone parsing failed
    #[error("Failed to parse timezone from: {input}")]
    TimezoneParseError { input: String },
}

/// A parsed XMLTV timestamp: the naive wall-clock value plus the untouched
/// offset suffix (if the source had one)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmltvTimestamp {
    pub datetime: NaiveDateTime,
    pub offset: Option<String>,
}

/// XMLTV datetime parsing and formatting
pub struct DateTimeParser;

impl DateTimeParser {
    /// Parse an XMLTV `start`/`stop` attribute value
    ///
    /// The first 14 characters must be digits forming a valid datetime.
    /// Everything after them, leading whitespace included, is returned as the
    /// offset suffix.
    pub fn parse_xmltv(value: &str) -> Result<XmltvTimestamp, DateTimeError> {
        let invalid = || DateTimeError::InvalidFormat {
            input: value.to_string(),
        };

        let prefix = value.get(..XMLTV_DATETIME_WIDTH).ok_or_else(invalid)?;
        if !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let datetime =
            NaiveDateTime::parse_from_str(prefix, XMLTV_DATETIME_FORMAT).map_err(|_| invalid())?;

        let suffix = &value[XMLTV_DATETIME_WIDTH..];
        let offset = if suffix.is_empty() {
            None
        } else {
            Some(suffix.to_string())
        };

        Ok(XmltvTimestamp { datetime, offset })
    }

    /// Format a naive datetime with an offset suffix appended verbatim
    pub fn format_xmltv(datetime: &NaiveDateTime, offset: &str) -> String {
        format!("{}{}", datetime.format(XMLTV_DATETIME_FORMAT), offset)
    }

    /// Parse an explicit reference day in `YYYY-MM-DD` form
    pub fn parse_reference_day(value: &str) -> Result<NaiveDate, DateTimeError> {
        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
            DateTimeError::InvalidDate {
                input: value.to_string(),
            }
        })
    }

    /// Calendar date of `now` as observed in the named IANA timezone
    pub fn local_date(now: DateTime<Utc>, timezone: &str) -> Result<NaiveDate, DateTimeError> {
        let tz: Tz = timezone
            .parse()
            .map_err(|_| DateTimeError::TimezoneParseError {
                input: timezone.to_string(),
            })?;
        Ok(now.with_timezone(&tz).date_naive())
    }

    /// Check that a timezone name is known without resolving a date
    pub fn is_valid_timezone(timezone: &str) -> bool {
        timezone.parse::<Tz>().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    #[test]
    fn test_parse_with_spaced_offset() {
        let ts = DateTimeParser::parse_xmltv("20240101060000 +0000").unwrap();
        assert_eq!(ts.datetime.year(), 2024);
        assert_eq!(ts.datetime.month(), 1);
        assert_eq!(ts.datetime.day(), 1);
        assert_eq!(ts.datetime.hour(), 6);
        assert_eq!(ts.offset.as_deref(), Some(" +0000"));
    }

    #[test]
    fn test_parse_with_unspaced_offset() {
        let ts = DateTimeParser::parse_xmltv("20240315233000-0600").unwrap();
        assert_eq!(ts.datetime.hour(), 23);
        assert_eq!(ts.datetime.minute(), 30);
        assert_eq!(ts.offset.as_deref(), Some("-0600"));
    }

    #[test]
    fn test_parse_without_offset() {
        let ts = DateTimeParser::parse_xmltv("20240101000000").unwrap();
        assert_eq!(ts.offset, None);
    }

    #[test]
    fn test_invalid_format() {
        for input in ["", "2024", "2024-01-01 06:00", "2024010106000x +0000", "20241301060000"] {
            match DateTimeParser::parse_xmltv(input) {
                Err(DateTimeError::InvalidFormat { input: reported }) => {
                    assert_eq!(reported, input)
                }
                other => panic!("Expected InvalidFormat for '{input}', got {other:?}"),
            }
        }
    }

    #[test]
    fn test_multibyte_input_does_not_panic() {
        assert!(DateTimeParser::parse_xmltv("2024010106000é").is_err());
    }

    #[test]
    fn test_format_preserves_offset_verbatim() {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        assert_eq!(DateTimeParser::format_xmltv(&dt, " +0000"), "20240101060000 +0000");
        assert_eq!(DateTimeParser::format_xmltv(&dt, "-0330"), "20240101060000-0330");
        assert_eq!(DateTimeParser::format_xmltv(&dt, ""), "20240101060000");
    }

    #[test]
    fn test_parse_reference_day() {
        let day = DateTimeParser::parse_reference_day("2024-02-29").unwrap();
        assert_eq!(day, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert!(DateTimeParser::parse_reference_day("2023-02-29").is_err());
    }

    #[test]
    fn test_local_date_crosses_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 3, 0, 0).unwrap();
        assert_eq!(
            DateTimeParser::local_date(now, "America/Mexico_City").unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()
        );
        assert_eq!(
            DateTimeParser::local_date(now, "UTC").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert!(DateTimeParser::local_date(now, "Mars/Olympus").is_err());
    }
}
