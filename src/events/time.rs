//! Timestamp parsing and display formatting for the event log.
//!
//! The [`TimeFormatter`] is constructed explicitly and handed to the
//! projector. It owns the display locale, the UTC offset used for rendering,
//! and the [`Clock`] that relative ages are measured against, so tests can pin
//! "now" with a [`FixedClock`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeDelta, Utc};
use serde_json::Value;

use crate::error::ConsoleError;

/// Rendered in place of a timestamp that cannot be parsed.
pub const INVALID_DATE: &str = "Invalid Date";

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const MONTH: u64 = 30 * DAY;
const YEAR: u64 = 365 * DAY;

/// Source of the current wall-clock time.
pub trait Clock: fmt::Debug + Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the system clock on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Display conventions for absolute timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayLocale {
    /// `11/22/2023, 10:44:00 AM`
    #[default]
    EnUs,
    /// `22/11/2023, 10:44:00`
    EnGb,
    /// `2023-11-22 10:44:00`
    Iso,
}

impl DisplayLocale {
    /// Canonical tag for this locale.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::EnGb => "en-GB",
            Self::Iso => "iso",
        }
    }

    fn pattern(self) -> &'static str {
        match self {
            Self::EnUs => "%-m/%-d/%Y, %-I:%M:%S %p",
            Self::EnGb => "%d/%m/%Y, %H:%M:%S",
            Self::Iso => "%Y-%m-%d %H:%M:%S",
        }
    }
}

impl FromStr for DisplayLocale {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "en-us" | "en" => Ok(Self::EnUs),
            "en-gb" => Ok(Self::EnGb),
            "iso" => Ok(Self::Iso),
            _ => Err(ConsoleError::UnsupportedLocale(s.to_string())),
        }
    }
}

impl fmt::Display for DisplayLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a payload timestamp.
///
/// Accepts RFC 3339 strings, `YYYY-MM-DD HH:MM:SS[.fff]` and `YYYY-MM-DD`
/// (both read as UTC), and numbers as epoch milliseconds. Anything else is
/// `None`.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp_str(s.trim()),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for pattern in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, pattern) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Formats absolute and relative times for display rows.
#[derive(Debug, Clone)]
pub struct TimeFormatter {
    locale: DisplayLocale,
    offset: FixedOffset,
    clock: Arc<dyn Clock>,
}

impl Default for TimeFormatter {
    fn default() -> Self {
        Self::new(DisplayLocale::default())
    }
}

impl TimeFormatter {
    /// Create a formatter rendering in UTC against the system clock.
    #[must_use]
    pub fn new(locale: DisplayLocale) -> Self {
        Self {
            locale,
            offset: Utc.fix(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Render absolute timestamps at a fixed UTC offset.
    #[must_use]
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    /// Measure relative ages against `clock`.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn locale(&self) -> DisplayLocale {
        self.locale
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Format a payload timestamp, or [`INVALID_DATE`] when it doesn't parse.
    pub fn format_timestamp(&self, value: &Value) -> String {
        parse_timestamp(value).map_or_else(|| INVALID_DATE.to_string(), |dt| self.format_datetime(dt))
    }

    pub fn format_datetime(&self, dt: DateTime<Utc>) -> String {
        dt.with_timezone(&self.offset)
            .format(self.locale.pattern())
            .to_string()
    }

    /// Relative phrase ("3 minutes ago") for a payload timestamp.
    ///
    /// Reads the clock on every call.
    pub fn relative_age(&self, value: &Value) -> String {
        parse_timestamp(value).map_or_else(|| INVALID_DATE.to_string(), |dt| self.relative_to_now(dt))
    }

    pub fn relative_to_now(&self, then: DateTime<Utc>) -> String {
        relative_phrase(self.clock.now().signed_duration_since(then))
    }
}

fn relative_phrase(delta: TimeDelta) -> String {
    let secs = delta.num_seconds();
    let magnitude = secs.unsigned_abs();

    if magnitude < MINUTE {
        return "just now".to_string();
    }

    let (count, unit) = if magnitude < HOUR {
        (magnitude / MINUTE, "minute")
    } else if magnitude < DAY {
        (magnitude / HOUR, "hour")
    } else if magnitude < MONTH {
        (magnitude / DAY, "day")
    } else if magnitude < YEAR {
        (magnitude / MONTH, "month")
    } else {
        (magnitude / YEAR, "year")
    };
    let plural = if count == 1 { "" } else { "s" };

    if secs < 0 {
        format!("in {count} {unit}{plural}")
    } else {
        format!("{count} {unit}{plural} ago")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 11, 22, 12, 0, 0).unwrap()
    }

    fn formatter_at(now: DateTime<Utc>) -> TimeFormatter {
        TimeFormatter::new(DisplayLocale::EnUs).with_clock(Arc::new(FixedClock(now)))
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let expected = Utc.with_ymd_and_hms(2023, 11, 22, 10, 44, 0).unwrap();

        assert_eq!(parse_timestamp(&json!("2023-11-22T10:44:00Z")), Some(expected));
        assert_eq!(
            parse_timestamp(&json!("2023-11-22T11:44:00+01:00")),
            Some(expected)
        );
        assert_eq!(parse_timestamp(&json!("2023-11-22 10:44:00")), Some(expected));
        assert_eq!(parse_timestamp(&json!(1_700_649_840_000_i64)), Some(expected));
        assert_eq!(
            parse_timestamp(&json!("2023-11-22")),
            Utc.with_ymd_and_hms(2023, 11, 22, 0, 0, 0).single()
        );
    }

    #[test]
    fn test_parse_timestamp_with_nanoseconds() {
        let parsed = parse_timestamp(&json!("2023-11-22T10:44:00.518137754Z")).unwrap();
        assert_eq!(parsed.timestamp(), 1_700_649_840);
        assert_eq!(parsed.timestamp_subsec_nanos(), 518_137_754);
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp(&json!("yesterday-ish")).is_none());
        assert!(parse_timestamp(&json!(null)).is_none());
        assert!(parse_timestamp(&json!(true)).is_none());
        assert!(parse_timestamp(&json!({"at": 1})).is_none());
    }

    #[test]
    fn test_format_timestamp_per_locale() {
        let ts = json!("2023-11-22T10:44:00Z");

        assert_eq!(
            TimeFormatter::new(DisplayLocale::EnUs).format_timestamp(&ts),
            "11/22/2023, 10:44:00 AM"
        );
        assert_eq!(
            TimeFormatter::new(DisplayLocale::EnGb).format_timestamp(&ts),
            "22/11/2023, 10:44:00"
        );
        assert_eq!(
            TimeFormatter::new(DisplayLocale::Iso).format_timestamp(&ts),
            "2023-11-22 10:44:00"
        );
    }

    #[test]
    fn test_format_timestamp_applies_offset() {
        let formatter = TimeFormatter::new(DisplayLocale::EnUs)
            .with_offset(FixedOffset::east_opt(3 * 3600).unwrap());
        assert_eq!(
            formatter.format_timestamp(&json!("2023-11-22T10:44:00Z")),
            "11/22/2023, 1:44:00 PM"
        );
    }

    #[test]
    fn test_format_invalid_timestamp() {
        let formatter = TimeFormatter::default();
        assert_eq!(formatter.format_timestamp(&json!("not a date")), INVALID_DATE);
        assert_eq!(formatter.format_timestamp(&Value::Null), INVALID_DATE);
    }

    #[test]
    fn test_locale_from_str() {
        assert_eq!("en-US".parse::<DisplayLocale>().unwrap(), DisplayLocale::EnUs);
        assert_eq!("en_gb".parse::<DisplayLocale>().unwrap(), DisplayLocale::EnGb);
        assert_eq!("ISO".parse::<DisplayLocale>().unwrap(), DisplayLocale::Iso);
        assert!(matches!(
            "fr-FR".parse::<DisplayLocale>(),
            Err(ConsoleError::UnsupportedLocale(_))
        ));
    }

    #[test]
    fn test_relative_age_buckets() {
        let now = noon();
        let formatter = formatter_at(now);
        let ago = |delta: TimeDelta| formatter.relative_to_now(now - delta);

        assert_eq!(ago(TimeDelta::seconds(30)), "just now");
        assert_eq!(ago(TimeDelta::seconds(60)), "1 minute ago");
        assert_eq!(ago(TimeDelta::minutes(3)), "3 minutes ago");
        assert_eq!(ago(TimeDelta::hours(1)), "1 hour ago");
        assert_eq!(ago(TimeDelta::hours(5)), "5 hours ago");
        assert_eq!(ago(TimeDelta::days(2)), "2 days ago");
        assert_eq!(ago(TimeDelta::days(45)), "1 month ago");
        assert_eq!(ago(TimeDelta::days(400)), "1 year ago");
        assert_eq!(ago(TimeDelta::minutes(-5)), "in 5 minutes");
    }

    #[test]
    fn test_relative_age_reads_clock_each_call() {
        let start = noon();
        let ts = json!("2023-11-22T11:57:00Z");

        assert_eq!(formatter_at(start).relative_age(&ts), "3 minutes ago");
        assert_eq!(
            formatter_at(start + TimeDelta::hours(2)).relative_age(&ts),
            "2 hours ago"
        );
    }

    #[test]
    fn test_relative_age_invalid_input() {
        assert_eq!(formatter_at(noon()).relative_age(&json!("nope")), INVALID_DATE);
    }
}
