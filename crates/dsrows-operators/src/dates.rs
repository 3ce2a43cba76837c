//! Date parsing and conversion to the service's local timezone.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, Utc};

/// Format of dates stored in rows.
pub const LOCAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
];

#[derive(Debug, Clone, Copy)]
pub struct DateService {
    offset: FixedOffset,
}

impl DateService {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Host local offset, sampled now.
    pub fn local() -> Self {
        Self::new(Local::now().offset().fix())
    }

    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    /// `None` falls back to the host offset; out of range offsets do too.
    pub fn from_offset_minutes(minutes: Option<i32>) -> Self {
        minutes
            .and_then(|m| m.checked_mul(60))
            .and_then(FixedOffset::east_opt)
            .map(Self::new)
            .unwrap_or_else(Self::local)
    }

    /// Parse a user supplied date/time.
    ///
    /// RFC 3339 input keeps its own offset. Naive date/times and plain dates
    /// are taken as UTC. Anything else is `None`.
    pub fn parse(&self, raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        for fmt in NAIVE_DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
                return Some(naive.and_utc());
            }
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    /// Render an instant as a local ISO date/time string.
    pub fn local_date(&self, dt: DateTime<Utc>) -> String {
        dt.with_timezone(&self.offset).format(LOCAL_FORMAT).to_string()
    }
}

impl Default for DateService {
    fn default() -> Self {
        Self::local()
    }
}
