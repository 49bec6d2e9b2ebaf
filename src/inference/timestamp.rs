//! Request timestamps and the clock used when a request carries none.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, ParseError, Utc};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

/// Parses an ISO-8601 style timestamp into its wall-clock fields.
///
/// A trailing `Z` is accepted and ignored. A numeric offset such as `+02:00` is accepted
/// but not applied: `2024-05-01T23:30:00+02:00` yields hour 23. A bare date means
/// midnight.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, ParseError> {
    let text = value.trim();
    let text = text.strip_suffix(['Z', 'z']).unwrap_or(text);

    if let Some(parsed) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
    {
        return Ok(parsed);
    }
    if let Some(parsed) = OFFSET_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(text, format).ok())
    {
        return Ok(parsed.naive_local());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").map(|date| date.and_time(NaiveTime::MIN))
}

/// Source of "now" for requests without a timestamp.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }
}

/// Always answers the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now_utc(&self) -> NaiveDateTime {
        self.0
    }
}
