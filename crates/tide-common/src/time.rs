//! Time handling for forecast steps and valid times.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unit used to write a forecast step (e.g. "15m", "6h", "1d").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeUnit {
    Minute,
    Hour,
    Day,
}

impl TimeUnit {
    /// Number of minutes in one unit.
    pub fn minutes(&self) -> u32 {
        match self {
            TimeUnit::Minute => 1,
            TimeUnit::Hour => 60,
            TimeUnit::Day => 1440,
        }
    }

    /// Suffix used in the textual form.
    pub fn suffix(&self) -> char {
        match self {
            TimeUnit::Minute => 'm',
            TimeUnit::Hour => 'h',
            TimeUnit::Day => 'd',
        }
    }
}

/// A positive time step, stored in whole minutes.
///
/// Parsed from strings such as `15m`, `6h` or `1d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeStep {
    minutes: u32,
}

impl TimeStep {
    /// Create a step from whole minutes. Zero is rejected.
    pub fn from_minutes(minutes: u32) -> Result<Self, TimeParseError> {
        if minutes == 0 {
            return Err(TimeParseError::ZeroStep);
        }
        Ok(Self { minutes })
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    /// How many whole `base` steps fit in this step, if it is an exact multiple.
    pub fn multiple_of(&self, base: TimeStep) -> Option<u32> {
        (self.minutes % base.minutes == 0).then(|| self.minutes / base.minutes)
    }

    /// Largest unit that divides the step exactly.
    pub fn natural_unit(&self) -> TimeUnit {
        if self.minutes % TimeUnit::Day.minutes() == 0 {
            TimeUnit::Day
        } else if self.minutes % TimeUnit::Hour.minutes() == 0 {
            TimeUnit::Hour
        } else {
            TimeUnit::Minute
        }
    }
}

impl FromStr for TimeStep {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let unit = match s.chars().last() {
            Some('m') | Some('M') => TimeUnit::Minute,
            Some('h') | Some('H') => TimeUnit::Hour,
            Some('d') | Some('D') => TimeUnit::Day,
            _ => return Err(TimeParseError::InvalidStep(s.to_string())),
        };

        let count: u32 = s[..s.len() - 1]
            .parse()
            .map_err(|_| TimeParseError::InvalidStep(s.to_string()))?;

        let minutes = count
            .checked_mul(unit.minutes())
            .ok_or_else(|| TimeParseError::InvalidStep(s.to_string()))?;

        Self::from_minutes(minutes)
    }
}

impl fmt::Display for TimeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = self.natural_unit();
        write!(f, "{}{}", self.minutes / unit.minutes(), unit.suffix())
    }
}

/// Represents a valid time for forecast data.
///
/// Combines reference time (forecast start) and an elapsed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidTime {
    /// Forecast reference time
    pub reference_time: DateTime<Utc>,
    /// Offset from the reference time in minutes
    pub offset_minutes: i64,
}

impl ValidTime {
    pub fn new(reference_time: DateTime<Utc>, offset_minutes: i64) -> Self {
        Self {
            reference_time,
            offset_minutes,
        }
    }

    /// Build from an absolute timestamp relative to a reference time.
    pub fn between(reference_time: DateTime<Utc>, valid: DateTime<Utc>) -> Self {
        Self::new(reference_time, (valid - reference_time).num_minutes())
    }

    /// Calculate the actual valid time (reference + offset)
    pub fn valid_datetime(&self) -> DateTime<Utc> {
        self.reference_time + Duration::minutes(self.offset_minutes)
    }

    /// Parse from ISO 8601 string
    pub fn from_iso8601(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }

        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
            return Ok(Utc.from_utc_datetime(&ndt));
        }

        if let Ok(ndt) =
            NaiveDateTime::parse_from_str(&format!("{}T00:00:00", s), "%Y-%m-%dT%H:%M:%S")
        {
            return Ok(Utc.from_utc_datetime(&ndt));
        }

        Err(TimeParseError::InvalidFormat(s.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("Invalid time step '{0}' (expected e.g. '15m', '6h' or '1d')")]
    InvalidStep(String),

    #[error("Time step must be greater than zero")]
    ZeroStep,
}
