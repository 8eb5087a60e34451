//! CF-convention time coordinates ("<unit> since <epoch>").

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::{NetCdfError, NetCdfResult};

/// A parsed `units` attribute of a time variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeUnits {
    pub seconds_per_unit: f64,
    pub epoch: DateTime<Utc>,
}

impl TimeUnits {
    /// Parse strings like `seconds since 1970-01-01 00:00:00`.
    pub fn parse(units: &str) -> NetCdfResult<Self> {
        let invalid = || NetCdfError::InvalidFormat(format!("time units '{}'", units));

        let (unit, epoch) = units.trim().split_once(" since ").ok_or_else(invalid)?;
        let seconds_per_unit = match unit.trim().to_lowercase().as_str() {
            "seconds" | "second" | "secs" | "s" => 1.0,
            "minutes" | "minute" | "mins" | "min" => 60.0,
            "hours" | "hour" | "hrs" | "h" => 3600.0,
            "days" | "day" | "d" => 86400.0,
            _ => return Err(invalid()),
        };
        let epoch = parse_epoch(epoch.trim()).ok_or_else(invalid)?;

        Ok(Self {
            seconds_per_unit,
            epoch,
        })
    }

    /// Absolute time of a coordinate value, rounded to the nearest second.
    pub fn decode(&self, value: f64) -> NetCdfResult<DateTime<Utc>> {
        let seconds = (value * self.seconds_per_unit).round();
        if !seconds.is_finite() || seconds.abs() > i64::MAX as f64 {
            return Err(NetCdfError::InvalidFormat(format!(
                "time value {} out of range",
                value
            )));
        }
        Ok(self.epoch + Duration::seconds(seconds as i64))
    }

    pub fn decode_all(&self, values: &[f64]) -> NetCdfResult<Vec<DateTime<Utc>>> {
        values.iter().map(|&v| self.decode(v)).collect()
    }
}

fn parse_epoch(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let s = s.trim_end_matches('Z').trim_end_matches(" UTC");
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| Utc.from_utc_datetime(&ndt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        let units = TimeUnits::parse("seconds since 1970-01-01 00:00:00").unwrap();
        assert_eq!(units.seconds_per_unit, 1.0);
        assert_eq!(units.epoch, Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap());

        let units = TimeUnits::parse("hours since 1950-01-01").unwrap();
        assert_eq!(units.seconds_per_unit, 3600.0);

        let units = TimeUnits::parse("days since 2025-07-11T00:00:00Z").unwrap();
        assert_eq!(units.epoch, Utc.with_ymd_and_hms(2025, 7, 11, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_units_rejects_garbage() {
        assert!(TimeUnits::parse("fortnights since 1970-01-01").is_err());
        assert!(TimeUnits::parse("seconds").is_err());
        assert!(TimeUnits::parse("seconds since yesterday").is_err());
    }

    #[test]
    fn test_decode() {
        let units = TimeUnits::parse("minutes since 2025-07-11 00:00:00").unwrap();
        let times = units.decode_all(&[0.0, 15.0, 30.0]).unwrap();
        assert_eq!(times[1], Utc.with_ymd_and_hms(2025, 7, 11, 0, 15, 0).unwrap());

        // Float noise in stored seconds rounds away
        let units = TimeUnits::parse("hours since 2025-07-11").unwrap();
        let t = units.decode(0.249_999_99).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2025, 7, 11, 0, 15, 0).unwrap());
    }
}
