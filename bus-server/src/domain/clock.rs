//! Clock time handling for bus timetables.
//!
//! Timetables store departure times as "HH:MM" strings. Arrival estimates
//! are minutes-of-day only: adding travel time wraps at midnight and no
//! date is tracked.

use chrono::{Duration, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Minutes in one day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A time of day with minute precision.
///
/// # Examples
///
/// ```
/// use bus_server::domain::ClockTime;
///
/// let t = ClockTime::parse_hhmm("07:05").unwrap();
/// assert_eq!(t.minutes(), 425);
/// assert_eq!(t.to_string(), "07:05");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClockTime(NaiveTime);

impl ClockTime {
    /// Parse a time from "HH:MM" format.
    ///
    /// # Examples
    ///
    /// ```
    /// use bus_server::domain::ClockTime;
    ///
    /// assert!(ClockTime::parse_hhmm("00:00").is_ok());
    /// assert!(ClockTime::parse_hhmm("23:59").is_ok());
    ///
    /// assert!(ClockTime::parse_hhmm("7:00").is_err());
    /// assert!(ClockTime::parse_hhmm("24:00").is_err());
    /// assert!(ClockTime::parse_hhmm("12:60").is_err());
    /// ```
    pub fn parse_hhmm(s: &str) -> Result<Self, TimeError> {
        if s.len() != 5 {
            return Err(TimeError::new("expected HH:MM format"));
        }

        let bytes = s.as_bytes();

        if bytes[2] != b':' {
            return Err(TimeError::new("expected colon at position 2"));
        }

        let hour =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        if hour > 23 {
            return Err(TimeError::new("hour must be 0-23"));
        }

        let minute = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(Self)
            .ok_or_else(|| TimeError::new("invalid time"))
    }

    /// Build a clock time from a minute count, wrapping at 24 hours.
    pub fn from_minutes(total: u64) -> Self {
        let of_day = (total % u64::from(MINUTES_PER_DAY)) as u32;
        // of_day < 1440, so the components are always in range
        Self(NaiveTime::from_hms_opt(of_day / 60, of_day % 60, 0).unwrap_or(NaiveTime::MIN))
    }

    /// Minutes since midnight (0-1439).
    pub fn minutes(&self) -> u32 {
        self.0.hour() * 60 + self.0.minute()
    }

    /// Returns the hour (0-23).
    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    /// Returns the minute (0-59).
    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    /// Add whole minutes, wrapping past midnight.
    ///
    /// ```
    /// use bus_server::domain::ClockTime;
    ///
    /// let t = ClockTime::parse_hhmm("23:50").unwrap();
    /// assert_eq!(t.wrapping_add_minutes(25).to_string(), "00:15");
    /// ```
    pub fn wrapping_add_minutes(&self, minutes: u32) -> Self {
        let (time, _) = self
            .0
            .overflowing_add_signed(Duration::minutes(i64::from(minutes)));
        Self(time)
    }
}

impl fmt::Debug for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClockTime({:02}:{:02})", self.hour(), self.minute())
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ClockTime::parse_hhmm(&s).map_err(serde::de::Error::custom)
    }
}

/// Parse an "HH:MM" string into minutes since midnight.
pub fn parse_time_to_minutes(s: &str) -> Result<u32, TimeError> {
    ClockTime::parse_hhmm(s).map(|t| t.minutes())
}

/// Format a minute count as zero-padded "HH:MM", wrapping at 24 hours.
pub fn format_time_from_minutes(total: u64) -> String {
    ClockTime::from_minutes(total).to_string()
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> ClockTime {
        ClockTime::parse_hhmm(s).unwrap()
    }

    #[test]
    fn parse_valid_times() {
        assert_eq!(t("00:00").minutes(), 0);
        assert_eq!(t("23:59").minutes(), 1439);
        assert_eq!(t("08:30").hour(), 8);
        assert_eq!(t("08:30").minute(), 30);
    }

    #[test]
    fn parse_invalid_format() {
        assert!(ClockTime::parse_hhmm("").is_err());
        assert!(ClockTime::parse_hhmm("0800").is_err());
        assert!(ClockTime::parse_hhmm("08-00").is_err());
        assert!(ClockTime::parse_hhmm("8:00").is_err());
        assert!(ClockTime::parse_hhmm("08:0a").is_err());
        assert!(ClockTime::parse_hhmm("08:00:00").is_err());
    }

    #[test]
    fn parse_invalid_values() {
        assert!(ClockTime::parse_hhmm("24:00").is_err());
        assert!(ClockTime::parse_hhmm("99:00").is_err());
        assert!(ClockTime::parse_hhmm("12:60").is_err());
    }

    #[test]
    fn display_pads() {
        assert_eq!(t("07:05").to_string(), "07:05");
        assert_eq!(format!("{:?}", t("07:05")), "ClockTime(07:05)");
    }

    #[test]
    fn add_minutes_same_day() {
        assert_eq!(t("08:00").wrapping_add_minutes(30), t("08:30"));
        assert_eq!(t("08:45").wrapping_add_minutes(90), t("10:15"));
    }

    #[test]
    fn add_minutes_wraps_midnight() {
        assert_eq!(t("23:30").wrapping_add_minutes(45), t("00:15"));
        assert_eq!(t("12:00").wrapping_add_minutes(MINUTES_PER_DAY), t("12:00"));
    }

    #[test]
    fn format_wraps() {
        assert_eq!(format_time_from_minutes(0), "00:00");
        assert_eq!(format_time_from_minutes(445), "07:25");
        assert_eq!(format_time_from_minutes(1440), "00:00");
        assert_eq!(format_time_from_minutes(1500), "01:00");
    }

    #[test]
    fn serde_as_string() {
        let json = serde_json::to_string(&t("06:40")).unwrap();
        assert_eq!(json, "\"06:40\"");
        let back: ClockTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t("06:40"));
        assert!(serde_json::from_str::<ClockTime>("\"6:40\"").is_err());
    }

    #[test]
    fn ordering() {
        assert!(t("06:00") < t("06:01"));
        assert!(t("23:59") > t("00:00"));
    }
}
