//! Calendar-day unlock dates
//!
//! Locks have day granularity. A lock is active while the current UTC
//! day is strictly before its unlock date; on the unlock date itself it
//! is already spendable.

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Wire format of every date (`YYYY-MM-DD`)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("Empty date")]
    Empty,

    #[error("Invalid date format (expected YYYY-MM-DD): {0}")]
    InvalidFormat(String),

    #[error("Date before unix epoch: {0}")]
    BeforeEpoch(String),

    #[error("Invalid day timestamp: {0}")]
    InvalidTimestamp(u64),

    #[error("Date arithmetic out of range: {0}")]
    OutOfRange(String),
}

/// A calendar day on which a lock becomes spendable
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UnlockDate(NaiveDate);

impl UnlockDate {
    pub fn new(date: NaiveDate) -> Result<Self, DateError> {
        if date < NaiveDate::default() {
            return Err(DateError::BeforeEpoch(date.to_string()));
        }
        Ok(Self(date))
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Unix timestamp of midnight UTC on this day
    pub fn day_timestamp(&self) -> u64 {
        day_timestamp(self.0)
    }

    /// Rebuild a date from a day-boundary timestamp stored in a key
    pub fn from_day_timestamp(ts: u64) -> Result<Self, DateError> {
        let secs = i64::try_from(ts).map_err(|_| DateError::InvalidTimestamp(ts))?;
        let dt = DateTime::<Utc>::from_timestamp(secs, 0).ok_or(DateError::InvalidTimestamp(ts))?;
        Ok(Self(dt.date_naive()))
    }
}

impl fmt::Display for UnlockDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for UnlockDate {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DateError::Empty);
        }
        let date = NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map_err(|_| DateError::InvalidFormat(s.to_string()))?;
        Self::new(date)
    }
}

impl TryFrom<String> for UnlockDate {
    type Error = DateError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<UnlockDate> for String {
    fn from(d: UnlockDate) -> Self {
        d.to_string()
    }
}

/// Unix timestamp of midnight UTC on `day`. Days before the epoch clamp to 0.
pub fn day_timestamp(day: NaiveDate) -> u64 {
    let secs = day.and_hms_opt(0, 0, 0).map_or(0, |dt| dt.and_utc().timestamp());
    u64::try_from(secs).unwrap_or(0)
}

/// The UTC calendar day containing `time`
pub fn block_day(time: DateTime<Utc>) -> NaiveDate {
    time.date_naive()
}

/// `day < unlock_date`
pub fn is_locked(day: NaiveDate, unlock: &UnlockDate) -> bool {
    day < unlock.0
}

/// Add calendar months, clamping to the last day of a shorter month
pub fn add_months(day: NaiveDate, months: u32) -> Result<NaiveDate, DateError> {
    day.checked_add_months(Months::new(months))
        .ok_or_else(|| DateError::OutOfRange(format!("{day} + {months} months")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> UnlockDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let d = date("2026-01-01");
        assert_eq!(d.to_string(), "2026-01-01");
        assert!(matches!("".parse::<UnlockDate>(), Err(DateError::Empty)));
        assert!(matches!(
            "2026-13-01".parse::<UnlockDate>(),
            Err(DateError::InvalidFormat(_))
        ));
        assert!(matches!(
            "2026-01-01T00:00:00Z".parse::<UnlockDate>(),
            Err(DateError::InvalidFormat(_))
        ));
        assert!(matches!(
            "1969-12-31".parse::<UnlockDate>(),
            Err(DateError::BeforeEpoch(_))
        ));
    }

    #[test]
    fn test_day_timestamp_roundtrip() {
        let d = date("2027-01-01");
        assert_eq!(d.day_timestamp(), 1_798_761_600);
        assert_eq!(UnlockDate::from_day_timestamp(d.day_timestamp()).unwrap(), d);
    }

    #[test]
    fn test_is_locked_is_strict() {
        let unlock = date("2026-06-01");
        let before = NaiveDate::from_ymd_opt(2026, 5, 31).unwrap();
        let on = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        assert!(is_locked(before, &unlock));
        assert!(!is_locked(on, &unlock));
    }

    #[test]
    fn test_block_day_truncates_time() {
        let t = DateTime::parse_from_rfc3339("2026-03-15T23:59:59Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(block_day(t), NaiveDate::from_ymd_opt(2026, 3, 15).unwrap());
    }

    #[test]
    fn test_add_months_clamps() {
        let aug31 = NaiveDate::from_ymd_opt(2025, 8, 31).unwrap();
        assert_eq!(
            add_months(aug31, 6).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()
        );
    }
}
