//! Calendar date keys
//!
//! Every date the engine touches is a local calendar day with no time-of-day
//! and no time zone. `DateKey` wraps a `NaiveDate` and fixes its textual form
//! to `YYYY-MM-DD`, so parsing and formatting are exact inverses and repeated
//! `add_days` steps never drift across midnight or DST boundaries.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const KEY_FORMAT: &str = "%Y-%m-%d";

/// Error returned when a string is not a canonical `YYYY-MM-DD` key
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid date key '{input}': expected YYYY-MM-DD")]
pub struct DateKeyError {
    pub input: String,
}

/// A calendar day in canonical `YYYY-MM-DD` form
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    /// Build a key from year/month/day, `None` if the date does not exist
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Parse a canonical key. Non-padded forms such as `2024-1-5` are rejected.
    pub fn parse(input: &str) -> Result<Self, DateKeyError> {
        let err = || DateKeyError {
            input: input.to_string(),
        };
        let date = NaiveDate::parse_from_str(input, KEY_FORMAT).map_err(|_| err())?;
        let key = Self(date);
        if key.to_string() != input {
            return Err(err());
        }
        Ok(key)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn weekday(&self) -> Weekday {
        self.0.weekday()
    }

    /// Shift by `days` (negative moves backwards). Saturates at chrono's range.
    pub fn add_days(&self, days: i64) -> Self {
        let shifted = self
            .0
            .checked_add_signed(chrono::Duration::try_days(days).unwrap_or(chrono::Duration::MAX))
            .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX });
        Self(shifted)
    }

    /// The following calendar day
    pub fn succ(&self) -> Self {
        self.add_days(1)
    }

    /// Signed number of days from `self` to `other` (`other - self`)
    pub fn days_until(&self, other: DateKey) -> i64 {
        (other.0 - self.0).num_days()
    }

    /// Iterate over every day in `[self, end]`. Empty when `end < self`.
    pub fn iter_through(self, end: DateKey) -> impl Iterator<Item = DateKey> {
        let count = self.days_until(end) + 1;
        (0..count.max(0)).map(move |offset| self.add_days(offset))
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(KEY_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = DateKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
