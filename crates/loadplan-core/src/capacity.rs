//! Daily capacity model
//!
//! Maps a calendar day to the hours of work the single shared lane can absorb.
//! Weekdays always get the base capacity; Saturday and Sunday are configured
//! independently as off, half or full days.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::date::DateKey;
use crate::ConfigError;

/// How much of the base capacity a weekend day gets
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayMode {
    #[default]
    Off,
    Half,
    Full,
}

impl DayMode {
    /// Fraction of the base daily capacity
    pub fn factor(self) -> f64 {
        match self {
            DayMode::Off => 0.0,
            DayMode::Half => 0.5,
            DayMode::Full => 1.0,
        }
    }
}

impl std::fmt::Display for DayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayMode::Off => write!(f, "off"),
            DayMode::Half => write!(f, "half"),
            DayMode::Full => write!(f, "full"),
        }
    }
}

/// Saturday/Sunday configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekendConfig {
    #[serde(default)]
    pub saturday: DayMode,
    #[serde(default)]
    pub sunday: DayMode,
}

impl WeekendConfig {
    pub const fn new(saturday: DayMode, sunday: DayMode) -> Self {
        Self { saturday, sunday }
    }

    /// Both weekend days at full capacity
    pub const fn working() -> Self {
        Self::new(DayMode::Full, DayMode::Full)
    }
}

/// Process-wide capacity settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapacityConfig {
    /// Base weekday capacity in hours
    pub daily_capacity_hours: f64,
    #[serde(default)]
    pub weekend: WeekendConfig,
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            daily_capacity_hours: 7.0,
            weekend: WeekendConfig::default(),
        }
    }
}

impl CapacityConfig {
    /// Create a validated configuration
    pub fn new(daily_capacity_hours: f64, weekend: WeekendConfig) -> Result<Self, ConfigError> {
        let config = Self {
            daily_capacity_hours,
            weekend,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.daily_capacity_hours.is_finite() || self.daily_capacity_hours <= 0.0 {
            return Err(ConfigError::InvalidCapacity(self.daily_capacity_hours));
        }
        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Hours of capacity on `date`
    pub fn day_capacity(&self, date: DateKey) -> f64 {
        let factor = match date.weekday() {
            Weekday::Sat => self.weekend.saturday.factor(),
            Weekday::Sun => self.weekend.sunday.factor(),
            _ => 1.0,
        };
        self.daily_capacity_hours * factor
    }

    /// Minutes of capacity on `date`
    pub fn day_capacity_minutes(&self, date: DateKey) -> f64 {
        self.day_capacity(date) * 60.0
    }

    pub fn is_capacity_bearing(&self, date: DateKey) -> bool {
        self.day_capacity(date) > 0.0
    }

    /// Number of capacity-bearing days in `[start, due]`
    pub fn capacity_bearing_days(&self, start: DateKey, due: DateKey) -> usize {
        start
            .iter_through(due)
            .filter(|day| self.is_capacity_bearing(*day))
            .count()
    }

    /// Total hours available in `[start, due]`
    pub fn range_capacity_hours(&self, start: DateKey, due: DateKey) -> f64 {
        start.iter_through(due).map(|day| self.day_capacity(day)).sum()
    }
}
