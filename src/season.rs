//! Season windows and temperature ranges.

use crate::error::ValidationError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Temperature written when a completion gives no usable range, in Celsius.
pub const FALLBACK_TEMP_MIN: f64 = 0.0;
pub const FALLBACK_TEMP_MAX: f64 = 30.0;

/// Calendar month, 1 through 12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month(u8);

impl Month {
    pub const MARCH: Month = Month(3);
    pub const SEPTEMBER: Month = Month(9);

    pub fn new(number: u8) -> Result<Self, ValidationError> {
        if (1..=12).contains(&number) {
            Ok(Month(number))
        } else {
            Err(ValidationError::MonthOutOfRange(number))
        }
    }

    pub fn number(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.number())
    }
}

// The flies table stores months as zero-padded text ("03"), but older rows
// hold plain integers.
impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u8),
            Text(String),
        }

        let number = match Raw::deserialize(deserializer)? {
            Raw::Number(n) => n,
            Raw::Text(s) => s.trim().parse::<u8>().map_err(serde::de::Error::custom)?,
        };
        Month::new(number).map_err(serde::de::Error::custom)
    }
}

/// Months in which a fly is fished. `end < start` wraps over the new year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonWindow {
    pub start: Month,
    pub end: Month,
}

impl SeasonWindow {
    pub fn new(start: u8, end: u8) -> Result<Self, ValidationError> {
        Ok(Self {
            start: Month::new(start)?,
            end: Month::new(end)?,
        })
    }

    pub fn is_active(&self, month: Month) -> bool {
        let (start, end, m) = (self.start.0, self.end.0, month.0);
        if start <= end {
            start <= m && m <= end
        } else {
            m >= start || m <= end
        }
    }
}

impl Default for SeasonWindow {
    fn default() -> Self {
        Self {
            start: Month::MARCH,
            end: Month::SEPTEMBER,
        }
    }
}

/// Water temperature range in Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRange {
    pub min: f64,
    pub max: f64,
}

impl TemperatureRange {
    pub fn new(min: f64, max: f64) -> Result<Self, ValidationError> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(ValidationError::TemperatureNotFinite);
        }
        if self.min > self.max {
            return Err(ValidationError::TemperatureOrder {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

impl Default for TemperatureRange {
    fn default() -> Self {
        Self {
            min: FALLBACK_TEMP_MIN,
            max: FALLBACK_TEMP_MAX,
        }
    }
}
