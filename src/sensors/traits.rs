// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Sensor metadata and reading types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a stored tag does not name a known variant
#[derive(Debug, Clone, Error)]
#[error("unknown {kind} `{value}`")]
pub struct ParseTagError {
    pub kind: &'static str,
    pub value: String,
}

/// Implements `as_str`, `Display` and `FromStr` over fixed lowercase tags
macro_rules! string_tag {
    ($ty:ident, $kind:literal, { $($variant:ident => $tag:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $tag,)+
                }
            }
        }

        impl ::std::fmt::Display for $ty {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $ty {
            type Err = $crate::sensors::ParseTagError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($tag => Ok($ty::$variant),)+
                    other => Err($crate::sensors::ParseTagError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}
pub(crate) use string_tag;

/// Sensor operational status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorStatus {
    Active,
    Inactive,
    Maintenance,
}

string_tag!(SensorStatus, "sensor status", {
    Active => "active",
    Inactive => "inactive",
    Maintenance => "maintenance",
});

/// Measurement capability inferred from a sensor's id and model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Temperature,
    Humidity,
    Combo,
}

string_tag!(Capability, "capability", {
    Temperature => "temperature",
    Humidity => "humidity",
    Combo => "combo",
});

impl Capability {
    pub fn measures_temperature(&self) -> bool {
        matches!(self, Capability::Temperature | Capability::Combo)
    }

    pub fn measures_humidity(&self) -> bool {
        matches!(self, Capability::Humidity | Capability::Combo)
    }
}

/// Data-quality tag attached to each reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataQuality {
    Good,
    Warning,
    Error,
}

string_tag!(DataQuality, "data quality", {
    Good => "good",
    Warning => "warning",
    Error => "error",
});

/// Inclusive min/max operating range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperatingRange {
    pub min: f64,
    pub max: f64,
}

impl OperatingRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Sensor metadata row, inserted once by seeding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub sensor_id: String,
    pub model: String,
    pub manufacturer: String,
    pub installation_date: NaiveDate,
    pub calibration_date: Option<NaiveDate>,
    pub location: String,
    pub zone: String,
    pub floor_level: i32,
    pub coordinates: (f64, f64), // lat, lng
    pub status: SensorStatus,
    pub temperature_range: OperatingRange,
    pub humidity_range: OperatingRange,
}

/// The subset of sensor metadata the synthesizer needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSensor {
    pub sensor_id: String,
    pub model: String,
    pub location: String,
}

/// A single timestamped measurement record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub sensor_id: String,
    pub location: String,
    pub capability: Capability,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub timestamp: DateTime<Utc>,
    pub data_quality: DataQuality,
    pub battery_level: f64, // 0-100
    pub signal_strength: u8, // 0-100
}

impl Reading {
    /// Whether the optional fields agree with the capability
    pub fn is_consistent(&self) -> bool {
        self.temperature.is_some() == self.capability.measures_temperature()
            && self.humidity.is_some() == self.capability.measures_humidity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_round_trip_through_str() {
        for cap in [Capability::Temperature, Capability::Humidity, Capability::Combo] {
            assert_eq!(cap.as_str().parse::<Capability>().unwrap(), cap);
        }
        assert_eq!("maintenance".parse::<SensorStatus>().unwrap(), SensorStatus::Maintenance);
        assert_eq!(DataQuality::Warning.to_string(), "warning");
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let err = "pressure".parse::<Capability>().unwrap_err();
        assert_eq!(err.to_string(), "unknown capability `pressure`");
    }

    #[test]
    fn test_capability_fields() {
        assert!(Capability::Temperature.measures_temperature());
        assert!(!Capability::Temperature.measures_humidity());
        assert!(!Capability::Humidity.measures_temperature());
        assert!(Capability::Combo.measures_temperature() && Capability::Combo.measures_humidity());
    }
}
