// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Detection module - threshold anomaly classification

mod classification;

pub use classification::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sensors::string_tag;

/// Anomaly event derived from a single reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyEvent {
    pub sensor_id: String,
    /// Copied from the source reading
    pub detection_timestamp: DateTime<Utc>,
    pub anomaly_type: AnomalyType,
    pub severity: Severity,
    pub threshold_value: f64,
    pub actual_value: f64,
    /// |actual - threshold| / threshold * 100, 2 decimals
    pub deviation_score: f64,
    pub description: String,
}

/// Anomaly type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyType {
    TemperatureSpike,
    HumiditySpike,
}

string_tag!(AnomalyType, "anomaly type", {
    TemperatureSpike => "temperature_spike",
    HumiditySpike => "humidity_spike",
});

/// Severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

string_tag!(Severity, "severity", {
    Low => "low",
    Medium => "medium",
    High => "high",
});
