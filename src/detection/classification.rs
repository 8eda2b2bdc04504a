// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Fixed-threshold anomaly classification

use super::{AnomalyEvent, AnomalyType, Severity};
use crate::sensors::{round_to, DataQuality, Reading};

pub const TEMPERATURE_THRESHOLD: f64 = 30.0;
pub const TEMPERATURE_HIGH: f64 = 35.0;
pub const HUMIDITY_THRESHOLD: f64 = 65.0;
pub const HUMIDITY_HIGH: f64 = 80.0;

/// One threshold rule over a single reading field.
///
/// Values above `threshold` but below `high_at` are `Medium`, anything at or
/// above `high_at` is `High`. `Low` is never produced by these bands.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdRule {
    pub anomaly_type: AnomalyType,
    pub threshold: f64,
    pub high_at: f64,
    field: fn(&Reading) -> Option<f64>,
}

impl ThresholdRule {
    pub fn value(&self, reading: &Reading) -> Option<f64> {
        (self.field)(reading)
    }

    pub fn severity(&self, actual: f64) -> Severity {
        if actual < self.high_at {
            Severity::Medium
        } else {
            Severity::High
        }
    }
}

fn temperature_of(reading: &Reading) -> Option<f64> {
    reading.temperature
}

fn humidity_of(reading: &Reading) -> Option<f64> {
    reading.humidity
}

/// Rules in evaluation order; temperature wins over humidity
pub const RULES: [ThresholdRule; 2] = [
    ThresholdRule {
        anomaly_type: AnomalyType::TemperatureSpike,
        threshold: TEMPERATURE_THRESHOLD,
        high_at: TEMPERATURE_HIGH,
        field: temperature_of,
    },
    ThresholdRule {
        anomaly_type: AnomalyType::HumiditySpike,
        threshold: HUMIDITY_THRESHOLD,
        high_at: HUMIDITY_HIGH,
        field: humidity_of,
    },
];

/// Percentage distance of `actual` from a non-zero `threshold`, 2 decimals
pub fn deviation_score(actual: f64, threshold: f64) -> f64 {
    round_to((actual - threshold).abs() / threshold * 100.0, 2)
}

/// Candidate selection handed to the store
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateFilter {
    pub quality: DataQuality,
    pub min_temperature: f64,
    pub min_humidity: f64,
}

impl Default for CandidateFilter {
    fn default() -> Self {
        Self {
            quality: DataQuality::Good,
            min_temperature: TEMPERATURE_THRESHOLD,
            min_humidity: HUMIDITY_THRESHOLD,
        }
    }
}

/// Applies the ordered threshold rules to candidate readings
#[derive(Debug, Clone)]
pub struct AnomalyClassifier {
    rules: &'static [ThresholdRule],
}

impl Default for AnomalyClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl AnomalyClassifier {
    pub fn new() -> Self {
        Self { rules: &RULES }
    }

    /// Classify a reading. Returns `None` when no rule fires.
    pub fn classify(&self, reading: &Reading) -> Option<AnomalyEvent> {
        self.rules.iter().find_map(|rule| {
            let actual = rule.value(reading).filter(|v| *v > rule.threshold)?;

            Some(AnomalyEvent {
                sensor_id: reading.sensor_id.clone(),
                detection_timestamp: reading.timestamp,
                anomaly_type: rule.anomaly_type,
                severity: rule.severity(actual),
                threshold_value: rule.threshold,
                actual_value: actual,
                deviation_score: deviation_score(actual, rule.threshold),
                description: format!(
                    "Detected {} - Value: {:?}, Threshold: {:.1}",
                    rule.anomaly_type, actual, rule.threshold
                ),
            })
        })
    }

    pub fn classify_all(&self, readings: &[Reading]) -> Vec<AnomalyEvent> {
        readings.iter().filter_map(|r| self.classify(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::Capability;
    use chrono::{TimeZone, Utc};

    fn reading(temperature: Option<f64>, humidity: Option<f64>) -> Reading {
        let capability = match (temperature, humidity) {
            (Some(_), None) => Capability::Temperature,
            (None, Some(_)) => Capability::Humidity,
            _ => Capability::Combo,
        };
        Reading {
            sensor_id: "COMBO_001".to_string(),
            location: "Research Lab".to_string(),
            capability,
            temperature,
            humidity,
            timestamp: Utc.with_ymd_and_hms(2024, 7, 1, 8, 0, 0).unwrap(),
            data_quality: DataQuality::Good,
            battery_level: 80.0,
            signal_strength: 90,
        }
    }

    #[test]
    fn test_temperature_medium() {
        let event = AnomalyClassifier::new().classify(&reading(Some(32.0), None)).unwrap();
        assert_eq!(event.anomaly_type, AnomalyType::TemperatureSpike);
        assert_eq!(event.severity, Severity::Medium);
        assert_eq!(event.threshold_value, 30.0);
        assert_eq!(event.actual_value, 32.0);
        assert_eq!(event.deviation_score, 6.67);
        assert_eq!(event.description, "Detected temperature_spike - Value: 32.0, Threshold: 30.0");
    }

    #[test]
    fn test_temperature_high() {
        let event = AnomalyClassifier::new().classify(&reading(Some(40.0), None)).unwrap();
        assert_eq!(event.severity, Severity::High);
        assert_eq!(event.deviation_score, 33.33);

        let boundary = AnomalyClassifier::new().classify(&reading(Some(35.0), None)).unwrap();
        assert_eq!(boundary.severity, Severity::High);
    }

    #[test]
    fn test_humidity_high() {
        let event = AnomalyClassifier::new().classify(&reading(None, Some(85.0))).unwrap();
        assert_eq!(event.anomaly_type, AnomalyType::HumiditySpike);
        assert_eq!(event.severity, Severity::High);
        assert_eq!(event.threshold_value, 65.0);
        assert_eq!(event.deviation_score, 30.77);
        assert_eq!(event.description, "Detected humidity_spike - Value: 85.0, Threshold: 65.0");
    }

    #[test]
    fn test_humidity_medium_when_temperature_below_threshold() {
        let event = AnomalyClassifier::new()
            .classify(&reading(Some(25.0), Some(70.0)))
            .unwrap();
        assert_eq!(event.anomaly_type, AnomalyType::HumiditySpike);
        assert_eq!(event.severity, Severity::Medium);
    }

    #[test]
    fn test_temperature_takes_precedence() {
        let event = AnomalyClassifier::new()
            .classify(&reading(Some(31.0), Some(90.0)))
            .unwrap();
        assert_eq!(event.anomaly_type, AnomalyType::TemperatureSpike);
        assert_eq!(event.actual_value, 31.0);
    }

    #[test]
    fn test_no_rule_fires() {
        let classifier = AnomalyClassifier::new();
        assert!(classifier.classify(&reading(Some(30.0), Some(65.0))).is_none());
        assert!(classifier.classify(&reading(None, None)).is_none());
        assert!(classifier.classify(&reading(Some(20.0), None)).is_none());
    }

    #[test]
    fn test_low_severity_unreachable() {
        let classifier = AnomalyClassifier::new();
        for tenths in 301..1000 {
            let t = f64::from(tenths) / 10.0;
            let event = classifier.classify(&reading(Some(t), None)).unwrap();
            assert_ne!(event.severity, Severity::Low);
        }
    }

    #[test]
    fn test_timestamp_copied_from_reading() {
        let r = reading(Some(33.0), None);
        let event = AnomalyClassifier::new().classify(&r).unwrap();
        assert_eq!(event.detection_timestamp, r.timestamp);
        assert_eq!(event.sensor_id, r.sensor_id);
    }

    #[test]
    fn test_classify_all_skips_non_qualifying() {
        let readings = vec![
            reading(Some(31.0), None),
            reading(Some(20.0), Some(50.0)),
            reading(None, Some(66.0)),
        ];
        let events = AnomalyClassifier::new().classify_all(&readings);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_deviation_score() {
        assert_eq!(deviation_score(32.0, 30.0), 6.67);
        assert_eq!(deviation_score(40.0, 30.0), 33.33);
        assert_eq!(deviation_score(85.0, 65.0), 30.77);
        assert_eq!(deviation_score(30.0, 30.0), 0.0);
    }
}
