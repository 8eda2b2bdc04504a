// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Capability inference from sensor identity strings

use super::Capability;

/// Ordered rules: (id marker, model marker, capability). First match wins.
const RULES: [(&str, &str, Capability); 3] = [
    ("TEMP", "DHT", Capability::Temperature),
    ("HUM", "HUM", Capability::Humidity),
    ("COMBO", "BME", Capability::Combo),
];

/// Infer what a sensor measures from its id and model.
///
/// Matching is case-insensitive substring search. Inputs that match no
/// rule are treated as `Combo`.
pub fn infer_capability(sensor_id: &str, model: &str) -> Capability {
    let id = sensor_id.to_uppercase();
    let model = model.to_uppercase();

    RULES
        .iter()
        .find(|(id_marker, model_marker, _)| id.contains(id_marker) || model.contains(model_marker))
        .map(|(_, _, capability)| *capability)
        .unwrap_or(Capability::Combo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_sensors() {
        assert_eq!(infer_capability("TEMP_001", "DHT22"), Capability::Temperature);
        assert_eq!(infer_capability("HUM_001", "HUM100"), Capability::Humidity);
        assert_eq!(infer_capability("COMBO_001", "BME280"), Capability::Combo);
    }

    #[test]
    fn test_unmatched_defaults_to_combo() {
        assert_eq!(infer_capability("XYZ_1", "UNKNOWN"), Capability::Combo);
        assert_eq!(infer_capability("", ""), Capability::Combo);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(infer_capability("temp-lab", "x"), Capability::Temperature);
        assert_eq!(infer_capability("probe", "dht11"), Capability::Temperature);
        assert_eq!(infer_capability("probe", "hum-2"), Capability::Humidity);
        assert_eq!(infer_capability("probe", "bme680"), Capability::Combo);
    }

    #[test]
    fn test_precedence_temperature_first() {
        // Both temperature and humidity markers present
        assert_eq!(infer_capability("TEMP_HUM_1", "HUM100"), Capability::Temperature);
        assert_eq!(infer_capability("HUM_1", "DHT22"), Capability::Temperature);
        // Humidity beats combo
        assert_eq!(infer_capability("COMBO_1", "HUM100"), Capability::Humidity);
    }

    #[test]
    fn test_deterministic() {
        let pairs = [("TEMP_001", "DHT22"), ("a", "b"), ("Hum", "bme"), ("combo", "")];
        for (id, model) in pairs {
            let first = infer_capability(id, model);
            for _ in 0..10 {
                assert_eq!(infer_capability(id, model), first);
            }
        }
    }
}
