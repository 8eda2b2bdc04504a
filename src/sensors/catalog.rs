// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Seed sensor catalog

use chrono::NaiveDate;

use super::{OperatingRange, Sensor, SensorStatus};

const TEMPERATURE_RANGE: OperatingRange = OperatingRange::new(-40.0, 85.0);
const HUMIDITY_RANGE: OperatingRange = OperatingRange::new(0.0, 100.0);

struct SeedSpec {
    id: &'static str,
    model: &'static str,
    manufacturer: &'static str,
    installed: (i32, u32, u32),
    calibrated: Option<(i32, u32, u32)>,
    location: &'static str,
    zone: &'static str,
    floor: i32,
    coordinates: (f64, f64),
    status: SensorStatus,
}

const SEEDS: [SeedSpec; 3] = [
    SeedSpec {
        id: "TEMP_001",
        model: "DHT22",
        manufacturer: "Adafruit",
        installed: (2024, 1, 15),
        calibrated: None,
        location: "Warehouse A",
        zone: "Zone A",
        floor: 1,
        coordinates: (18.0, 73.0),
        status: SensorStatus::Active,
    },
    SeedSpec {
        id: "HUM_001",
        model: "HUM100",
        manufacturer: "Sensirion",
        installed: (2024, 1, 10),
        calibrated: Some((2024, 6, 10)),
        location: "Storage",
        zone: "Zone B",
        floor: 0,
        coordinates: (18.0, 74.0),
        status: SensorStatus::Active,
    },
    SeedSpec {
        id: "COMBO_001",
        model: "BME280",
        manufacturer: "Bosch",
        installed: (2024, 1, 12),
        calibrated: Some((2024, 6, 11)),
        location: "Research Lab",
        zone: "Zone C",
        floor: 2,
        coordinates: (19.0, 75.0),
        status: SensorStatus::Maintenance,
    },
];

fn date((y, m, d): (i32, u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

/// Sample sensors inserted by the seed step
pub fn sample_sensors() -> Vec<Sensor> {
    SEEDS
        .iter()
        .map(|s| Sensor {
            sensor_id: s.id.to_string(),
            model: s.model.to_string(),
            manufacturer: s.manufacturer.to_string(),
            installation_date: date(s.installed),
            calibration_date: s.calibrated.map(date),
            location: s.location.to_string(),
            zone: s.zone.to_string(),
            floor_level: s.floor,
            coordinates: s.coordinates,
            status: s.status,
            temperature_range: TEMPERATURE_RANGE,
            humidity_range: HUMIDITY_RANGE,
        })
        .collect()
}
