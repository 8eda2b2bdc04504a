// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Synthetic reading generator for simulation/testing

use chrono::{DateTime, Duration, Utc};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_distr::Uniform;
use tracing::debug;

use super::{infer_capability, ActiveSensor, Capability, DataQuality, Reading};
use crate::config::GeneratorConfig;
use crate::error::{KpiError, KpiResult};

const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Discrete sampler over an explicit weight table
#[derive(Debug, Clone)]
pub struct WeightedSampler<T> {
    items: Vec<T>,
    index: WeightedIndex<f64>,
}

impl<T: Copy> WeightedSampler<T> {
    /// Weights must be finite, non-negative and sum to 1.0
    pub fn new(table: &[(T, f64)]) -> KpiResult<Self> {
        if table.is_empty() {
            return Err(KpiError::InvalidConfig("weight table is empty".to_string()));
        }
        if let Some((_, w)) = table.iter().find(|(_, w)| !w.is_finite() || *w < 0.0) {
            return Err(KpiError::InvalidConfig(format!("invalid weight {w}")));
        }

        let total: f64 = table.iter().map(|(_, w)| w).sum();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(KpiError::InvalidConfig(format!(
                "weights must sum to 1.0, got {total}"
            )));
        }

        let index = WeightedIndex::new(table.iter().map(|(_, w)| *w))
            .map_err(|e| KpiError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            items: table.iter().map(|(item, _)| *item).collect(),
            index,
        })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        self.items[self.index.sample(rng)]
    }
}

/// Value ranges and quality mix used when synthesizing readings
#[derive(Debug, Clone)]
pub struct SynthesisProfile {
    temperature: Uniform<f64>,
    humidity: Uniform<f64>,
    battery: Uniform<f64>,
    signal: Uniform<u8>,
    quality: WeightedSampler<DataQuality>,
}

impl SynthesisProfile {
    pub fn from_config(config: &GeneratorConfig) -> KpiResult<Self> {
        config.validate()?;

        let w = &config.quality_weights;
        let quality = WeightedSampler::new(&[
            (DataQuality::Good, w.good),
            (DataQuality::Warning, w.warning),
            (DataQuality::Error, w.error),
        ])?;

        let [t_min, t_max] = config.temperature_range;
        let [h_min, h_max] = config.humidity_range;
        let [b_min, b_max] = config.battery_range;
        let [s_min, s_max] = config.signal_range;

        Ok(Self {
            temperature: Uniform::new_inclusive(t_min, t_max),
            humidity: Uniform::new_inclusive(h_min, h_max),
            battery: Uniform::new_inclusive(b_min, b_max),
            signal: Uniform::new_inclusive(s_min, s_max),
            quality,
        })
    }
}

/// Timestamps for one sensor: `days_back` days of `readings_per_day` hourly
/// offsets starting at `now - days_back`.
///
/// Offsets are hours, not clock slots: with more than 24 readings per day
/// the later slots spill into the following calendar day. Fails with
/// `GridOutOfRange` when the first or last slot is not a valid timestamp.
pub fn slot_timestamps(
    now: DateTime<Utc>,
    days_back: u32,
    readings_per_day: u32,
) -> KpiResult<impl Iterator<Item = DateTime<Utc>>> {
    let out_of_range = || KpiError::GridOutOfRange { days_back, readings_per_day };

    let start = now
        .checked_sub_signed(Duration::days(i64::from(days_back)))
        .ok_or_else(out_of_range)?;
    if days_back > 0 && readings_per_day > 0 {
        let last = Duration::days(i64::from(days_back - 1))
            + Duration::hours(i64::from(readings_per_day - 1));
        start.checked_add_signed(last).ok_or_else(out_of_range)?;
    }

    // Every slot lies between start and last
    Ok((0..days_back).flat_map(move |day| {
        (0..readings_per_day).map(move |interval| {
            start + Duration::days(i64::from(day)) + Duration::hours(i64::from(interval))
        })
    }))
}

/// Generates capability-consistent readings over a time grid
pub struct ReadingSynthesizer<R: Rng = ChaCha8Rng> {
    profile: SynthesisProfile,
    rng: R,
}

impl ReadingSynthesizer<ChaCha8Rng> {
    pub fn new(profile: SynthesisProfile) -> Self {
        Self::with_rng(profile, ChaCha8Rng::from_entropy())
    }

    pub fn seeded(profile: SynthesisProfile, seed: u64) -> Self {
        Self::with_rng(profile, ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn from_config(config: &GeneratorConfig) -> KpiResult<Self> {
        let profile = SynthesisProfile::from_config(config)?;
        Ok(match config.seed {
            Some(seed) => Self::seeded(profile, seed),
            None => Self::new(profile),
        })
    }
}

impl<R: Rng> ReadingSynthesizer<R> {
    pub fn with_rng(profile: SynthesisProfile, rng: R) -> Self {
        Self { profile, rng }
    }

    /// One reading per (sensor, day, interval)
    pub fn synthesize(
        &mut self,
        sensors: &[ActiveSensor],
        now: DateTime<Utc>,
        days_back: u32,
        readings_per_day: u32,
    ) -> KpiResult<Vec<Reading>> {
        let out_of_range = || KpiError::GridOutOfRange { days_back, readings_per_day };

        let total = (days_back as usize)
            .checked_mul(readings_per_day as usize)
            .and_then(|per_sensor| per_sensor.checked_mul(sensors.len()))
            .ok_or_else(out_of_range)?;
        let mut readings = Vec::new();
        readings.try_reserve(total).map_err(|_| out_of_range())?;

        for sensor in sensors {
            let capability = infer_capability(&sensor.sensor_id, &sensor.model);
            debug!("Sensor {} ({}) inferred as {}", sensor.sensor_id, sensor.model, capability);

            for timestamp in slot_timestamps(now, days_back, readings_per_day)? {
                readings.push(self.reading(sensor, capability, timestamp));
            }
        }

        Ok(readings)
    }

    fn reading(
        &mut self,
        sensor: &ActiveSensor,
        capability: Capability,
        timestamp: DateTime<Utc>,
    ) -> Reading {
        let temperature = if capability.measures_temperature() {
            Some(round_to(self.profile.temperature.sample(&mut self.rng), 2))
        } else {
            None
        };
        let humidity = if capability.measures_humidity() {
            Some(round_to(self.profile.humidity.sample(&mut self.rng), 2))
        } else {
            None
        };

        Reading {
            sensor_id: sensor.sensor_id.clone(),
            location: sensor.location.clone(),
            capability,
            temperature,
            humidity,
            timestamp,
            data_quality: self.profile.quality.sample(&mut self.rng),
            battery_level: round_to(self.profile.battery.sample(&mut self.rng), 1),
            signal_strength: self.profile.signal.sample(&mut self.rng),
        }
    }
}
