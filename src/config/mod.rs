// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Configuration module

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{KpiError, KpiResult};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level
    pub log_level: String,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Reading generator configuration
    pub generator: GeneratorConfig,

    /// Anomaly simulation configuration
    pub anomalies: AnomalyConfig,

    /// Report configuration
    pub reports: ReportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            database: DatabaseConfig::default(),
            generator: GeneratorConfig::default(),
            anomalies: AnomalyConfig::default(),
            reports: ReportConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("sensorkpi"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn validate(&self) -> KpiResult<()> {
        self.generator.validate()
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database path
    pub path: PathBuf,

    /// Create missing tables on open
    pub create_schema: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/sensor_analytics.db"),
            create_schema: true,
        }
    }
}

/// Relative weights of the data-quality tags
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityWeights {
    pub good: f64,
    pub warning: f64,
    pub error: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            good: 0.85,
            warning: 0.12,
            error: 0.03,
        }
    }
}

/// Reading generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Days of history to synthesize
    pub days_back: u32,

    /// Hourly samples per day
    pub readings_per_day: u32,

    pub temperature_range: [f64; 2],
    pub humidity_range: [f64; 2],
    pub battery_range: [f64; 2],
    pub signal_range: [u8; 2],

    /// Fixed RNG seed; entropy-seeded when absent
    pub seed: Option<u64>,

    pub quality_weights: QualityWeights,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            days_back: 7,
            readings_per_day: 12,
            temperature_range: [18.0, 32.0],
            humidity_range: [35.0, 75.0],
            battery_range: [15.0, 100.0],
            signal_range: [50, 100],
            seed: None,
            quality_weights: QualityWeights::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> KpiResult<()> {
        let ranges = [
            ("temperature_range", self.temperature_range),
            ("humidity_range", self.humidity_range),
            ("battery_range", self.battery_range),
        ];
        for (name, [min, max]) in ranges {
            if !min.is_finite() || !max.is_finite() || min > max {
                return Err(KpiError::InvalidConfig(format!(
                    "{name} must be finite with min <= max, got [{min}, {max}]"
                )));
            }
        }

        let [s_min, s_max] = self.signal_range;
        if s_min > s_max || s_max > 100 {
            return Err(KpiError::InvalidConfig(format!(
                "signal_range must satisfy min <= max <= 100, got [{s_min}, {s_max}]"
            )));
        }

        let [b_min, b_max] = self.battery_range;
        if b_min < 0.0 || b_max > 100.0 {
            return Err(KpiError::InvalidConfig(format!(
                "battery_range must lie within [0, 100], got [{b_min}, {b_max}]"
            )));
        }

        let w = &self.quality_weights;
        let weights = [w.good, w.warning, w.error];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(KpiError::InvalidConfig(format!(
                "quality weights must be non-negative, got {weights:?}"
            )));
        }
        let total: f64 = weights.iter().sum();
        if (total - 1.0).abs() > 1e-9 {
            return Err(KpiError::InvalidConfig(format!(
                "quality weights must sum to 1.0, got {total}"
            )));
        }

        Ok(())
    }
}

/// Anomaly simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Maximum candidate readings sampled per run
    pub max_anomalies: usize,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self { max_anomalies: 8 }
    }
}

/// Report configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Rows in the latest-readings report
    pub latest_limit: usize,

    /// Lookback for daily statistics
    pub statistics_days: u32,

    /// Lookback for the anomaly summary
    pub anomaly_days: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            latest_limit: 15,
            statistics_days: 7,
            anomaly_days: 7,
        }
    }
}
