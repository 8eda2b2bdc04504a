// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! SensorKPI - synthetic sensor readings, threshold anomalies and reports
//!
//! Manages a small relational dataset of sensors, their time-series readings
//! and derived anomaly events.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                          Engine                            │
//! ├────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐   ┌─────────────┐   ┌────────────────────┐   │
//! │  │ Catalog  │ → │ Synthesizer │ → │ Anomaly Classifier │   │
//! │  │ (seed)   │   │ (readings)  │   │ (threshold rules)  │   │
//! │  └──────────┘   └─────────────┘   └────────────────────┘   │
//! │        ↓               ↓                    ↓              │
//! │  ┌──────────────────────────────────────────────────────┐  │
//! │  │            SensorStore (SQLite, per-batch tx)        │  │
//! │  └──────────────────────────────────────────────────────┘  │
//! │                          ↓                                 │
//! │                ┌──────────────────┐                        │
//! │                │     Reports      │                        │
//! │                └──────────────────┘                        │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod core;
pub mod db;
pub mod detection;
pub mod error;
pub mod reports;
pub mod sensors;

// Re-exports for convenience
pub use config::Config;
pub use core::{Engine, PipelineState, StepOutcome};
pub use db::{Database, SensorStore};
pub use detection::{AnomalyClassifier, AnomalyEvent, AnomalyType, Severity};
pub use error::{KpiError, KpiResult};
pub use sensors::{infer_capability, Capability, Reading, ReadingSynthesizer, Sensor};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = "SensorKPI";
