// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Report rendering - latest readings, daily statistics, anomaly summary

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tabled::{Table, Tabled};
use tracing::error;

use crate::db::{format_timestamp, AnomalySummary, DailyStatistics, Database};
use crate::sensors::Reading;

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Pretty-printed table
    #[default]
    Table,
    /// JSON array
    Json,
}

const BANNER_WIDTH: usize = 80;

fn banner(title: &str) -> String {
    let rule = "=".repeat(BANNER_WIDTH);
    format!("\n{rule}\n{title}\n{rule}")
}

fn or_na(value: Option<f64>, suffix: &str) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.1}{suffix}"))
}

fn plain(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}

#[derive(Debug, Tabled)]
struct LatestReadingRow {
    sensor_id: String,
    sensor_type: String,
    temperature: String,
    humidity: String,
    timestamp: String,
    data_quality: String,
    battery_level: String,
    signal_strength: String,
}

impl From<&Reading> for LatestReadingRow {
    fn from(r: &Reading) -> Self {
        Self {
            sensor_id: r.sensor_id.clone(),
            sensor_type: r.capability.to_string(),
            temperature: or_na(r.temperature, "°C"),
            humidity: or_na(r.humidity, "%"),
            timestamp: format_timestamp(&r.timestamp),
            data_quality: r.data_quality.to_string(),
            battery_level: or_na(Some(r.battery_level), "%"),
            signal_strength: format!("{}%", r.signal_strength),
        }
    }
}

#[derive(Debug, Tabled)]
struct DailyStatisticsRow {
    reading_date: String,
    sensor_id: String,
    sensor_type: String,
    reading_count: i64,
    avg_temp: String,
    min_temp: String,
    max_temp: String,
    avg_humidity: String,
    min_humidity: String,
    max_humidity: String,
    avg_battery: String,
    error_count: i64,
}

impl From<&DailyStatistics> for DailyStatisticsRow {
    fn from(s: &DailyStatistics) -> Self {
        Self {
            reading_date: s.reading_date.to_string(),
            sensor_id: s.sensor_id.clone(),
            sensor_type: s.sensor_type.to_string(),
            reading_count: s.reading_count,
            avg_temp: plain(s.avg_temperature),
            min_temp: plain(s.min_temperature),
            max_temp: plain(s.max_temperature),
            avg_humidity: plain(s.avg_humidity),
            min_humidity: plain(s.min_humidity),
            max_humidity: plain(s.max_humidity),
            avg_battery: plain(s.avg_battery),
            error_count: s.error_count,
        }
    }
}

#[derive(Debug, Tabled)]
struct AnomalySummaryRow {
    sensor_id: String,
    anomaly_type: String,
    severity: String,
    anomaly_count: i64,
    latest_detection: String,
    avg_deviation: f64,
}

impl From<&AnomalySummary> for AnomalySummaryRow {
    fn from(s: &AnomalySummary) -> Self {
        Self {
            sensor_id: s.sensor_id.clone(),
            anomaly_type: s.anomaly_type.to_string(),
            severity: s.severity.to_string(),
            anomaly_count: s.anomaly_count,
            latest_detection: format_timestamp(&s.latest_detection),
            avg_deviation: s.avg_deviation,
        }
    }
}

/// Render items under a titled banner
fn render<'a, T, R>(title: &str, items: &'a [T], format: ReportFormat, empty: &str) -> Result<String>
where
    T: Serialize,
    R: Tabled + From<&'a T>,
{
    let body = if items.is_empty() {
        empty.to_string()
    } else {
        match format {
            ReportFormat::Table => Table::new(items.iter().map(R::from)).to_string(),
            ReportFormat::Json => serde_json::to_string_pretty(items)?,
        }
    };
    Ok(format!("{}\n{}", banner(title), body))
}

pub fn render_latest_readings(readings: &[Reading], format: ReportFormat) -> Result<String> {
    render::<_, LatestReadingRow>(
        "LATEST SENSOR READINGS",
        readings,
        format,
        "No sensor readings found.",
    )
}

pub fn render_daily_statistics(stats: &[DailyStatistics], format: ReportFormat) -> Result<String> {
    render::<_, DailyStatisticsRow>(
        "DAILY SENSOR STATISTICS",
        stats,
        format,
        "No statistics available.",
    )
}

pub fn render_anomaly_summary(summary: &[AnomalySummary], format: ReportFormat) -> Result<String> {
    render::<_, AnomalySummaryRow>(
        "ANOMALY DETECTION SUMMARY",
        summary,
        format,
        "No anomalies detected in the specified period.",
    )
}

fn lookback(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now - Duration::days(i64::from(days))
}

/// Print the newest `limit` readings. Errors are logged, not returned.
pub fn show_latest_readings(db: &Database, limit: usize, format: ReportFormat) {
    let rendered = db
        .latest_readings(limit)
        .map_err(anyhow::Error::from)
        .and_then(|rows| render_latest_readings(&rows, format));
    emit("latest readings", rendered);
}

pub fn show_daily_statistics(db: &Database, days: u32, format: ReportFormat) {
    let rendered = db
        .daily_statistics(lookback(Utc::now(), days))
        .map_err(anyhow::Error::from)
        .and_then(|rows| render_daily_statistics(&rows, format));
    emit("daily statistics", rendered);
}

pub fn show_anomaly_summary(db: &Database, days: u32, format: ReportFormat) {
    let rendered = db
        .anomaly_summary(lookback(Utc::now(), days))
        .map_err(anyhow::Error::from)
        .and_then(|rows| render_anomaly_summary(&rows, format));
    emit("anomaly summary", rendered);
}

fn emit(report: &str, rendered: Result<String>) {
    match rendered {
        Ok(text) => println!("{text}"),
        Err(e) => error!("Error displaying {}: {:#}", report, e),
    }
}
