// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Database module for persistent storage

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::{params, Connection, Row};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::detection::{AnomalyEvent, AnomalyType, CandidateFilter, Severity};
use crate::error::{KpiError, KpiResult};
use crate::sensors::{ActiveSensor, Capability, DataQuality, Reading, Sensor, SensorStatus};

/// Storage format for timestamps (UTC, second precision)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Columns the seed step writes into `sensors`
pub const SENSOR_COLUMNS: [&str; 15] = [
    "sensor_id",
    "model",
    "manufacturer",
    "installation_date",
    "calibration_date",
    "location",
    "zone",
    "floor_level",
    "coordinates_lat",
    "coordinates_lng",
    "status",
    "temperature_range_min",
    "temperature_range_max",
    "humidity_range_min",
    "humidity_range_max",
];

/// Persistence seam used by the engine.
///
/// Each bulk write is atomic: either every row is committed or none is.
pub trait SensorStore {
    /// Column layout of the `sensors` table
    fn describe_sensors(&self) -> KpiResult<Vec<ColumnInfo>>;

    /// Insert sensors, skipping ids that already exist. Returns rows inserted.
    fn insert_sensors(&mut self, sensors: &[Sensor]) -> KpiResult<usize>;

    fn list_active_sensors(&self) -> KpiResult<Vec<ActiveSensor>>;

    fn insert_readings(&mut self, readings: &[Reading]) -> KpiResult<usize>;

    /// Up to `limit` readings matching `filter`, in no particular order
    fn sample_candidates(&self, filter: &CandidateFilter, limit: usize) -> KpiResult<Vec<Reading>>;

    fn insert_anomalies(&mut self, events: &[AnomalyEvent]) -> KpiResult<usize>;
}

/// One column from schema introspection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub not_null: bool,
    pub primary_key: bool,
}

/// Database manager
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database
    pub fn open(config: &DatabaseConfig) -> KpiResult<Self> {
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                KpiError::StoreUnavailable(format!("cannot create {:?}: {e}", parent))
            })?;
        }

        let conn = Connection::open(&config.path)
            .map_err(|e| KpiError::StoreUnavailable(format!("{:?}: {e}", config.path)))?;

        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        "#,
        )
        .map_err(|e| KpiError::StoreUnavailable(e.to_string()))?;

        let db = Self { conn };
        if config.create_schema {
            db.create_tables()?;
        }

        info!("Database connection established at {:?}", config.path);
        Ok(db)
    }

    /// Private in-memory database with the schema applied
    pub fn open_in_memory() -> KpiResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| KpiError::StoreUnavailable(e.to_string()))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| KpiError::StoreUnavailable(e.to_string()))?;

        let db = Self { conn };
        db.create_tables()?;
        Ok(db)
    }

    /// Create database tables
    pub fn create_tables(&self) -> KpiResult<()> {
        self.conn
            .execute_batch(SCHEMA_SQL)
            .map_err(|e| KpiError::persistence("create schema", e))?;
        debug!("Database schema applied");
        Ok(())
    }

    /// Underlying connection, for ad hoc queries
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Newest readings first
    pub fn latest_readings(&self, limit: usize) -> KpiResult<Vec<Reading>> {
        let op = "query latest readings";
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {READING_COLUMNS} FROM sensor_logs ORDER BY timestamp DESC, id DESC LIMIT ?1"
            ))
            .map_err(|e| KpiError::persistence(op, e))?;

        let rows = stmt
            .query_map(params![limit as i64], reading_from_row)
            .map_err(|e| KpiError::persistence(op, e))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| KpiError::persistence(op, e))
    }

    /// Per-day, per-sensor aggregates of readings taken at or after `since`
    pub fn daily_statistics(&self, since: DateTime<Utc>) -> KpiResult<Vec<DailyStatistics>> {
        let op = "query daily statistics";
        let mut stmt = self
            .conn
            .prepare(
                r#"SELECT
                    DATE(timestamp) AS reading_date,
                    sensor_id,
                    sensor_type,
                    COUNT(*) AS reading_count,
                    ROUND(AVG(temperature), 2),
                    ROUND(MIN(temperature), 2),
                    ROUND(MAX(temperature), 2),
                    ROUND(AVG(humidity), 2),
                    ROUND(MIN(humidity), 2),
                    ROUND(MAX(humidity), 2),
                    ROUND(AVG(battery_level), 1),
                    SUM(CASE WHEN data_quality = 'error' THEN 1 ELSE 0 END)
                FROM sensor_logs
                WHERE timestamp >= ?1
                GROUP BY DATE(timestamp), sensor_id, sensor_type
                ORDER BY reading_date DESC, sensor_id"#,
            )
            .map_err(|e| KpiError::persistence(op, e))?;

        let rows = stmt
            .query_map(params![format_timestamp(&since)], |row| {
                let date: String = row.get(0)?;
                Ok(DailyStatistics {
                    reading_date: parse_date(0, &date)?,
                    sensor_id: row.get(1)?,
                    sensor_type: row.get(2)?,
                    reading_count: row.get(3)?,
                    avg_temperature: row.get(4)?,
                    min_temperature: row.get(5)?,
                    max_temperature: row.get(6)?,
                    avg_humidity: row.get(7)?,
                    min_humidity: row.get(8)?,
                    max_humidity: row.get(9)?,
                    avg_battery: row.get(10)?,
                    error_count: row.get(11)?,
                })
            })
            .map_err(|e| KpiError::persistence(op, e))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| KpiError::persistence(op, e))
    }

    /// Anomaly counts per (sensor, type, severity) detected at or after `since`
    pub fn anomaly_summary(&self, since: DateTime<Utc>) -> KpiResult<Vec<AnomalySummary>> {
        let op = "query anomaly summary";
        let mut stmt = self
            .conn
            .prepare(
                r#"SELECT
                    sensor_id,
                    anomaly_type,
                    severity,
                    COUNT(*) AS anomaly_count,
                    MAX(detection_timestamp) AS latest_detection,
                    ROUND(AVG(deviation_score), 2)
                FROM anomaly_detections
                WHERE detection_timestamp >= ?1
                GROUP BY sensor_id, anomaly_type, severity
                ORDER BY anomaly_count DESC, latest_detection DESC"#,
            )
            .map_err(|e| KpiError::persistence(op, e))?;

        let rows = stmt
            .query_map(params![format_timestamp(&since)], |row| {
                let latest: String = row.get(4)?;
                Ok(AnomalySummary {
                    sensor_id: row.get(0)?,
                    anomaly_type: row.get(1)?,
                    severity: row.get(2)?,
                    anomaly_count: row.get(3)?,
                    latest_detection: parse_timestamp(4, &latest)?,
                    avg_deviation: row.get(5)?,
                })
            })
            .map_err(|e| KpiError::persistence(op, e))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| KpiError::persistence(op, e))
    }

    /// Get database statistics
    pub fn get_stats(&self) -> KpiResult<DatabaseStats> {
        let count = |table: &str| -> KpiResult<usize> {
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get::<_, i64>(0))
                .map(|n| n as usize)
                .map_err(|e| KpiError::persistence("count rows", e))
        };

        Ok(DatabaseStats {
            sensor_count: count("sensors")?,
            reading_count: count("sensor_logs")?,
            anomaly_count: count("anomaly_detections")?,
        })
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        info!("Database connection closed");
    }
}

impl SensorStore for Database {
    fn describe_sensors(&self) -> KpiResult<Vec<ColumnInfo>> {
        let op = "describe sensors";
        let mut stmt = self
            .conn
            .prepare("PRAGMA table_info(sensors)")
            .map_err(|e| KpiError::persistence(op, e))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(ColumnInfo {
                    name: row.get("name")?,
                    data_type: row.get("type")?,
                    not_null: row.get::<_, i64>("notnull")? != 0,
                    primary_key: row.get::<_, i64>("pk")? != 0,
                })
            })
            .map_err(|e| KpiError::persistence(op, e))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| KpiError::persistence(op, e))
    }

    fn insert_sensors(&mut self, sensors: &[Sensor]) -> KpiResult<usize> {
        let op = "insert sensors";
        let tx = self.conn.transaction().map_err(|e| KpiError::persistence(op, e))?;
        let mut count = 0;

        {
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT OR IGNORE INTO sensors ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                    SENSOR_COLUMNS.join(", ")
                ))
                .map_err(|e| KpiError::persistence(op, e))?;

            for sensor in sensors {
                count += stmt
                    .execute(params![
                        sensor.sensor_id,
                        sensor.model,
                        sensor.manufacturer,
                        sensor.installation_date.format(DATE_FORMAT).to_string(),
                        sensor.calibration_date.map(|d| d.format(DATE_FORMAT).to_string()),
                        sensor.location,
                        sensor.zone,
                        sensor.floor_level,
                        sensor.coordinates.0,
                        sensor.coordinates.1,
                        sensor.status,
                        sensor.temperature_range.min,
                        sensor.temperature_range.max,
                        sensor.humidity_range.min,
                        sensor.humidity_range.max,
                    ])
                    .map_err(|e| KpiError::persistence(op, e))?;
            }
        }

        tx.commit().map_err(|e| KpiError::persistence(op, e))?;
        Ok(count)
    }

    fn list_active_sensors(&self) -> KpiResult<Vec<ActiveSensor>> {
        let op = "list active sensors";
        let mut stmt = self
            .conn
            .prepare("SELECT sensor_id, model, location FROM sensors WHERE status = ?1 ORDER BY sensor_id")
            .map_err(|e| KpiError::persistence(op, e))?;

        let rows = stmt
            .query_map(params![SensorStatus::Active], |row| {
                Ok(ActiveSensor {
                    sensor_id: row.get(0)?,
                    model: row.get(1)?,
                    location: row.get(2)?,
                })
            })
            .map_err(|e| KpiError::persistence(op, e))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| KpiError::persistence(op, e))
    }

    fn insert_readings(&mut self, readings: &[Reading]) -> KpiResult<usize> {
        let op = "insert readings";
        let tx = self.conn.transaction().map_err(|e| KpiError::persistence(op, e))?;

        {
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT INTO sensor_logs ({READING_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
                ))
                .map_err(|e| KpiError::persistence(op, e))?;

            for reading in readings {
                stmt.execute(params![
                    reading.sensor_id,
                    reading.location,
                    reading.capability,
                    reading.temperature,
                    reading.humidity,
                    format_timestamp(&reading.timestamp),
                    reading.data_quality,
                    reading.battery_level,
                    reading.signal_strength,
                ])
                .map_err(|e| KpiError::persistence(op, e))?;
            }
        }

        tx.commit().map_err(|e| KpiError::persistence(op, e))?;
        Ok(readings.len())
    }

    fn sample_candidates(&self, filter: &CandidateFilter, limit: usize) -> KpiResult<Vec<Reading>> {
        let op = "sample anomaly candidates";
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {READING_COLUMNS} FROM sensor_logs
                 WHERE data_quality = ?1 AND (temperature > ?2 OR humidity > ?3)
                 ORDER BY RANDOM() LIMIT ?4"
            ))
            .map_err(|e| KpiError::persistence(op, e))?;

        let rows = stmt
            .query_map(
                params![filter.quality, filter.min_temperature, filter.min_humidity, limit as i64],
                reading_from_row,
            )
            .map_err(|e| KpiError::persistence(op, e))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| KpiError::persistence(op, e))
    }

    fn insert_anomalies(&mut self, events: &[AnomalyEvent]) -> KpiResult<usize> {
        let op = "insert anomalies";
        let tx = self.conn.transaction().map_err(|e| KpiError::persistence(op, e))?;

        {
            let mut stmt = tx
                .prepare(
                    r#"INSERT INTO anomaly_detections
                       (sensor_id, detection_timestamp, anomaly_type, severity,
                        threshold_value, actual_value, deviation_score, description)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
                )
                .map_err(|e| KpiError::persistence(op, e))?;

            for event in events {
                stmt.execute(params![
                    event.sensor_id,
                    format_timestamp(&event.detection_timestamp),
                    event.anomaly_type,
                    event.severity,
                    event.threshold_value,
                    event.actual_value,
                    event.deviation_score,
                    event.description,
                ])
                .map_err(|e| KpiError::persistence(op, e))?;
            }
        }

        tx.commit().map_err(|e| KpiError::persistence(op, e))?;
        Ok(events.len())
    }
}

const READING_COLUMNS: &str = "sensor_id, location, sensor_type, temperature, humidity, \
     timestamp, data_quality, battery_level, signal_strength";

fn reading_from_row(row: &Row<'_>) -> rusqlite::Result<Reading> {
    let timestamp: String = row.get(5)?;
    Ok(Reading {
        sensor_id: row.get(0)?,
        location: row.get(1)?,
        capability: row.get(2)?,
        temperature: row.get(3)?,
        humidity: row.get(4)?,
        timestamp: parse_timestamp(5, &timestamp)?,
        data_quality: row.get(6)?,
        battery_level: row.get(7)?,
        signal_strength: row.get(8)?,
    })
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_date(idx: usize, value: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

// Enum tags are stored as their lowercase names
macro_rules! sql_tag {
    ($($ty:ty),+) => {$(
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e| FromSqlError::Other(Box::new(e)))
            }
        }
    )+};
}

sql_tag!(SensorStatus, Capability, DataQuality, AnomalyType, Severity);

/// Daily aggregate row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStatistics {
    pub reading_date: NaiveDate,
    pub sensor_id: String,
    pub sensor_type: Capability,
    pub reading_count: i64,
    pub avg_temperature: Option<f64>,
    pub min_temperature: Option<f64>,
    pub max_temperature: Option<f64>,
    pub avg_humidity: Option<f64>,
    pub min_humidity: Option<f64>,
    pub max_humidity: Option<f64>,
    pub avg_battery: Option<f64>,
    pub error_count: i64,
}

/// Anomaly summary row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalySummary {
    pub sensor_id: String,
    pub anomaly_type: AnomalyType,
    pub severity: Severity,
    pub anomaly_count: i64,
    pub latest_detection: DateTime<Utc>,
    pub avg_deviation: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseStats {
    pub sensor_count: usize,
    pub reading_count: usize,
    pub anomaly_count: usize,
}

const SCHEMA_SQL: &str = r#"
-- Sensor metadata
CREATE TABLE IF NOT EXISTS sensors (
    sensor_id TEXT PRIMARY KEY,
    model TEXT NOT NULL,
    manufacturer TEXT,
    installation_date TEXT,
    calibration_date TEXT,
    location TEXT NOT NULL,
    zone TEXT,
    floor_level INTEGER,
    coordinates_lat REAL,
    coordinates_lng REAL,
    status TEXT NOT NULL DEFAULT 'active'
        CHECK (status IN ('active', 'inactive', 'maintenance')),
    temperature_range_min REAL,
    temperature_range_max REAL,
    humidity_range_min REAL,
    humidity_range_max REAL,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP
);

-- Sensor readings
CREATE TABLE IF NOT EXISTS sensor_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sensor_id TEXT NOT NULL REFERENCES sensors(sensor_id),
    location TEXT NOT NULL,
    sensor_type TEXT NOT NULL CHECK (sensor_type IN ('temperature', 'humidity', 'combo')),
    temperature REAL,
    humidity REAL,
    timestamp TEXT NOT NULL,
    data_quality TEXT NOT NULL CHECK (data_quality IN ('good', 'warning', 'error')),
    battery_level REAL NOT NULL,
    signal_strength INTEGER NOT NULL,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_sensor_logs_timestamp ON sensor_logs(timestamp);
CREATE INDEX IF NOT EXISTS idx_sensor_logs_sensor ON sensor_logs(sensor_id);

-- Anomaly detections
CREATE TABLE IF NOT EXISTS anomaly_detections (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sensor_id TEXT NOT NULL REFERENCES sensors(sensor_id),
    detection_timestamp TEXT NOT NULL,
    anomaly_type TEXT NOT NULL,
    severity TEXT NOT NULL CHECK (severity IN ('low', 'medium', 'high')),
    threshold_value REAL NOT NULL,
    actual_value REAL NOT NULL,
    deviation_score REAL NOT NULL,
    description TEXT,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_anomaly_detections_timestamp ON anomaly_detections(detection_timestamp);
CREATE INDEX IF NOT EXISTS idx_anomaly_detections_sensor ON anomaly_detections(sensor_id);
"#;
