//! Engine - the three batch actions over an explicitly passed store

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use super::{PipelineState, StepOutcome};
use crate::config::Config;
use crate::db::{ColumnInfo, SensorStore, SENSOR_COLUMNS};
use crate::detection::{AnomalyClassifier, CandidateFilter};
use crate::error::{KpiError, KpiResult};
use crate::sensors::{ReadingSynthesizer, Sensor};

/// Owns the store handle for the duration of a run
pub struct Engine<S: SensorStore> {
    store: S,
    synthesizer: ReadingSynthesizer,
    classifier: AnomalyClassifier,
    filter: CandidateFilter,
    state: PipelineState,
}

impl<S: SensorStore> Engine<S> {
    pub fn new(store: S, config: &Config) -> KpiResult<Self> {
        Ok(Self::with_synthesizer(store, ReadingSynthesizer::from_config(&config.generator)?))
    }

    pub fn with_synthesizer(store: S, synthesizer: ReadingSynthesizer) -> Self {
        Self {
            store,
            synthesizer,
            classifier: AnomalyClassifier::new(),
            filter: CandidateFilter::default(),
            state: PipelineState::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Log the `sensors` table layout
    pub fn check_table_structure(&self) -> KpiResult<Vec<ColumnInfo>> {
        let columns = self.store.describe_sensors().map_err(|e| {
            error!("Error checking table structure: {}", e);
            e
        })?;

        info!("Sensors table structure:");
        for col in &columns {
            info!("  {} - {}", col.name, col.data_type);
        }
        Ok(columns)
    }

    /// Insert seed sensors after checking the table has the needed columns
    pub fn seed_sensors(&mut self, sensors: &[Sensor]) -> StepOutcome {
        let outcome = match self.try_seed_sensors(sensors) {
            Ok(count) => {
                info!("Inserted {} sample sensors", count);
                self.state.sensors_seeded += count;
                StepOutcome::Completed { count }
            }
            Err(e) => {
                error!("Error inserting sensors: {}", e);
                StepOutcome::from_error(e)
            }
        };
        self.finish(outcome)
    }

    fn try_seed_sensors(&mut self, sensors: &[Sensor]) -> KpiResult<usize> {
        let columns = self.store.describe_sensors()?;
        debug!(
            "Available columns: {:?}",
            columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>()
        );

        let missing: Vec<String> = SENSOR_COLUMNS
            .iter()
            .filter(|required| !columns.iter().any(|c| c.name == **required))
            .map(|s| s.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(KpiError::SchemaMismatch { table: "sensors", missing });
        }

        self.store.insert_sensors(sensors)
    }

    /// Synthesize and store readings for every active sensor, ending now
    pub fn generate_readings(&mut self, days_back: u32, readings_per_day: u32) -> StepOutcome {
        self.generate_readings_at(Utc::now(), days_back, readings_per_day)
    }

    pub fn generate_readings_at(
        &mut self,
        now: DateTime<Utc>,
        days_back: u32,
        readings_per_day: u32,
    ) -> StepOutcome {
        let outcome = match self.try_generate(now, days_back, readings_per_day) {
            Ok((count, sensors)) => {
                info!("Generated {} sensor readings for {} sensors", count, sensors);
                self.state.readings_generated += count;
                StepOutcome::Completed { count }
            }
            Err(e) if e.is_empty_input() => {
                warn!("No active sensors found");
                StepOutcome::from_error(e)
            }
            Err(e) => {
                error!("Error generating sensor readings: {}", e);
                StepOutcome::from_error(e)
            }
        };
        self.finish(outcome)
    }

    fn try_generate(
        &mut self,
        now: DateTime<Utc>,
        days_back: u32,
        readings_per_day: u32,
    ) -> KpiResult<(usize, usize)> {
        let sensors = self.store.list_active_sensors()?;
        if sensors.is_empty() {
            return Err(KpiError::EmptyInputSet("active sensors"));
        }

        let readings = self
            .synthesizer
            .synthesize(&sensors, now, days_back, readings_per_day)?;
        let count = self.store.insert_readings(&readings)?;
        Ok((count, sensors.len()))
    }

    /// Sample up to `max_count` candidate readings and store the anomalies
    /// they trigger
    pub fn classify_anomalies(&mut self, max_count: usize) -> StepOutcome {
        let outcome = match self.try_classify(max_count) {
            Ok(count) => {
                info!("Created {} anomaly detections", count);
                self.state.anomalies_created += count;
                StepOutcome::Completed { count }
            }
            Err(e) => {
                error!("Error simulating anomalies: {}", e);
                StepOutcome::from_error(e)
            }
        };
        self.finish(outcome)
    }

    fn try_classify(&mut self, max_count: usize) -> KpiResult<usize> {
        let candidates = self.store.sample_candidates(&self.filter, max_count)?;
        debug!("Sampled {} anomaly candidates", candidates.len());

        let events = self.classifier.classify_all(&candidates);
        if events.is_empty() {
            return Ok(0);
        }
        self.store.insert_anomalies(&events)
    }

    fn finish(&mut self, outcome: StepOutcome) -> StepOutcome {
        if matches!(outcome, StepOutcome::Failed { .. }) {
            self.state.failed_steps += 1;
        }
        self.state.last_step_at = Some(Utc::now());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::db::Database;
    use crate::detection::{AnomalyEvent, AnomalyType, Severity};
    use crate::sensors::{
        sample_sensors, ActiveSensor, Capability, DataQuality, Reading, SensorStatus,
        SynthesisProfile,
    };
    use chrono::TimeZone;

    fn engine<S: SensorStore>(store: S) -> Engine<S> {
        let profile = SynthesisProfile::from_config(&GeneratorConfig::default()).unwrap();
        Engine::with_synthesizer(store, ReadingSynthesizer::seeded(profile, 7))
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 8, 12, 0, 0).unwrap()
    }

    fn seeded() -> Engine<Database> {
        let mut engine = engine(Database::open_in_memory().unwrap());
        assert!(engine.seed_sensors(&sample_sensors()).is_success());
        engine
    }

    /// Wraps a store and fails the chosen write
    struct FailingStore {
        inner: Database,
        fail_readings: bool,
        fail_anomalies: bool,
    }

    fn injected() -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_IOERR),
            Some("injected failure".to_string()),
        )
    }

    impl SensorStore for FailingStore {
        fn describe_sensors(&self) -> KpiResult<Vec<ColumnInfo>> {
            self.inner.describe_sensors()
        }

        fn insert_sensors(&mut self, sensors: &[Sensor]) -> KpiResult<usize> {
            self.inner.insert_sensors(sensors)
        }

        fn list_active_sensors(&self) -> KpiResult<Vec<ActiveSensor>> {
            self.inner.list_active_sensors()
        }

        fn insert_readings(&mut self, readings: &[Reading]) -> KpiResult<usize> {
            if self.fail_readings {
                return Err(KpiError::persistence("insert readings", injected()));
            }
            self.inner.insert_readings(readings)
        }

        fn sample_candidates(&self, filter: &CandidateFilter, limit: usize) -> KpiResult<Vec<Reading>> {
            self.inner.sample_candidates(filter, limit)
        }

        fn insert_anomalies(&mut self, events: &[AnomalyEvent]) -> KpiResult<usize> {
            if self.fail_anomalies {
                return Err(KpiError::persistence("insert anomalies", injected()));
            }
            self.inner.insert_anomalies(events)
        }
    }

    #[test]
    fn test_generate_count_matches_grid() {
        let mut engine = seeded();
        let outcome = engine.generate_readings_at(now(), 2, 3);
        // Two of the three seed sensors are active
        assert_eq!(outcome.count(), 2 * 3 * 2);
        assert_eq!(engine.store().get_stats().unwrap().reading_count, 12);
        assert_eq!(engine.state().readings_generated, 12);
    }

    #[test]
    fn test_generated_rows_follow_capability() {
        let mut engine = seeded();
        engine.generate_readings_at(now(), 3, 24);

        let readings = engine.store().latest_readings(1000).unwrap();
        assert_eq!(readings.len(), 3 * 24 * 2);
        for r in &readings {
            assert!(r.is_consistent());
            match r.sensor_id.as_str() {
                "TEMP_001" => assert_eq!(r.capability, Capability::Temperature),
                "HUM_001" => assert_eq!(r.capability, Capability::Humidity),
                other => panic!("unexpected sensor {other}"),
            }
        }
    }

    #[test]
    fn test_no_active_sensors_is_empty_not_failure() {
        let mut engine = engine(Database::open_in_memory().unwrap());
        let outcome = engine.generate_readings_at(now(), 2, 3);
        assert!(matches!(outcome, StepOutcome::Empty { .. }));
        assert!(!outcome.is_success());
        assert_eq!(engine.state().failed_steps, 0);

        let mut sensors = sample_sensors();
        for s in &mut sensors {
            s.status = SensorStatus::Inactive;
        }
        engine.seed_sensors(&sensors);
        assert!(matches!(engine.generate_readings_at(now(), 2, 3), StepOutcome::Empty { .. }));
    }

    #[test]
    fn test_zero_grid_completes_with_no_rows() {
        let mut engine = seeded();
        let outcome = engine.generate_readings_at(now(), 0, 24);
        assert!(outcome.is_success());
        assert_eq!(outcome.count(), 0);
    }

    #[test]
    fn test_window_outside_time_range_fails_without_panicking() {
        let mut engine = seeded();
        let outcome = engine.generate_readings_at(now(), 200_000_000, 0);
        assert!(matches!(
            outcome,
            StepOutcome::Failed { error: KpiError::GridOutOfRange { .. } }
        ));
        assert_eq!(engine.store().get_stats().unwrap().reading_count, 0);
        assert_eq!(engine.state().failed_steps, 1);
    }

    #[test]
    fn test_failed_reading_batch_leaves_no_rows() {
        let mut engine = seeded();
        engine
            .store()
            .connection()
            .execute_batch(
                "CREATE TRIGGER fail_midway BEFORE INSERT ON sensor_logs
                 WHEN (SELECT COUNT(*) FROM sensor_logs) >= 5
                 BEGIN SELECT RAISE(ABORT, 'forced failure'); END;",
            )
            .unwrap();

        let outcome = engine.generate_readings_at(now(), 2, 3);
        assert!(matches!(outcome, StepOutcome::Failed { error: KpiError::PersistenceFailure { .. } }));
        assert_eq!(engine.store().get_stats().unwrap().reading_count, 0);
        assert_eq!(engine.state().failed_steps, 1);
        assert_eq!(engine.state().readings_generated, 0);
    }

    #[test]
    fn test_failing_store_reported_not_raised() {
        let mut inner = Database::open_in_memory().unwrap();
        inner.insert_sensors(&sample_sensors()).unwrap();
        let mut engine = engine(FailingStore {
            inner,
            fail_readings: true,
            fail_anomalies: false,
        });

        let outcome = engine.generate_readings_at(now(), 1, 1);
        assert!(!outcome.is_success());
        assert!(outcome.reason().unwrap().contains("insert readings"));
        assert_eq!(engine.store().inner.get_stats().unwrap().reading_count, 0);
    }

    fn hot_reading(sensor_id: &str, capability: Capability, t: Option<f64>, h: Option<f64>) -> Reading {
        Reading {
            sensor_id: sensor_id.to_string(),
            location: "Warehouse A".to_string(),
            capability,
            temperature: t,
            humidity: h,
            timestamp: Utc.with_ymd_and_hms(2024, 7, 5, 9, 0, 0).unwrap(),
            data_quality: DataQuality::Good,
            battery_level: 60.0,
            signal_strength: 70,
        }
    }

    #[test]
    fn test_classify_creates_events() {
        let mut store = Database::open_in_memory().unwrap();
        store.insert_sensors(&sample_sensors()).unwrap();
        store
            .insert_readings(&[
                hot_reading("TEMP_001", Capability::Temperature, Some(32.0), None),
                hot_reading("HUM_001", Capability::Humidity, None, Some(85.0)),
                hot_reading("TEMP_001", Capability::Temperature, Some(22.0), None),
            ])
            .unwrap();

        let mut engine = engine(store);
        let outcome = engine.classify_anomalies(10);
        assert_eq!(outcome.count(), 2);

        let since = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        let summary = engine.store().anomaly_summary(since).unwrap();
        let temp = summary
            .iter()
            .find(|s| s.anomaly_type == AnomalyType::TemperatureSpike)
            .unwrap();
        assert_eq!(temp.severity, Severity::Medium);
        assert_eq!(temp.avg_deviation, 6.67);
    }

    #[test]
    fn test_classify_respects_cap() {
        let mut store = Database::open_in_memory().unwrap();
        store.insert_sensors(&sample_sensors()).unwrap();
        let readings: Vec<_> = (0..6)
            .map(|_| hot_reading("TEMP_001", Capability::Temperature, Some(31.5), None))
            .collect();
        store.insert_readings(&readings).unwrap();

        let mut engine = engine(store);
        assert_eq!(engine.classify_anomalies(4).count(), 4);
        assert_eq!(engine.classify_anomalies(0).count(), 0);
        assert_eq!(engine.store().get_stats().unwrap().anomaly_count, 4);
    }

    #[test]
    fn test_classify_with_no_candidates_succeeds() {
        let mut engine = seeded();
        let outcome = engine.classify_anomalies(8);
        assert!(outcome.is_success());
        assert_eq!(outcome.count(), 0);
    }

    #[test]
    fn test_failed_anomaly_batch_rolls_back() {
        let mut inner = Database::open_in_memory().unwrap();
        inner.insert_sensors(&sample_sensors()).unwrap();
        inner
            .insert_readings(&[hot_reading("TEMP_001", Capability::Temperature, Some(36.0), None)])
            .unwrap();
        let mut engine = engine(FailingStore {
            inner,
            fail_readings: false,
            fail_anomalies: true,
        });

        assert!(matches!(engine.classify_anomalies(5), StepOutcome::Failed { .. }));
        assert_eq!(engine.store().inner.get_stats().unwrap().anomaly_count, 0);
    }

    #[test]
    fn test_seed_rejects_incomplete_schema() {
        let mut db = Database::open_in_memory().unwrap();
        db.connection()
            .execute_batch(
                "DROP TABLE anomaly_detections; DROP TABLE sensor_logs; DROP TABLE sensors;
                 CREATE TABLE sensors (sensor_id TEXT PRIMARY KEY, model TEXT);",
            )
            .unwrap();
        let mut engine = engine(db);

        match engine.seed_sensors(&sample_sensors()) {
            StepOutcome::Failed { error: KpiError::SchemaMismatch { missing, .. } } => {
                assert!(missing.contains(&"status".to_string()));
                assert!(!missing.contains(&"model".to_string()));
            }
            other => panic!("unexpected outcome {other}"),
        }
    }

    #[test]
    fn test_check_table_structure() {
        let engine = engine(Database::open_in_memory().unwrap());
        let columns = engine.check_table_structure().unwrap();
        assert!(columns.len() >= SENSOR_COLUMNS.len());
    }
}
