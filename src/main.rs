// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! SensorKPI - seeds sensors, synthesizes readings, flags anomalies and
//! prints the latest-readings, daily-statistics and anomaly reports.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use sensorkpi::reports::{self, ReportFormat};
use sensorkpi::sensors::sample_sensors;
use sensorkpi::{Config, Database, Engine, StepOutcome, NAME, VERSION};

/// SensorKPI - sensor reading simulation and anomaly reporting
#[derive(Parser, Debug)]
#[command(name = "sensorkpi")]
#[command(version = VERSION)]
#[command(about = "Seed sensors, synthesize readings, detect threshold anomalies and report")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database path
    #[arg(long)]
    database: Option<PathBuf>,

    /// Days of readings to synthesize
    #[arg(long)]
    days_back: Option<u32>,

    /// Hourly readings per day
    #[arg(long)]
    readings_per_day: Option<u32>,

    /// Maximum anomaly candidates to sample
    #[arg(long)]
    max_anomalies: Option<usize>,

    /// RNG seed for reproducible readings
    #[arg(long)]
    seed: Option<u64>,

    /// Report output format
    #[arg(long, value_enum, default_value_t = ReportFormat::Table)]
    format: ReportFormat,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        if tracing::dispatcher::has_been_set() {
            error!("Application error: {:#}", e);
        } else {
            eprintln!("Application error: {:#}", e);
        }
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;

    init_logging(&args, &config)?;
    info!("{} v{}", NAME, VERSION);
    info!("Configuration loaded from {:?}", config_path);

    // Override with command line args
    if let Some(path) = args.database {
        config.database.path = path;
    }
    if let Some(days) = args.days_back {
        config.generator.days_back = days;
    }
    if let Some(rpd) = args.readings_per_day {
        config.generator.readings_per_day = rpd;
    }
    if let Some(max) = args.max_anomalies {
        config.anomalies.max_anomalies = max;
    }
    if args.seed.is_some() {
        config.generator.seed = args.seed;
    }
    config.validate()?;

    let db = Database::open(&config.database)?;
    let mut engine = Engine::new(db, &config)?;
    info!("Starting sensor data management operations...");

    if let Err(e) = engine.check_table_structure() {
        warn!("Could not read sensors table structure: {}", e);
    }

    report_step("Sample sensors inserted", engine.seed_sensors(&sample_sensors()));
    report_step(
        "Sensor readings generated",
        engine.generate_readings(config.generator.days_back, config.generator.readings_per_day),
    );
    report_step(
        "Anomalies simulated",
        engine.classify_anomalies(config.anomalies.max_anomalies),
    );

    let db = engine.store();
    reports::show_latest_readings(db, config.reports.latest_limit, args.format);
    reports::show_daily_statistics(db, config.reports.statistics_days, args.format);
    reports::show_anomaly_summary(db, config.reports.anomaly_days, args.format);

    let state = engine.state();
    info!(
        "Run complete: {} sensors seeded, {} readings, {} anomalies, {} failed steps",
        state.sensors_seeded, state.readings_generated, state.anomalies_created, state.failed_steps
    );

    Ok(())
}

fn init_logging(args: &Args, config: &Config) -> Result<()> {
    let level = if args.trace {
        "trace"
    } else if args.debug {
        "debug"
    } else {
        config.log_level.as_str()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn report_step(label: &str, outcome: StepOutcome) {
    match &outcome {
        StepOutcome::Completed { count } => info!("✓ {} ({})", label, count),
        StepOutcome::Empty { reason } => warn!("- {} skipped: {}", label, reason),
        StepOutcome::Failed { error } => error!("✗ {} failed: {}", label, error),
    }
}
