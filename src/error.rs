// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Error taxonomy shared by the store, the engine and configuration

use thiserror::Error;

/// Result alias used by store and engine operations
pub type KpiResult<T> = Result<T, KpiError>;

#[derive(Debug, Error)]
pub enum KpiError {
    /// No usable connection to the store; callers must not proceed
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Nothing to operate on. Not a failure, reported distinctly
    #[error("no {0} found")]
    EmptyInputSet(&'static str),

    /// A write, read or commit against the store failed
    #[error("{operation} failed: {source}")]
    PersistenceFailure {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// Schema introspection found required columns absent
    #[error("table `{table}` is missing columns: {}", .missing.join(", "))]
    SchemaMismatch {
        table: &'static str,
        missing: Vec<String>,
    },

    /// The reading grid falls outside the representable time range
    #[error("reading grid of {days_back} days x {readings_per_day} per day is out of range")]
    GridOutOfRange { days_back: u32, readings_per_day: u32 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl KpiError {
    pub fn persistence(operation: &'static str, source: rusqlite::Error) -> Self {
        KpiError::PersistenceFailure { operation, source }
    }

    /// True for outcomes that signal "nothing to do" rather than a failure
    pub fn is_empty_input(&self) -> bool {
        matches!(self, KpiError::EmptyInputSet(_))
    }
}
