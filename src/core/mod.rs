//! Core engine module - runs the seed, generate and classify steps

mod engine;

pub use engine::Engine;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::error::KpiError;

/// Result of one high-level step
#[derive(Debug)]
pub enum StepOutcome {
    /// Batch committed; `count` rows written
    Completed { count: usize },
    /// Nothing to work on. Distinct from failure
    Empty { reason: String },
    /// Store error; the batch was rolled back
    Failed { error: KpiError },
}

impl StepOutcome {
    pub(crate) fn from_error(error: KpiError) -> Self {
        if error.is_empty_input() {
            StepOutcome::Empty { reason: error.to_string() }
        } else {
            StepOutcome::Failed { error }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Completed { .. })
    }

    pub fn count(&self) -> usize {
        match self {
            StepOutcome::Completed { count } => *count,
            _ => 0,
        }
    }

    pub fn reason(&self) -> Option<String> {
        match self {
            StepOutcome::Completed { .. } => None,
            StepOutcome::Empty { reason } => Some(reason.clone()),
            StepOutcome::Failed { error } => Some(error.to_string()),
        }
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Completed { count } => write!(f, "completed ({count} rows)"),
            StepOutcome::Empty { reason } => write!(f, "nothing to do: {reason}"),
            StepOutcome::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}

/// Running totals across steps
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineState {
    pub sensors_seeded: usize,
    pub readings_generated: usize,
    pub anomalies_created: usize,
    pub failed_steps: usize,
    pub last_step_at: Option<DateTime<Utc>>,
}
