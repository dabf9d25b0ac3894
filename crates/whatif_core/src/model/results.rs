//! Run outcomes and visualization-ready shapes
//!
//! Outcomes are ephemeral: they are rebuilt on every orchestration run and
//! never persisted by this crate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, ErrorKind};

use super::parameters::ParamValue;

/// Summary metrics returned by the engine for a full simulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationMetrics {
    /// Fraction of simulated paths that meet the plan's goal
    pub success_probability: f64,
    /// Median ending portfolio value
    pub ending_median: f64,
}

/// Metrics returned by the engine's single-point sensitivity endpoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityMetrics {
    pub success_probability: f64,
}

impl From<SimulationMetrics> for SensitivityMetrics {
    fn from(metrics: SimulationMetrics) -> Self {
        Self {
            success_probability: metrics.success_probability,
        }
    }
}

/// Terminal state of one dispatched request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunOutcome {
    Success { metrics: SimulationMetrics },
    Failure { error: ErrorKind, message: String },
}

impl RunOutcome {
    pub fn failure(err: &EngineError) -> Self {
        RunOutcome::Failure {
            error: err.kind(),
            message: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success { .. })
    }

    pub fn metrics(&self) -> Option<&SimulationMetrics> {
        match self {
            RunOutcome::Success { metrics } => Some(metrics),
            RunOutcome::Failure { .. } => None,
        }
    }
}

impl From<Result<SimulationMetrics, EngineError>> for RunOutcome {
    fn from(result: Result<SimulationMetrics, EngineError>) -> Self {
        match result {
            Ok(metrics) => RunOutcome::Success { metrics },
            Err(err) => RunOutcome::failure(&err),
        }
    }
}

/// Outcome of one scenario, tagged with the scenario it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRunResult {
    pub name: String,
    pub changes: BTreeMap<String, ParamValue>,
    pub outcome: RunOutcome,
}

/// Outcome of one sweep point, tagged with its (field, variation) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRunResult {
    pub field: String,
    pub variation: f64,
    pub outcome: Result<SensitivityMetrics, ErrorKind>,
}

/// One cell of the sensitivity heatmap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapPoint {
    pub parameter: String,
    pub variation: f64,
    pub success_probability: f64,
}

/// Metrics column of a scenario row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowMetrics {
    Available {
        success_probability: f64,
        ending_median: f64,
    },
    Unavailable {
        error: ErrorKind,
    },
}

/// One row of the scenario comparison table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRow {
    pub name: String,
    pub changes: BTreeMap<String, ParamValue>,
    pub metrics: RowMetrics,
}

impl ScenarioRow {
    pub fn success_probability(&self) -> Option<f64> {
        match self.metrics {
            RowMetrics::Available {
                success_probability,
                ..
            } => Some(success_probability),
            RowMetrics::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.metrics, RowMetrics::Available { .. })
    }
}
