//! Boundary to the remote simulation engine.
//!
//! The orchestrator only ever talks to a [`SimulationClient`]. Parameter sets
//! reaching a client are already renamed to the engine's field names. Every
//! failure is reported as an [`EngineError`]; the orchestrator captures it per
//! request. Implementations are responsible for bounding each call with a
//! timeout.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::model::{ParameterSet, SensitivityMetrics, SimulationMetrics};

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::HttpSimulationClient;

/// Field names the engine accepts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSchema {
    pub fields: Vec<String>,
}

#[async_trait]
pub trait SimulationClient: Send + Sync {
    /// Run a full Monte Carlo simulation for one parameter set
    async fn run_simulation(&self, params: &ParameterSet)
    -> Result<SimulationMetrics, EngineError>;

    /// Let the engine apply one variation to `baseline` and report the outcome
    async fn run_sensitivity_point(
        &self,
        baseline: &ParameterSet,
        field: &str,
        variation: f64,
    ) -> Result<SensitivityMetrics, EngineError>;

    /// Fetch the field names the engine currently accepts
    async fn engine_schema(&self) -> Result<EngineSchema, EngineError>;
}

#[async_trait]
impl<C: SimulationClient + ?Sized> SimulationClient for std::sync::Arc<C> {
    async fn run_simulation(
        &self,
        params: &ParameterSet,
    ) -> Result<SimulationMetrics, EngineError> {
        (**self).run_simulation(params).await
    }

    async fn run_sensitivity_point(
        &self,
        baseline: &ParameterSet,
        field: &str,
        variation: f64,
    ) -> Result<SensitivityMetrics, EngineError> {
        (**self).run_sensitivity_point(baseline, field, variation).await
    }

    async fn engine_schema(&self) -> Result<EngineSchema, EngineError> {
        (**self).engine_schema().await
    }
}
