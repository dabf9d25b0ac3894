//! Scenario and sensitivity orchestration for retirement-plan simulations.
//!
//! This crate derives variant parameter sets from a baseline plan and runs
//! them concurrently against a remote Monte Carlo engine. It supports:
//! - Named "what-if" scenarios expressed as field-level deltas
//! - One-parameter sensitivity sweeps, singly or across many fields at once
//! - Per-request failure isolation (a rejected variant never aborts its batch)
//! - Shaping raw outcomes into a scenario table and a sparse heatmap
//!
//! # Example
//!
//! ```ignore
//! use whatif_core::analysis::{Orchestrator, to_scenario_table};
//! use whatif_core::client::HttpSimulationClient;
//! use whatif_core::config::{FieldRules, ScenarioDelta};
//! use whatif_core::model::ParameterSet;
//!
//! let client = HttpSimulationClient::new("http://localhost:8080", timeout)?;
//! let orchestrator = Orchestrator::new(client, FieldRules::standard());
//!
//! let baseline = ParameterSet::new()
//!     .with("equity_return_annual", 0.10)
//!     .with("monthly_spending", -20_000.0);
//! let pessimistic = ScenarioDelta::new("Pessimistic").change("equity_return_annual", -0.02);
//!
//! let results = orchestrator.run_scenarios(&baseline, &[pessimistic]).await?;
//! let rows = to_scenario_table(&results);
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod analysis;
pub mod apply;
pub mod client;
pub mod error;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod config;
pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use analysis::{Orchestrator, OrchestratorConfig, SweepMode};
pub use client::SimulationClient;
pub use config::{FieldRule, FieldRules, FieldSpec, ScenarioDelta, ScenarioSet, SweepSpec};
pub use error::{ConfigError, EngineError, ErrorKind};
pub use model::{HeatmapPoint, ParamValue, ParameterSet, RunOutcome, ScenarioRow};
