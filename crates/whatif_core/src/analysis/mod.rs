//! Scenario comparison and sensitivity analysis.
//!
//! The [`Orchestrator`] derives variant parameter sets from a baseline,
//! dispatches them concurrently against a [`SimulationClient`] and collects
//! every outcome. Two shapes come out the other side:
//!
//! ```ignore
//! use whatif_core::analysis::{Orchestrator, to_heatmap_matrix, to_scenario_table};
//! use whatif_core::config::SweepSpec;
//!
//! // What-if scenarios -> comparison table (one row per scenario, input order)
//! let results = orchestrator.run_scenarios(&baseline, scenarios.as_slice()).await?;
//! let rows = to_scenario_table(&results);
//!
//! // Sweeps across several fields -> sparse heatmap
//! let points = orchestrator
//!     .run_multi_parameter_sensitivity(&baseline, &[
//!         SweepSpec::linspace("equity_return_annual", -0.03, 0.03, 7),
//!         SweepSpec::linspace("monthly_spending", -0.3, 0.3, 7),
//!     ])
//!     .await?;
//! let matrix = to_heatmap_matrix(points);
//! ```
//!
//! # Failure Model
//!
//! A `ConfigError` (unknown field, type mismatch, stale engine mapping) is
//! found while deriving variants and halts the batch before anything is sent.
//! Engine failures are captured per request: a failed scenario becomes an
//! unavailable row and a failed sweep point is simply absent from the heatmap.
//! Nothing is retried.
//!
//! [`SimulationClient`]: crate::client::SimulationClient

mod orchestrator;
mod shapers;

pub use orchestrator::*;
pub use shapers::*;
