//! Concurrent dispatch of scenario and sweep batches.
//!
//! All requests of a batch are issued at once and awaited with [`settle_all`],
//! which waits for every request to reach a terminal state. Output order always
//! follows input order, independent of response arrival order.

use std::future::Future;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::apply::{apply_scenario_delta, apply_sweep_variation};
use crate::client::SimulationClient;
use crate::config::{FieldRules, ScenarioDelta, SweepSpec, total_points};
use crate::error::{ConfigError, EngineError};
use crate::model::{HeatmapPoint, ParameterSet, ScenarioRunResult, SensitivityMetrics, SweepRunResult};

use super::to_heatmap_points;

/// Where sweep variations are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepMode {
    /// Derive each variant locally and send it through `run_simulation`
    #[default]
    Local,
    /// Send baseline, field and variation to `run_sensitivity_point`
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub sweep_mode: SweepMode,
    /// Allowed distance of the allocation total from 1.0 before a warning
    pub allocation_tolerance: f64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            sweep_mode: SweepMode::Local,
            allocation_tolerance: 1e-6,
        }
    }
}

/// Wait for every future to finish, success or failure, and return all
/// outputs in input order. Never short-circuits.
pub async fn settle_all<I>(futures: I) -> Vec<<I::Item as Future>::Output>
where
    I: IntoIterator,
    I::Item: Future,
{
    join_all(futures).await
}

enum SweepPayload {
    /// Engine-named parameter set with the variation already applied
    Derived(ParameterSet),
    /// Engine name of the swept field
    Remote(String),
}

struct SweepRequest {
    field: String,
    variation: f64,
    payload: SweepPayload,
}

/// Coordinates scenario and sweep batches against a simulation client
pub struct Orchestrator<C> {
    client: C,
    rules: FieldRules,
    config: OrchestratorConfig,
}

impl<C: SimulationClient> Orchestrator<C> {
    pub fn new(client: C, rules: FieldRules) -> Self {
        Self {
            client,
            rules,
            config: OrchestratorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn rules(&self) -> &FieldRules {
        &self.rules
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run every scenario concurrently, one result per delta in input order.
    ///
    /// Engine failures are captured in the matching result; only a
    /// `ConfigError` aborts, and it does so before any request is sent.
    pub async fn run_scenarios(
        &self,
        baseline: &ParameterSet,
        deltas: &[ScenarioDelta],
    ) -> Result<Vec<ScenarioRunResult>, ConfigError> {
        let variants = deltas
            .iter()
            .map(|delta| {
                let derived = apply_scenario_delta(&self.rules, baseline, delta)?;
                self.advise_allocation(&delta.name, &derived);
                self.rules.to_engine(&derived)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let span = info_span!("scenario_batch", scenarios = deltas.len());
        let outcomes = settle_all(variants.iter().zip(deltas).map(|(params, delta)| {
            debug!(scenario = %delta.name, "dispatching scenario");
            self.client.run_simulation(params)
        }))
        .instrument(span)
        .await;

        let results: Vec<ScenarioRunResult> = deltas
            .iter()
            .zip(outcomes)
            .map(|(delta, outcome)| {
                if let Err(err) = &outcome {
                    warn!(scenario = %delta.name, kind = %err.kind(), "scenario run failed: {err}");
                }
                ScenarioRunResult {
                    name: delta.name.clone(),
                    changes: delta.changes.clone(),
                    outcome: outcome.into(),
                }
            })
            .collect();

        let succeeded = results.iter().filter(|r| r.outcome.is_success()).count();
        info!(
            succeeded,
            failed = results.len() - succeeded,
            "scenario batch complete"
        );
        Ok(results)
    }

    /// Sweep one field. Failed variations are omitted from the result.
    pub async fn run_sensitivity_sweep(
        &self,
        baseline: &ParameterSet,
        field: &str,
        variations: &[f64],
    ) -> Result<Vec<HeatmapPoint>, ConfigError> {
        let sweep = SweepSpec::new(field, variations.to_vec());
        self.run_multi_parameter_sensitivity(baseline, std::slice::from_ref(&sweep))
            .await
    }

    /// Sweep several fields at once, every (field, variation) pair in flight
    /// simultaneously, flattened in sweep order. Failed points are omitted.
    pub async fn run_multi_parameter_sensitivity(
        &self,
        baseline: &ParameterSet,
        sweeps: &[SweepSpec],
    ) -> Result<Vec<HeatmapPoint>, ConfigError> {
        let results = self.run_sweep_outcomes(baseline, sweeps).await?;
        Ok(to_heatmap_points(&results))
    }

    /// Sweep several fields and return every tagged outcome, failures
    /// included, in sweep order.
    pub async fn run_sweep_outcomes(
        &self,
        baseline: &ParameterSet,
        sweeps: &[SweepSpec],
    ) -> Result<Vec<SweepRunResult>, ConfigError> {
        // Plan the whole batch first so a bad field halts before any dispatch
        let engine_baseline = self.rules.to_engine(baseline)?;
        let requests = self.plan_sweeps(baseline, sweeps)?;

        let span = info_span!(
            "sensitivity_batch",
            fields = sweeps.len(),
            requests = requests.len(),
            mode = ?self.config.sweep_mode
        );
        let outcomes = settle_all(
            requests
                .iter()
                .map(|request| self.dispatch_point(request, &engine_baseline)),
        )
        .instrument(span)
        .await;

        let results: Vec<SweepRunResult> = requests
            .into_iter()
            .zip(outcomes)
            .map(|(request, outcome)| {
                if let Err(err) = &outcome {
                    warn!(
                        field = %request.field,
                        variation = request.variation,
                        kind = %err.kind(),
                        "sensitivity point failed: {err}"
                    );
                }
                SweepRunResult {
                    field: request.field,
                    variation: request.variation,
                    outcome: outcome.map_err(|e| e.kind()),
                }
            })
            .collect();

        let succeeded = results.iter().filter(|r| r.outcome.is_ok()).count();
        info!(
            succeeded,
            failed = results.len() - succeeded,
            "sensitivity batch complete"
        );
        Ok(results)
    }

    fn plan_sweeps(
        &self,
        baseline: &ParameterSet,
        sweeps: &[SweepSpec],
    ) -> Result<Vec<SweepRequest>, ConfigError> {
        let mut requests = Vec::with_capacity(total_points(sweeps));
        for sweep in sweeps {
            let spec = self.rules.lookup(&sweep.field)?;
            let engine_field = spec.wire_name().to_string();
            for &variation in &sweep.variations {
                // Validates the field in both modes
                let derived = apply_sweep_variation(&self.rules, baseline, &sweep.field, variation)?;
                if spec.allocation {
                    self.advise_allocation(&format!("{} {variation:+}", sweep.field), &derived);
                }
                let payload = match self.config.sweep_mode {
                    SweepMode::Local => SweepPayload::Derived(self.rules.to_engine(&derived)?),
                    SweepMode::Remote => SweepPayload::Remote(engine_field.clone()),
                };
                requests.push(SweepRequest {
                    field: sweep.field.clone(),
                    variation,
                    payload,
                });
            }
        }
        Ok(requests)
    }

    async fn dispatch_point(
        &self,
        request: &SweepRequest,
        engine_baseline: &ParameterSet,
    ) -> Result<SensitivityMetrics, EngineError> {
        debug!(field = %request.field, variation = request.variation, "dispatching sensitivity point");
        match &request.payload {
            SweepPayload::Derived(params) => self
                .client
                .run_simulation(params)
                .await
                .map(SensitivityMetrics::from),
            SweepPayload::Remote(engine_field) => {
                self.client
                    .run_sensitivity_point(engine_baseline, engine_field, request.variation)
                    .await
            }
        }
    }

    /// Allocation total of `params` when it misses 1.0 by more than the
    /// configured tolerance. Advisory only; the engine enforces the total.
    pub fn allocation_drift(&self, params: &ParameterSet) -> Option<f64> {
        self.rules
            .allocation_sum(params)
            .filter(|sum| (sum - 1.0).abs() > self.config.allocation_tolerance)
    }

    fn advise_allocation(&self, label: &str, params: &ParameterSet) {
        if let Some(sum) = self.allocation_drift(params) {
            warn!(variant = label, allocation_sum = sum, "allocation does not sum to 1.0");
        }
    }
}
