//! Subcommand bodies, generic over the engine client

use std::path::Path;

use color_eyre::eyre::WrapErr;
use tracing::{info, warn};
use whatif_core::analysis::{Orchestrator, to_heatmap_matrix, to_scenario_table};
use whatif_core::client::{EngineSchema, SimulationClient};

use crate::plan::PlanFile;
use crate::report::{render_heatmap, render_scenario_table, to_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Fetch the engine schema and check the field table against it
pub async fn check_schema<C: SimulationClient>(
    orchestrator: &Orchestrator<C>,
) -> color_eyre::Result<EngineSchema> {
    let schema = orchestrator
        .client()
        .engine_schema()
        .await
        .wrap_err("could not fetch engine schema")?;
    orchestrator.rules().validate_against_engine(&schema)?;
    info!(fields = schema.fields.len(), "field table matches engine schema");
    Ok(schema)
}

/// List each engine field with the plan field mapped onto it
pub fn render_schema<C: SimulationClient>(
    orchestrator: &Orchestrator<C>,
    schema: &EngineSchema,
    format: OutputFormat,
) -> color_eyre::Result<String> {
    if format == OutputFormat::Json {
        return Ok(to_json(schema)?);
    }

    let rules = orchestrator.rules();
    let mut out = String::new();
    for field in &schema.fields {
        let mapped = rules
            .specs()
            .iter()
            .find(|spec| spec.wire_name() == field)
            .map(|spec| spec.name.as_str());
        match mapped {
            Some(name) if name != field => out.push_str(&format!("{field} <- {name}\n")),
            Some(_) => out.push_str(&format!("{field}\n")),
            None => out.push_str(&format!("{field} (unused)\n")),
        }
    }
    Ok(out)
}

/// Run the plan's scenarios and annotate them with their outcomes.
///
/// With `write_back` the annotated plan is saved once the batch settles.
pub async fn run_scenarios<C: SimulationClient>(
    orchestrator: &Orchestrator<C>,
    plan: &mut PlanFile,
    write_back: Option<&Path>,
    format: OutputFormat,
) -> color_eyre::Result<String> {
    if plan.scenarios.is_empty() {
        warn!("plan has no scenarios");
    }

    let results = orchestrator
        .run_scenarios(&plan.baseline, plan.scenarios.as_slice())
        .await?;
    let annotated = plan.scenarios.annotate(&results);

    if let Some(path) = write_back {
        plan.save(path)?;
        info!(annotated, path = %path.display(), "wrote scenario results back to plan");
    }

    let rows = to_scenario_table(&results);
    match format {
        OutputFormat::Text => Ok(render_scenario_table(&rows)),
        OutputFormat::Json => Ok(to_json(&rows)?),
    }
}

/// Run every sweep in the plan as one batch and render the heatmap
pub async fn run_sweeps<C: SimulationClient>(
    orchestrator: &Orchestrator<C>,
    plan: &PlanFile,
    format: OutputFormat,
) -> color_eyre::Result<String> {
    if plan.sweeps.is_empty() {
        warn!("plan has no sweeps");
    }

    let points = orchestrator
        .run_multi_parameter_sensitivity(&plan.baseline, &plan.sweeps)
        .await?;
    let matrix = to_heatmap_matrix(points);

    match format {
        OutputFormat::Text => Ok(render_heatmap(&matrix)),
        OutputFormat::Json => Ok(to_json(&matrix)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use whatif_core::config::ScenarioDelta;
    use whatif_core::error::{ConfigError, EngineError};
    use whatif_core::model::{ParameterSet, SensitivityMetrics, SimulationMetrics};

    /// Rejects spending above 25k a month, otherwise succeeds
    struct FixedEngine;

    #[async_trait]
    impl SimulationClient for FixedEngine {
        async fn run_simulation(
            &self,
            params: &ParameterSet,
        ) -> Result<SimulationMetrics, EngineError> {
            let spending = params.number("monthly_spending").unwrap_or(0.0);
            if spending < -25_000.0 {
                return Err(EngineError::Rejection {
                    status: 422,
                    message: "spending exceeds capital".into(),
                });
            }
            Ok(SimulationMetrics {
                success_probability: 0.9,
                ending_median: 1_500_000.0,
            })
        }

        async fn run_sensitivity_point(
            &self,
            _baseline: &ParameterSet,
            _field: &str,
            variation: f64,
        ) -> Result<SensitivityMetrics, EngineError> {
            Ok(SensitivityMetrics {
                success_probability: 0.5 + variation,
            })
        }

        async fn engine_schema(&self) -> Result<EngineSchema, EngineError> {
            Ok(EngineSchema {
                fields: vec!["equity_return_annual".into(), "monthly_spending".into()],
            })
        }
    }

    const PLAN: &str = r#"
engine:
  url: http://localhost:8080
fields:
  - name: equity_return_annual
    rule: additive
  - name: monthly_spending
    rule: scale_magnitude
baseline:
  equity_return_annual: 0.07
  monthly_spending: -20000
scenarios:
  - name: Frugal
    changes:
      monthly_spending: -0.1
  - name: Lavish
    changes:
      monthly_spending: 0.5
sweeps:
  - field: monthly_spending
    variations: [-0.2, 0.0, 0.2, 0.4]
"#;

    fn orchestrator(plan: &PlanFile) -> Orchestrator<FixedEngine> {
        Orchestrator::new(FixedEngine, plan.rules().unwrap())
    }

    #[tokio::test]
    async fn test_schema_check_passes_for_matching_table() {
        let plan = PlanFile::from_yaml(PLAN).unwrap();
        let orchestrator = orchestrator(&plan);

        let schema = check_schema(&orchestrator).await.unwrap();
        let text = render_schema(&orchestrator, &schema, OutputFormat::Text).unwrap();
        assert_eq!(text, "equity_return_annual\nmonthly_spending\n");
    }

    #[tokio::test]
    async fn test_schema_check_reports_missing_fields() {
        let mut plan = PlanFile::from_yaml(PLAN).unwrap();
        plan.fields = None;
        let orchestrator = Orchestrator::new(FixedEngine, plan.rules().unwrap());

        let err = check_schema(&orchestrator).await.unwrap_err();
        let mismatch = err.downcast_ref::<ConfigError>().unwrap();
        let ConfigError::SchemaMismatch { missing } = mismatch else {
            panic!("expected a schema mismatch, got {mismatch}");
        };
        assert!(missing.contains(&"starting_capital".to_string()));
        assert!(!missing.contains(&"monthly_spending".to_string()));
    }

    #[tokio::test]
    async fn test_scenarios_write_back_annotations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.yaml");
        let mut plan = PlanFile::from_yaml(PLAN).unwrap();
        let orchestrator = orchestrator(&plan);

        let table = run_scenarios(&orchestrator, &mut plan, Some(&path), OutputFormat::Text)
            .await
            .unwrap();
        assert!(table.contains("90.00%"));
        assert!(table.contains("unavailable: engine rejection"));

        let saved = PlanFile::load(&path).unwrap();
        let frugal = saved.scenarios.get("Frugal").unwrap();
        assert!(frugal.last_result.as_ref().unwrap().is_success());
        let lavish = saved.scenarios.get("Lavish").unwrap();
        assert!(!lavish.last_result.as_ref().unwrap().is_success());
        // Authored changes survive the round trip
        assert_eq!(lavish.changes.len(), 1);
    }

    #[tokio::test]
    async fn test_scenarios_without_write_back_leave_disk_alone() {
        let mut plan = PlanFile::from_yaml(PLAN).unwrap();
        plan.scenarios
            .add(ScenarioDelta::new("Baseline"))
            .unwrap();
        let orchestrator = orchestrator(&plan);

        let json = run_scenarios(&orchestrator, &mut plan, None, OutputFormat::Json)
            .await
            .unwrap();
        let rows: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(rows.as_array().unwrap().len(), 3);
        assert_eq!(rows[1]["metrics"]["status"], "unavailable");
        assert!(plan.scenarios.get("Baseline").unwrap().last_result.is_some());
    }

    #[tokio::test]
    async fn test_sweeps_render_only_successful_points() {
        let plan = PlanFile::from_yaml(PLAN).unwrap();
        let orchestrator = orchestrator(&plan);

        let grid = run_sweeps(&orchestrator, &plan, OutputFormat::Text)
            .await
            .unwrap();
        let lines: Vec<&str> = grid.lines().collect();
        assert_eq!(lines.len(), 2);
        // +0.4 takes spending to 28k, which the engine rejects
        assert!(!lines[0].contains("+0.40"));
        assert_eq!(lines[1].matches('%').count(), 3);
    }
}
