//! YAML plan files
//!
//! A plan bundles everything one run needs:
//!
//! ```yaml
//! engine:
//!   url: http://localhost:8080
//!   timeout_ms: 30000
//! baseline:
//!   equity_return_annual: 0.07
//!   monthly_spending: -20000
//! scenarios:
//!   - name: Pessimistic
//!     changes:
//!       equity_return_annual: -0.02
//! sweeps:
//!   - field: monthly_spending
//!     variations: [-0.3, -0.1, 0.0, 0.1, 0.3]
//! ```
//!
//! `fields` is optional and defaults to the standard field table.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use whatif_core::analysis::OrchestratorConfig;
use whatif_core::config::{FieldRules, FieldSpec, ScenarioSet, SweepSpec};
use whatif_core::error::ConfigError;
use whatif_core::model::ParameterSet;

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("failed to read plan {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse plan: {0}")]
    Parse(#[from] serde_saphyr::Error),
    #[error("failed to serialize plan: {0}")]
    Serialize(#[from] serde_saphyr::ser::Error),
    #[error("failed to write plan {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Where the simulation engine lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    pub url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanFile {
    pub engine: EngineSettings,
    /// Custom field table; the standard one is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldSpec>>,
    pub baseline: ParameterSet,
    #[serde(default)]
    pub scenarios: ScenarioSet,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sweeps: Vec<SweepSpec>,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

impl PlanFile {
    pub fn from_yaml(yaml: &str) -> Result<Self, PlanError> {
        Ok(serde_saphyr::from_str(yaml)?)
    }

    pub fn to_yaml(&self) -> Result<String, PlanError> {
        Ok(serde_saphyr::to_string(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let content = fs::read_to_string(path).map_err(|source| PlanError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let plan = Self::from_yaml(&content)?;
        tracing::debug!(
            path = %path.display(),
            scenarios = plan.scenarios.len(),
            sweeps = plan.sweeps.len(),
            "loaded plan"
        );
        Ok(plan)
    }

    pub fn save(&self, path: &Path) -> Result<(), PlanError> {
        let yaml = self.to_yaml()?;
        fs::write(path, yaml).map_err(|source| PlanError::Write {
            path: path.display().to_string(),
            source,
        })
    }

    /// Field table for this plan, validated against the baseline
    pub fn rules(&self) -> Result<FieldRules, PlanError> {
        let rules = match &self.fields {
            Some(specs) => FieldRules::from_specs(specs.clone())?,
            None => FieldRules::standard(),
        };
        rules.validate_parameters(&self.baseline)?;
        Ok(rules)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.engine.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use whatif_core::analysis::SweepMode;
    use whatif_core::config::FieldRule;
    use whatif_core::model::ParamValue;

    const PLAN: &str = r#"
engine:
  url: http://localhost:8080
baseline:
  equity_return_annual: 0.07
  monthly_spending: -20000
  spending_rule: constant_dollar
  adjust_for_inflation: true
scenarios:
  - name: Pessimistic
    changes:
      equity_return_annual: -0.02
  - name: Frugal
    changes:
      monthly_spending: -0.1
sweeps:
  - field: monthly_spending
    variations: [-0.3, 0.0, 0.3]
"#;

    #[test]
    fn test_parse_plan_with_defaults() {
        let plan = PlanFile::from_yaml(PLAN).unwrap();

        assert_eq!(plan.engine.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(plan.timeout(), Duration::from_secs(30));
        assert!(plan.fields.is_none());
        assert_eq!(plan.orchestrator.sweep_mode, SweepMode::Local);

        assert_eq!(plan.baseline.number("monthly_spending"), Some(-20_000.0));
        assert_eq!(
            plan.baseline.get("spending_rule"),
            Some(&ParamValue::Choice("constant_dollar".into()))
        );
        assert_eq!(
            plan.baseline.get("adjust_for_inflation"),
            Some(&ParamValue::Flag(true))
        );

        assert_eq!(plan.scenarios.len(), 2);
        assert_eq!(plan.scenarios.as_slice()[1].name, "Frugal");
        assert_eq!(plan.sweeps[0].variations, vec![-0.3, 0.0, 0.3]);

        assert!(plan.rules().is_ok());
    }

    #[test]
    fn test_custom_field_table_and_remote_mode() {
        let yaml = r#"
engine:
  url: http://engine:9000
  timeout_ms: 500
fields:
  - name: equity_return_annual
    engine_name: equityReturn
    rule: additive
  - name: monthly_spending
    rule: scale_magnitude
baseline:
  equity_return_annual: 0.07
  monthly_spending: -20000
orchestrator:
  sweep_mode: remote
"#;
        let plan = PlanFile::from_yaml(yaml).unwrap();
        assert_eq!(plan.timeout(), Duration::from_millis(500));
        assert_eq!(plan.orchestrator.sweep_mode, SweepMode::Remote);

        let rules = plan.rules().unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.get("equity_return_annual").unwrap().wire_name(), "equityReturn");
        assert_eq!(rules.get("monthly_spending").unwrap().rule, FieldRule::ScaleMagnitude);
    }

    #[test]
    fn test_baseline_outside_field_table_is_rejected() {
        let yaml = r#"
engine:
  url: http://localhost:8080
fields:
  - name: equity_return_annual
    rule: additive
baseline:
  equity_return_annual: 0.07
  monthly_spending: -20000
"#;
        let plan = PlanFile::from_yaml(yaml).unwrap();
        let err = plan.rules().unwrap_err();
        assert!(matches!(
            err,
            PlanError::Config(ConfigError::UnknownField(ref f)) if f == "monthly_spending"
        ));
    }

    #[test]
    fn test_duplicate_scenario_names_fail_to_parse() {
        let yaml = r#"
engine:
  url: http://localhost:8080
baseline:
  equity_return_annual: 0.07
scenarios:
  - name: Twin
  - name: Twin
"#;
        assert!(matches!(
            PlanFile::from_yaml(yaml),
            Err(PlanError::Parse(_))
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.yaml");

        let plan = PlanFile::from_yaml(PLAN).unwrap();
        plan.save(&path).unwrap();
        let reloaded = PlanFile::load(&path).unwrap();
        assert_eq!(reloaded, plan);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = PlanFile::load(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, PlanError::Read { .. }));
    }
}
