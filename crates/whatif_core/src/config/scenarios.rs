//! User-authored scenario definitions

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::{ParamValue, RunOutcome, ScenarioRunResult};

/// A named set of field-level changes against the baseline.
///
/// After a run the delta is annotated with its outcome; the changes stay
/// editable and the outcome stays until the next run replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDelta {
    pub name: String,
    #[serde(default)]
    pub changes: BTreeMap<String, ParamValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_result: Option<RunOutcome>,
}

impl ScenarioDelta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            changes: BTreeMap::new(),
            last_result: None,
        }
    }

    /// Builder-style change
    pub fn change(mut self, field: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.changes.insert(field.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Ordered list of scenarios with unique names
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ScenarioDelta>", into = "Vec<ScenarioDelta>")]
pub struct ScenarioSet {
    scenarios: Vec<ScenarioDelta>,
}

impl TryFrom<Vec<ScenarioDelta>> for ScenarioSet {
    type Error = ConfigError;

    fn try_from(deltas: Vec<ScenarioDelta>) -> Result<Self, Self::Error> {
        Self::from_deltas(deltas)
    }
}

impl From<ScenarioSet> for Vec<ScenarioDelta> {
    fn from(set: ScenarioSet) -> Self {
        set.scenarios
    }
}

impl ScenarioSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list, rejecting duplicate names
    pub fn from_deltas(deltas: Vec<ScenarioDelta>) -> Result<Self, ConfigError> {
        let mut set = Self::new();
        for delta in deltas {
            set.add(delta)?;
        }
        Ok(set)
    }

    pub fn add(&mut self, delta: ScenarioDelta) -> Result<(), ConfigError> {
        if self.get(&delta.name).is_some() {
            return Err(ConfigError::DuplicateScenario(delta.name));
        }
        self.scenarios.push(delta);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<ScenarioDelta, ConfigError> {
        let idx = self.position(name)?;
        Ok(self.scenarios.remove(idx))
    }

    pub fn rename(&mut self, name: &str, new_name: &str) -> Result<(), ConfigError> {
        if name != new_name && self.get(new_name).is_some() {
            return Err(ConfigError::DuplicateScenario(new_name.to_string()));
        }
        let idx = self.position(name)?;
        self.scenarios[idx].name = new_name.to_string();
        Ok(())
    }

    pub fn set_change(
        &mut self,
        name: &str,
        field: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Result<(), ConfigError> {
        let idx = self.position(name)?;
        self.scenarios[idx]
            .changes
            .insert(field.into(), value.into());
        Ok(())
    }

    pub fn clear_change(&mut self, name: &str, field: &str) -> Result<(), ConfigError> {
        let idx = self.position(name)?;
        self.scenarios[idx].changes.remove(field);
        Ok(())
    }

    /// Attach run outcomes to their scenarios by name.
    ///
    /// Results for scenarios that were removed since the run are ignored.
    /// Returns the number of scenarios annotated.
    pub fn annotate(&mut self, results: &[ScenarioRunResult]) -> usize {
        let mut annotated = 0;
        for result in results {
            if let Some(delta) = self.scenarios.iter_mut().find(|d| d.name == result.name) {
                delta.last_result = Some(result.outcome.clone());
                annotated += 1;
            }
        }
        annotated
    }

    pub fn get(&self, name: &str) -> Option<&ScenarioDelta> {
        self.scenarios.iter().find(|d| d.name == name)
    }

    pub fn as_slice(&self) -> &[ScenarioDelta] {
        &self.scenarios
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    fn position(&self, name: &str) -> Result<usize, ConfigError> {
        self.scenarios
            .iter()
            .position(|d| d.name == name)
            .ok_or_else(|| ConfigError::ScenarioNotFound(name.to_string()))
    }
}
