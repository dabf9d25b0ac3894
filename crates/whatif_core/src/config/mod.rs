//! Field combination rules and run definitions
//!
//! The field table is the single authority on how a delta combines with a
//! baseline value and on what the remote engine calls each field. It replaces
//! loosely typed deltas with an explicit, validated mapping:
//!
//! ```ignore
//! use whatif_core::config::{FieldRules, FieldSpec};
//!
//! let rules = FieldRules::from_specs(vec![
//!     FieldSpec::additive("equity_return_annual").engine_name("equityReturn"),
//!     FieldSpec::scale_magnitude("monthly_spending").engine_name("monthlySpending"),
//!     FieldSpec::additive("equity_allocation").allocation(),
//! ])?;
//!
//! // Fail fast at startup if the engine renamed anything
//! rules.validate_against_engine(&client.engine_schema().await?)?;
//! ```

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::client::EngineSchema;
use crate::error::ConfigError;
use crate::model::ParameterSet;

pub mod scenarios;
pub mod sweep;

pub use scenarios::{ScenarioDelta, ScenarioSet};
pub use sweep::{SweepSpec, total_points};

/// How a change combines with the baseline value of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRule {
    /// Rate-like fields: `base + change`
    Additive,
    /// Amount-like fields: the fractional change applies to `|base|` and the
    /// sign of `base` is kept (outflows are stored negative)
    ScaleMagnitude,
    /// Booleans and enum choices: the change replaces the value
    Replace,
}

/// One row of the field table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    /// Name of the field in the engine's schema; defaults to `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_name: Option<String>,
    pub rule: FieldRule,
    /// Counts toward the allocation total
    #[serde(default)]
    pub allocation: bool,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, rule: FieldRule) -> Self {
        Self {
            name: name.into(),
            engine_name: None,
            rule,
            allocation: false,
        }
    }

    pub fn additive(name: impl Into<String>) -> Self {
        Self::new(name, FieldRule::Additive)
    }

    pub fn scale_magnitude(name: impl Into<String>) -> Self {
        Self::new(name, FieldRule::ScaleMagnitude)
    }

    pub fn replace(name: impl Into<String>) -> Self {
        Self::new(name, FieldRule::Replace)
    }

    pub fn engine_name(mut self, engine_name: impl Into<String>) -> Self {
        self.engine_name = Some(engine_name.into());
        self
    }

    pub fn allocation(mut self) -> Self {
        self.allocation = true;
        self
    }

    /// Name the engine expects for this field
    pub fn wire_name(&self) -> &str {
        self.engine_name.as_deref().unwrap_or(&self.name)
    }
}

/// Ordered field table with constant-time lookup by name
#[derive(Debug, Clone)]
pub struct FieldRules {
    specs: Vec<FieldSpec>,
    index: FxHashMap<String, usize>,
}

impl FieldRules {
    /// Build a table, rejecting duplicate field names and two fields that
    /// map onto the same engine name
    pub fn from_specs(specs: Vec<FieldSpec>) -> Result<Self, ConfigError> {
        let mut index = FxHashMap::default();
        let mut wire_names: FxHashMap<String, String> = FxHashMap::default();
        for (i, spec) in specs.iter().enumerate() {
            if index.insert(spec.name.clone(), i).is_some() {
                return Err(ConfigError::DuplicateField(spec.name.clone()));
            }
            if let Some(first) = wire_names.insert(spec.wire_name().to_string(), spec.name.clone())
            {
                return Err(ConfigError::DuplicateEngineName {
                    engine_name: spec.wire_name().to_string(),
                    first,
                    second: spec.name.clone(),
                });
            }
        }
        Ok(Self { specs, index })
    }

    /// Default table for a retirement plan
    pub fn standard() -> Self {
        let specs = vec![
            FieldSpec::scale_magnitude("starting_capital"),
            FieldSpec::additive("equity_allocation").allocation(),
            FieldSpec::additive("bond_allocation").allocation(),
            FieldSpec::additive("cash_allocation").allocation(),
            FieldSpec::additive("equity_return_annual"),
            FieldSpec::additive("equity_volatility_annual"),
            FieldSpec::additive("bond_return_annual"),
            FieldSpec::additive("bond_volatility_annual"),
            FieldSpec::additive("inflation_annual"),
            FieldSpec::scale_magnitude("monthly_spending"),
            FieldSpec::scale_magnitude("monthly_contribution"),
            FieldSpec::additive("current_age"),
            FieldSpec::additive("retirement_age"),
            FieldSpec::additive("horizon_years"),
            FieldSpec::replace("spending_rule"),
            FieldSpec::replace("adjust_for_inflation"),
        ];
        let index = specs
            .iter()
            .enumerate()
            .map(|(i, spec)| (spec.name.clone(), i))
            .collect();
        Self { specs, index }
    }

    pub fn get(&self, field: &str) -> Option<&FieldSpec> {
        self.index.get(field).map(|&i| &self.specs[i])
    }

    /// Look up a field, treating an unknown name as an authoring error
    pub fn lookup(&self, field: &str) -> Result<&FieldSpec, ConfigError> {
        self.get(field)
            .ok_or_else(|| ConfigError::UnknownField(field.to_string()))
    }

    pub fn specs(&self) -> &[FieldSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Check every mapped field against the engine's advertised schema.
    ///
    /// Reports all missing names at once rather than the first.
    pub fn validate_against_engine(&self, schema: &EngineSchema) -> Result<(), ConfigError> {
        let known: FxHashSet<&str> = schema.fields.iter().map(String::as_str).collect();
        let missing: Vec<String> = self
            .specs
            .iter()
            .map(FieldSpec::wire_name)
            .filter(|name| !known.contains(name))
            .map(str::to_string)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::SchemaMismatch { missing })
        }
    }

    /// Check that every field of a parameter set is covered by the table
    pub fn validate_parameters(&self, params: &ParameterSet) -> Result<(), ConfigError> {
        for name in params.field_names() {
            self.lookup(name)?;
        }
        Ok(())
    }

    /// Rename a parameter set to the engine's field names
    pub fn to_engine(&self, params: &ParameterSet) -> Result<ParameterSet, ConfigError> {
        params
            .iter()
            .map(|(name, value)| {
                let spec = self.lookup(name)?;
                Ok((spec.wire_name().to_string(), value.clone()))
            })
            .collect()
    }

    /// Sum of the designated allocation fields present in `params`.
    ///
    /// Returns `None` when the table designates no allocation fields or none
    /// are present.
    pub fn allocation_sum(&self, params: &ParameterSet) -> Option<f64> {
        let values: Vec<f64> = self
            .specs
            .iter()
            .filter(|spec| spec.allocation)
            .filter_map(|spec| params.number(&spec.name))
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum())
        }
    }
}

impl Default for FieldRules {
    fn default() -> Self {
        Self::standard()
    }
}
