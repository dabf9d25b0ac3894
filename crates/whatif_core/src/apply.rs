//! Derive variant parameter sets from a baseline.
//!
//! Both entry points share one combination table (`FieldRule`) and always
//! return a new `ParameterSet`; the baseline is only borrowed.

use crate::config::{FieldRule, FieldRules, ScenarioDelta};
use crate::error::ConfigError;
use crate::model::{ParamValue, ParameterSet};

/// Apply every change in `delta` to a copy of `baseline`.
///
/// Fields the delta does not mention are copied unchanged.
pub fn apply_scenario_delta(
    rules: &FieldRules,
    baseline: &ParameterSet,
    delta: &ScenarioDelta,
) -> Result<ParameterSet, ConfigError> {
    let mut derived = baseline.clone();
    for (field, change) in &delta.changes {
        let value = combine_field(rules, baseline, field, change)?;
        derived.set(field.clone(), value);
    }
    Ok(derived)
}

/// Apply a single sweep variation to a copy of `baseline`.
///
/// For amount fields `variation` is a fractional change of the baseline's
/// signed value: `-0.30` on `-20000` gives `-14000`.
pub fn apply_sweep_variation(
    rules: &FieldRules,
    baseline: &ParameterSet,
    field: &str,
    variation: f64,
) -> Result<ParameterSet, ConfigError> {
    check_sweepable(rules, field)?;
    let value = combine_field(rules, baseline, field, &ParamValue::Number(variation))?;
    let mut derived = baseline.clone();
    derived.set(field, value);
    Ok(derived)
}

/// Fail unless `field` is known and takes numeric offsets
pub fn check_sweepable(rules: &FieldRules, field: &str) -> Result<(), ConfigError> {
    match rules.lookup(field)?.rule {
        FieldRule::Replace => Err(ConfigError::NotSweepable(field.to_string())),
        FieldRule::Additive | FieldRule::ScaleMagnitude => Ok(()),
    }
}

fn combine_field(
    rules: &FieldRules,
    baseline: &ParameterSet,
    field: &str,
    change: &ParamValue,
) -> Result<ParamValue, ConfigError> {
    let spec = rules.lookup(field)?;
    let base = baseline
        .get(field)
        .ok_or_else(|| ConfigError::MissingBaselineField(field.to_string()))?;

    match spec.rule {
        FieldRule::Additive => {
            let (base, change) = numeric_pair(field, base, change)?;
            Ok(ParamValue::Number(base + change))
        }
        FieldRule::ScaleMagnitude => {
            let (base, change) = numeric_pair(field, base, change)?;
            Ok(ParamValue::Number(scale_magnitude(base, change)))
        }
        FieldRule::Replace => {
            if !base.same_kind(change) {
                return Err(ConfigError::TypeMismatch {
                    field: field.to_string(),
                    expected: base.kind_name(),
                    found: change.kind_name(),
                });
            }
            Ok(change.clone())
        }
    }
}

fn numeric_pair(
    field: &str,
    base: &ParamValue,
    change: &ParamValue,
) -> Result<(f64, f64), ConfigError> {
    let mismatch = |found: &ParamValue| ConfigError::TypeMismatch {
        field: field.to_string(),
        expected: "numeric",
        found: found.kind_name(),
    };
    let base = base.as_number().ok_or_else(|| mismatch(base))?;
    let change = change.as_number().ok_or_else(|| mismatch(change))?;
    Ok((base, change))
}

/// Scale `|base|` by `1 + change`, clamped at zero, keeping the sign of `base`
fn scale_magnitude(base: f64, change: f64) -> f64 {
    let magnitude = (base.abs() * (1.0 + change)).max(0.0);
    if base.is_sign_negative() {
        -magnitude
    } else {
        magnitude
    }
}
