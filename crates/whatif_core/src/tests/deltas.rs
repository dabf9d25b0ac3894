//! Tests for deriving variant parameter sets
//!
//! These tests verify:
//! - Rate fields combine additively, amount fields on magnitude with sign kept
//! - An empty delta reproduces the baseline exactly
//! - The baseline is never modified
//! - Unknown fields surface as `ConfigError`

use crate::apply::{apply_scenario_delta, apply_sweep_variation};
use crate::config::{FieldRules, FieldSpec, ScenarioDelta};
use crate::error::ConfigError;
use crate::model::ParameterSet;

use super::mock::approx_eq;

fn plan() -> ParameterSet {
    ParameterSet::new()
        .with("starting_capital", 2_000_000.0)
        .with("equity_allocation", 0.6)
        .with("bond_allocation", 0.4)
        .with("equity_return_annual", 0.10)
        .with("inflation_annual", 0.03)
        .with("monthly_spending", -20_000.0)
        .with("monthly_contribution", 5_000.0)
        .with("retirement_age", 62.0)
        .with("spending_rule", "constant_dollar")
        .with("adjust_for_inflation", true)
}

#[test]
fn test_sweep_amount_variation_preserves_sign() {
    let rules = FieldRules::standard();
    let derived = apply_sweep_variation(&rules, &plan(), "monthly_spending", -0.30).unwrap();

    let spending = derived.number("monthly_spending").unwrap();
    assert!(
        approx_eq(spending, -14_000.0),
        "expected 70% of the outflow with sign kept, got {spending}"
    );
}

#[test]
fn test_sweep_amount_variation_on_positive_amount() {
    let rules = FieldRules::standard();
    let derived =
        apply_sweep_variation(&rules, &plan(), "monthly_contribution", 0.20).unwrap();
    assert!(approx_eq(
        derived.number("monthly_contribution").unwrap(),
        6_000.0
    ));
}

#[test]
fn test_sweep_rate_variation_is_additive() {
    let rules = FieldRules::standard();
    let derived = apply_sweep_variation(&rules, &plan(), "inflation_annual", 0.01).unwrap();
    assert!(approx_eq(derived.number("inflation_annual").unwrap(), 0.04));

    let derived = apply_sweep_variation(&rules, &plan(), "retirement_age", -2.0).unwrap();
    assert!(approx_eq(derived.number("retirement_age").unwrap(), 60.0));
}

#[test]
fn test_empty_delta_is_identity() {
    let rules = FieldRules::standard();
    let baseline = plan();
    let derived = apply_scenario_delta(&rules, &baseline, &ScenarioDelta::new("Same")).unwrap();
    assert_eq!(derived, baseline);
}

#[test]
fn test_scenario_delta_combines_each_field_by_rule() {
    let rules = FieldRules::standard();
    let delta = ScenarioDelta::new("Downturn")
        .change("equity_return_annual", -0.02)
        .change("monthly_spending", -0.10)
        .change("starting_capital", -0.25);

    let derived = apply_scenario_delta(&rules, &plan(), &delta).unwrap();

    assert!(approx_eq(derived.number("equity_return_annual").unwrap(), 0.08));
    assert!(approx_eq(derived.number("monthly_spending").unwrap(), -18_000.0));
    assert!(approx_eq(derived.number("starting_capital").unwrap(), 1_500_000.0));
    // Untouched fields carry over
    assert_eq!(derived.number("inflation_annual"), Some(0.03));
    assert_eq!(derived.len(), plan().len());
}

#[test]
fn test_baseline_is_not_mutated() {
    let rules = FieldRules::standard();
    let baseline = plan();
    let snapshot = baseline.clone();

    let delta = ScenarioDelta::new("Aggressive")
        .change("equity_allocation", 0.2)
        .change("bond_allocation", -0.2);
    let _ = apply_scenario_delta(&rules, &baseline, &delta).unwrap();
    let _ = apply_sweep_variation(&rules, &baseline, "monthly_spending", 0.5).unwrap();

    assert_eq!(baseline, snapshot);
}

#[test]
fn test_unknown_field_is_config_error() {
    let rules = FieldRules::standard();
    let delta = ScenarioDelta::new("Typo").change("equity_retrun_annual", 0.01);

    assert_eq!(
        apply_scenario_delta(&rules, &plan(), &delta).unwrap_err(),
        ConfigError::UnknownField("equity_retrun_annual".into())
    );
    assert_eq!(
        apply_sweep_variation(&rules, &plan(), "spend", 0.1).unwrap_err(),
        ConfigError::UnknownField("spend".into())
    );
}

#[test]
fn test_custom_table_changes_combination() {
    // The same field treated as an amount instead of a rate
    let rules = FieldRules::from_specs(vec![FieldSpec::scale_magnitude("inflation_annual")])
        .unwrap();
    let baseline = ParameterSet::new().with("inflation_annual", 0.03);

    let derived = apply_sweep_variation(&rules, &baseline, "inflation_annual", 0.5).unwrap();
    assert!(approx_eq(derived.number("inflation_annual").unwrap(), 0.045));
}
