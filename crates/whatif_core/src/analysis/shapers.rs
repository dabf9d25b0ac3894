//! Pure transforms from run outcomes to visualization input.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::model::{HeatmapPoint, RowMetrics, RunOutcome, ScenarioRow, ScenarioRunResult, SweepRunResult};

/// One row per scenario, in input order. Failed scenarios are kept as
/// unavailable rows rather than dropped or sorted to the end.
pub fn to_scenario_table(results: &[ScenarioRunResult]) -> Vec<ScenarioRow> {
    results
        .iter()
        .map(|result| ScenarioRow {
            name: result.name.clone(),
            changes: result.changes.clone(),
            metrics: match &result.outcome {
                RunOutcome::Success { metrics } => RowMetrics::Available {
                    success_probability: metrics.success_probability,
                    ending_median: metrics.ending_median,
                },
                RunOutcome::Failure { error, .. } => RowMetrics::Unavailable { error: *error },
            },
        })
        .collect()
}

/// Heatmap points for the successful sweep outcomes only
pub fn to_heatmap_points(results: &[SweepRunResult]) -> Vec<HeatmapPoint> {
    results
        .iter()
        .filter_map(|result| {
            result.outcome.as_ref().ok().map(|metrics| HeatmapPoint {
                parameter: result.field.clone(),
                variation: result.variation,
                success_probability: metrics.success_probability,
            })
        })
        .collect()
}

/// Validate and deduplicate heatmap points.
///
/// Points with a non-finite probability or variation are dropped first. A
/// repeated `(parameter, variation)` keeps the position of its first
/// occurrence and the value of its last. No dense grid is built; consumers
/// derive axes with [`heatmap_axes`].
pub fn to_heatmap_matrix(points: impl IntoIterator<Item = HeatmapPoint>) -> Vec<HeatmapPoint> {
    let mut index: FxHashMap<(String, u64), usize> = FxHashMap::default();
    let mut matrix: Vec<HeatmapPoint> = Vec::new();

    for point in points {
        if !point.success_probability.is_finite() || !point.variation.is_finite() {
            continue;
        }
        let key = (point.parameter.clone(), variation_key(point.variation));
        match index.get(&key) {
            Some(&i) => matrix[i].success_probability = point.success_probability,
            None => {
                index.insert(key, matrix.len());
                matrix.push(point);
            }
        }
    }

    matrix
}

/// Distinct axes of a sparse heatmap
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeatmapAxes {
    /// Parameters in first-seen order
    pub parameters: Vec<String>,
    /// Variations ascending, without duplicates
    pub variations: Vec<f64>,
}

impl HeatmapAxes {
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

pub fn heatmap_axes(points: &[HeatmapPoint]) -> HeatmapAxes {
    let mut parameters: Vec<String> = Vec::new();
    for point in points {
        if !parameters.contains(&point.parameter) {
            parameters.push(point.parameter.clone());
        }
    }

    let mut variations: Vec<f64> = points.iter().map(|p| p.variation).collect();
    variations.sort_by(f64::total_cmp);
    variations.dedup_by(|a, b| variation_key(*a) == variation_key(*b));

    HeatmapAxes {
        parameters,
        variations,
    }
}

/// Find the probability recorded for one heatmap cell
pub fn heatmap_value(points: &[HeatmapPoint], parameter: &str, variation: f64) -> Option<f64> {
    let key = variation_key(variation);
    points
        .iter()
        .rev()
        .find(|p| p.parameter == parameter && variation_key(p.variation) == key)
        .map(|p| p.success_probability)
}

/// Bit pattern used for equality, with -0.0 folded into 0.0
fn variation_key(variation: f64) -> u64 {
    if variation == 0.0 {
        0.0f64.to_bits()
    } else {
        variation.to_bits()
    }
}
