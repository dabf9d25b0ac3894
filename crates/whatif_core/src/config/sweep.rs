//! Sensitivity sweep definitions

use serde::{Deserialize, Serialize};

/// A target field plus the ordered variations to probe.
///
/// For rate fields a variation is an additive offset; for amount fields it is
/// a fractional change of the baseline's magnitude. Stateless and reusable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepSpec {
    pub field: String,
    pub variations: Vec<f64>,
}

impl SweepSpec {
    pub fn new(field: impl Into<String>, variations: Vec<f64>) -> Self {
        Self {
            field: field.into(),
            variations,
        }
    }

    /// Evenly spaced variations from `min` to `max` inclusive
    pub fn linspace(field: impl Into<String>, min: f64, max: f64, steps: usize) -> Self {
        let variations = if steps <= 1 {
            vec![min]
        } else {
            let step_size = (max - min) / (steps - 1) as f64;
            (0..steps).map(|i| min + step_size * i as f64).collect()
        };
        Self::new(field, variations)
    }

    pub fn len(&self) -> usize {
        self.variations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variations.is_empty()
    }
}

/// Total number of requests a multi-parameter sweep will issue
pub fn total_points(sweeps: &[SweepSpec]) -> usize {
    sweeps.iter().map(SweepSpec::len).sum()
}
